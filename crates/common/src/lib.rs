pub mod config;
pub mod credentials;
pub mod error;
pub mod firestore;
pub mod redis_pool;
pub mod store;
pub mod timestamp;
pub mod types;
