//! HTTP surface of the deadline notifier.
//!
//! - `GET /health`
//! - `GET|POST /api/check-deadlines`: run one scan cycle
//! - `POST /api/send-notification`: ad-hoc push and/or email

pub mod middleware;
pub mod routes;
pub mod state;
