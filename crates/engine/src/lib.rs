pub mod claim;
pub mod context;
pub mod dispatcher;
pub mod marker;
pub mod on_demand;
pub mod processor;
pub mod scanner;
