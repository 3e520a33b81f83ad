pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod output;
