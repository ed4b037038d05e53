pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod observability;
pub mod redaction;
pub mod repository;
pub mod routes;
pub mod state;
pub mod validation;
