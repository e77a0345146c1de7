pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod metrics;
pub mod response;
pub mod routes;
pub mod state;
