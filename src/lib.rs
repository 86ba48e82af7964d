pub mod config;
pub mod constants;
pub mod extractors;
pub mod hermes;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
