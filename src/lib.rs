pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod monitor;
pub mod openapi;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod store;
pub mod validation;
