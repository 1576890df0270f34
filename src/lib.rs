pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;
