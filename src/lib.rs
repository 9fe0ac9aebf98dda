pub mod app;
pub mod config;
pub mod core;
pub mod http;
pub mod models;
