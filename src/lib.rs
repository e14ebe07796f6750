// ABOUTME: Library root for capstan - rolling deployments and scheduler action graphs.
// ABOUTME: The main binary is in main.rs.

pub mod audit;
pub mod config;
pub mod deploy;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod types;
