pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod deadline;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use app::{app, AppState};
