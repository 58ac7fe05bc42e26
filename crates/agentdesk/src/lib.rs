//! agentdesk core: per-thread workspace binding and the model catalog.

pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod stores;
pub mod workspace;

pub use app::App;
pub use commands::Commands;
