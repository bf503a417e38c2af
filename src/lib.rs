// Core modules
pub mod api;
pub mod settings;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod strategy;

// Re-export commonly used types
pub use api::ExchangeClient;
pub use models::*;
pub use strategy::Strategy;
