//! SelfHeal CLI library
//!
//! Exposes the command layer and configuration for integration testing

pub mod cli;
pub mod config;

pub use config::{load_config, AppConfig, LoadedConfig, SuggesterConfig};
