//! Configuration for jarvis-connector
//!
//! This crate provides:
//! - Configuration file discovery (TOML)
//! - Application configuration (AppConfig)
//! - Gerrit credential resolution

pub mod app_config;
pub mod config_file;
pub mod credentials;

pub use app_config::AppConfig;
pub use config_file::{config_file_path, load_config_file};
pub use credentials::{resolve_credentials, AUTH_ENV_VAR};
