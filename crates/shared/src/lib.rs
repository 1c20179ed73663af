//! Shared types, errors, and configuration for Filegate.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for file records
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, ServerConfig, StorageSettings, UploadConfig};
pub use error::AppError;
pub use types::FileId;
