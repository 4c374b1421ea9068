//! Shared errors and configuration for Coffer.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types and the wire shape of error responses
//! - Configuration management

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorResponse};
