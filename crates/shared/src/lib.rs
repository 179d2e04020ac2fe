//! Shared types, errors, and configuration for Cogsbook.
//!
//! This crate provides common types used across all other crates:
//! - Integer-cent money helpers
//! - The fixed cost-component model
//! - Typed IDs for processing runs
//! - Application-wide error types
//! - Configuration management (account mapping, logging)

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AccountMapping, AppConfig, ComponentAccounts, LoggingConfig, PnlAccounts, ProcessingConfig,
};
pub use error::{AppError, AppResult};
