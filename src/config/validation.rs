//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (backlog > 0, known log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Address syntax is not checked here; `inet_pton` at bind time is the
//!   single authority on what parses

use thiserror::Error;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.address must not be empty")]
    EmptyAddress,

    #[error("listener.options.listen_backlog must be positive, got {0}")]
    Backlog(i32),

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error, off")]
    LogLevel(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    }

    if config.listener.options.listen_backlog <= 0 {
        errors.push(ValidationError::Backlog(config.listener.options.listen_backlog));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
