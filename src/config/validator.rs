//! Settings validation rules.

use crate::config::schema::Settings;
use crate::error::{Result, UpkeepError};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

/// Validate settings and return all errors.
pub fn validate_settings(settings: &Settings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if settings.cache_ttl_minutes == 0 {
        errors.push(ValidationError {
            rule: "zero-ttl".to_string(),
            message: "cache_ttl_minutes must be at least 1".to_string(),
        });
    }

    if settings.scan_timeout_secs == 0 {
        errors.push(ValidationError {
            rule: "zero-timeout".to_string(),
            message: "scan_timeout_secs must be at least 1".to_string(),
        });
    }

    errors
}

/// Validate settings, failing on the first batch of errors.
pub fn validate(settings: &Settings) -> Result<()> {
    let errors = validate_settings(settings);
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(UpkeepError::ConfigValidationError { message })
}
