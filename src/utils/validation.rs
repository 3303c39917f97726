use crate::utils::error::{CheckError, Result};
use std::time::Duration;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// A usable TCP port: 1..=65535. Port 0 asks the OS for an ephemeral port and cannot be dialed.
pub fn validate_port(field_name: &str, port: u16) -> Result<()> {
    if port == 0 {
        return Err(CheckError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: port.to_string(),
            reason: "Port must be between 1 and 65535".to_string(),
        });
    }
    Ok(())
}

/// Upper bound for any configured timeout or hold, in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Parses a timeout given in (possibly fractional) seconds, at most `MAX_TIMEOUT_SECS`.
pub fn validate_timeout_secs(field_name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(CheckError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: secs.to_string(),
            reason: "Timeout must be a positive number of seconds".to_string(),
        });
    }
    validate_range(field_name, secs, f64::MIN_POSITIVE, MAX_TIMEOUT_SECS)?;

    Duration::try_from_secs_f64(secs).map_err(|e| CheckError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: secs.to_string(),
        reason: format!("Timeout out of range: {}", e),
    })
}

pub fn validate_positive_duration(field_name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(CheckError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{:?}", value),
            reason: "Duration must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CheckError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CheckError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CheckError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
