//! Unified error types for the rastro core library.
//!
//! This module provides a unified error type [`RastroError`] that covers all
//! failure modes across the scanning node. Each module also has its own
//! specific error types (`SourceError`, `LocationError`, `AdvisoryError`,
//! `ConfigError`) for internal use.
//!
//! The taxonomy matters more than the variants: location and advisory
//! failures are *absorbed* by the coordinator (absent fix, fallback text),
//! while source activation failures are the only errors that surface as the
//! scanner's `Error` state.

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for all rastro operations.
#[derive(Debug, Error)]
pub enum RastroError {
    // =========================================================================
    // BEACON SOURCE ERRORS
    // =========================================================================
    /// No Bluetooth adapter was found on this system.
    #[error(
        "No Bluetooth adapter found. Ensure Bluetooth hardware is present and drivers are loaded."
    )]
    AdapterNotFound,

    /// The Bluetooth adapter exists but is powered off.
    #[error("Bluetooth adapter is powered off. Run 'bluetoothctl power on' to enable.")]
    AdapterPoweredOff,

    /// The required scanning capability is missing or access was denied.
    #[error("Bluetooth scanning permission denied: {0}")]
    ScanPermissionDenied(String),

    /// Beacon source activation failed for another reason.
    #[error("Beacon source activation failed: {0}")]
    ActivationFailed(String),

    // =========================================================================
    // ABSORBED ENRICHMENT ERRORS
    // =========================================================================
    /// The location provider could not produce a fix.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The advisory service could not produce advice text.
    #[error("Advisory service failed: {0}")]
    AdvisoryFailed(String),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for rastro operations.
pub type Result<T> = std::result::Result<T, RastroError>;

impl RastroError {
    /// Returns `true` if this error came from beacon source activation.
    ///
    /// These are the only errors that put the scanner into its `Error`
    /// state; everything else is absorbed or reported to the caller.
    #[inline]
    #[must_use]
    pub fn is_activation_error(&self) -> bool {
        matches!(
            self,
            Self::AdapterNotFound
                | Self::AdapterPoweredOff
                | Self::ScanPermissionDenied(_)
                | Self::ActivationFailed(_)
        )
    }

    /// Returns `true` if this error is absorbed by the coordinator.
    ///
    /// Absorbed failures degrade gracefully (absent location, fallback
    /// advisory) and never change scanner state.
    #[inline]
    #[must_use]
    pub fn is_absorbed(&self) -> bool {
        matches!(self, Self::LocationUnavailable(_) | Self::AdvisoryFailed(_))
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 404 Not Found
            Self::ConfigNotFound(_) => 404,

            // 422 Unprocessable Entity - semantic errors
            Self::ConfigParseError(_) | Self::ConfigValidationError(_) => 422,

            // 500 Internal Server Error
            Self::IoError(_) => 500,

            // 502 Bad Gateway - upstream enrichment services
            Self::LocationUnavailable(_) | Self::AdvisoryFailed(_) => 502,

            // 503 Service Unavailable - scanning capability issues
            Self::AdapterNotFound
            | Self::AdapterPoweredOff
            | Self::ScanPermissionDenied(_)
            | Self::ActivationFailed(_) => 503,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AdapterNotFound => "ADAPTER_NOT_FOUND",
            Self::AdapterPoweredOff => "ADAPTER_POWERED_OFF",
            Self::ScanPermissionDenied(_) => "SCAN_PERMISSION_DENIED",
            Self::ActivationFailed(_) => "ACTIVATION_FAILED",
            Self::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
            Self::AdvisoryFailed(_) => "ADVISORY_FAILED",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::source::SourceError> for RastroError {
    fn from(err: crate::source::SourceError) -> Self {
        use crate::source::SourceError;
        match err {
            SourceError::AdapterNotFound => Self::AdapterNotFound,
            SourceError::AdapterPoweredOff => Self::AdapterPoweredOff,
            SourceError::PermissionDenied { message } => Self::ScanPermissionDenied(message),
            SourceError::DiscoveryFailed { message } => Self::ActivationFailed(message),
        }
    }
}

impl From<crate::location::LocationError> for RastroError {
    fn from(err: crate::location::LocationError) -> Self {
        Self::LocationUnavailable(err.to_string())
    }
}

impl From<crate::advisory::AdvisoryError> for RastroError {
    fn from(err: crate::advisory::AdvisoryError) -> Self {
        Self::AdvisoryFailed(err.to_string())
    }
}

impl From<crate::config::ConfigError> for RastroError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::ReadError { path, source } => Self::IoError(std::io::Error::new(
                source.kind(),
                format!("Failed to read {}: {}", path.display(), source),
            )),
            ConfigError::WriteError { path, source } => Self::IoError(std::io::Error::new(
                source.kind(),
                format!("Failed to write {}: {}", path.display(), source),
            )),
            ConfigError::ParseError(e) => Self::ConfigParseError(e),
            ConfigError::SerializeError(e) => Self::ConfigParseError(e),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_error_classification() {
        assert!(RastroError::AdapterNotFound.is_activation_error());
        assert!(RastroError::AdapterPoweredOff.is_activation_error());
        assert!(RastroError::ScanPermissionDenied("denied".into()).is_activation_error());
        assert!(RastroError::ActivationFailed("boom".into()).is_activation_error());

        assert!(!RastroError::LocationUnavailable("gps off".into()).is_activation_error());
    }

    #[test]
    fn test_absorbed_error_classification() {
        assert!(RastroError::LocationUnavailable("gps off".into()).is_absorbed());
        assert!(RastroError::AdvisoryFailed("quota".into()).is_absorbed());

        assert!(!RastroError::AdapterNotFound.is_absorbed());
        assert!(!RastroError::ConfigParseError("bad toml".into()).is_absorbed());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(RastroError::ConfigNotFound(PathBuf::from("/x")).is_config_error());
        assert!(RastroError::ConfigParseError("syntax".into()).is_config_error());
        assert!(RastroError::ConfigValidationError("bad value".into()).is_config_error());

        assert!(!RastroError::AdapterNotFound.is_config_error());
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            RastroError::ConfigNotFound(PathBuf::new()).http_status_code(),
            404
        );
        assert_eq!(
            RastroError::ConfigValidationError("bad".into()).http_status_code(),
            422
        );
        assert_eq!(
            RastroError::LocationUnavailable("gps".into()).http_status_code(),
            502
        );
        assert_eq!(RastroError::AdapterNotFound.http_status_code(), 503);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RastroError::AdapterNotFound.error_code(), "ADAPTER_NOT_FOUND");
        assert_eq!(
            RastroError::AdvisoryFailed("x".into()).error_code(),
            "ADVISORY_FAILED"
        );
    }

    #[test]
    fn test_from_source_error() {
        let err: RastroError = crate::source::SourceError::AdapterNotFound.into();
        assert!(matches!(err, RastroError::AdapterNotFound));
    }

    #[test]
    fn test_error_display_messages() {
        let err = RastroError::AdapterNotFound;
        assert!(err.to_string().contains("No Bluetooth adapter found"));

        let err = RastroError::ActivationFailed("discovery stream closed".into());
        assert!(err.to_string().contains("discovery stream closed"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RastroError>();
        assert_sync::<RastroError>();
    }
}
