//! Device location lookup.
//!
//! The coordinator asks a [`LocationProvider`] for a fresh fix per
//! sighting; a fix is never cached or reused. Provider failure means "no
//! location", it is never fatal to the scanner.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::LocationFix;

/// Location lookup error.
#[derive(Debug, Clone, Error)]
pub enum LocationError {
    /// No fix could be produced.
    #[error("location unavailable: {reason}")]
    Unavailable {
        /// Why the fix failed.
        reason: String,
    },
}

/// Source of best-effort device coordinates.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Return the current device location.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] when no fix can be produced.
    /// Callers must treat this as "location absent", never as fatal.
    async fn current_location(&self) -> Result<LocationFix, LocationError>;
}

/// Provider returning coordinates configured for this node.
///
/// A headless node has no GPS receiver; the operator configures the
/// node's coordinates once and every detection is stamped with them.
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    fix: LocationFix,
}

impl FixedLocationProvider {
    /// Create a provider that always returns `fix`.
    #[must_use]
    pub const fn new(fix: LocationFix) -> Self {
        Self { fix }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        Ok(self.fix)
    }
}

/// Provider for nodes without configured coordinates. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        Err(LocationError::Unavailable {
            reason: "no coordinates configured for this node".to_string(),
        })
    }
}
