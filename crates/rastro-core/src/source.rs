//! Beacon source abstraction.
//!
//! A beacon source produces [`BeaconSighting`]s and pushes them into the
//! coordinator through a [`SightingSink`]. Two implementations exist: the
//! timer-driven [`SimulatedSource`](crate::simulate::SimulatedSource) and,
//! behind the `bluetooth` feature, the BlueZ-backed
//! [`BleSource`](crate::ble::BleSource).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::BeaconSighting;

/// Beacon source activation error.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// No Bluetooth adapter is present.
    #[error("no Bluetooth adapter found")]
    AdapterNotFound,

    /// The adapter exists but is powered off and could not be powered on.
    #[error("Bluetooth adapter is powered off")]
    AdapterPoweredOff,

    /// The platform denied the scanning capability.
    #[error("scanning permission denied: {message}")]
    PermissionDenied {
        /// Platform error detail.
        message: String,
    },

    /// Starting device discovery failed.
    #[error("device discovery failed: {message}")]
    DiscoveryFailed {
        /// Platform error detail.
        message: String,
    },
}

/// Handle a source uses to deliver sightings to the coordinator.
///
/// Cheap to clone; delivery is non-blocking. Once the receiving session
/// ends, [`send`](Self::send) reports `false` and the source should wind
/// down its emission loop.
#[derive(Debug, Clone)]
pub struct SightingSink {
    tx: mpsc::UnboundedSender<BeaconSighting>,
}

impl SightingSink {
    /// Create a sink and the receiver the coordinator consumes from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BeaconSighting>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver a sighting. Returns `false` when the session is gone.
    pub fn send(&self, sighting: BeaconSighting) -> bool {
        self.tx.send(sighting).is_ok()
    }
}

/// A producer of beacon sightings.
///
/// Implementations must be defensively idempotent: activating an already
/// active source and deactivating an inactive one are both no-ops, never
/// panics. Deactivation cancels any pending emission; no sighting may be
/// delivered through the sink after `deactivate` returns.
#[async_trait]
pub trait BeaconSource: Send + Sync {
    /// Begin producing sightings into `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the underlying capability cannot be
    /// brought up. This is the only error path that can put the scanner
    /// into its `Error` state.
    async fn activate(&mut self, sink: SightingSink) -> Result<(), SourceError>;

    /// Stop producing sightings and cancel pending emissions. Idempotent.
    async fn deactivate(&mut self);
}

/// Derive a pseudo-minor id from a platform device identifier.
///
/// BlueZ does not expose an iBeacon minor field for generic
/// advertisements, so we keep the trailing digits of the device address as
/// a best-effort, non-authoritative stand-in. Identifiers without digits
/// map to 0.
#[must_use]
pub fn derive_minor_id(device_id: &str) -> u16 {
    let digits: String = device_id.chars().filter(char::is_ascii_digit).collect();
    let tail = &digits[digits.len().saturating_sub(4)..];
    tail.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BeaconSighting;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_derive_minor_id_takes_trailing_digits() {
        assert_eq!(derive_minor_id("AA:BB:CC:11:22:33"), 2233);
        assert_eq!(derive_minor_id("node-4242"), 4242);
        assert_eq!(derive_minor_id("12345678"), 5678);
    }

    #[test]
    fn test_derive_minor_id_short_and_empty_ids() {
        assert_eq!(derive_minor_id("dev7"), 7);
        assert_eq!(derive_minor_id("no-digits-here"), 0);
        assert_eq!(derive_minor_id(""), 0);
    }

    #[test]
    fn test_sink_reports_closed_session() {
        let (sink, rx) = SightingSink::channel();
        let sighting = BeaconSighting {
            service_id: Uuid::nil(),
            minor_id: 1,
            signal_strength_dbm: -60,
            observed_at_utc: Utc::now(),
        };
        assert!(sink.send(sighting.clone()));
        drop(rx);
        assert!(!sink.send(sighting));
    }
}
