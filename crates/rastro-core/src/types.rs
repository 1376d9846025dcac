//! Shared domain types and OpenAPI schemas.
//!
//! These are the value types that flow between beacon sources, the
//! detection coordinator, and the presentation layer. Sightings and
//! detection events are immutable once constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of the beacon scanner.
///
/// Exactly one state is active at a time; transitions are owned by the
/// [`DetectionCoordinator`](crate::coordinator::DetectionCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScannerState {
    /// Not scanning. Initial state, and the only state reachable by `stop()`.
    Idle,
    /// Actively listening for beacon sightings.
    Scanning,
    /// A sighting just arrived; returns to `Scanning` after the settle delay.
    Detected,
    /// Source activation failed. Requires an explicit stop/reset.
    Error,
}

impl ScannerState {
    /// Returns `true` unless the scanner is idle.
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// A single observed beacon advertisement matching the target service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "service_id": "f0012345-0000-0000-0000-000000000000",
    "minor_id": 4242,
    "signal_strength_dbm": -60,
    "observed_at_utc": "2025-06-01T17:30:00Z"
}))]
pub struct BeaconSighting {
    /// Service UUID the advertisement was filtered on.
    pub service_id: Uuid,

    /// Sub-identifier distinguishing individual beacons.
    ///
    /// For BlueZ scans this is *derived* from the trailing digits of the
    /// platform device address, not decoded from manufacturer data. It is
    /// unique enough per source device but not globally stable; never treat
    /// it as authoritative device identity.
    #[schema(example = 4242)]
    pub minor_id: u16,

    /// Received signal strength in dBm (more negative = weaker).
    #[schema(example = -60)]
    pub signal_strength_dbm: i16,

    /// When the advertisement was observed (UTC).
    pub observed_at_utc: DateTime<Utc>,
}

/// A best-effort device coordinate attached to a detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "latitude": 40.4168,
    "longitude": -3.7038,
    "accuracy_m": 12.5
}))]
pub struct LocationFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,

    /// Estimated horizontal accuracy in meters, if known.
    #[schema(nullable)]
    pub accuracy_m: Option<f64>,
}

/// Whether a detection event has been (nominally) reported onward.
///
/// There is no report transport yet; events are marked [`Synced`] at
/// creation, meaning "accepted locally". `Pending` is the extension point
/// for a real backend submission pipeline.
///
/// [`Synced`]: SyncStatus::Synced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Recorded locally, not yet reported.
    Pending,
    /// Reported (or accepted locally while no transport exists).
    Synced,
}

/// A beacon sighting enriched with location and sync metadata.
///
/// Created by the coordinator for every sighting delivered while the
/// scanner is active; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetectionEvent {
    /// Unique event id for this session.
    pub id: Uuid,

    /// Arrival order within the session (monotonically increasing).
    ///
    /// The event log is ordered newest-first by this sequence, regardless
    /// of the order in which location enrichment completes.
    pub sequence: u64,

    /// The sighting this event was created from.
    pub sighting: BeaconSighting,

    /// Device location at detection time, absent when the fix failed.
    #[schema(nullable)]
    pub location: Option<LocationFix>,

    /// Report status. Currently always `Synced` at creation.
    pub sync_status: SyncStatus,
}

impl DetectionEvent {
    /// Build a new event from a sighting and an optional location fix.
    #[must_use]
    pub fn new(sequence: u64, sighting: BeaconSighting, location: Option<LocationFix>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            sighting,
            location,
            sync_status: SyncStatus::Synced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(minor: u16) -> BeaconSighting {
        BeaconSighting {
            service_id: Uuid::nil(),
            minor_id: minor,
            signal_strength_dbm: -60,
            observed_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_scanner_state_activity() {
        assert!(!ScannerState::Idle.is_active());
        assert!(ScannerState::Scanning.is_active());
        assert!(ScannerState::Detected.is_active());
        assert!(ScannerState::Error.is_active());
    }

    #[test]
    fn test_scanner_state_serialization() {
        let json = serde_json::to_string(&ScannerState::Scanning).unwrap();
        assert_eq!(json, "\"SCANNING\"");
    }

    #[test]
    fn test_new_event_is_synced() {
        let event = DetectionEvent::new(1, sighting(4242), None);
        assert_eq!(event.sync_status, SyncStatus::Synced);
        assert_eq!(event.sequence, 1);
        assert!(event.location.is_none());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = DetectionEvent::new(1, sighting(1000), None);
        let b = DetectionEvent::new(2, sighting(1000), None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_sync_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Synced).unwrap(),
            "\"synced\""
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
