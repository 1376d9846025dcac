//! # rastro-core
//!
//! Core business logic for the rastro lost-pet beacon scanning node.
//!
//! This crate provides:
//! - The detection coordinator (scanner state machine and event log)
//! - Beacon sources: a simulated emitter and optional BlueZ scanning
//! - Location enrichment for detection events
//! - AI-generated safety advisories with a probabilistic trigger policy
//! - Configuration management (scanner, simulation, advisory, location)
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`coordinator`] - Scanner state machine, detection log, advisory lifecycle
//! - [`source`] - The [`source::BeaconSource`] trait and sighting channel
//! - [`simulate`] - Timer-driven simulated beacon source
//! - [`ble`] - BlueZ-backed beacon source (behind the `bluetooth` feature)
//! - [`location`] - Location providers for event enrichment
//! - [`advisory`] - Gemini client, trigger policy, and prompt assembly
//! - [`config`] - Application configuration loading, saving, and validation
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared types and OpenAPI schemas

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod advisory;
#[cfg(feature = "bluetooth")]
pub mod ble;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod location;
pub mod simulate;
pub mod source;
pub mod types;

// Re-export primary types for convenience
pub use advisory::{
    advisory_context, AdvisoryError, AdvisoryPolicy, AdvisoryService, GeminiClient, RandomPolicy,
    FALLBACK_ADVISORY,
};
#[cfg(feature = "bluetooth")]
pub use ble::BleSource;
pub use config::{
    AdvisoryConfig, Config, ConfigError, LocationConfig, LogConfig, ScannerConfig, ServerConfig,
    SimulationConfig, DEFAULT_TARGET_SERVICE_UUID,
};
pub use coordinator::DetectionCoordinator;
pub use error::{RastroError, Result};
pub use location::{
    FixedLocationProvider, LocationError, LocationProvider, UnavailableLocationProvider,
};
pub use simulate::SimulatedSource;
pub use source::{derive_minor_id, BeaconSource, SightingSink, SourceError};
pub use types::{BeaconSighting, DetectionEvent, LocationFix, ScannerState, SyncStatus};
