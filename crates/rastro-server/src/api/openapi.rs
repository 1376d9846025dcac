//! OpenAPI specification generation for the rastro API.
//!
//! This module generates an OpenAPI 3.0 specification consumed by the
//! companion mobile client for typed API access.

use axum::Json;
use utoipa::OpenApi;

// Import all the handler modules to reference their types
use super::advisory::{AdvisoryResponse, DismissAdvisoryResponse};
use super::error::ErrorResponse;
use super::events::EventsResponse;
use super::health::HealthResponse;
use super::scanner::{ScannerControlResponse, ScannerStatusResponse};
use rastro_core::{BeaconSighting, DetectionEvent, LocationFix, ScannerState, SyncStatus};

/// Serve the OpenAPI specification as JSON.
///
/// This endpoint is available at `/api/openapi.json` and returns the
/// complete OpenAPI 3.0 specification for the rastro API.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a string (for writing to file).
/// Used by the gen-openapi binary.
#[allow(dead_code)]
pub fn get_openapi_json() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialize OpenAPI spec")
}

/// Main OpenAPI document structure for rastro.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rastro API",
        version = "0.1.0",
        description = r#"
# rastro API

rastro is a demo node for a community lost-pet network. It scans for BLE
beacons worn by lost pets (or simulates them), records detections with the
node's location, and surfaces AI-generated safety advisories.

## Overview

This API runs on a small Linux node and provides:

1. **Scanner Control**: Start and stop beacon scanning, inspect the state machine
2. **Detection Log**: Every beacon sighting enriched with a location fix
3. **Safety Advisories**: Occasional AI-generated guidance for nearby helpers
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local rastro node")
    ),
    tags(
        (
            name = "system",
            description = "Health checks and system status"
        ),
        (
            name = "scanner",
            description = "Beacon scanner lifecycle and state"
        ),
        (
            name = "events",
            description = "Detection event log with location enrichment"
        ),
        (
            name = "advisory",
            description = "AI-generated safety advisories for detections"
        )
    ),
    paths(
        // Health endpoints
        super::health::health_check,
        // Scanner endpoints
        super::scanner::get_status,
        super::scanner::start_scanner,
        super::scanner::stop_scanner,
        // Event endpoints
        super::events::get_events,
        // Advisory endpoints
        super::advisory::get_advisory,
        super::advisory::dismiss_advisory,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Scanner types
            ScannerState,
            ScannerStatusResponse,
            ScannerControlResponse,
            // Event types
            BeaconSighting,
            LocationFix,
            SyncStatus,
            DetectionEvent,
            EventsResponse,
            // Advisory types
            AdvisoryResponse,
            DismissAdvisoryResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "rastro API");
        assert!(!spec.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"rastro API\""));
    }
}
