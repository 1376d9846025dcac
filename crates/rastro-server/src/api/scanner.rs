//! Scanner lifecycle API endpoints.
//!
//! Provides endpoints for checking scanner status and for starting and
//! stopping the beacon scan.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rastro_core::ScannerState;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiResult;
use crate::state::{AppState, SourceKind};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Scanner status response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "state": "SCANNING",
    "detection_count": 3,
    "source": "simulated",
    "checked_at_utc": "2025-06-12T18:30:00Z"
}))]
pub struct ScannerStatusResponse {
    /// Current scanner state.
    pub state: ScannerState,

    /// Number of detections recorded since startup.
    #[schema(example = 3)]
    pub detection_count: usize,

    /// Which source drives the scanner ("simulated" or "bluetooth").
    #[schema(example = "simulated")]
    pub source: String,

    /// UTC timestamp of when this status was read.
    #[schema(example = "2025-06-12T18:30:00Z")]
    pub checked_at_utc: String,
}

/// Response to a start or stop request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "state": "SCANNING",
    "source": "simulated"
}))]
pub struct ScannerControlResponse {
    /// Scanner state after the operation.
    pub state: ScannerState,

    /// Which source drives the scanner ("simulated" or "bluetooth").
    #[schema(example = "simulated")]
    pub source: String,
}

const fn source_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Simulated => "simulated",
        SourceKind::Bluetooth => "bluetooth",
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current scanner status.
#[utoipa::path(
    get,
    path = "/scanner",
    tag = "scanner",
    operation_id = "getScannerStatus",
    summary = "Get scanner status",
    description = "Returns the current scanner state, the number of recorded \
        detections, and which beacon source is in use.",
    responses(
        (status = 200, description = "Scanner status", body = ScannerStatusResponse)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Json<ScannerStatusResponse> {
    Json(ScannerStatusResponse {
        state: state.coordinator().state().await,
        detection_count: state.coordinator().detection_count().await,
        source: source_label(state.source_kind()).to_string(),
        checked_at_utc: Utc::now().to_rfc3339(),
    })
}

/// Start scanning for beacons.
///
/// No-op when the scanner is already running. When BlueZ activation fails
/// and fallback is configured, the simulated source takes over; otherwise
/// the scanner stays in the error state until a stop resets it.
#[utoipa::path(
    post,
    path = "/scanner/start",
    tag = "scanner",
    operation_id = "startScanner",
    summary = "Start the beacon scanner",
    description = "Activates the configured beacon source and begins \
        recording detections. Starting an already-running scanner is a \
        no-op. On Bluetooth activation failure the scanner either falls \
        back to simulation (when configured) or reports 503 and stays in \
        the ERROR state until stopped.",
    responses(
        (status = 200, description = "Scanner started", body = ScannerControlResponse),
        (status = 503, description = "Beacon source unavailable",
            body = crate::api::error::ErrorResponse)
    )
)]
pub async fn start_scanner(
    State(state): State<AppState>,
) -> ApiResult<Json<ScannerControlResponse>> {
    let kind = state.start_scanner().await?;

    Ok(Json(ScannerControlResponse {
        state: state.coordinator().state().await,
        source: source_label(kind).to_string(),
    }))
}

/// Stop scanning and reset the scanner.
#[utoipa::path(
    post,
    path = "/scanner/stop",
    tag = "scanner",
    operation_id = "stopScanner",
    summary = "Stop the beacon scanner",
    description = "Deactivates the beacon source and returns the scanner to \
        IDLE from any state, including ERROR. The detection log is kept; \
        any visible advisory is cleared. Safe to call repeatedly.",
    responses(
        (status = 200, description = "Scanner stopped", body = ScannerControlResponse)
    )
)]
pub async fn stop_scanner(State(state): State<AppState>) -> Json<ScannerControlResponse> {
    state.coordinator().stop().await;

    Json(ScannerControlResponse {
        state: ScannerState::Idle,
        source: source_label(state.source_kind()).to_string(),
    })
}
