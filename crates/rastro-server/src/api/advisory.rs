//! Safety advisory API endpoints.
//!
//! The coordinator decides when an advisory is generated; these endpoints
//! only expose the currently visible text and let the client dismiss it.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Current advisory response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": "Mantén la calma y verifica si el animal es visible."
}))]
pub struct AdvisoryResponse {
    /// The currently visible advisory text; `null` when none is shown.
    #[schema(nullable, example = "Mantén la calma y verifica si el animal es visible.")]
    pub message: Option<String>,
}

/// Advisory dismissal response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "dismissed": true }))]
pub struct DismissAdvisoryResponse {
    /// Always `true`; dismissing an absent advisory is a no-op.
    #[schema(example = true)]
    pub dismissed: bool,
}

/// Get the currently visible safety advisory.
#[utoipa::path(
    get,
    path = "/advisory",
    tag = "advisory",
    operation_id = "getAdvisory",
    summary = "Get the current safety advisory",
    description = "Returns the advisory text generated for a recent \
        detection, or null when none is visible. Advisories are replaced \
        by newer ones and cleared when the scanner stops.",
    responses(
        (status = 200, description = "Current advisory", body = AdvisoryResponse)
    )
)]
pub async fn get_advisory(State(state): State<AppState>) -> Json<AdvisoryResponse> {
    Json(AdvisoryResponse {
        message: state.coordinator().advisory_message().await,
    })
}

/// Dismiss the currently visible safety advisory.
#[utoipa::path(
    delete,
    path = "/advisory",
    tag = "advisory",
    operation_id = "dismissAdvisory",
    summary = "Dismiss the current safety advisory",
    description = "Clears the visible advisory. A no-op when none is shown.",
    responses(
        (status = 200, description = "Advisory dismissed", body = DismissAdvisoryResponse)
    )
)]
pub async fn dismiss_advisory(State(state): State<AppState>) -> Json<DismissAdvisoryResponse> {
    state.coordinator().dismiss_advisory().await;

    Json(DismissAdvisoryResponse { dismissed: true })
}
