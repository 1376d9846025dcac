//! Detection event log API endpoint.

use axum::extract::State;
use axum::Json;
use rastro_core::DetectionEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Detection event log response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "events": [],
    "count": 0
}))]
pub struct EventsResponse {
    /// Recorded detection events, newest first.
    pub events: Vec<DetectionEvent>,

    /// Number of events in the log.
    #[schema(example = 0)]
    pub count: usize,
}

/// Get the detection event log.
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    operation_id = "getEvents",
    summary = "Get recorded detections",
    description = "Returns all detection events recorded since startup, \
        newest first. The log survives scanner stops and restarts.",
    responses(
        (status = 200, description = "Detection event log", body = EventsResponse)
    )
)]
pub async fn get_events(State(state): State<AppState>) -> Json<EventsResponse> {
    let events = state.coordinator().events().await;
    let count = events.len();

    Json(EventsResponse { events, count })
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::state::AppState;
    use axum_test::TestServer;
    use rastro_core::Config;

    #[tokio::test]
    async fn test_event_log_starts_empty() {
        let state = AppState::from_config(Config::default());
        let server = TestServer::new(create_router(state)).unwrap();

        let response = server.get("/api/events").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["count"], 0);
        assert!(body["events"].as_array().unwrap().is_empty());
    }
}
