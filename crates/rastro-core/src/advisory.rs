//! AI safety advisory client and trigger policy.
//!
//! A random subset of detections asks a generative text API for short
//! safety advice for the volunteer. The trigger decision lives behind
//! [`AdvisoryPolicy`] so tests can force both branches; the client lives
//! behind [`AdvisoryService`] and is injected into the coordinator, never
//! reached through a global.
//!
//! The advisory text is Spanish: the tracking community this node serves
//! is Spanish-speaking.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DetectionEvent;

/// Shown when the advisory service fails. The volunteer still gets an
/// acknowledgement instead of an error.
pub const FALLBACK_ADVISORY: &str =
    "Gracias por tu colaboración. Los datos han sido enviados.";

/// Shown when the model answers with no usable text.
pub const EMPTY_RESPONSE_ADVISORY: &str =
    "Mantén la calma y verifica si el animal es visible.";

/// System instruction sent with every advisory request.
const SYSTEM_INSTRUCTION: &str = "\
Eres un asesor de seguridad IA para una comunidad de rastreo de mascotas \
(\"Sigue el rastro\"). Los usuarios escanean buscando balizas de mascotas \
perdidas. Si se detecta una, proporciona un consejo inmediato, calmado y \
centrado en la seguridad, basándote en la hora o contexto simulado.

Reglas:
1. Responde SIEMPRE en Español.
2. Sé breve (menos de 40 palabras).
3. Prioriza el bienestar del animal y del voluntario.
4. No inventes detalles específicos de la mascota que no se te hayan dado.";

/// Default API endpoint base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Advisory request error.
#[derive(Debug, Clone, Error)]
pub enum AdvisoryError {
    /// No API key is configured for the generative service.
    #[error("no advisory API key configured")]
    MissingApiKey,

    /// The HTTP request failed or the service answered with an error status.
    #[error("advisory request failed: {message}")]
    RequestFailed {
        /// Transport or status detail.
        message: String,
    },
}

/// Producer of short advisory text for a detection context.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Request advice for a free-text detection context.
    ///
    /// # Errors
    ///
    /// Returns an [`AdvisoryError`] on any failure. The coordinator masks
    /// errors with [`FALLBACK_ADVISORY`]; the distinct error type exists so
    /// tests can observe the failure path.
    async fn safety_advice(&self, context: &str) -> Result<String, AdvisoryError>;
}

/// Decides whether a detection should trigger an advisory request.
pub trait AdvisoryPolicy: Send + Sync {
    /// Returns `true` when `event` should trigger an advisory request.
    fn should_request(&self, event: &DetectionEvent) -> bool;
}

/// Policy triggering with a fixed probability per detection.
pub struct RandomPolicy {
    probability: f64,
    rng: Mutex<StdRng>,
}

impl RandomPolicy {
    /// Create a policy triggering with `probability`. Values outside 0..=1
    /// (including NaN) are clamped, never panic.
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a deterministic policy for tests.
    #[must_use]
    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self {
            probability: clamp_probability(probability),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

impl AdvisoryPolicy for RandomPolicy {
    fn should_request(&self, _event: &DetectionEvent) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rng.gen_bool(self.probability)
    }
}

/// Build the free-text context string for an advisory request.
///
/// Carries the minor id, coordinates when present, the local time in the
/// node's timezone, and the signal strength.
#[must_use]
pub fn advisory_context(event: &DetectionEvent, timezone: Tz) -> String {
    let coordinates = event.location.map_or_else(
        || "unknown".to_string(),
        |fix| format!("{:.4}, {:.4}", fix.latitude, fix.longitude),
    );
    let local_time = event
        .sighting
        .observed_at_utc
        .with_timezone(&timezone)
        .format("%H:%M:%S");

    format!(
        "Pet Beacon ID {} detected at coordinates {}. Time: {}. Signal Strength: {}dBm.",
        event.sighting.minor_id, coordinates, local_time, event.sighting.signal_strength_dbm
    )
}

// =============================================================================
// GEMINI CLIENT
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.trim())
            .find(|t| !t.is_empty())
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client for `model`. Requests fail with
    /// [`AdvisoryError::MissingApiKey`] until a key is provided.
    #[must_use]
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            model: model.into(),
            api_key,
        }
    }

    /// Override the endpoint base, for tests against a local server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AdvisoryService for GeminiClient {
    async fn safety_advice(&self, context: &str) -> Result<String, AdvisoryError> {
        let api_key = self.api_key.as_ref().ok_or(AdvisoryError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateContentRequest {
            system_instruction: Content::text(SYSTEM_INSTRUCTION),
            contents: vec![Content::text(format!(
                "Context: {context}. Provide immediate advice for the volunteer \
                 who just detected this signal."
            ))],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisoryError::RequestFailed {
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| AdvisoryError::RequestFailed {
                message: e.to_string(),
            })?;

        let body: GenerateContentResponse =
            response.json().await.map_err(|e| AdvisoryError::RequestFailed {
                message: e.to_string(),
            })?;

        Ok(body
            .first_text()
            .map_or_else(|| EMPTY_RESPONSE_ADVISORY.to_string(), ToString::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeaconSighting, DetectionEvent, LocationFix};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn event_at(minor: u16, location: Option<LocationFix>) -> DetectionEvent {
        DetectionEvent::new(
            1,
            BeaconSighting {
                service_id: Uuid::nil(),
                minor_id: minor,
                signal_strength_dbm: -60,
                observed_at_utc: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap(),
            },
            location,
        )
    }

    #[test]
    fn test_context_with_location() {
        let event = event_at(
            4242,
            Some(LocationFix {
                latitude: 40.4168,
                longitude: -3.7038,
                accuracy_m: None,
            }),
        );
        let context = advisory_context(&event, chrono_tz::Europe::Madrid);
        assert!(context.contains("Pet Beacon ID 4242"));
        assert!(context.contains("40.4168, -3.7038"));
        assert!(context.contains("-60dBm"));
        // 15:30 UTC is 17:30 in Madrid during CEST.
        assert!(context.contains("17:30:00"));
    }

    #[test]
    fn test_context_without_location() {
        let event = event_at(1000, None);
        let context = advisory_context(&event, chrono_tz::UTC);
        assert!(context.contains("coordinates unknown"));
        assert!(context.contains("15:30:00"));
    }

    #[test]
    fn test_policy_extremes() {
        let event = event_at(1, None);
        let always = RandomPolicy::seeded(1.0, 42);
        let never = RandomPolicy::seeded(0.0, 42);
        for _ in 0..16 {
            assert!(always.should_request(&event));
            assert!(!never.should_request(&event));
        }
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let event = event_at(1, None);
        let high = RandomPolicy::seeded(7.5, 1);
        let low = RandomPolicy::seeded(-1.0, 1);
        let nan = RandomPolicy::seeded(f64::NAN, 1);
        for _ in 0..8 {
            assert!(high.should_request(&event));
            assert!(!low.should_request(&event));
            assert!(!nan.should_request(&event));
        }
    }

    #[test]
    fn test_seeded_policy_is_deterministic() {
        let event = event_at(1, None);
        let a = RandomPolicy::seeded(0.3, 7);
        let b = RandomPolicy::seeded(0.3, 7);
        let decisions_a: Vec<bool> = (0..32).map(|_| a.should_request(&event)).collect();
        let decisions_b: Vec<bool> = (0..32).map(|_| b.should_request(&event)).collect();
        assert_eq!(decisions_a, decisions_b);
        // A 30% policy takes both branches over 32 draws.
        assert!(decisions_a.iter().any(|&d| d));
        assert!(decisions_a.iter().any(|&d| !d));
    }

    #[test]
    fn test_response_text_extraction() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "Mantén la distancia y llama al refugio."}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            body.first_text(),
            Some("Mantén la distancia y llama al refugio.")
        );
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(body.first_text().is_none());

        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "   "}]}}]}"#,
        )
        .unwrap();
        assert!(body.first_text().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_distinctly() {
        let client = GeminiClient::new("gemini-2.5-flash", None);
        let err = client.safety_advice("context").await.unwrap_err();
        assert!(matches!(err, AdvisoryError::MissingApiKey));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            system_instruction: Content::text("instructions"),
            contents: vec![Content::text("hello")],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"parts\""));
        assert!(json.contains("\"hello\""));
    }
}
