//! Insight client backed by the Generative Language `generateContent` API.
//!
//! The model is asked for a JSON reply matching [`FuelInsights`]; the reply
//! arrives as text inside the first candidate and is decoded from there.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::model::{FuelInsights, FuelInsightsRequest};

use super::{InsightsClient, InsightsError, Result, render_prompt};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: String) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Builds a client with the key read from the environment variable `key_env`.
    pub fn from_env(endpoint: &str, model: &str, key_env: &str) -> Result<Self> {
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InsightsError::MissingApiKey(key_env.to_string()))?;
        Self::new(endpoint, model, api_key)
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl InsightsClient for GeminiClient {
    fn fuel_insights(&self, request: &FuelInsightsRequest) -> Result<FuelInsights> {
        debug!(trips = request.trips.len(), model = %self.model, "requesting fuel insights");

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "insight service rejected request");
            return Err(InsightsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

fn request_body(request: &FuelInsightsRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": render_prompt(request) }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "estimatedFuelConsumption": {
                        "type": "NUMBER",
                        "description": "The estimated total fuel consumption for all trips in liters.",
                    },
                    "drivingStyleInsights": {
                        "type": "STRING",
                        "description": "Insights into the user driving style and its impact on fuel consumption.",
                    },
                },
                "required": ["estimatedFuelConsumption", "drivingStyleInsights"],
            },
        },
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Pulls the model's JSON reply out of a `generateContent` response.
fn parse_response(body: &str) -> Result<FuelInsights> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| InsightsError::MalformedResponse("no text in first candidate".to_string()))?;

    serde_json::from_str(&text)
        .map_err(|e| InsightsError::MalformedResponse(format!("reply is not the expected JSON: {e}")))
}
