//! Transport to the hosted text model.
//!
//! The decider only sees [`TextGenerator`]; [`GeminiClient`] is the production
//! implementation speaking the Gemini `generateContent` REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;

/// Sampling controls sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 150,
        }
    }
}

impl From<&ModelConfig> for GenerationParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Anything that turns a prompt into free-form reply text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ModelError>;
}

/// Failure to obtain reply text from the model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model credential is not configured")]
    MissingCredential,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model reply carried no text")]
    EmptyReply,
    #[error("model did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn request_body(prompt: &str, params: GenerationParams) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![RequestPart {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        },
    }
}

/// Joins the text parts of the first candidate.
fn reply_text(response: GenerateContentResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyReply);
    }
    Ok(text)
}

/// Gemini REST client. Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = config
            .require_api_key()
            .map_err(|_| ModelError::MissingCredential)?
            .to_string();

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ModelError::Client)?;

        Ok(Self {
            http,
            url: format!(
                "{}/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, ModelError> {
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, params))
            .send()
            .await?;

        let status = response.status();
        debug!(%status, url = %self.url, "model endpoint responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        reply_text(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::discount::{DecisionSource, DiscountQuery, ModelBackedDecider};
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// (path, x-goog-api-key, body) for every call the local endpoint served.
    type Served = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn local_model_endpoint(status: StatusCode, reply: Value) -> (String, Served) {
        let served: Served = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&served);
        let app = Router::new().fallback(
            move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                let reply = reply.clone();
                async move {
                    let key = headers
                        .get("x-goog-api-key")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    recorder
                        .lock()
                        .expect("recorder mutex poisoned")
                        .push((uri.path().to_string(), key, body));
                    (status, Json(reply))
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local endpoint");
        let addr = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (format!("http://{addr}/v1beta/models"), served)
    }

    fn local_config(endpoint: String) -> ModelConfig {
        ModelConfig {
            api_key: Some("k1".to_string()),
            endpoint,
            timeout: Duration::from_secs(5),
            ..ModelConfig::default()
        }
    }

    fn child() -> DiscountQuery {
        DiscountQuery::new(10, false, Vec::<String>::new())
    }

    #[test]
    fn request_body_uses_camel_case_generation_config() {
        let body = request_body(
            "hello",
            GenerationParams {
                temperature: 0.1,
                max_output_tokens: 150,
            },
        );
        let value = serde_json::to_value(&body).expect("serializes");

        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 150);
        assert!(value["generationConfig"]["temperature"].as_f64().is_some());
        assert_eq!(value.get("generation_config"), None::<&Value>);
    }

    #[test]
    fn reply_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"discount_percentage\": " }, { "text": "0.2}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .expect("valid payload");

        assert_eq!(
            reply_text(response).expect("text"),
            "{\"discount_percentage\": 0.2}"
        );
    }

    #[test]
    fn reply_without_candidates_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .expect("valid payload");

        assert!(matches!(reply_text(response), Err(ModelError::EmptyReply)));
    }

    #[test]
    fn client_requires_credential() {
        let config = ModelConfig::default();
        assert!(matches!(
            GeminiClient::new(&config),
            Err(ModelError::MissingCredential)
        ));
    }

    #[test]
    fn client_targets_configured_model() {
        let config = ModelConfig {
            api_key: Some("test-key".to_string()),
            endpoint: "https://example.test/v1beta/models/".to_string(),
            ..ModelConfig::default()
        };

        let client = GeminiClient::new(&config).expect("client builds");

        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
        assert!(!format!("{client:?}").contains("test-key"));
    }

    #[tokio::test]
    async fn gemini_client_sends_key_and_generation_config() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{
                    "text": "```json\n{\"discount_percentage\": 0.2, \"reason\": \"kid\"}\n```"
                }] }
            }]
        });
        let (endpoint, served) = local_model_endpoint(StatusCode::OK, reply).await;
        let config = local_config(endpoint);

        let client = GeminiClient::new(&config).expect("client builds");
        let text = client
            .generate("hello", GenerationParams::from(&config))
            .await
            .expect("model replies");
        assert!(text.contains("\"discount_percentage\": 0.2"));

        let decision = ModelBackedDecider::gemini(&config)
            .expect("decider builds")
            .decide(&child())
            .await;
        assert_eq!(decision.source(), DecisionSource::Model);
        assert_eq!(decision.discount_percentage(), 0.2);
        assert_eq!(decision.reason(), "kid");

        let served = served.lock().expect("recorder mutex poisoned").clone();
        assert_eq!(served.len(), 2);
        let (path, key, body) = &served[0];
        assert_eq!(path, "/v1beta/models/gemini-2.0-flash-exp:generateContent");
        assert_eq!(key.as_deref(), Some("k1"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 150);
        let temperature = body["generationConfig"]["temperature"]
            .as_f64()
            .expect("temperature is numeric");
        assert!((temperature - 0.1).abs() < 1e-6);
        assert!(served[1].2["contents"][0]["parts"][0]["text"]
            .as_str()
            .is_some_and(|prompt| prompt.contains("- Age: 10\n")));
    }

    #[tokio::test]
    async fn gemini_client_maps_error_status_and_decider_falls_back() {
        let (endpoint, served) =
            local_model_endpoint(StatusCode::TOO_MANY_REQUESTS, json!({ "error": "quota" })).await;
        let config = local_config(endpoint);

        let client = GeminiClient::new(&config).expect("client builds");
        match client.generate("hello", GenerationParams::default()).await {
            Err(ModelError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("quota"));
            }
            other => panic!("expected API error, got {other:?}"),
        }

        let decision = ModelBackedDecider::gemini(&config)
            .expect("decider builds")
            .decide(&child())
            .await;
        assert_eq!(decision.source(), DecisionSource::Rule);
        assert_eq!(decision.discount_percentage(), 0.2);
        assert_eq!(decision.reason(), "Age 0-12 discount (20%)");
        assert_eq!(served.lock().expect("recorder mutex poisoned").len(), 2);
    }
}
