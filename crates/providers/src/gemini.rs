//! Gemini `generateContent` client.
//!
//! Uses the REST API directly:
//! - `x-goog-api-key` header authentication
//! - System instruction as a top-level `systemInstruction` content
//! - `generationConfig` and `safetySettings` sent with every call
//! - Whole-response only; no SSE

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tablechat_core::error::GenerationError;
use tablechat_core::generation::*;
use tablechat_core::message::{ChatTurn, Role};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Gemini generation client.
pub struct GeminiClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| GenerationError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Use a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str, action: &str) -> String {
        format!("{}/{API_VERSION}/models/{model}{action}", self.base_url)
    }

    /// Build the wire body: context turns first, then the live prompt.
    fn to_api_request(request: &GenerationRequest) -> ApiRequest {
        let mut contents: Vec<ApiContent> = request.context.iter().map(ApiContent::from).collect();
        contents.push(ApiContent {
            role: Some(Role::User.as_str().into()),
            parts: vec![ApiPart {
                text: request.prompt.clone(),
            }],
        });

        let system_instruction = if request.system_instruction.trim().is_empty() {
            None
        } else {
            Some(ApiContent {
                role: None,
                parts: vec![ApiPart {
                    text: request.system_instruction.clone(),
                }],
            })
        };

        ApiRequest {
            system_instruction,
            contents,
            generation_config: ApiGenerationConfig {
                temperature: request.config.temperature,
                top_p: request.config.top_p,
                top_k: request.config.top_k,
                max_output_tokens: request.config.max_output_tokens,
            },
            safety_settings: request
                .safety
                .entries()
                .iter()
                .map(|(category, threshold)| ApiSafetySetting {
                    category: category.api_name().into(),
                    threshold: threshold.api_name().into(),
                })
                .collect(),
        }
    }

    /// Map a non-success status and body to an error.
    fn error_from_status(status: u16, retry_after: Option<u64>, body: &str) -> GenerationError {
        let message = serde_json::from_str::<ApiErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            429 => GenerationError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(5),
            },
            401 | 403 => GenerationError::Authentication(message),
            400 if message.contains("API key") => GenerationError::Authentication(message),
            _ => GenerationError::Upstream {
                status_code: status,
                message,
            },
        }
    }

    /// Convert the API response to our GenerationResponse.
    fn to_generation_response(
        resp: ApiResponse,
        requested_model: &str,
    ) -> Result<GenerationResponse, GenerationError> {
        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::Blocked { reason });
        }

        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                    Err(GenerationError::Blocked {
                        reason: reason.to_string(),
                    })
                }
                _ => Err(GenerationError::EmptyResponse),
            };
        }

        let usage = resp.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(GenerationResponse {
            text,
            model: resp
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            finish_reason: candidate.finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl Generator for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError> {
        let url = self.endpoint(&request.model, ":generateContent");
        let body = Self::to_api_request(&request);

        debug!(
            provider = "gemini",
            model = %request.model,
            context_turns = request.context.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(e.to_string())
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(Self::error_from_status(status, retry_after, &error_body));
        }

        let api_resp: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::Upstream {
                    status_code: status,
                    message: format!("Failed to parse Gemini response: {e}"),
                })?;

        Self::to_generation_response(api_resp, &request.model)
    }

    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        let url = format!("{}/{API_VERSION}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(true);
        }
        let body = response.text().await.unwrap_or_default();
        match Self::error_from_status(status, None, &body) {
            e @ GenerationError::Authentication(_) => Err(e),
            _ => Ok(false),
        }
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
    safety_settings: Vec<ApiSafetySetting>,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ApiPart>,
}

impl From<&ChatTurn> for ApiContent {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: Some(turn.role.as_str().into()),
            parts: turn
                .parts
                .iter()
                .map(|text| ApiPart { text: text.clone() })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseContent {
    #[serde(default)]
    parts: Vec<ApiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ApiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::HeaderMap, http::StatusCode, routing::post};

    fn test_request() -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.5-flash".into(),
            system_instruction: "answer from the table only".into(),
            context: vec![
                ChatTurn::text(Role::User, "reference data:\nmonitor price? 500 THB"),
                ChatTurn::text(Role::Model, "understood"),
            ],
            prompt: "จอคอมราคาเท่าไหร่".into(),
            config: GenerationConfig::default(),
            safety: SafetyPolicy::default(),
        }
    }

    #[test]
    fn constructor_with_base_url() {
        let client = GeminiClient::new("AIza-test")
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.name(), "gemini");
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(
            client.endpoint("gemini-2.5-flash", ":generateContent"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GeminiClient::to_api_request(&test_request())).unwrap();

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "answer from the table only"
        );
        assert!(body["systemInstruction"].get("role").is_none());

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "จอคอมราคาเท่าไหร่");

        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 2048);
        assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);

        let safety = body["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 4);
        assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
        assert_eq!(safety[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
    }

    #[test]
    fn blank_system_instruction_is_omitted() {
        let mut request = test_request();
        request.system_instruction = "  ".into();
        let body = serde_json::to_value(GeminiClient::to_api_request(&request)).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parse_text_response() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "จอมอนิเตอร์ราคา "}, {"text": "500 บาทค่ะ"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 8, "totalTokenCount": 128},
                "modelVersion": "gemini-2.5-flash-001"
            }"#,
        )
        .unwrap();

        let out = GeminiClient::to_generation_response(resp, "gemini-2.5-flash").unwrap();
        assert_eq!(out.text, "จอมอนิเตอร์ราคา 500 บาทค่ะ");
        assert_eq!(out.model, "gemini-2.5-flash-001");
        assert_eq!(out.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(out.usage.unwrap().total_tokens, 128);
    }

    #[test]
    fn thought_parts_are_skipped() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "answer"}
            ]}}]}"#,
        )
        .unwrap();
        let out = GeminiClient::to_generation_response(resp, "m").unwrap();
        assert_eq!(out.text, "answer");
        assert_eq!(out.model, "m");
    }

    #[test]
    fn prompt_block_is_reported() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let err = GeminiClient::to_generation_response(resp, "m").unwrap_err();
        assert!(matches!(err, GenerationError::Blocked { reason } if reason == "SAFETY"));
    }

    #[test]
    fn safety_finish_without_text_is_blocked() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let err = GeminiClient::to_generation_response(resp, "m").unwrap_err();
        assert!(matches!(err, GenerationError::Blocked { .. }));
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let resp: ApiResponse = serde_json::from_str("{}").unwrap();
        let err = GeminiClient::to_generation_response(resp, "m").unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn status_mapping() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            GeminiClient::error_from_status(400, None, body),
            GenerationError::Authentication(_)
        ));
        assert!(matches!(
            GeminiClient::error_from_status(429, Some(12), ""),
            GenerationError::RateLimited { retry_after_secs: 12 }
        ));
        match GeminiClient::error_from_status(
            503,
            None,
            r#"{"error": {"code": 503, "message": "The model is overloaded."}}"#,
        ) {
            GenerationError::Upstream {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 503);
                assert_eq!(message, "The model is overloaded.");
            }
            other => panic!("Expected Upstream, got {other:?}"),
        }
        match GeminiClient::error_from_status(500, None, "plain text failure") {
            GenerationError::Upstream { message, .. } => assert_eq!(message, "plain text failure"),
            other => panic!("Expected Upstream, got {other:?}"),
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn generate_against_local_server() {
        async fn handler(
            Path(model_action): Path<String>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            assert_eq!(model_action, "gemini-2.5-flash:generateContent");
            assert_eq!(headers["x-goog-api-key"], "AIza-test");
            let prompt = body["contents"].as_array().unwrap().last().unwrap()["parts"][0]["text"]
                .as_str()
                .unwrap()
                .to_string();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": format!("echo: {prompt}")}]}, "finishReason": "STOP"}]
                })),
            )
        }

        let base = serve(Router::new().route("/v1beta/models/{model_action}", post(handler))).await;
        let client = GeminiClient::new("AIza-test").unwrap().with_base_url(base);

        let out = client.generate(test_request()).await.unwrap();
        assert_eq!(out.text, "echo: จอคอมราคาเท่าไหร่");
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_as_error() {
        async fn handler() -> (StatusCode, &'static str) {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                r#"{"error": {"code": 503, "message": "overloaded"}}"#,
            )
        }

        let base = serve(Router::new().route("/v1beta/models/{model_action}", post(handler))).await;
        let client = GeminiClient::new("AIza-test").unwrap().with_base_url(base);

        let err = client.generate(test_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Upstream { status_code: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = GeminiClient::new("AIza-test")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client.generate(test_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }
}
