//! Generator trait: the abstraction over the remote text-generation service.
//!
//! A Generator receives the assembled context plus a live prompt and returns
//! the model's complete reply. There is no partial/streaming state at this
//! level: a request either succeeds with text or fails with an error.
//!
//! Implementations: Gemini `generateContent`, the retrying wrapper, and
//! scripted generators in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::message::ChatTurn;

/// Fixed decoding parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling randomness (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Candidate pool size
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Hard cap on reply length
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.4
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> u32 {
    40
}
fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Harm categories the remote service can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    /// The identifier used on the wire.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Harassment => "HARM_CATEGORY_HARASSMENT",
            Self::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            Self::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            Self::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

/// How aggressively a category is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl BlockThreshold {
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::BlockNone => "BLOCK_NONE",
            Self::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            Self::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            Self::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

/// Content-safety thresholds, one per harm category.
///
/// The default policy is permissive: nothing is blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    #[serde(default = "block_none")]
    pub harassment: BlockThreshold,

    #[serde(default = "block_none")]
    pub hate_speech: BlockThreshold,

    #[serde(default = "block_none")]
    pub sexually_explicit: BlockThreshold,

    #[serde(default = "block_none")]
    pub dangerous_content: BlockThreshold,
}

fn block_none() -> BlockThreshold {
    BlockThreshold::BlockNone
}

impl SafetyPolicy {
    /// Every category paired with its threshold, in a stable order.
    pub fn entries(&self) -> [(HarmCategory, BlockThreshold); 4] {
        [
            (HarmCategory::Harassment, self.harassment),
            (HarmCategory::HateSpeech, self.hate_speech),
            (HarmCategory::SexuallyExplicit, self.sexually_explicit),
            (HarmCategory::DangerousContent, self.dangerous_content),
        ]
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            harassment: block_none(),
            hate_speech: block_none(),
            sexually_explicit: block_none(),
            dangerous_content: block_none(),
        }
    }
}

/// Everything the remote service needs for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model identifier (e.g., "gemini-2.5-flash")
    pub model: String,

    /// Fixed instruction constraining answer behavior
    pub system_instruction: String,

    /// Prior turns, grounding turns first
    pub context: Vec<ChatTurn>,

    /// The live user message
    pub prompt: String,

    pub config: GenerationConfig,

    pub safety: SafetyPolicy,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete reply from the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text
    pub text: String,

    /// Which model actually responded
    pub model: String,

    /// Why generation stopped, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The core Generator trait.
///
/// The assistant calls `generate()` without knowing which backend answers.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this generator (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and wait for the complete reply.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError>;

    /// Can we reach the service with the configured credential?
    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        Ok(true)
    }
}
