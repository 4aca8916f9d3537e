//! Configuration loading, validation, and management for TableChat.
//!
//! Loads configuration from `~/.tablechat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tablechat_core::generation::{GenerationConfig, SafetyPolicy};

/// Environment variables checked for the API key, highest priority first.
pub const API_KEY_VARS: [&str; 3] = ["TABLECHAT_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.tablechat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential for the generation service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Decoding parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Content-safety thresholds
    #[serde(default)]
    pub safety: SafetyPolicy,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub prompts: PromptConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// User-facing strings for the web and terminal shells
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("generation", &self.generation)
            .field("safety", &self.safety)
            .field("knowledge", &self.knowledge)
            .field("prompts", &self.prompts)
            .field("session", &self.session)
            .field("retry", &self.retry)
            .field("gateway", &self.gateway)
            .field("ui", &self.ui)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// CSV file with `User_query` and `Chatbot_response` columns
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("Prepare for chatbot.csv")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

/// Fixed texts that frame every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Prefix of the synthetic user turn that carries the knowledge table
    #[serde(default = "default_grounding_preamble")]
    pub grounding_preamble: String,

    /// The synthetic model turn acknowledging the table
    #[serde(default = "default_grounding_ack")]
    pub grounding_ack: String,
}

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
คุณคือผู้เชี่ยวชาญด้านคอมพิวเตอร์และสารสนเทศ หน้าที่ของคุณคือตอบคำถามโดยอ้างอิงจากฐานข้อมูลที่ให้มาเท่านั้น
กฎเหล็ก:
1. จับคู่ด้วยความหมาย (Semantic Match) เช่น \"จอคอม\" -> \"จอมอนิเตอร์\"
2. หากถามสั้นๆ ให้รวบรวมข้อมูลที่เกี่ยวข้องทั้งหมดมาตอบ
3. แก้ไขคำผิดอัตโนมัติ
4. ตอบด้วย \"ค่ะ/คะ\" เสมอ ห้ามใช้ Emoji ในเนื้อหาคำตอบ
5. หากไม่พบข้อมูลจริงๆ ให้ตอบว่า \"ขออภัยค่ะ ฉันไม่พบข้อมูลที่คุณต้องการในขณะนี้\"
";

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.into()
}
fn default_grounding_preamble() -> String {
    "อ้างอิงข้อมูลจากตารางนี้:\n".into()
}
fn default_grounding_ack() -> String {
    "รับทราบค่ะ ฉันจะวิเคราะห์และตอบคำถามจากข้อมูลชุดนี้เท่านั้นค่ะ".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_instruction: default_system_instruction(),
            grounding_preamble: default_grounding_preamble(),
            grounding_ack: default_grounding_ack(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How many recent turns are sent with each request
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Storage cap per session; `0` keeps everything
    #[serde(default = "default_max_stored_turns")]
    pub max_stored_turns: usize,

    /// Maximum live sessions in the gateway before the oldest is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// First greeting of a new session
    #[serde(default = "default_welcome_greeting")]
    pub welcome_greeting: String,

    /// Greeting installed by "clear history"
    #[serde(default = "default_reset_greeting")]
    pub reset_greeting: String,
}

fn default_history_window() -> usize {
    5
}
fn default_max_stored_turns() -> usize {
    200
}
fn default_max_sessions() -> usize {
    1_000
}
fn default_welcome_greeting() -> String {
    "สวัสดีค่ะ ฉันคือผู้ช่วยอัจฉริยะ ยินดีให้คำปรึกษาเรื่องคอมพิวเตอร์ค่ะ".into()
}
fn default_reset_greeting() -> String {
    "สวัสดีค่ะ มีอะไรให้ช่วยสอบถามเพิ่มเติมไหมคะ".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            max_stored_turns: default_max_stored_turns(),
            max_sessions: default_max_sessions(),
            welcome_greeting: default_welcome_greeting(),
            reset_greeting: default_reset_greeting(),
        }
    }
}

impl SessionConfig {
    /// The storage cap as the session store expects it.
    pub fn stored_turns_cap(&self) -> Option<usize> {
        (self.max_stored_turns > 0).then_some(self.max_stored_turns)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Per-attempt timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_heading")]
    pub heading: String,

    #[serde(default = "default_hint")]
    pub hint: String,

    #[serde(default = "default_input_placeholder")]
    pub input_placeholder: String,

    #[serde(default = "default_busy_text")]
    pub busy_text: String,

    #[serde(default = "default_clear_label")]
    pub clear_label: String,

    /// Shown before the message of a failed request
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,

    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_title() -> String {
    "Computer Expert AI".into()
}
fn default_heading() -> String {
    "ผู้ช่วยอัจฉริยะด้านคอมพิวเตอร์".into()
}
fn default_hint() -> String {
    "คุณสามารถสอบถามเรื่อง Windows, สเปกคอมพิวเตอร์ หรืออุปกรณ์ต่างๆ ได้ทันที".into()
}
fn default_input_placeholder() -> String {
    "พิมพ์คำถามของคุณที่นี่...".into()
}
fn default_busy_text() -> String {
    "กำลังค้นหาข้อมูล...".into()
}
fn default_clear_label() -> String {
    "ล้างประวัติการสนทนา".into()
}
fn default_error_prefix() -> String {
    "เกิดข้อผิดพลาดในการเชื่อมต่อ".into()
}
fn default_footer() -> String {
    "Version 1.0 | Powered by Gemini AI".into()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            heading: default_heading(),
            hint: default_hint(),
            input_placeholder: default_input_placeholder(),
            busy_text: default_busy_text(),
            clear_label: default_clear_label(),
            error_prefix: default_error_prefix(),
            footer: default_footer(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tablechat/config.toml).
    ///
    /// Environment variables override the file:
    /// - `TABLECHAT_API_KEY`, `GOOGLE_API_KEY`, `GEMINI_API_KEY` (in that order)
    /// - `TABLECHAT_MODEL`
    /// - `TABLECHAT_KNOWLEDGE`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Like [`load`](Self::load), but reading `path` instead of the default file.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // An explicit TABLECHAT_API_KEY beats the file; the vendor variables
        // only fill a gap.
        if let Some(key) = non_empty(API_KEY_VARS[0]) {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = API_KEY_VARS[1..].iter().find_map(|var| non_empty(var));
        }

        if let Some(model) = non_empty("TABLECHAT_MODEL") {
            self.model = model;
        }

        if let Some(path) = non_empty("TABLECHAT_KNOWLEDGE") {
            self.knowledge.path = PathBuf::from(path);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tablechat")
    }

    /// The default config file, `~/.tablechat/config.toml`.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&generation.top_p) {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be between 0.0 and 1.0".into(),
            ));
        }
        if generation.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "generation.top_k must be at least 1".into(),
            ));
        }
        if generation.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_output_tokens must be at least 1".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if let Some(cap) = self.session.stored_turns_cap() {
            if cap < self.session.history_window {
                return Err(ConfigError::ValidationError(format!(
                    "session.max_stored_turns ({cap}) must not be smaller than session.history_window ({})",
                    self.session.history_window
                )));
            }
        }
        if self.session.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_sessions must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The API key, or a configuration error naming where to put one.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential {
                variables: API_KEY_VARS.join(", "),
            })
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: default_api_url(),
            generation: GenerationConfig::default(),
            safety: SafetyPolicy::default(),
            knowledge: KnowledgeConfig::default(),
            prompts: PromptConfig::default(),
            session: SessionConfig::default(),
            retry: RetryConfig::default(),
            gateway: GatewayConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key configured: set one of {variables} or `api_key` in config.toml")]
    MissingCredential { variables: String },
}
