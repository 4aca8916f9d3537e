//! Scripted generators shared by the assistant tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tablechat_core::error::GenerationError;
use tablechat_core::generation::{GenerationRequest, GenerationResponse, Generator, Usage};
use tablechat_knowledge::{KnowledgeBlob, KnowledgeRow};

/// Always answers with the same text and remembers every request.
pub struct RecordingGenerator {
    reply: String,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        Ok(GenerationResponse {
            text: self.reply.clone(),
            model,
            finish_reason: Some("STOP".into()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// Always fails with the given error.
pub struct FailingGenerator {
    error: GenerationError,
}

impl FailingGenerator {
    pub fn upstream(status_code: u16, message: &str) -> Self {
        Self {
            error: GenerationError::Upstream {
                status_code,
                message: message.into(),
            },
        }
    }

    pub fn network() -> Self {
        Self {
            error: GenerationError::Network("connection refused".into()),
        }
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        Err(self.error.clone())
    }
}

/// An in-memory knowledge table.
pub fn kb(rows: &[(&str, &str)]) -> Arc<KnowledgeBlob> {
    Arc::new(KnowledgeBlob::from_rows(
        "test.csv",
        rows.iter()
            .map(|(q, a)| KnowledgeRow {
                user_query: q.to_string(),
                chatbot_response: a.to_string(),
            })
            .collect(),
    ))
}
