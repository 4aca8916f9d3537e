//! Gateway state backed by scripted generators.

use std::sync::Arc;

use async_trait::async_trait;
use tablechat_config::AppConfig;
use tablechat_core::error::GenerationError;
use tablechat_core::generation::{GenerationRequest, GenerationResponse, Generator};
use tablechat_knowledge::{KnowledgeBlob, KnowledgeRow};

use crate::{GatewayState, SharedState};

/// Lightweight mock generator for gateway tests.
struct MockGenerator {
    reply: Result<String, GenerationError>,
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "gateway_mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let text = self.reply.clone()?;
        Ok(GenerationResponse {
            text,
            model: request.model,
            finish_reason: Some("STOP".into()),
            usage: None,
        })
    }
}

fn state_with(reply: Result<String, GenerationError>) -> SharedState {
    let mut config = AppConfig::default();
    config.model = "test-model".into();
    config.session.welcome_greeting = "welcome".into();
    config.session.reset_greeting = "hello again".into();

    let knowledge = Arc::new(KnowledgeBlob::from_rows(
        "test.csv",
        vec![KnowledgeRow {
            user_query: "monitor price?".into(),
            chatbot_response: "500 THB".into(),
        }],
    ));

    Arc::new(GatewayState::new(
        &config,
        Arc::new(MockGenerator { reply }),
        knowledge,
    ))
}

/// State whose generator always answers `reply`.
pub fn test_state(reply: &str) -> SharedState {
    state_with(Ok(reply.to_string()))
}

/// State whose generator always fails with a 503.
pub fn failing_state() -> SharedState {
    state_with(Err(GenerationError::Upstream {
        status_code: 503,
        message: "service unavailable".into(),
    }))
}
