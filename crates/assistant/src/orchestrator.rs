//! One question in, one answer out.
//!
//! 1. **Validate** the prompt (blank prompts never touch history)
//! 2. **Record** the user turn in the session
//! 3. **Assemble** grounding turns + the recent window
//! 4. **Send** to the generator
//! 5. **Record** the model turn on success; leave history alone on failure

use std::sync::Arc;

use tablechat_config::AppConfig;
use tablechat_core::error::GenerationError;
use tablechat_core::generation::{
    GenerationConfig, GenerationRequest, GenerationResponse, Generator, SafetyPolicy,
};
use tablechat_core::message::Turn;
use tablechat_knowledge::KnowledgeBlob;
use tablechat_session::SessionHistory;
use tracing::{debug, info, warn};

use crate::context::ContextAssembler;

/// Lifecycle of a single request. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Answers questions against a fixed knowledge table.
///
/// Holds no per-session state: the caller passes the session in, so one
/// assistant can serve any number of sessions.
pub struct Assistant {
    generator: Arc<dyn Generator>,
    knowledge: Arc<KnowledgeBlob>,
    assembler: ContextAssembler,
    model: String,
    system_instruction: String,
    config: GenerationConfig,
    safety: SafetyPolicy,
    history_window: usize,
}

impl Assistant {
    /// Create an assistant with default prompts and decoding parameters.
    pub fn new(generator: Arc<dyn Generator>, knowledge: Arc<KnowledgeBlob>) -> Self {
        Self::from_config(&AppConfig::default(), generator, knowledge)
    }

    pub fn from_config(
        config: &AppConfig,
        generator: Arc<dyn Generator>,
        knowledge: Arc<KnowledgeBlob>,
    ) -> Self {
        Self {
            generator,
            knowledge,
            assembler: ContextAssembler::from_config(&config.prompts),
            model: config.model.clone(),
            system_instruction: config.prompts.system_instruction.clone(),
            config: config.generation.clone(),
            safety: config.safety.clone(),
            history_window: config.session.history_window,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Number of recent turns sent with each request.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBlob {
        &self.knowledge
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Answer `prompt` within `history`.
    pub async fn respond(
        &self,
        history: &mut SessionHistory,
        prompt: &str,
    ) -> Result<GenerationResponse, AssistantError> {
        self.respond_observed(history, prompt, |_| {}).await
    }

    /// Like [`respond`](Self::respond), reporting each state change to
    /// `observe`. Terminal shells use this to show a busy indicator.
    pub async fn respond_observed<F>(
        &self,
        history: &mut SessionHistory,
        prompt: &str,
        mut observe: F,
    ) -> Result<GenerationResponse, AssistantError>
    where
        F: FnMut(RequestState) + Send,
    {
        let mut state = RequestState::Idle;
        observe(state);

        if prompt.trim().is_empty() {
            return Err(AssistantError::EmptyPrompt);
        }

        history.append(Turn::user(prompt));

        let context = self
            .assembler
            .build(&self.knowledge, history.recent(self.history_window), prompt);

        debug!(
            session = %history.id(),
            context_turns = context.turns.len(),
            estimated_tokens = context.estimated_tokens,
            "Context assembled"
        );

        let request = GenerationRequest {
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            context: context.turns,
            prompt: context.prompt,
            config: self.config.clone(),
            safety: self.safety.clone(),
        };

        state = transition(state, RequestState::Sending);
        observe(state);

        match self.generator.generate(request).await {
            Ok(response) => {
                state = transition(state, RequestState::Succeeded);
                observe(state);
                history.append(Turn::model(response.text.clone()));
                info!(
                    session = %history.id(),
                    generator = %self.generator.name(),
                    model = %response.model,
                    reply_chars = response.text.chars().count(),
                    "Reply generated"
                );
                Ok(response)
            }
            Err(e) => {
                state = transition(state, RequestState::Failed);
                observe(state);
                warn!(
                    session = %history.id(),
                    generator = %self.generator.name(),
                    error = %e,
                    "Generation failed"
                );
                Err(e.into())
            }
        }
    }
}

fn transition(from: RequestState, to: RequestState) -> RequestState {
    debug_assert!(
        matches!(
            (from, to),
            (RequestState::Idle, RequestState::Sending)
                | (RequestState::Sending, RequestState::Succeeded)
                | (RequestState::Sending, RequestState::Failed)
        ),
        "invalid request transition {from:?} -> {to:?}"
    );
    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingGenerator, RecordingGenerator, kb};
    use tablechat_core::message::Role;
    use tablechat_session::Greetings;

    fn session() -> SessionHistory {
        SessionHistory::new(Greetings {
            welcome: "welcome".into(),
            reset: "hello again".into(),
        })
    }

    #[tokio::test]
    async fn success_appends_user_and_model_turns() {
        let generator = Arc::new(RecordingGenerator::new("500 บาทค่ะ"));
        let assistant = Assistant::new(generator.clone(), kb(&[("monitor price?", "500 THB")]));
        let mut history = session();

        let reply = assistant.respond(&mut history, "จอคอมราคาเท่าไหร่").await.unwrap();
        assert_eq!(reply.text, "500 บาทค่ะ");

        let roles: Vec<Role> = history.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(history.turns()[1].content, "จอคอมราคาเท่าไหร่");
        assert_eq!(history.turns()[2].content, "500 บาทค่ะ");
    }

    #[tokio::test]
    async fn request_carries_grounding_window_and_prompt() {
        let generator = Arc::new(RecordingGenerator::new("ok"));
        let assistant = Assistant::new(generator.clone(), kb(&[("monitor price?", "500 THB")]))
            .with_model("test-model")
            .with_system_instruction("only from the table");
        let mut history = session();

        assistant.respond(&mut history, "จอคอมราคาเท่าไหร่").await.unwrap();

        let request = generator.last_request().unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.system_instruction, "only from the table");
        assert_eq!(request.prompt, "จอคอมราคาเท่าไหร่");
        assert!(request.context[0].joined().contains("monitor price?"));
        assert!(request.context[0].joined().contains("500 THB"));
        // grounding, ack, welcome, user prompt
        assert_eq!(request.context.len(), 4);
        assert_eq!(request.context[2].joined(), "welcome");
        assert_eq!(request.context[3].role, Role::User);
    }

    #[tokio::test]
    async fn window_limits_history_sent() {
        let generator = Arc::new(RecordingGenerator::new("ok"));
        let assistant = Assistant::new(generator.clone(), kb(&[])).with_history_window(5);
        let mut history = session();

        for i in 0..4 {
            assistant.respond(&mut history, &format!("q{i}")).await.unwrap();
        }

        let request = generator.last_request().unwrap();
        assert_eq!(request.context.len(), 2 + 5);
        let window: Vec<String> = request.context[2..].iter().map(|t| t.joined()).collect();
        // At send time: welcome, q0, ok, q1, ok, q2, ok, q3
        assert_eq!(window, vec!["q1", "ok", "q2", "ok", "q3"]);
    }

    #[tokio::test]
    async fn failure_keeps_user_turn_and_adds_no_model_turn() {
        let assistant = Assistant::new(
            Arc::new(FailingGenerator::upstream(503, "service unavailable")),
            kb(&[("q", "a")]),
        );
        let mut history = session();
        history.append(Turn::user("earlier"));
        history.append(Turn::model("earlier answer"));

        let err = assistant.respond(&mut history, "hello").await.unwrap_err();
        assert!(matches!(
            err,
            AssistantError::Generation(GenerationError::Upstream { status_code: 503, .. })
        ));

        assert_eq!(history.len(), 4);
        let last = history.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "hello");
        assert_eq!(history.turns()[2].content, "earlier answer");
    }

    #[tokio::test]
    async fn session_stays_usable_after_failure() {
        let failing = Assistant::new(Arc::new(FailingGenerator::network()), kb(&[]));
        let working = Assistant::new(Arc::new(RecordingGenerator::new("back")), kb(&[]));
        let mut history = session();

        assert!(failing.respond(&mut history, "first").await.is_err());
        let reply = working.respond(&mut history, "second").await.unwrap();
        assert_eq!(reply.text, "back");
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_touching_history() {
        let generator = Arc::new(RecordingGenerator::new("never"));
        let assistant = Assistant::new(generator.clone(), kb(&[]));
        let mut history = session();

        let err = assistant.respond(&mut history, "   \n").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyPrompt));
        assert_eq!(history.len(), 1);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn prompt_is_stored_and_sent_as_typed() {
        let generator = Arc::new(RecordingGenerator::new("ok"));
        let assistant = Assistant::new(generator.clone(), kb(&[("q", "a")]));
        let mut history = session();

        assistant
            .respond(&mut history, "  จอคอมราคาเท่าไหร่\n")
            .await
            .unwrap();

        assert_eq!(history.turns()[1].content, "  จอคอมราคาเท่าไหร่\n");
        assert_eq!(
            generator.last_request().unwrap().prompt,
            "  จอคอมราคาเท่าไหร่\n"
        );
    }

    #[tokio::test]
    async fn observer_sees_state_machine() {
        let mut seen = Vec::new();
        let assistant = Assistant::new(Arc::new(RecordingGenerator::new("ok")), kb(&[]));
        let mut history = session();
        assistant
            .respond_observed(&mut history, "hi", |s| seen.push(s))
            .await
            .unwrap();
        assert_eq!(
            seen,
            vec![RequestState::Idle, RequestState::Sending, RequestState::Succeeded]
        );

        let mut seen = Vec::new();
        let assistant = Assistant::new(Arc::new(FailingGenerator::network()), kb(&[]));
        let _ = assistant
            .respond_observed(&mut history, "hi", |s| seen.push(s))
            .await;
        assert_eq!(
            seen,
            vec![RequestState::Idle, RequestState::Sending, RequestState::Failed]
        );
        assert!(seen.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn reset_then_hello_gives_greeting_and_hello() {
        let mut history = session();
        history.reset();
        history.append(Turn::user("hello"));

        let recent: Vec<(Role, &str)> = history
            .recent(5)
            .iter()
            .map(|t| (t.role, t.content.as_str()))
            .collect();
        assert_eq!(recent, vec![(Role::Model, "hello again"), (Role::User, "hello")]);
    }
}
