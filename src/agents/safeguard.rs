//! Safety gate: submits candidate code to the judge role for a one-word
//! verdict before anything is executed.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::prompts::build_safeguard_prompt;

/// Binary verdict from the judge role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// The code may be executed.
    Safe,
    /// The code must not be executed.
    Danger,
}

impl SafetyVerdict {
    /// Parses a judge response.
    ///
    /// The verdict is Danger if and only if the response contains the literal
    /// `DANGER` anywhere; every other response, including empty or malformed
    /// ones, is Safe. This fail-open asymmetry is intentional contract, kept
    /// under test rather than silently tightened.
    pub fn from_response(response: &str) -> Self {
        if response.contains("DANGER") {
            SafetyVerdict::Danger
        } else {
            SafetyVerdict::Safe
        }
    }

    /// True for the Safe verdict.
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }
}

/// Judge-role gate vetting writer code before injection and execution.
pub struct SafetyGate {
    llm: Arc<dyn LlmProvider>,
    model: String,
    enabled: bool,
}

impl SafetyGate {
    /// Creates a gate backed by the given provider.
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>, enabled: bool) -> Self {
        Self {
            llm,
            model: model.into(),
            enabled,
        }
    }

    /// Whether the gate consults the judge at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Reviews a candidate snippet.
    ///
    /// A disabled gate short-circuits to Safe without any LLM call. The
    /// system prompt must embed the original template script (built by
    /// [`crate::prompts::build_safeguard_system_prompt`]).
    pub async fn review(
        &self,
        system_prompt: &str,
        code: &str,
    ) -> Result<SafetyVerdict, LlmError> {
        if !self.enabled {
            debug!("Safety gate disabled, skipping review");
            return Ok(SafetyVerdict::Safe);
        }

        let request = GenerationRequest::new(
            &self.model,
            vec![
                Message::system(system_prompt),
                Message::user(build_safeguard_prompt(code)),
            ],
        )
        .with_temperature(0.0)
        .with_max_tokens(10);

        let response = self.llm.generate(request).await?;
        let text = response.first_content().unwrap_or("");
        let verdict = SafetyVerdict::from_response(text);

        if verdict == SafetyVerdict::Danger {
            info!("Safety gate rejected candidate code");
        }

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        reply: String,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResponse {
                id: "fixed".to_string(),
                model: "mock".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(&self.reply),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage {
                    prompt_tokens: 1,
                    completion_tokens: 1,
                    total_tokens: 2,
                },
            })
        }
    }

    #[test]
    fn test_verdict_danger_substring_anywhere() {
        assert_eq!(
            SafetyVerdict::from_response("DANGER"),
            SafetyVerdict::Danger
        );
        assert_eq!(
            SafetyVerdict::from_response("I think this is DANGER because..."),
            SafetyVerdict::Danger
        );
    }

    #[test]
    fn test_verdict_fail_open_on_anything_else() {
        assert_eq!(SafetyVerdict::from_response("SAFE"), SafetyVerdict::Safe);
        assert_eq!(SafetyVerdict::from_response(""), SafetyVerdict::Safe);
        assert_eq!(
            SafetyVerdict::from_response("I'm not sure about this one"),
            SafetyVerdict::Safe
        );
        // Lowercase does not trip the literal match
        assert_eq!(SafetyVerdict::from_response("danger"), SafetyVerdict::Safe);
    }

    #[tokio::test]
    async fn test_disabled_gate_never_consults_judge() {
        let provider = Arc::new(FixedProvider::new("DANGER"));
        let gate = SafetyGate::new(provider.clone(), "mock", false);

        let verdict = gate.review("sys", "rm -rf /").await.unwrap();
        assert!(verdict.is_safe());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enabled_gate_parses_judge_reply() {
        let provider = Arc::new(FixedProvider::new("DANGER"));
        let gate = SafetyGate::new(provider.clone(), "mock", true);

        let verdict = gate.review("sys", "import os").await.unwrap();
        assert_eq!(verdict, SafetyVerdict::Danger);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let provider = Arc::new(FixedProvider::new("SAFE"));
        let gate = SafetyGate::new(provider, "mock", true);
        assert!(gate.review("sys", "x = 1").await.unwrap().is_safe());
    }
}
