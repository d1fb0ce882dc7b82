//! Conversation orchestrator: the per-question state machine.
//!
//! For each inbound user message the orchestrator rebuilds the writer and
//! safeguard system prompts (embedding the template script, documentation,
//! example Q&A, the cached baseline result, and the prior discussion), then
//! drives a bounded dialogue: the writer proposes a snippet, the safety gate
//! vets it, the injector merges it into the template, the sandbox executes
//! the merged script, and the outcome either becomes a narrated answer or is
//! fed back to the writer as a debug prompt until the attempt budget runs
//! out.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::prompts::{
    build_debug_prompt, build_interpreter_prompt, build_safeguard_system_prompt,
    build_writer_system_prompt, CODE_PROMPT, EXHAUSTED_MESSAGE, SAFETY_REJECTION_MESSAGE,
};
use crate::sandbox::{ExecutionFailure, ExecutionOutcome, ScriptRunner};
use crate::solver::SolverKind;
use crate::template::TemplateScript;
use crate::utils::extract_code_block;

use super::error::AgentResult;
use super::safeguard::{SafetyGate, SafetyVerdict};
use super::types::Transcript;

/// Configuration for the conversation orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Solver family the template targets.
    pub solver: SolverKind,
    /// Model identifier for both roles (empty selects the client default).
    pub model: String,
    /// Documentation text describing the template script.
    pub doc_str: String,
    /// Example question/answer/code text for the writer prompt.
    pub example_qa: String,
    /// Debug attempts granted per user message.
    pub debug_times: u32,
    /// Whether candidate code is submitted to the safeguard judge.
    pub use_safeguard: bool,
    /// Sampling temperature for writer requests.
    pub temperature: f64,
    /// Token cap for writer requests.
    pub max_tokens: u32,
}

impl OrchestratorConfig {
    /// Creates a configuration with defaults matching the reference behavior:
    /// three debug attempts, safeguard enabled.
    pub fn new(solver: SolverKind) -> Self {
        Self {
            solver,
            model: String::new(),
            doc_str: String::new(),
            example_qa: String::new(),
            debug_times: 3,
            use_safeguard: true,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the template documentation text.
    pub fn with_doc_str(mut self, doc_str: impl Into<String>) -> Self {
        self.doc_str = doc_str.into();
        self
    }

    /// Sets the example Q&A text.
    pub fn with_example_qa(mut self, example_qa: impl Into<String>) -> Self {
        self.example_qa = example_qa.into();
        self
    }

    /// Sets the per-message debug budget.
    pub fn with_debug_times(mut self, debug_times: u32) -> Self {
        self.debug_times = debug_times;
        self
    }

    /// Enables or disables the safeguard judge.
    pub fn with_safeguard(mut self, use_safeguard: bool) -> Self {
        self.use_safeguard = use_safeguard;
        self
    }
}

/// Outcome of one writer proposal, before retry accounting.
enum AttemptOutcome {
    /// Execution produced an interpreted solver answer.
    Success(String),
    /// The attempt failed somewhere between extraction and interpretation.
    Failure(ExecutionFailure),
}

/// Drives the writer/safeguard dialogue for one user at a time.
///
/// Owns the per-session state (debug counter, success flag, cached baseline
/// result) exclusively; the template script is shared read-only.
pub struct ChatOrchestrator {
    llm: Arc<dyn LlmProvider>,
    runner: Arc<dyn ScriptRunner>,
    template: TemplateScript,
    gate: SafetyGate,
    config: OrchestratorConfig,
    session_id: Uuid,
    baseline_result: String,
    user_transcript: Transcript,
}

impl ChatOrchestrator {
    /// Creates an orchestrator and caches the baseline result by executing
    /// the unmodified template once.
    ///
    /// The baseline is stored whether it is a value or a failure; it anchors
    /// the comparison in every final answer for the session's lifetime.
    pub async fn new(
        llm: Arc<dyn LlmProvider>,
        runner: Arc<dyn ScriptRunner>,
        template: TemplateScript,
        config: OrchestratorConfig,
    ) -> Self {
        let baseline_result = match runner.execute(template.text()).await {
            ExecutionOutcome::Value(value) => value,
            ExecutionOutcome::Failure(failure) => failure.to_string(),
        };

        let session_id = Uuid::new_v4();
        info!(%session_id, baseline = %baseline_result, "Session created");

        let gate = SafetyGate::new(Arc::clone(&llm), config.model.clone(), config.use_safeguard);

        Self {
            llm,
            runner,
            template,
            gate,
            config,
            session_id,
            baseline_result,
            user_transcript: Transcript::new(),
        }
    }

    /// The cached result of running the unmodified template.
    pub fn baseline_result(&self) -> &str {
        &self.baseline_result
    }

    /// Session identifier.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The user-facing conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.user_transcript
    }

    /// Answers one user message.
    ///
    /// Returns the writer's narrated answer on success, the fixed apology
    /// when the debug budget is exhausted. Only configuration-class and
    /// writer-transport errors surface as `Err`.
    pub async fn answer(&mut self, user_message: &str) -> AgentResult<String> {
        self.user_transcript.push_user(user_message);
        let chat_history = self.user_transcript.render();

        // Role prompts are rebuilt per user message so both roles see the
        // full prior discussion, including the current question.
        let writer_system = build_writer_system_prompt(
            &self.config.solver.to_string(),
            self.template.text(),
            &self.config.doc_str,
            &self.config.example_qa,
            &self.baseline_result,
            &chat_history,
        );
        let safeguard_system = build_safeguard_system_prompt(self.template.text(), &chat_history);

        let mut writer_messages = vec![Message::system(writer_system), Message::user(CODE_PROMPT)];
        let mut attempts_left = self.config.debug_times;
        let mut succeeded = false;
        let mut narration = String::new();

        loop {
            let proposal = self.ask_writer(&writer_messages).await?;
            writer_messages.push(Message::assistant(&proposal));

            match self.run_attempt(&proposal, &safeguard_system).await? {
                AttemptOutcome::Success(value) => {
                    debug!(session_id = %self.session_id, value = %value, "Execution succeeded");

                    writer_messages.push(Message::user(build_interpreter_prompt(&value)));
                    let reply = self.ask_writer(&writer_messages).await?;
                    narration = if reply.trim().is_empty() { value } else { reply };
                    succeeded = true;
                    break;
                }
                AttemptOutcome::Failure(failure) => {
                    if attempts_left == 0 {
                        warn!(
                            session_id = %self.session_id,
                            kind = %failure.kind,
                            "Debug budget exhausted"
                        );
                        break;
                    }
                    attempts_left -= 1;

                    debug!(
                        session_id = %self.session_id,
                        kind = %failure.kind,
                        attempts_left,
                        "Attempt failed, feeding error back to writer"
                    );
                    writer_messages.push(Message::user(build_debug_prompt(
                        &failure.kind,
                        &failure.message,
                    )));
                }
            }
        }

        let reply = if succeeded {
            narration
        } else {
            EXHAUSTED_MESSAGE.to_string()
        };

        self.user_transcript.push_assistant(&reply);
        Ok(reply)
    }

    /// One writer proposal: extract, vet, inject, execute.
    async fn run_attempt(
        &self,
        writer_response: &str,
        safeguard_system: &str,
    ) -> AgentResult<AttemptOutcome> {
        let code = match extract_code_block(writer_response) {
            Some(code) => code,
            None => {
                return Ok(AttemptOutcome::Failure(ExecutionFailure::new(
                    "NoCodeFoundError",
                    "The reply contains no fenced code block. Write the code \
                     snippet in a ```python ...``` block.",
                )))
            }
        };

        match self.gate.review(safeguard_system, &code).await {
            Ok(SafetyVerdict::Safe) => {}
            Ok(SafetyVerdict::Danger) => {
                return Ok(AttemptOutcome::Failure(ExecutionFailure::new(
                    "SafetyRejection",
                    SAFETY_REJECTION_MESSAGE,
                )))
            }
            // Judge transport failures are absorbed into the retry loop; the
            // writer transport is the one dependency we cannot retry without.
            Err(e) => {
                return Ok(AttemptOutcome::Failure(ExecutionFailure::new(
                    "LlmError",
                    e.to_string(),
                )))
            }
        }

        let merged = self.template.inject(&code, self.config.solver)?;

        Ok(match self.runner.execute(&merged).await {
            ExecutionOutcome::Value(value) => AttemptOutcome::Success(value),
            ExecutionOutcome::Failure(failure) => AttemptOutcome::Failure(failure),
        })
    }

    /// Sends the current writer conversation and returns the reply text.
    async fn ask_writer(&self, messages: &[Message]) -> AgentResult<String> {
        let request = GenerationRequest::new(&self.config.model, messages.to_vec())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = self.llm.generate(request).await?;
        Ok(response.first_content().unwrap_or("").to_string())
    }
}
