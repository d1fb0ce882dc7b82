//! End-to-end orchestration scenarios through the public API.
//!
//! The LLM and the script runner are mocked; the template, injector, prompt
//! construction, safety gate, and retry accounting are all real.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use optichat::agents::{ChatOrchestrator, OrchestratorConfig};
use optichat::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use optichat::sandbox::{ExecutionFailure, ExecutionOutcome, ScriptRunner};
use optichat::solver::{SolverKind, SolverReport};
use optichat::template::TemplateScript;
use optichat::LlmError;

const TEMPLATE: &str = "\
supply = [100, 150, 200]

# DATA CODE GOES HERE

model.optimize()
m = model

# CONSTRAINT CODE GOES HERE

m.update()
model.optimize()
";

/// Scripted LLM provider shared by the writer and the safeguard.
struct ScriptedLlm {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let content = self
            .responses
            .lock()
            .unwrap()
            .get(idx)
            .cloned()
            .unwrap_or_default();

        Ok(GenerationResponse {
            id: format!("scripted-{}", idx),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }
}

/// Runner that interprets a scripted solver report per execution, through the
/// real interpretation path.
struct ReportRunner {
    reports: Mutex<Vec<Result<SolverReport, ExecutionFailure>>>,
    scripts: Mutex<Vec<String>>,
}

impl ReportRunner {
    fn new(reports: Vec<Result<SolverReport, ExecutionFailure>>) -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(reports),
            scripts: Mutex::new(Vec::new()),
        })
    }

    fn executions(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptRunner for ReportRunner {
    async fn execute(&self, script: &str) -> ExecutionOutcome {
        let mut scripts = self.scripts.lock().unwrap();
        let idx = scripts.len();
        scripts.push(script.to_string());

        match self.reports.lock().unwrap().get(idx) {
            Some(Ok(report)) => ExecutionOutcome::Value(SolverKind::Gurobi.interpret(report)),
            Some(Err(failure)) => ExecutionOutcome::Failure(failure.clone()),
            None => panic!("runner executed more scripts than scripted"),
        }
    }
}

fn optimal(objective: f64) -> Result<SolverReport, ExecutionFailure> {
    Ok(SolverReport {
        status: 2,
        objective: Some(objective),
        iis: vec![],
    })
}

fn name_error() -> Result<SolverReport, ExecutionFailure> {
    Err(ExecutionFailure::new(
        "NameError",
        "name 'undefined_var' is not defined",
    ))
}

#[tokio::test]
async fn constraint_question_ends_with_540_narrated_against_baseline() {
    let llm = ScriptedLlm::new(vec![
        // writer proposes a capping constraint
        "Add this:\n```python\nm.addConstr(x[0, 0] <= 10)\n```",
        // safeguard verdict
        "SAFE",
        // writer narrates
        "With the cap, the optimal cost rises to 540 from the original 500.",
    ]);
    let runner = ReportRunner::new(vec![optimal(500.0), optimal(540.0)]);
    let template = TemplateScript::new(TEMPLATE).unwrap();

    let config = OrchestratorConfig::new(SolverKind::Gurobi).with_model("mock-model");
    let mut orchestrator = ChatOrchestrator::new(llm.clone(), runner.clone(), template, config).await;

    assert!(orchestrator.baseline_result().contains("500"));

    let answer = orchestrator
        .answer("What happens if shipments on lane (0,0) are capped at 10?")
        .await
        .unwrap();

    assert!(answer.contains("540"));
    assert!(answer.contains("500"));

    // baseline + one merged run, and the snippet landed at the constraint
    // marker with the writer's code
    assert_eq!(runner.executions(), 2);
    let merged = runner.scripts.lock().unwrap()[1].clone();
    assert!(merged.contains("m.addConstr(x[0, 0] <= 10)"));
    assert!(!merged.contains("# CONSTRAINT CODE GOES HERE"));
    assert!(merged.contains("# DATA CODE GOES HERE"));

    // The judge saw the template and the one-word-answer contract
    let judge_request = &llm.requests.lock().unwrap()[1];
    assert_eq!(judge_request.messages[0].role, "system");
    assert!(judge_request.messages[0].content.contains("supply = [100, 150, 200]"));
    assert!(judge_request.messages[1].content.contains("m.addConstr(x[0, 0] <= 10)"));
}

#[tokio::test]
async fn name_error_exhausts_budget_of_one_then_apologizes() {
    let llm = ScriptedLlm::new(vec![
        "```python\nprint(undefined_var)\n```",
        "SAFE",
        "```python\nprint(undefined_var)\n```",
        "SAFE",
    ]);
    let runner = ReportRunner::new(vec![optimal(500.0), name_error(), name_error()]);
    let template = TemplateScript::new(TEMPLATE).unwrap();

    let config = OrchestratorConfig::new(SolverKind::Gurobi).with_debug_times(1);
    let mut orchestrator = ChatOrchestrator::new(llm.clone(), runner.clone(), template, config).await;

    let answer = orchestrator.answer("Please reference something undefined").await.unwrap();
    assert_eq!(answer, "Sorry. I cannot answer your question.");

    // Two writer proposals, two judge calls, and no narration request
    assert_eq!(llm.calls.load(Ordering::SeqCst), 4);
    assert_eq!(runner.executions(), 3);

    // The debug prompt fed the NameError back to the writer
    let debug_request = &llm.requests.lock().unwrap()[2];
    let last = debug_request.messages.last().unwrap();
    assert!(last.content.contains("NameError"));
    assert!(last.content.contains("undefined_var"));
}

#[tokio::test]
async fn infeasible_result_reaches_narration_with_conflict_names() {
    let llm = ScriptedLlm::new(vec![
        "```python\nm.addConstr(x[0, 0] >= 1000)\n```",
        "SAFE",
        "The model became infeasible; Supply[0] and Demand[0] conflict.",
    ]);
    let infeasible = Ok(SolverReport {
        status: 3,
        objective: None,
        iis: vec!["Supply[0]".to_string(), "Demand[0]".to_string()],
    });
    let runner = ReportRunner::new(vec![optimal(500.0), infeasible]);
    let template = TemplateScript::new(TEMPLATE).unwrap();

    let config = OrchestratorConfig::new(SolverKind::Gurobi);
    let mut orchestrator = ChatOrchestrator::new(llm.clone(), runner, template, config).await;

    let answer = orchestrator
        .answer("Force 1000 units over lane (0,0)")
        .await
        .unwrap();
    assert!(answer.contains("infeasible"));

    // The narration request carried the conflicting constraint names
    let narration_request = &llm.requests.lock().unwrap()[2];
    let last = narration_request.messages.last().unwrap();
    assert!(last.content.contains("Supply[0]"));
    assert!(last.content.contains("Demand[0]"));
}

#[tokio::test]
async fn template_without_markers_is_a_fatal_configuration_error() {
    let err = TemplateScript::new("model.optimize()\n").unwrap_err();
    assert!(err.to_string().contains("DATA CODE GOES HERE"));
}
