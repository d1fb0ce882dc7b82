//! Sandboxed script execution.
//!
//! Runs a merged solver script in a Python subprocess with a wall-clock
//! deadline. The subprocess gives scope isolation (nothing leaks back into
//! this process), and `kill_on_drop` guarantees the child is reaped on every
//! exit path, including timeout. Script side effects on the host (prints,
//! file writes, network) are an accepted risk mitigated only by the safety
//! gate, not eliminated here; no memory or CPU quota is enforced.

use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

use crate::solver::{parse_report, SolverKind};

/// Result of running a script: an interpreted solver answer or a failure.
///
/// Never both. Every failure carries the exception class name (Python's, or a
/// synthesized one such as `TimeoutError`) and a message suitable for feeding
/// back to the code writer.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The script ran to completion and the solver state was interpreted.
    Value(String),
    /// The script raised, timed out, or its solver state was unreadable.
    Failure(ExecutionFailure),
}

impl ExecutionOutcome {
    /// Returns true for the `Value` case.
    pub fn is_value(&self) -> bool {
        matches!(self, ExecutionOutcome::Value(_))
    }
}

/// A failed execution, shaped like a Python exception.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionFailure {
    /// Exception class name, e.g. `NameError`, `SyntaxError`, `TimeoutError`.
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
}

impl ExecutionFailure {
    /// Creates a failure with an explicit kind and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The deadline was exceeded.
    pub fn timeout(deadline: Duration) -> Self {
        Self::new(
            "TimeoutError",
            format!(
                "Execution exceeded the {} second deadline, in case the \
                 generated code falls into an infinite loop.",
                deadline.as_secs()
            ),
        )
    }

    /// The script completed but its solver state could not be interpreted.
    pub fn interpretation(message: impl Into<String>) -> Self {
        Self::new("InterpretationError", message)
    }

    /// Classifies a non-zero-exit run from its stderr.
    ///
    /// Python prints the raised exception as the last `SomeError: message`
    /// line of the traceback; the last such line wins so chained tracebacks
    /// resolve to the exception that actually escaped.
    pub fn from_stderr(stderr: &str) -> Self {
        let pattern = regex::Regex::new(
            r"(?m)^([A-Za-z_][A-Za-z0-9_.]*(?:Error|Exception|Interrupt)):?[ \t]*(.*)$",
        )
        .expect("static traceback pattern compiles");

        match pattern.captures_iter(stderr).last() {
            Some(caps) => Self::new(&caps[1], caps[2].trim()),
            None => Self::new("ExecutionError", stderr.trim()),
        }
    }
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Trait for script runners.
///
/// The orchestrator holds `Arc<dyn ScriptRunner>` so tests can substitute a
/// scripted mock for the subprocess-backed executor.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Runs a script to completion and interprets its solver state.
    async fn execute(&self, script: &str) -> ExecutionOutcome;
}

/// Configuration for the sandboxed executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Python interpreter binary to invoke.
    pub python_bin: String,
    /// Wall-clock deadline for one execution.
    pub timeout: Duration,
}

impl ExecutorConfig {
    /// Creates a configuration with defaults (python3, 60 second deadline).
    pub fn new() -> Self {
        Self {
            python_bin: "python3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the interpreter binary.
    pub fn with_python_bin(mut self, bin: impl Into<String>) -> Self {
        self.python_bin = bin.into();
        self
    }

    /// Sets the execution deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Subprocess-backed executor for one solver kind.
pub struct SandboxedExecutor {
    config: ExecutorConfig,
    solver: SolverKind,
}

impl SandboxedExecutor {
    /// Creates a new executor.
    pub fn new(config: ExecutorConfig, solver: SolverKind) -> Self {
        Self { config, solver }
    }

    /// Creates an executor with default configuration.
    pub fn with_defaults(solver: SolverKind) -> Self {
        Self::new(ExecutorConfig::default(), solver)
    }

    /// The solver kind this executor probes for.
    pub fn solver(&self) -> SolverKind {
        self.solver
    }

    async fn run_script(&self, script: &str) -> ExecutionOutcome {
        // The probe epilogue serializes the solver state as the final line of
        // stdout; it recomputes the IIS on every run.
        let full_script = format!("{}\n{}", script, self.solver.probe_epilogue());

        let mut file = match tempfile::Builder::new()
            .prefix("optichat-")
            .suffix(".py")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                return ExecutionOutcome::Failure(ExecutionFailure::new(
                    "OSError",
                    format!("Failed to stage script: {}", e),
                ))
            }
        };

        if let Err(e) = file.write_all(full_script.as_bytes()) {
            return ExecutionOutcome::Failure(ExecutionFailure::new(
                "OSError",
                format!("Failed to write script: {}", e),
            ));
        }

        debug!(
            path = %file.path().display(),
            timeout_secs = self.config.timeout.as_secs(),
            "Executing merged script"
        );

        let child = tokio::process::Command::new(&self.config.python_bin)
            .arg(file.path())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.config.timeout, child).await {
            // Dropping the output future kills the child via kill_on_drop,
            // so nothing outlives the deadline.
            Err(_) => {
                warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "Script execution timed out"
                );
                return ExecutionOutcome::Failure(ExecutionFailure::timeout(self.config.timeout));
            }
            Ok(Err(e)) => {
                return ExecutionOutcome::Failure(ExecutionFailure::new(
                    "OSError",
                    format!("Failed to run {}: {}", self.config.python_bin, e),
                ))
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let failure = ExecutionFailure::from_stderr(&stderr);
            debug!(kind = %failure.kind, "Script raised");
            return ExecutionOutcome::Failure(failure);
        }

        match parse_report(&stdout) {
            Ok(report) => ExecutionOutcome::Value(self.solver.interpret(&report)),
            Err(e) => ExecutionOutcome::Failure(ExecutionFailure::interpretation(e.to_string())),
        }
    }
}

#[async_trait]
impl ScriptRunner for SandboxedExecutor {
    async fn execute(&self, script: &str) -> ExecutionOutcome {
        self.run_script(script).await
    }
}
