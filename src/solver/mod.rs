//! Solver-state interpretation.
//!
//! After a merged script runs, the sandbox parses the solver state the probe
//! epilogue emitted (see [`SolverKind::probe_epilogue`]) and maps the model's
//! terminal status to a human-readable string. Each supported solver kind
//! carries its own capabilities: the injection heuristic signature, the probe
//! script, and the status interpretation. Adding a solver kind extends this
//! enum without touching the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{SolverError, TemplateError};

/// Sentinel prefix the probe epilogue prints before its JSON state line.
pub const STATE_SENTINEL: &str = "<<<OPTICHAT_SOLVER_STATE>>>";

/// Supported solver families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Gurobi via the `gurobipy` Python bindings.
    Gurobi,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Gurobi => write!(f, "gurobi"),
        }
    }
}

impl FromStr for SolverKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gurobi" => Ok(SolverKind::Gurobi),
            other => Err(TemplateError::UnsupportedSolver(other.to_string())),
        }
    }
}

impl SolverKind {
    /// Call signature whose presence in a snippet marks it as constraint code.
    ///
    /// This is a substring match, not a parse. It is a narrow, solver-coupled
    /// rule inherited from the template contract: snippets that add
    /// constraints land at the CONSTRAINT marker, everything else at the DATA
    /// marker.
    pub fn constraint_call_signature(&self) -> &'static str {
        match self {
            SolverKind::Gurobi => "addConstr",
        }
    }

    /// Python epilogue appended to every executed script.
    ///
    /// Reads the model bound to the well-known variable `m`, recomputes the
    /// IIS when the model is infeasible (never cached between runs), and
    /// prints the state as one sentinel-tagged JSON line. If `m` is missing
    /// or not a model, the raised exception surfaces as an execution failure
    /// like any other error in the script.
    pub fn probe_epilogue(&self) -> String {
        match self {
            SolverKind::Gurobi => format!(
                r#"
import json as _optichat_json
_optichat_state = {{"status": int(m.Status), "objective": None, "iis": []}}
if m.Status == 2:
    _optichat_state["objective"] = float(m.ObjVal)
elif m.Status == 3:
    m.computeIIS()
    _optichat_state["iis"] = [c.ConstrName for c in m.getConstrs() if c.IISConstr]
print("{sentinel}" + _optichat_json.dumps(_optichat_state))
"#,
                sentinel = STATE_SENTINEL
            ),
        }
    }

    /// Maps a solver report to the human-readable result string.
    pub fn interpret(&self, report: &SolverReport) -> String {
        match self {
            SolverKind::Gurobi => match report.status() {
                ModelStatus::Optimal => format!(
                    "Optimization problem solved. The objective value is: {}",
                    report.objective.unwrap_or(f64::NAN)
                ),
                ModelStatus::Unbounded => "unbounded".to_string(),
                ModelStatus::InfOrUnbounded => "inf_or_unbound".to_string(),
                ModelStatus::Infeasible => {
                    let names: Vec<String> =
                        report.iis.iter().map(|n| format!("'{}'", n)).collect();
                    format!(
                        "infeasible\nConflicting Constraints:\n[{}]",
                        names.join(", ")
                    )
                }
                ModelStatus::Other(code) => format!("Model Status:{}", code),
            },
        }
    }
}

/// Terminal status of an optimization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Optimal,
    Infeasible,
    InfOrUnbounded,
    Unbounded,
    Other(i32),
}

impl ModelStatus {
    /// Maps a Gurobi status code to a status variant.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => ModelStatus::Optimal,
            3 => ModelStatus::Infeasible,
            4 => ModelStatus::InfOrUnbounded,
            5 => ModelStatus::Unbounded,
            other => ModelStatus::Other(other),
        }
    }
}

/// Solver state captured by the probe epilogue after a script run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverReport {
    /// Raw solver status code.
    pub status: i32,
    /// Objective value, present only when the model solved to optimality.
    pub objective: Option<f64>,
    /// Names of constraints in the irreducible inconsistent subsystem,
    /// present only when the model is infeasible.
    #[serde(default)]
    pub iis: Vec<String>,
}

impl SolverReport {
    /// The typed terminal status for this report.
    pub fn status(&self) -> ModelStatus {
        ModelStatus::from_code(self.status)
    }
}

/// Extracts the probe's solver report from captured stdout.
///
/// Scans for the last sentinel-tagged line so that user print statements
/// earlier in the script cannot shadow the probe output.
pub fn parse_report(stdout: &str) -> Result<SolverReport, SolverError> {
    let state_line = stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix(STATE_SENTINEL))
        .ok_or(SolverError::StateNotFound)?;

    serde_json::from_str(state_line).map_err(|e| SolverError::StateParseError(e.to_string()))
}
