//! Template script store and code injection.
//!
//! A [`TemplateScript`] is the base solver script with two named insertion
//! markers, one for data code and one for constraint code. Both markers must
//! be present at construction time; a template without them is a fatal
//! configuration error, never a retriable one. Instances are shared read-only
//! across sessions.

use regex::Regex;
use std::path::Path;

use crate::error::TemplateError;
use crate::solver::SolverKind;

/// Marker line for data-stage code insertion.
pub const DATA_MARKER: &str = "# DATA CODE GOES HERE";

/// Marker line for constraint-stage code insertion.
pub const CONSTRAINT_MARKER: &str = "# CONSTRAINT CODE GOES HERE";

/// Validated base solver script containing both insertion markers.
#[derive(Debug, Clone)]
pub struct TemplateScript {
    text: String,
}

impl TemplateScript {
    /// Validates and wraps a template script.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingMarker`] if either marker is absent.
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();

        if !text.contains(DATA_MARKER) {
            return Err(TemplateError::MissingMarker(DATA_MARKER));
        }
        if !text.contains(CONSTRAINT_MARKER) {
            return Err(TemplateError::MissingMarker(CONSTRAINT_MARKER));
        }

        Ok(Self { text })
    }

    /// Loads and validates a template script from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TemplateError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::new(text)
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Splices a candidate snippet into the template and returns the merged
    /// script.
    ///
    /// Marker choice follows the solver kind's heuristic: snippets containing
    /// the constraint-adding call signature go to the CONSTRAINT marker,
    /// everything else to the DATA marker. The marker line's leading
    /// whitespace is re-applied to every snippet line so injected code stays
    /// nested at the marker's level.
    pub fn inject(&self, snippet: &str, solver: SolverKind) -> Result<String, TemplateError> {
        let marker = if snippet.contains(solver.constraint_call_signature()) {
            CONSTRAINT_MARKER
        } else {
            DATA_MARKER
        };

        splice(&self.text, marker, snippet)
    }
}

/// Replaces `marker` in `text` with `snippet`, preserving the marker line's
/// indentation on every snippet line.
fn splice(text: &str, marker: &'static str, snippet: &str) -> Result<String, TemplateError> {
    let pattern = Regex::new(&format!(r"(?m)^([ \t]*){}", regex::escape(marker)))
        .expect("static marker pattern compiles");

    let caps = pattern
        .captures(text)
        .ok_or(TemplateError::MarkerNotFound(marker))?;

    let indent = &caps[1];
    let reindented = snippet
        .lines()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n");

    let matched = caps.get(0).expect("whole match exists");
    let mut merged = String::with_capacity(text.len() + reindented.len());
    merged.push_str(&text[..matched.start()]);
    merged.push_str(&reindented);
    merged.push_str(&text[matched.end()..]);

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
import gurobipy as gp

# DATA CODE GOES HERE

model = gp.Model(\"Distribution\")
model.optimize()
m = model

# CONSTRAINT CODE GOES HERE

m.update()
model.optimize()
";

    #[test]
    fn test_new_requires_both_markers() {
        assert!(TemplateScript::new(TEMPLATE).is_ok());

        let missing_data = TEMPLATE.replace(DATA_MARKER, "");
        let err = TemplateScript::new(missing_data).unwrap_err();
        assert!(matches!(err, TemplateError::MissingMarker(m) if m == DATA_MARKER));

        let missing_constraint = TEMPLATE.replace(CONSTRAINT_MARKER, "");
        let err = TemplateScript::new(missing_constraint).unwrap_err();
        assert!(matches!(err, TemplateError::MissingMarker(m) if m == CONSTRAINT_MARKER));
    }

    #[test]
    fn test_inject_constraint_code_goes_to_constraint_marker() {
        let template = TemplateScript::new(TEMPLATE).unwrap();
        let merged = template
            .inject("m.addConstr(x[0, 0] <= 10)", SolverKind::Gurobi)
            .unwrap();

        assert!(merged.contains("m.addConstr(x[0, 0] <= 10)"));
        assert!(!merged.contains(CONSTRAINT_MARKER));
        assert!(merged.contains(DATA_MARKER));
    }

    #[test]
    fn test_inject_data_code_goes_to_data_marker() {
        let template = TemplateScript::new(TEMPLATE).unwrap();
        let merged = template.inject("supply[0] = 120", SolverKind::Gurobi).unwrap();

        assert!(merged.contains("supply[0] = 120"));
        assert!(!merged.contains(DATA_MARKER));
        assert!(merged.contains(CONSTRAINT_MARKER));
    }

    #[test]
    fn test_inject_preserves_marker_indentation() {
        let indented = "\
def build():
    # DATA CODE GOES HERE
    pass

# CONSTRAINT CODE GOES HERE
";
        let template = TemplateScript::new(indented).unwrap();
        let merged = template
            .inject("a = 1\nb = 2", SolverKind::Gurobi)
            .unwrap();

        assert!(merged.contains("    a = 1\n    b = 2"));
    }

    #[test]
    fn test_inject_multiline_at_top_level() {
        let template = TemplateScript::new(TEMPLATE).unwrap();
        let snippet = "demand[1] = 150\ndemand[2] = 90";
        let merged = template.inject(snippet, SolverKind::Gurobi).unwrap();

        assert!(merged.contains("\ndemand[1] = 150\ndemand[2] = 90\n"));
    }

    #[test]
    fn test_inject_snippet_with_dollar_signs() {
        // Replacement must be literal, not regex-expanded
        let template = TemplateScript::new(TEMPLATE).unwrap();
        let merged = template
            .inject("label = \"cost in $1k\"", SolverKind::Gurobi)
            .unwrap();

        assert!(merged.contains("label = \"cost in $1k\""));
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = TemplateScript::from_file("/definitely/not/here.py").unwrap_err();
        assert!(matches!(err, TemplateError::ReadFailed { .. }));
    }
}
