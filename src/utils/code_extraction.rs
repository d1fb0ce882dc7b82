//! Code extraction utilities for parsing LLM responses.
//!
//! Writer responses are free text expected to contain exactly one fenced code
//! block. This module pulls out the first block, tolerating an optional
//! language tag and surrounding prose. A response with no fence yields
//! `None`, which the orchestrator treats as a retriable extraction failure.

use regex::Regex;

/// Extracts the first fenced code block from an LLM response.
///
/// The language tag (```` ```python ````) is optional and discarded. Returns
/// `None` when the response contains no complete fenced block.
pub fn extract_code_block(response: &str) -> Option<String> {
    let pattern = Regex::new(r"(?s)```[ \t]*[a-zA-Z0-9_+-]*[ \t]*\r?\n(.*?)```")
        .expect("static fence pattern compiles");

    pattern
        .captures(response)
        .map(|caps| caps[1].trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_python_block() {
        let response = "\
Sure, here is the code:

```python
m.addConstr(x[0, 0] <= 10)
```

That should do it.";

        let code = extract_code_block(response).unwrap();
        assert_eq!(code, "m.addConstr(x[0, 0] <= 10)");
    }

    #[test]
    fn test_extracts_untagged_block() {
        let response = "```\nsupply[0] = 120\n```";
        assert_eq!(extract_code_block(response).unwrap(), "supply[0] = 120");
    }

    #[test]
    fn test_extracts_first_of_multiple_blocks() {
        let response = "```python\nfirst = 1\n```\ntext\n```python\nsecond = 2\n```";
        assert_eq!(extract_code_block(response).unwrap(), "first = 1");
    }

    #[test]
    fn test_multiline_block_preserved() {
        let response = "```python\na = 1\nb = 2\n```";
        assert_eq!(extract_code_block(response).unwrap(), "a = 1\nb = 2");
    }

    #[test]
    fn test_no_block_returns_none() {
        assert!(extract_code_block("I cannot write code for that.").is_none());
        assert!(extract_code_block("").is_none());
    }

    #[test]
    fn test_unterminated_fence_returns_none() {
        assert!(extract_code_block("```python\nx = 1").is_none());
    }
}
