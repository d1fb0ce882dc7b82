//! Prompt templates for the writer and safeguard roles.
//!
//! The writer proposes code snippets for the template script; the safeguard
//! judges whether a snippet is safe to run. Both system prompts are rebuilt
//! on every user message so they embed the full prior discussion with that
//! user. Placeholders use `{name}` substitution.

/// System prompt for the code-writer role.
pub const WRITER_SYSTEM_TEMPLATE: &str = "\
You are a chatbot to:
(1) write Python code to answer users questions for supply chain-related coding
project;
(2) explain solutions from a {solver} Python solver.

--- SOURCE CODE ---
{source_code}

--- DOC STR ---
{doc_str}
---

Here are some example questions and their answers and codes:
--- EXAMPLES ---
{example_qa}
---

The execution result of the original source code is below.
--- Original Result ---
{execution_result}

Note that your written code will be added to the lines with substring:
\"# ... CODE GOES HERE\"
So, you don't need to write other code, such as m.optimize() or m.update().
You just need to write code snippet in ```python ...``` block.

Be mindful that order of the code, because some variables might not be defined
yet when your code is inserted into the source code.
";

/// System prompt for the safeguard judge role.
pub const SAFEGUARD_SYSTEM_TEMPLATE: &str = "\
Given the original source code:
{source_code}

Is the following code safe (not malicious code to break security,
privacy, or hack the system) to run?
Answer only one word.
If not safe, answer `DANGER`; else, answer `SAFE`.
";

/// First message sent to the writer for a new user question.
pub const CODE_PROMPT: &str = "
Answer Code:
";

/// Message template feeding an execution failure back to the writer.
pub const DEBUG_TEMPLATE: &str = "
While running the code you suggested, I encountered the {error_type}:
--- ERROR MESSAGE ---
{error_message}

Please try to resolve this bug, and rewrite the code snippet.
--- NEW CODE ---
";

/// Message template asking the safeguard for a one-word verdict.
pub const SAFEGUARD_TEMPLATE: &str = "
--- Code ---
{code}

--- One-Word Answer: SAFE or DANGER ---
";

/// Message template asking the writer to narrate a successful result.
pub const INTERPRETER_TEMPLATE: &str = "\
Here are the execution results: {execution_result}

Can you organize these information to a human readable answer?
Remember to compare the new results to the original results you obtained in the
beginning.

--- HUMAN READABLE ANSWER ---
";

/// Rejection text fed back to the writer when the safeguard answers DANGER.
pub const SAFETY_REJECTION_MESSAGE: &str = "
Sorry, this new code is not safe to run. I would not allow you to execute it.
Please try to find a new way (coding) to answer the question.";

/// Fixed user-facing reply when the debug budget is exhausted.
pub const EXHAUSTED_MESSAGE: &str = "Sorry. I cannot answer your question.";

/// Builds the writer's system prompt, embedding the template script, its
/// documentation, example Q&A, the baseline execution result, and the prior
/// discussion with this user.
pub fn build_writer_system_prompt(
    solver: &str,
    source_code: &str,
    doc_str: &str,
    example_qa: &str,
    execution_result: &str,
    chat_history: &str,
) -> String {
    let prompt = WRITER_SYSTEM_TEMPLATE
        .replace("{solver}", solver)
        .replace("{source_code}", source_code)
        .replace("{doc_str}", doc_str)
        .replace("{example_qa}", example_qa)
        .replace("{execution_result}", execution_result);

    append_history(prompt, chat_history)
}

/// Builds the safeguard's system prompt, embedding the full template script
/// and the prior discussion with this user.
pub fn build_safeguard_system_prompt(source_code: &str, chat_history: &str) -> String {
    let prompt = SAFEGUARD_SYSTEM_TEMPLATE.replace("{source_code}", source_code);
    append_history(prompt, chat_history)
}

/// Builds the debug prompt for one failed attempt.
pub fn build_debug_prompt(error_type: &str, error_message: &str) -> String {
    DEBUG_TEMPLATE
        .replace("{error_type}", error_type)
        .replace("{error_message}", error_message)
}

/// Builds the one-word-verdict request for a candidate snippet.
pub fn build_safeguard_prompt(code: &str) -> String {
    SAFEGUARD_TEMPLATE.replace("{code}", code)
}

/// Builds the narration request for a successful execution result.
pub fn build_interpreter_prompt(execution_result: &str) -> String {
    INTERPRETER_TEMPLATE.replace("{execution_result}", execution_result)
}

fn append_history(prompt: String, chat_history: &str) -> String {
    if chat_history.is_empty() {
        prompt
    } else {
        format!(
            "{}\nHere are the history of discussions:\n{}",
            prompt, chat_history
        )
    }
}
