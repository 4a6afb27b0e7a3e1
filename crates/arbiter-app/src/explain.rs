//! The `explain` use case: look up combining algorithm and status code documentation.

use arbiter_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// Found an explanation for the identifier.
    Found(Explanation),
    /// Unknown identifier; includes the known algorithm ids and status codes.
    NotFound {
        identifier: String,
        available_algorithms: &'static [&'static str],
        available_status_codes: &'static [&'static str],
    },
}

/// Look up an explanation for a combining algorithm or status code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_algorithms: explain::all_algorithm_ids(),
            available_status_codes: explain::all_status_codes(),
        },
    }
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\n");
    out.push_str("Examples\n");
    out.push_str("--------\n\n");
    out.push_str("Before:\n");
    out.push_str("```json\n");
    out.push_str(exp.examples.before);
    out.push('\n');
    out.push_str("```\n\n");
    out.push_str("After:\n");
    out.push_str("```json\n");
    out.push_str(exp.examples.after);
    out.push('\n');
    out.push_str("```\n");

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    algorithms: &[&'static str],
    status_codes: &[&'static str],
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Unknown combining algorithm or status code: {}\n\n",
        identifier
    ));
    out.push_str("Available combining algorithms:\n");
    for id in algorithms {
        out.push_str(&format!("  - {}\n", id));
    }
    out.push_str("\nAvailable status codes:\n");
    for code in status_codes {
        out.push_str(&format!("  - {}\n", code));
    }

    out
}
