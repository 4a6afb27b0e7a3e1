use crate::{RenderableResponse, RenderableResult};

pub fn render_markdown(response: &RenderableResponse) -> String {
    let mut out = String::new();
    out.push_str("# Arbiter decision\n\n");
    out.push_str(&format!("- Decision: **{}**\n", response.decision.label()));
    out.push_str(&format!("- Results: {}\n", response.results.len()));

    if response.results.is_empty() {
        out.push_str("\nNo results.\n");
        return out;
    }

    out.push_str("\n## Results\n\n");
    out.push_str("| Resource | Decision | Status |\n");
    out.push_str("|---|---|---|\n");
    for r in &response.results {
        out.push_str(&format!(
            "| `{}` | {} | `{}` |\n",
            escape_cell(r.resource_label()),
            r.decision.label(),
            r.status
        ));
    }

    let detailed: Vec<&RenderableResult> =
        response.results.iter().filter(|r| r.has_details()).collect();
    if detailed.is_empty() {
        return out;
    }

    out.push_str("\n## Details\n");
    for r in detailed {
        out.push_str(&format!("\n### `{}`\n\n", r.resource_label()));
        if let Some(message) = &r.message {
            out.push_str(&format!("- Message: {}\n", message));
        }
        for m in &r.missing_attributes {
            out.push_str(&format!(
                "- Missing attribute: `{}` in `{}` (`{}`)\n",
                m.attribute_id, m.category, m.data_type
            ));
        }
        for o in &r.obligations {
            out.push_str(&format!("- Obligation `{}`\n", o.obligation_id));
            for (id, value) in &o.assignments {
                out.push_str(&format!("  - `{}` = `{}`\n", id, value));
            }
        }
    }

    out
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
