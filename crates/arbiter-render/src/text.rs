use crate::RenderableResponse;

/// Render a response as terminal text, one line per result.
///
/// Format:
/// `{resource}: {decision} [{status}]`, followed by indented detail lines.
/// Control characters inside messages are escaped so every entry stays on
/// its own line.
pub fn render_text(response: &RenderableResponse) -> Vec<String> {
    let mut out = Vec::new();
    out.push(format!("decision: {}", response.decision.label()));

    for r in &response.results {
        out.push(format!(
            "{}: {} [{}]",
            r.resource_label(),
            r.decision.label(),
            r.status
        ));
        if let Some(message) = &r.message {
            out.push(format!("  message: {}", escape(message)));
        }
        for m in &r.missing_attributes {
            out.push(format!(
                "  missing: {}/{} ({})",
                m.category, m.attribute_id, m.data_type
            ));
        }
        for o in &r.obligations {
            let assignments: Vec<String> = o
                .assignments
                .iter()
                .map(|(id, value)| format!("{}={}", id, escape(value)))
                .collect();
            if assignments.is_empty() {
                out.push(format!("  obligation: {}", o.obligation_id));
            } else {
                out.push(format!(
                    "  obligation: {} ({})",
                    o.obligation_id,
                    assignments.join(", ")
                ));
            }
        }
    }

    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
