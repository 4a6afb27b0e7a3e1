//! Render use cases: markdown and terminal text from in-memory envelopes.

use crate::response::to_renderable;
use arbiter_types::ResponseEnvelope;

pub fn render_markdown(envelope: &ResponseEnvelope) -> String {
    arbiter_render::render_markdown(&to_renderable(envelope))
}

pub fn render_text(envelope: &ResponseEnvelope) -> String {
    let mut out = arbiter_render::render_text(&to_renderable(envelope)).join("\n");
    out.push('\n');
    out
}
