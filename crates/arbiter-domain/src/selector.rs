//! Path queries over a resource's content document.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("path must start with '/': {0}")]
    NotAbsolute(String),
    #[error("empty path segment in {0}")]
    EmptySegment(String),
}

/// Evaluates an attribute-selector path against resource content.
///
/// Each returned string is one matched node in its lexical form; the caller
/// parses it under the selector's declared data type.
pub trait ContentSelector: Send + Sync {
    fn select(&self, content: &Value, path: &str) -> Result<Vec<String>, SelectorError>;
}

/// Slash-separated JSON path selector.
///
/// `/orders/*/id` walks object keys and array indices; `*` expands every
/// child, and a name applied to an array is applied to each element. Leaf
/// strings, numbers and booleans become matches, `null` and objects do not.
/// `~1` and `~0` escape `/` and `~` inside a segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPathSelector;

impl ContentSelector for JsonPathSelector {
    fn select(&self, content: &Value, path: &str) -> Result<Vec<String>, SelectorError> {
        let Some(rest) = path.strip_prefix('/') else {
            return Err(SelectorError::NotAbsolute(path.to_string()));
        };

        let mut frontier: Vec<&Value> = vec![content];
        if !rest.is_empty() {
            for raw in rest.split('/') {
                if raw.is_empty() {
                    return Err(SelectorError::EmptySegment(path.to_string()));
                }
                let segment = raw.replace("~1", "/").replace("~0", "~");
                frontier = step(&frontier, &segment);
                if frontier.is_empty() {
                    break;
                }
            }
        }

        let mut out = Vec::new();
        for node in frontier {
            collect_leaves(node, &mut out);
        }
        Ok(out)
    }
}

fn step<'v>(frontier: &[&'v Value], segment: &str) -> Vec<&'v Value> {
    let mut next = Vec::new();
    for node in frontier {
        match (node, segment) {
            (Value::Object(map), "*") => next.extend(map.values()),
            (Value::Array(items), "*") => next.extend(items.iter()),
            (Value::Object(map), name) => next.extend(map.get(name)),
            (Value::Array(items), name) => match name.parse::<usize>() {
                Ok(index) => next.extend(items.get(index)),
                Err(_) => next.extend(step(&items.iter().collect::<Vec<_>>(), name)),
            },
            _ => {}
        }
    }
    next
}

fn collect_leaves(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(items) => {
            for item in items {
                if !item.is_array() {
                    collect_leaves(item, out);
                }
            }
        }
        Value::Null | Value::Object(_) => {}
    }
}
