use std::sync::Arc;

use serde_json::Value;

use crate::logging::Level;
use crate::registry::{Comparator, Helper, Registry};

struct Frame {
    head: Value,
    parent: Option<Arc<Frame>>,
}

/// Chained lookup environment for one render.
///
/// `push` never touches existing frames, so a context handed to a body stays
/// valid for the caller after the body returns.
#[derive(Clone)]
pub struct Context {
    registry: Registry,
    stack: Arc<Frame>,
}

fn descend<'a>(mut current: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

impl Context {
    pub(crate) fn new(registry: Registry, data: Value) -> Self {
        Self {
            registry,
            stack: Arc::new(Frame {
                head: data,
                parent: None,
            }),
        }
    }

    pub fn push(&self, head: Value) -> Context {
        Context {
            registry: self.registry.clone(),
            stack: Arc::new(Frame {
                head,
                parent: Some(self.stack.clone()),
            }),
        }
    }

    pub fn head(&self) -> &Value {
        &self.stack.head
    }

    /// Resolves `.`, `.a.b` (head only) or `a.b` (first segment searched from
    /// the innermost frame outwards).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = path.trim();
        if path == "." {
            return Some(self.head());
        }
        if let Some(rest) = path.strip_prefix('.') {
            let segments: Vec<&str> = rest.split('.').collect();
            return descend(self.head(), &segments);
        }
        let segments: Vec<&str> = path.split('.').collect();
        let (first, rest) = segments.split_first()?;
        let mut frame: &Frame = &self.stack;
        loop {
            if let Some(found) = frame.head.as_object().and_then(|map| map.get(*first)) {
                return descend(found, rest);
            }
            match &frame.parent {
                Some(parent) => frame = &**parent,
                None => return None,
            }
        }
    }

    pub fn helper(&self, name: &str) -> Option<Arc<dyn Helper>> {
        self.registry.helper(name)
    }

    pub fn comparator(&self, name: &str) -> Option<Arc<dyn Comparator>> {
        self.registry.comparator(name)
    }

    pub fn log(&self, level: Level, helper: &str, message: impl Into<String>) {
        self.registry.logger().log(level, helper, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_shadows_without_mutating_parent() {
        let registry = Registry::new();
        let base = registry.context(json!({ "name": "outer", "keep": 1 }));
        let inner = base.push(json!({ "name": "inner" }));
        assert_eq!(inner.get("name"), Some(&json!("inner")));
        assert_eq!(inner.get("keep"), Some(&json!(1)));
        assert_eq!(base.get("name"), Some(&json!("outer")));
    }

    #[test]
    fn resolves_dotted_and_indexed_paths() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "a": { "b": [10, { "c": "deep" }] } }));
        assert_eq!(ctx.get("a.b.0"), Some(&json!(10)));
        assert_eq!(ctx.get("a.b.1.c"), Some(&json!("deep")));
        assert_eq!(ctx.get("a.missing"), None);
        assert_eq!(ctx.get("."), Some(ctx.head()));
    }

    #[test]
    fn leading_dot_only_searches_head() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "outer": 1 })).push(json!({ "x": 2 }));
        assert_eq!(ctx.get(".x"), Some(&json!(2)));
        assert_eq!(ctx.get(".outer"), None);
        assert_eq!(ctx.get("outer"), Some(&json!(1)));
    }
}
