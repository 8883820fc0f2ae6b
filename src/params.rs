use anyhow::Result;
use serde_json::Value;

use crate::chunk::Chunk;
use crate::context::Context;
use crate::template::{render_nodes, Node};
use crate::value::is_truthy;

/// One `name=...` parameter as written in the markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// `"text"` or a number literal.
    Literal(Value),
    /// An unquoted path, looked up in the context.
    Path(String),
    /// A quoted string containing `{...}` tags; resolves to its rendered text.
    Template(Vec<Node>),
}

impl Param {
    pub fn literal(value: impl Into<Value>) -> Self {
        Param::Literal(value.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Param::Path(path.into())
    }

    /// True for an empty or falsy literal, e.g. `sort=""`.
    pub fn is_blank(&self) -> bool {
        match self {
            Param::Literal(value) => !is_truthy(value),
            Param::Path(path) => path.trim().is_empty(),
            Param::Template(nodes) => nodes.is_empty(),
        }
    }

    /// `None` when a path reference does not resolve.
    pub fn resolve(&self, ctx: &Context) -> Result<Option<Value>> {
        match self {
            Param::Literal(value) => Ok(Some(value.clone())),
            Param::Path(path) => Ok(ctx.get(path).cloned()),
            Param::Template(nodes) => {
                let rendered = render_nodes(nodes, Chunk::new(), ctx)?;
                Ok(Some(Value::String(rendered.into_string())))
            }
        }
    }
}

/// Parameters of one helper or section invocation, in markup order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Param)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, param: Param) -> Self {
        self.insert(name, param);
        self
    }

    /// A repeated name replaces the earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, param: Param) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = param;
        } else {
            self.entries.push((name, param));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, param)| param)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(name, param)| (name.as_str(), param))
    }

    /// Resolves a parameter to its runtime value.
    pub fn tap(&self, name: &str, ctx: &Context) -> Result<Option<Value>> {
        match self.get(name) {
            Some(param) => param.resolve(ctx),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::template::Template;
    use serde_json::json;

    #[test]
    fn tap_resolves_literals_paths_and_templates() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "who": "Tom", "n": 3 }));
        let template = Template::parse("hi {who}").unwrap();
        let params = Params::new()
            .with("lit", Param::literal("desc"))
            .with("num", Param::path("n"))
            .with("missing", Param::path("nope"))
            .with("tpl", Param::Template(template.nodes().to_vec()));
        assert_eq!(params.tap("lit", &ctx).unwrap(), Some(json!("desc")));
        assert_eq!(params.tap("num", &ctx).unwrap(), Some(json!(3)));
        assert_eq!(params.tap("missing", &ctx).unwrap(), None);
        assert_eq!(params.tap("absent", &ctx).unwrap(), None);
        assert_eq!(params.tap("tpl", &ctx).unwrap(), Some(json!("hi Tom")));
    }

    #[test]
    fn insert_replaces_duplicates() {
        let params = Params::new()
            .with("sort", Param::literal("asc"))
            .with("sort", Param::literal("desc"));
        assert_eq!(params.iter().count(), 1);
        assert_eq!(params.get("sort"), Some(&Param::literal("desc")));
        assert!(Param::literal("").is_blank());
        assert!(!Param::literal("asc").is_blank());
    }
}
