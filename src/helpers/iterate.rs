use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};

use crate::chunk::Chunk;
use crate::context::Context;
use crate::params::Params;
use crate::registry::Comparator;
use crate::template::Bodies;
use crate::value::{display, kind, IterSource};

use super::{Outcome, SkipReason};

pub const NAME: &str = "iterate";

/// Built-in `sort="desc"` order: plain code point comparison, reversed.
pub fn descending(a: &str, b: &str) -> Ordering {
    b.cmp(a)
}

enum SortOrder {
    Named(Arc<dyn Comparator>),
    Descending,
    Ascending,
}

impl SortOrder {
    /// A registered comparator wins over the built-in `desc`; anything else
    /// falls back to ascending.
    fn resolve(ctx: &Context, params: &Params) -> Result<Option<Self>> {
        match params.get("sort") {
            Some(raw) if !raw.is_blank() => {}
            _ => return Ok(None),
        }
        let name = params
            .tap("sort", ctx)?
            .map(|value| display(&value))
            .unwrap_or_default();
        let order = match ctx.comparator(&name) {
            Some(comparator) => SortOrder::Named(comparator),
            None if name == "desc" => SortOrder::Descending,
            None => SortOrder::Ascending,
        };
        Ok(Some(order))
    }

    fn apply(&self, entries: &mut [(String, Value)]) {
        match self {
            SortOrder::Named(comparator) => {
                entries.sort_by(|a, b| comparator.compare(&a.0, &b.0))
            }
            SortOrder::Descending => entries.sort_by(|a, b| descending(&a.0, &b.0)),
            SortOrder::Ascending => entries.sort_by(|a, b| a.0.cmp(&b.0)),
        }
    }
}

/// `{@iterate key=obj sort="asc"}{$key}:{$value}{/iterate}`
///
/// Binds `$key`, `$parentKey`, `$value` and `$type` for every own key of
/// `key`, which may be an object, an array or a string.
pub fn iterate(
    chunk: Chunk,
    ctx: &Context,
    bodies: &Bodies<'_>,
    params: &Params,
) -> Result<Chunk> {
    Ok(run(chunk, ctx, bodies, params)?.finish(ctx, NAME))
}

fn run(mut chunk: Chunk, ctx: &Context, bodies: &Bodies<'_>, params: &Params) -> Result<Outcome> {
    if !params.contains("key") {
        return Ok(Outcome::skipped(chunk, SkipReason::MissingParam("key")));
    }
    let Some(body) = bodies.block else {
        return Ok(Outcome::skipped(chunk, SkipReason::MissingBody));
    };
    let target = params.tap("key", ctx)?;
    let Some(source) = target.as_ref().and_then(IterSource::from_value) else {
        return Ok(Outcome::skipped(chunk, SkipReason::NotIterable));
    };

    let mut entries = source.entries();
    if let Some(order) = SortOrder::resolve(ctx, params)? {
        order.apply(&mut entries);
    }

    let parent_key = ctx.get("$key").cloned().unwrap_or(Value::Null);
    for (key, value) in entries {
        let frame = json!({
            "$key": key,
            "$parentKey": parent_key,
            "$type": kind(&value),
            "$value": value,
        });
        chunk = body.render(chunk, &ctx.push(frame))?;
    }
    Ok(Outcome::Rendered(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;
    use crate::registry::Registry;
    use crate::template::Template;

    #[test]
    fn descending_reverses_natural_order() {
        assert_eq!(descending("a", "b"), Ordering::Greater);
        assert_eq!(descending("b", "a"), Ordering::Less);
        assert_eq!(descending("a", "a"), Ordering::Equal);
    }

    #[test]
    fn sorting_leaves_source_untouched() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "obj": { "b": 2, "a": 1 } }));
        let body = Template::parse("{$key}").unwrap();
        let params = Params::new()
            .with("key", Param::path("obj"))
            .with("sort", Param::literal("asc"));
        let out = iterate(Chunk::new(), &ctx, &Bodies::block(body.body()), &params).unwrap();
        assert_eq!(out.as_str(), "ab");
        let keys: Vec<&String> = ctx.get("obj").unwrap().as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn blank_sort_keeps_base_order() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "obj": { "b": 2, "a": 1 } }));
        let body = Template::parse("{$key}").unwrap();
        let params = Params::new()
            .with("key", Param::path("obj"))
            .with("sort", Param::literal(""));
        let out = iterate(Chunk::new(), &ctx, &Bodies::block(body.body()), &params).unwrap();
        assert_eq!(out.as_str(), "ba");
    }

    #[test]
    fn missing_body_is_a_no_op() {
        let registry = Registry::new();
        let ctx = registry.context(json!({ "obj": { "a": 1 } }));
        let params = Params::new().with("key", Param::path("obj"));
        let out = iterate(Chunk::new().write("kept"), &ctx, &Bodies::none(), &params).unwrap();
        assert_eq!(out.as_str(), "kept");
    }
}
