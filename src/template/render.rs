use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::chunk::Chunk;
use crate::context::Context;
use crate::logging::Level;
use crate::params::Params;
use crate::value::{display, is_present};

use super::parse::{Node, SectionKind};
use super::{Bodies, Body};

const HOST: &str = "host";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn render_nodes(nodes: &[Node], mut chunk: Chunk, ctx: &Context) -> Result<Chunk> {
    for node in nodes {
        chunk = render_node(node, chunk, ctx)?;
    }
    Ok(chunk)
}

fn render_node(node: &Node, chunk: Chunk, ctx: &Context) -> Result<Chunk> {
    match node {
        Node::Text(text) => Ok(chunk.write(text)),
        Node::Reference { path, filters } => {
            let Some(value) = ctx.get(path) else {
                return Ok(chunk);
            };
            let text = display(value);
            if filters.iter().any(|filter| filter == "s") {
                Ok(chunk.write(&text))
            } else {
                Ok(chunk.write(&escape_html(&text)))
            }
        }
        Node::Section {
            kind,
            path,
            params,
            block,
            else_block,
        } => render_section(*kind, path, params, block, else_block.as_deref(), chunk, ctx),
        Node::Helper {
            name,
            params,
            block,
            else_block,
        } => {
            let Some(helper) = ctx.helper(name) else {
                ctx.log(Level::Warn, HOST, format!("helper not found: {name}"));
                return Ok(chunk);
            };
            let bodies = Bodies {
                block: block.as_deref().map(Body::new),
                else_block: else_block.as_deref().map(Body::new),
            };
            helper.call(chunk, ctx, &bodies, params)
        }
    }
}

fn with_params(ctx: &Context, params: &Params) -> Result<Context> {
    if params.is_empty() {
        return Ok(ctx.clone());
    }
    let mut frame = Map::new();
    for (name, param) in params.iter() {
        frame.insert(name.to_string(), param.resolve(ctx)?.unwrap_or(Value::Null));
    }
    Ok(ctx.push(Value::Object(frame)))
}

fn render_section(
    kind: SectionKind,
    path: &str,
    params: &Params,
    block: &[Node],
    else_block: Option<&[Node]>,
    mut chunk: Chunk,
    ctx: &Context,
) -> Result<Chunk> {
    let value = ctx.get(path).cloned();
    let present = value.as_ref().map_or(false, is_present);
    let scope = with_params(ctx, params)?;

    let render_else = |chunk: Chunk| match else_block {
        Some(nodes) => render_nodes(nodes, chunk, &scope),
        None => Ok(chunk),
    };

    match kind {
        SectionKind::Exists if present => render_nodes(block, chunk, &scope),
        SectionKind::NotExists if !present => render_nodes(block, chunk, &scope),
        SectionKind::Exists | SectionKind::NotExists => render_else(chunk),
        SectionKind::Section => match value {
            Some(Value::Array(items)) if !items.is_empty() => {
                let len = items.len();
                for (idx, item) in items.into_iter().enumerate() {
                    let frame = scope.push(json!({ "$idx": idx, "$len": len }));
                    chunk = render_nodes(block, chunk, &frame.push(item))?;
                }
                Ok(chunk)
            }
            Some(Value::Bool(true)) => render_nodes(block, chunk, &scope),
            Some(other) if is_present(&other) => render_nodes(block, chunk, &scope.push(other)),
            _ => render_else(chunk),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}
