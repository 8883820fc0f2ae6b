//! Minimal dust-style host used to drive the helpers.
//!
//! Supports text, references with `|s`/`|h` filters, `{#}`/`{?}`/`{^}`
//! sections with `{:else}`, helper blocks, `{~n}`-style specials and
//! comments. Whitespace is kept verbatim.

mod parse;
mod render;

use anyhow::Result;

use crate::chunk::Chunk;
use crate::context::Context;

pub use parse::{Node, SectionKind};
pub(crate) use render::render_nodes;
pub use render::escape_html;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            nodes: parse::parse(source)?,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The whole template as a body block, handy when calling helpers directly.
    pub fn body(&self) -> Body<'_> {
        Body::new(&self.nodes)
    }

    pub fn render(&self, ctx: &Context) -> Result<String> {
        Ok(render_nodes(&self.nodes, Chunk::new(), ctx)?.into_string())
    }
}

/// A nested template fragment a helper may render any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    nodes: &'a [Node],
}

impl<'a> Body<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self { nodes }
    }

    pub fn render(&self, chunk: Chunk, ctx: &Context) -> Result<Chunk> {
        render_nodes(self.nodes, chunk, ctx)
    }
}

/// Bodies attached to one helper invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bodies<'a> {
    pub block: Option<Body<'a>>,
    pub else_block: Option<Body<'a>>,
}

impl<'a> Bodies<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn block(body: Body<'a>) -> Self {
        Self {
            block: Some(body),
            else_block: None,
        }
    }
}
