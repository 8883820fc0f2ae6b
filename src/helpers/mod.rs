//! Control-flow helpers: `iterate`, `range` and the `contains` family.
//!
//! Every validation failure is logged and leaves the chunk untouched; none of
//! them reaches the caller as an error.

pub mod contains;
pub mod iterate;
pub mod range;
mod validate;

use std::fmt;

use crate::chunk::Chunk;
use crate::context::Context;
use crate::logging::Level;
use crate::registry::Registry;

pub use contains::{contains, contains_all, contains_once, Quantifier};
pub use iterate::iterate;
pub use range::range;

pub fn register_helpers(registry: &Registry) {
    registry.register(iterate::NAME, iterate);
    registry.register(range::NAME, range);
    registry.register(contains::NAME, contains);
    registry.register(contains::ONCE_NAME, contains_once);
    registry.register(contains::ALL_NAME, contains_all);
}

/// Why a helper left its chunk unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingParam(&'static str),
    MissingBound,
    Unresolved(&'static str),
    NotArray(&'static str),
    NotIterable,
    InvalidScope(String),
    InvalidStep,
    InvalidBound,
    MissingBody,
    NoMatch,
    RecordFailed { index: usize },
}

impl SkipReason {
    pub fn level(&self) -> Level {
        match self {
            SkipReason::NotIterable | SkipReason::NoMatch | SkipReason::RecordFailed { .. } => {
                Level::Info
            }
            _ => Level::Warn,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingParam(name) => write!(f, "missing parameter '{name}'"),
            SkipReason::MissingBound => write!(f, "missing parameter 'to' or 'n'"),
            SkipReason::Unresolved(name) => write!(f, "parameter '{name}' resolved to nothing"),
            SkipReason::NotArray(name) => write!(f, "the parameter '{name}' is not an array"),
            SkipReason::NotIterable => write!(f, "the parameter 'key' has no keys to iterate"),
            SkipReason::InvalidScope(scope) => write!(
                f,
                "the parameter 'scope' should be 'once' or 'all', got '{scope}'"
            ),
            SkipReason::InvalidStep => write!(f, "the parameter 'step' must be a non-zero number"),
            SkipReason::InvalidBound => write!(f, "unable to compute the upper bound"),
            SkipReason::MissingBody => write!(f, "missing body block"),
            SkipReason::NoMatch => write!(f, "no element matched"),
            SkipReason::RecordFailed { index } => {
                write!(f, "element {index} does not match")
            }
        }
    }
}

/// Result of one helper invocation before it is handed back to the host.
#[derive(Debug)]
pub enum Outcome {
    Rendered(Chunk),
    Skipped { chunk: Chunk, reason: SkipReason },
}

impl Outcome {
    pub fn skipped(chunk: Chunk, reason: SkipReason) -> Self {
        Outcome::Skipped { chunk, reason }
    }

    pub fn finish(self, ctx: &Context, helper: &str) -> Chunk {
        match self {
            Outcome::Rendered(chunk) => chunk,
            Outcome::Skipped { chunk, reason } => {
                ctx.log(reason.level(), helper, format!("[@{helper}] {reason}"));
                chunk
            }
        }
    }
}
