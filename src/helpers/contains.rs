use anyhow::Result;
use serde_json::Value;

use crate::chunk::Chunk;
use crate::context::Context;
use crate::logging::Level;
use crate::params::Params;
use crate::template::Bodies;
use crate::value::display;

use super::validate::{array_predicate, ArrayPredicate};
use super::{Outcome, SkipReason};

pub const NAME: &str = "contains";
pub const ONCE_NAME: &str = "containsOnce";
pub const ALL_NAME: &str = "containsAll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// At least one record matches.
    Once,
    /// Every record matches; holds for an empty array.
    All,
}

impl Quantifier {
    pub fn parse(value: &Value) -> Option<Self> {
        match value.as_str()?.trim().to_ascii_lowercase().as_str() {
            "once" => Some(Quantifier::Once),
            "all" => Some(Quantifier::All),
            _ => None,
        }
    }

    /// Stops at the first match (`Once`) or the first failure (`All`).
    fn scan(&self, predicate: &ArrayPredicate) -> std::result::Result<(), SkipReason> {
        let records = &predicate.records;
        match self {
            Quantifier::Once if records.iter().any(|record| predicate.matches(record)) => Ok(()),
            Quantifier::Once => Err(SkipReason::NoMatch),
            Quantifier::All => match records.iter().position(|record| !predicate.matches(record)) {
                None => Ok(()),
                Some(index) => Err(SkipReason::RecordFailed { index }),
            },
        }
    }
}

/// `{@contains arr=list key="name" value="Tom" scope="all"}...{/contains}`
///
/// Renders the body at most once, when the records of `arr` satisfy the
/// key/value predicate under `scope` (`once` by default).
pub fn contains(
    chunk: Chunk,
    ctx: &Context,
    bodies: &Bodies<'_>,
    params: &Params,
) -> Result<Chunk> {
    Ok(run(chunk, ctx, bodies, params, NAME, None)?.finish(ctx, NAME))
}

/// `contains` with the quantifier fixed to `once`; `scope` is ignored.
pub fn contains_once(
    chunk: Chunk,
    ctx: &Context,
    bodies: &Bodies<'_>,
    params: &Params,
) -> Result<Chunk> {
    let outcome = run(chunk, ctx, bodies, params, ONCE_NAME, Some(Quantifier::Once))?;
    Ok(outcome.finish(ctx, ONCE_NAME))
}

/// `contains` with the quantifier fixed to `all`; `scope` is ignored.
pub fn contains_all(
    chunk: Chunk,
    ctx: &Context,
    bodies: &Bodies<'_>,
    params: &Params,
) -> Result<Chunk> {
    let outcome = run(chunk, ctx, bodies, params, ALL_NAME, Some(Quantifier::All))?;
    Ok(outcome.finish(ctx, ALL_NAME))
}

fn run(
    chunk: Chunk,
    ctx: &Context,
    bodies: &Bodies<'_>,
    params: &Params,
    helper: &str,
    fixed: Option<Quantifier>,
) -> Result<Outcome> {
    let predicate = match array_predicate(ctx, params)? {
        Ok(predicate) => predicate,
        Err(reason) => return Ok(Outcome::skipped(chunk, reason)),
    };
    if predicate.value.is_none() {
        ctx.log(
            Level::Info,
            helper,
            format!("[@{helper}] no 'value' given, matching on key '{}' only", predicate.key),
        );
    }

    let quantifier = match fixed {
        Some(quantifier) => quantifier,
        None => match params.tap("scope", ctx)? {
            None => Quantifier::Once,
            Some(scope) => match Quantifier::parse(&scope) {
                Some(quantifier) => quantifier,
                None => {
                    return Ok(Outcome::skipped(chunk, SkipReason::InvalidScope(display(&scope))))
                }
            },
        },
    };

    let Some(body) = bodies.block else {
        return Ok(Outcome::skipped(chunk, SkipReason::MissingBody));
    };

    match quantifier.scan(&predicate) {
        Ok(()) => Ok(Outcome::Rendered(body.render(chunk, ctx)?)),
        Err(reason) => Ok(Outcome::skipped(chunk, reason)),
    }
}
