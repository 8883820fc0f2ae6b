use anyhow::Result;
use serde_json::json;

use crate::chunk::Chunk;
use crate::context::Context;
use crate::params::Params;
use crate::template::Bodies;
use crate::value::{number_value, to_number};

use super::{Outcome, SkipReason};

pub const NAME: &str = "range";

fn number_param(ctx: &Context, params: &Params, name: &str) -> Result<Option<f64>> {
    Ok(params
        .tap(name, ctx)?
        .as_ref()
        .and_then(to_number)
        .filter(|value| value.is_finite()))
}

/// `{@range from=2 to=10 step=2}{$i}{/range}` or `{@range n=3}{$i}{/range}`
///
/// The upper bound is exclusive, so `n=3` yields `0, 1, 2`.
pub fn range(chunk: Chunk, ctx: &Context, bodies: &Bodies<'_>, params: &Params) -> Result<Chunk> {
    Ok(run(chunk, ctx, bodies, params)?.finish(ctx, NAME))
}

fn run(mut chunk: Chunk, ctx: &Context, bodies: &Bodies<'_>, params: &Params) -> Result<Outcome> {
    if !params.contains("to") && !params.contains("n") {
        return Ok(Outcome::skipped(chunk, SkipReason::MissingBound));
    }
    let Some(body) = bodies.block else {
        return Ok(Outcome::skipped(chunk, SkipReason::MissingBody));
    };

    let from = number_param(ctx, params, "from")?.unwrap_or(0.0);
    let step = number_param(ctx, params, "step")?.unwrap_or(1.0);
    let to = match number_param(ctx, params, "to")? {
        Some(to) => to,
        None => match number_param(ctx, params, "n")? {
            Some(count) => from + count,
            None => return Ok(Outcome::skipped(chunk, SkipReason::InvalidBound)),
        },
    };
    if step == 0.0 {
        return Ok(Outcome::skipped(chunk, SkipReason::InvalidStep));
    }

    let mut index: u64 = 0;
    loop {
        // Recomputed from `from` each time so float steps do not drift.
        let current = from + step * index as f64;
        let in_bounds = if step > 0.0 { current < to } else { current > to };
        if !in_bounds {
            break;
        }
        let frame = ctx.push(json!({ "$i": number_value(current) }));
        chunk = body.render(chunk, &frame)?;
        index += 1;
    }
    Ok(Outcome::Rendered(chunk))
}
