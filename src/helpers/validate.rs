use anyhow::Result;
use serde_json::Value;

use crate::context::Context;
use crate::params::Params;
use crate::value::{display, loose_equals};

use super::SkipReason;

pub(crate) type Checked<T> = std::result::Result<T, SkipReason>;

/// Validated inputs of an array-predicate helper.
#[derive(Debug)]
pub(crate) struct ArrayPredicate {
    pub records: Vec<Value>,
    pub key: String,
    pub value: Option<Value>,
}

impl ArrayPredicate {
    /// Key presence is checked first; a record without the key fails
    /// without looking at `value`.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(field) = record.as_object().and_then(|map| map.get(&self.key)) else {
            return false;
        };
        match &self.value {
            Some(expected) => loose_equals(field, expected),
            None => true,
        }
    }
}

/// Checks `arr`, `key` and `value` in that order.
pub(crate) fn array_predicate(ctx: &Context, params: &Params) -> Result<Checked<ArrayPredicate>> {
    if !params.contains("arr") {
        return Ok(Err(SkipReason::MissingParam("arr")));
    }
    let records = match params.tap("arr", ctx)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Err(SkipReason::NotArray("arr"))),
    };

    if !params.contains("key") {
        return Ok(Err(SkipReason::MissingParam("key")));
    }
    let key = match params.tap("key", ctx)? {
        Some(Value::Null) | None => return Ok(Err(SkipReason::Unresolved("key"))),
        Some(raw) => display(&raw),
    };

    let value = match params.tap("value", ctx)? {
        Some(Value::Null) | None => None,
        Some(raw) => Some(raw),
    };

    Ok(Ok(ArrayPredicate {
        records,
        key,
        value,
    }))
}
