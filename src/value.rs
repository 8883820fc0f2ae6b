use serde_json::{Map, Number, Value};

/// Runtime type tag bound as `$type` during iteration.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) => true,
        Value::Object(_) => true,
    }
}

/// Section truthiness: `0` counts as present, empty arrays do not.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(_) => true,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Integral values become JSON integers so that `$i` prints as `2`, not `2.0`.
pub fn number_value(raw: f64) -> Value {
    if raw.fract() == 0.0 && raw >= (i64::MIN as f64) && raw <= (i64::MAX as f64) {
        Value::Number(Number::from(raw as i64))
    } else {
        Number::from_f64(raw).map_or(Value::Null, Value::Number)
    }
}

/// Numeric coercion used by `range` and by loose equality.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| !f.is_nan())
        }
        _ => None,
    }
}

fn coerce_scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(num) => num.as_f64(),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(_) => to_number(value),
        _ => None,
    }
}

/// Equality used by `contains` when matching `value`.
///
/// Same-typed operands compare structurally (numbers numerically). Mixed
/// number/bool/string operands are both coerced to `f64`. `null` only equals
/// `null`, and containers never equal scalars.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => left == right,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            false
        }
        _ => match (coerce_scalar(left), coerce_scalar(right)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Text form of a value as it appears in rendered output.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => match (num.as_i64(), num.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => num.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Something `iterate` can enumerate as key/value pairs.
#[derive(Debug, Clone, Copy)]
pub enum IterSource<'a> {
    Map(&'a Map<String, Value>),
    Sequence(&'a [Value]),
    Text(&'a str),
}

impl<'a> IterSource<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Map(map)),
            Value::Array(items) => Some(Self::Sequence(items)),
            Value::String(text) => Some(Self::Text(text)),
            _ => None,
        }
    }

    /// Own key/value pairs in base order: insertion order for maps,
    /// positions otherwise. Built in one pass over the source.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Self::Map(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            Self::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(idx, value)| (idx.to_string(), value.clone()))
                .collect(),
            Self::Text(text) => text
                .chars()
                .enumerate()
                .map(|(idx, ch)| (idx.to_string(), Value::String(ch.to_string())))
                .collect(),
        }
    }
}
