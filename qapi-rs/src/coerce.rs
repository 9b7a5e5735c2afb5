//! Token coercion.
//!
//! Turns one raw string token into a [`Value`] of the declared kind. The lenient
//! path never fails for a known kind: unparsable numbers become zero and
//! unparsable timestamps become the start of today. The strict path reports the
//! failure instead.

use crate::bind::BindingError;
use crate::defaults::start_of_day;
use crate::value::{TypeTag, Value, ValueKind, TIMESTAMP_LAYOUT};
use chrono::{Local, NaiveDateTime};

/// A token that does not parse as its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot parse '{token}' as {kind}")]
pub struct CoercionError {
    pub token: String,
    pub kind: ValueKind,
}

/// Coerce a token, reporting parse failures.
///
/// The variadic marker of `tag` is ignored.
pub fn try_coerce(token: &str, tag: TypeTag) -> Result<Value, CoercionError> {
    let fail = || CoercionError {
        token: token.to_string(),
        kind: tag.kind,
    };

    match tag.kind {
        ValueKind::Int32 => token.parse().map(Value::Int32).map_err(|_| fail()),
        ValueKind::Int64 => token.parse().map(Value::Int64).map_err(|_| fail()),
        ValueKind::Float32 => token.parse().map(Value::Float32).map_err(|_| fail()),
        ValueKind::Float64 => token.parse().map(Value::Float64).map_err(|_| fail()),
        ValueKind::Str => Ok(Value::Str(token.to_string())),
        ValueKind::Timestamp => parse_timestamp(token).map(Value::Timestamp).ok_or_else(fail),
    }
}

/// Parse the fixed `YYYY-MM-DD HH:MM:SS` layout.
///
/// chrono accepts unpadded fields such as `2024-1-5 1:2:3`; only tokens that
/// render back to themselves are taken.
fn parse_timestamp(token: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(token, TIMESTAMP_LAYOUT).ok()?;
    (parsed.format(TIMESTAMP_LAYOUT).to_string() == token).then_some(parsed)
}

/// Coerce a token, falling back to the kind's zero (or start of today) when it
/// does not parse.
pub fn coerce(token: &str, tag: TypeTag) -> Value {
    match try_coerce(token, tag) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(token = %err.token, kind = %err.kind, "Token did not parse, using fallback");
            fallback(tag.kind)
        }
    }
}

/// Coerce against a textual type declaration such as `"int32"` or `"...string"`.
///
/// An unknown declaration is the one hard failure of lenient coercion.
pub fn coerce_declared(token: &str, declared: &str) -> Result<Value, BindingError> {
    let tag: TypeTag = declared.parse()?;
    Ok(coerce(token, tag))
}

fn fallback(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Int32 => Value::Int32(0),
        ValueKind::Int64 => Value::Int64(0),
        ValueKind::Float32 => Value::Float32(0.0),
        ValueKind::Float64 => Value::Float64(0.0),
        ValueKind::Str => Value::Str(String::new()),
        ValueKind::Timestamp => Value::Timestamp(start_of_day(Local::now().date_naive(), 0)),
    }
}
