//! Typed argument values.
//!
//! Every handler parameter is declared with a [`TypeTag`]: one of a closed set of
//! scalar kinds, optionally marked variadic. Bound arguments travel to the
//! handler adapter as [`Value`]s.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed layout used to parse and render timestamps.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Kinds and Tags
// ============================================================================

/// Scalar kinds a parameter can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int32,
    Int64,
    Float32,
    Float64,
    #[serde(rename = "string")]
    Str,
    Timestamp,
}

impl ValueKind {
    /// Canonical declaration text of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
            ValueKind::Str => "string",
            ValueKind::Timestamp => "timestamp",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ValueKind::Str | ValueKind::Timestamp)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of one handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub kind: ValueKind,
    pub variadic: bool,
}

impl TypeTag {
    pub const INT32: TypeTag = TypeTag::scalar(ValueKind::Int32);
    pub const INT64: TypeTag = TypeTag::scalar(ValueKind::Int64);
    pub const FLOAT32: TypeTag = TypeTag::scalar(ValueKind::Float32);
    pub const FLOAT64: TypeTag = TypeTag::scalar(ValueKind::Float64);
    pub const STRING: TypeTag = TypeTag::scalar(ValueKind::Str);
    pub const TIMESTAMP: TypeTag = TypeTag::scalar(ValueKind::Timestamp);

    /// A single, non-variadic slot of `kind`.
    pub const fn scalar(kind: ValueKind) -> Self {
        Self {
            kind,
            variadic: false,
        }
    }

    /// The same kind, marked variadic.
    pub const fn variadic(self) -> Self {
        Self {
            kind: self.kind,
            variadic: true,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variadic {
            f.write_str("...")?;
        }
        f.write_str(self.kind.as_str())
    }
}

/// A type declaration outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown parameter type: {0}")]
pub struct UnknownTypeError(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTypeError;

    /// Parses declarations such as `int32`, `...string` or `time.Time`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (variadic, base) = match trimmed.strip_prefix("...") {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let kind = match base {
            "int32" => ValueKind::Int32,
            "int" | "int64" => ValueKind::Int64,
            "float32" => ValueKind::Float32,
            "float64" => ValueKind::Float64,
            "string" => ValueKind::Str,
            "timestamp" | "time.Time" => ValueKind::Timestamp,
            _ => return Err(UnknownTypeError(s.to_string())),
        };

        Ok(TypeTag { kind, variadic })
    }
}

// ============================================================================
// Values
// ============================================================================

/// A coerced argument ready to be handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Str(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Str(_) => ValueKind::Str,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// `magnitude` expressed in a numeric kind, `None` for strings and timestamps.
    pub(crate) fn numeric(kind: ValueKind, magnitude: u32) -> Option<Self> {
        match kind {
            ValueKind::Int32 => Some(Value::Int32(i32::try_from(magnitude).unwrap_or(i32::MAX))),
            ValueKind::Int64 => Some(Value::Int64(i64::from(magnitude))),
            ValueKind::Float32 => Some(Value::Float32(magnitude as f32)),
            ValueKind::Float64 => Some(Value::Float64(f64::from(magnitude))),
            ValueKind::Str | ValueKind::Timestamp => None,
        }
    }
}

/// Canonical string form. Coercing it back yields the same value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_LAYOUT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Timestamp(v) => serializer.collect_str(&v.format(TIMESTAMP_LAYOUT)),
        }
    }
}
