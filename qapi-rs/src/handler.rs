//! Handler adapters.
//!
//! Handlers are plain functions whose parameters are scalar Rust types:
//!
//! ```
//! use qapi::{Condition, HandlerResult, Outcome, Rest};
//!
//! fn tagged_orders(limit: i64, Rest(tags): Rest<String>) -> HandlerResult {
//!     let mut condition = Condition::new();
//!     condition.insert("tags".into(), tags.into());
//!     Ok(Outcome::new(condition, limit.into()))
//! }
//! ```
//!
//! Any such function implements [`Handler`]. At registration it is wrapped in an
//! [`Adapter`] that unpacks the bound `Vec<Value>` into the real signature, so the
//! dispatcher only ever sees a `dyn Invocable`.

use crate::value::{TypeTag, Value, ValueKind};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::marker::PhantomData;
use std::vec::IntoIter;

/// Error type returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The resolved query or filter a handler reports alongside its data.
pub type Condition = serde_json::Map<String, serde_json::Value>;

/// The payload computed by a handler.
pub type Data = serde_json::Value;

/// Return type for handler functions.
pub type HandlerResult = Result<Outcome, BoxError>;

// ============================================================================
// Outcome
// ============================================================================

/// Successful handler result: the condition it resolved and the data it produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    #[serde(rename = "cond")]
    pub condition: Condition,
    pub data: Data,
}

impl Outcome {
    pub fn new(condition: Condition, data: Data) -> Self {
        Self { condition, data }
    }
}

impl From<(Condition, Data)> for Outcome {
    fn from((condition, data): (Condition, Data)) -> Self {
        Self { condition, data }
    }
}

/// Conversion of handler return values into an [`Outcome`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, BoxError>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(self)
    }
}

impl<E> IntoOutcome for Result<Outcome, E>
where
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Argument extraction
// ============================================================================

/// A bound argument list that does not match the handler's Rust signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("Missing argument {index} (expected {expected})")]
    Missing { index: usize, expected: ValueKind },

    #[error("Argument {index} is {found}, expected {expected}")]
    TypeMismatch {
        index: usize,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// Cursor over the bound values of one call.
pub struct Args {
    values: IntoIter<Value>,
    index: usize,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
            index: 0,
        }
    }

    /// Position of the next value.
    pub fn index(&self) -> usize {
        self.index
    }

    fn next_value(&mut self) -> Option<Value> {
        let value = self.values.next()?;
        self.index += 1;
        Some(value)
    }
}

/// A handler parameter type that can be taken from the bound values.
pub trait FromArg: Sized {
    /// Type tag this parameter is declared with.
    const TYPE_TAG: TypeTag;

    fn from_args(args: &mut Args) -> Result<Self, ArgError>;
}

macro_rules! scalar_arg {
    ($ty:ty, $variant:ident, $tag:expr) => {
        impl FromArg for $ty {
            const TYPE_TAG: TypeTag = $tag;

            fn from_args(args: &mut Args) -> Result<Self, ArgError> {
                let index = args.index();
                match args.next_value() {
                    Some(Value::$variant(v)) => Ok(v),
                    Some(other) => Err(ArgError::TypeMismatch {
                        index,
                        expected: Self::TYPE_TAG.kind,
                        found: other.kind(),
                    }),
                    None => Err(ArgError::Missing {
                        index,
                        expected: Self::TYPE_TAG.kind,
                    }),
                }
            }
        }
    };
}

scalar_arg!(i32, Int32, TypeTag::INT32);
scalar_arg!(i64, Int64, TypeTag::INT64);
scalar_arg!(f32, Float32, TypeTag::FLOAT32);
scalar_arg!(f64, Float64, TypeTag::FLOAT64);
scalar_arg!(String, Str, TypeTag::STRING);
scalar_arg!(NaiveDateTime, Timestamp, TypeTag::TIMESTAMP);

/// Variadic tail: takes every remaining bound value.
///
/// Must be the last parameter of a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rest<T>(pub Vec<T>);

impl<T: FromArg> FromArg for Rest<T> {
    const TYPE_TAG: TypeTag = T::TYPE_TAG.variadic();

    fn from_args(args: &mut Args) -> Result<Self, ArgError> {
        let mut items = Vec::new();
        while !args.values.as_slice().is_empty() {
            items.push(T::from_args(args)?);
        }
        Ok(Rest(items))
    }
}

// ============================================================================
// Handler trait
// ============================================================================

/// A function that can be invoked with bound values.
///
/// Implemented for `Fn(A1, .., An) -> R` (up to eight parameters) where every
/// `Ai: FromArg` and `R: IntoOutcome`. `T` is the parameter tuple and only
/// serves to keep the implementations apart.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    fn call_with(&self, args: Vec<Value>) -> Result<Result<Outcome, BoxError>, ArgError>;

    /// Tags of the Rust parameters, in order.
    fn param_tags(&self) -> Vec<TypeTag>;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Clone + Send + Sync + 'static,
            R: IntoOutcome,
            $($ty: FromArg,)*
        {
            fn call_with(&self, args: Vec<Value>) -> Result<Result<Outcome, BoxError>, ArgError> {
                let mut args = Args::new(args);
                $(let $ty = <$ty as FromArg>::from_args(&mut args)?;)*
                Ok((self)($($ty),*).into_outcome())
            }

            fn param_tags(&self) -> Vec<TypeTag> {
                vec![$(<$ty as FromArg>::TYPE_TAG),*]
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

// ============================================================================
// Type-erased invocation
// ============================================================================

/// Object-safe view of a registered handler.
pub trait Invocable: Send + Sync {
    fn invoke(&self, args: Vec<Value>) -> Result<Result<Outcome, BoxError>, ArgError>;

    fn param_tags(&self) -> Vec<TypeTag>;
}

/// Wraps a [`Handler`] so it can be stored as `dyn Invocable`.
pub struct Adapter<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> Adapter<H, T>
where
    H: Handler<T>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H, T> Invocable for Adapter<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    fn invoke(&self, args: Vec<Value>) -> Result<Result<Outcome, BoxError>, ArgError> {
        self.handler.call_with(args)
    }

    fn param_tags(&self) -> Vec<TypeTag> {
        self.handler.param_tags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn days_handler(days: i32) -> HandlerResult {
        let mut condition = Condition::new();
        condition.insert("days".into(), json!(days));
        Ok(Outcome::new(condition, json!({ "count": days * 2 })))
    }

    fn tags_handler(limit: i64, Rest(tags): Rest<String>) -> Outcome {
        Outcome::new(Condition::new(), json!({ "limit": limit, "tags": tags }))
    }

    fn failing(_: String) -> Result<Outcome, std::io::Error> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "backend down"))
    }

    #[test]
    fn test_call_scalar_handler() {
        let outcome = days_handler.call_with(vec![Value::Int32(3)]).unwrap().unwrap();
        assert_eq!(outcome.condition.get("days"), Some(&json!(3)));
        assert_eq!(outcome.data, json!({ "count": 6 }));
    }

    #[test]
    fn test_rest_collects_tail() {
        let outcome = tags_handler
            .call_with(vec![
                Value::Int64(2),
                Value::Str("a".into()),
                Value::Str("b".into()),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(outcome.data, json!({ "limit": 2, "tags": ["a", "b"] }));
    }

    #[test]
    fn test_param_tags() {
        assert_eq!(days_handler.param_tags(), vec![TypeTag::INT32]);
        assert_eq!(
            tags_handler.param_tags(),
            vec![TypeTag::INT64, TypeTag::STRING.variadic()]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = days_handler.call_with(vec![Value::Str("3".into())]).unwrap_err();
        assert_eq!(
            err,
            ArgError::TypeMismatch {
                index: 0,
                expected: ValueKind::Int32,
                found: ValueKind::Str,
            }
        );
    }

    #[test]
    fn test_missing_argument() {
        let err = days_handler.call_with(vec![]).unwrap_err();
        assert!(matches!(err, ArgError::Missing { index: 0, .. }));
    }

    #[test]
    fn test_handler_error_is_kept() {
        let result = failing.call_with(vec![Value::Str("x".into())]).unwrap();
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "backend down");
    }

    #[test]
    fn test_adapter_is_object_safe() {
        let invocable: Box<dyn Invocable> = Box::new(Adapter::new(days_handler));
        assert_eq!(invocable.param_tags(), vec![TypeTag::INT32]);
        assert!(invocable.invoke(vec![Value::Int32(1)]).unwrap().is_ok());
    }

    #[test]
    fn test_closure_handler() {
        let prefix = String::from("q:");
        let handler = move |name: String| -> HandlerResult {
            Ok(Outcome::new(Condition::new(), json!(format!("{}{}", prefix, name))))
        };
        let outcome = handler.call_with(vec![Value::Str("x".into())]).unwrap().unwrap();
        assert_eq!(outcome.data, json!("q:x"));
    }
}
