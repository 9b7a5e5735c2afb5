//! # qapi: Query API registry
//!
//! Register plain Rust functions under a name, then call them with a list of
//! string tokens. Tokens are coerced into the function's parameter types,
//! missing arguments get type-driven defaults, and every call returns the same
//! envelope shape.
//!
//! ## Core Principles
//!
//! - **No reflection**: handlers are wrapped in typed adapters at registration
//! - **Availability first**: malformed numbers become zero, malformed timestamps
//!   become today, unless strict mode is on
//! - **Recent-window defaults**: a parameter hinted as "近N天" defaults to 5
//! - **Explicit registry**: no global state, lock-free lookups
//!
//! ## Quick Start
//!
//! ```
//! use qapi::{Condition, Dispatcher, HandlerEntry, HandlerResult, Outcome, ParameterSpec, Registry, TypeTag};
//! use std::sync::Arc;
//!
//! fn recent_orders(days: i32) -> HandlerResult {
//!     let mut condition = Condition::new();
//!     condition.insert("days".into(), days.into());
//!     Ok(Outcome::new(condition, serde_json::json!([])))
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register(HandlerEntry::new(
//!         "recentOrders",
//!         "Orders placed recently",
//!         vec![ParameterSpec::new("days", TypeTag::INT32, "近几天")],
//!         recent_orders,
//!     ))
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let envelope = dispatcher.dispatch("orders this week", &["recentOrders"]).unwrap();
//! assert_eq!(envelope.detail.condition["days"], 5);
//!
//! let envelope = dispatcher.dispatch("orders this week", &["recentOrders", "12"]).unwrap();
//! assert_eq!(envelope.detail.condition["days"], 12);
//! ```
//!
//! Functions can also be annotated with [`api`] to generate their entry:
//!
//! ```ignore
//! /// Orders placed recently
//! #[qapi::api(name = "recentOrders", hint(days = "近几天"))]
//! fn recent_orders(days: i32) -> qapi::HandlerResult { /* ... */ }
//!
//! registry.register(recent_orders_entry())?;
//! ```

pub mod arity;
pub mod bind;
pub mod catalog;
pub mod coerce;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod handler;
pub mod registry;
pub mod tracing_support;
pub mod value;

// Re-export the attribute macro
pub use qapi_rs_macros::api;

pub use bind::{Binder, BindingError};
pub use catalog::{render_catalog, ToolSpec};
pub use coerce::{coerce, coerce_declared, try_coerce, CoercionError};
pub use config::DispatchConfig;
pub use defaults::{default_for, HintPolicy, MarkerHints};
pub use dispatch::{DispatchError, Dispatcher, ResultEnvelope};
pub use handler::{
    ArgError, BoxError, Condition, Data, FromArg, Handler, HandlerResult, IntoOutcome, Invocable,
    Outcome, Rest,
};
pub use registry::{HandlerEntry, ParameterSpec, Registry, RegistryError};
pub use value::{TypeTag, UnknownTypeError, Value, ValueKind};

#[cfg(feature = "tracing")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};
