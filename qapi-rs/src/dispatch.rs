//! Request dispatch.
//!
//! A request is a list of tokens: the handler name followed by its positional
//! arguments. The dispatcher looks the handler up, binds the arguments, invokes
//! the handler and wraps its outcome into a [`ResultEnvelope`].

use crate::bind::{Binder, BindingError};
use crate::config::DispatchConfig;
use crate::defaults::HintPolicy;
use crate::handler::{ArgError, BoxError, Outcome};
use crate::registry::Registry;
use serde::Serialize;
use std::sync::Arc;

/// Uniform result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    #[serde(rename = "api")]
    pub handler_name: String,

    #[serde(rename = "comment")]
    pub description: String,

    pub detail: Outcome,
}

/// Errors returned by [`Dispatcher::dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Empty request: no handler name given")]
    EmptyRequest,

    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The bound values do not fit the handler's Rust signature.
    ///
    /// Not produced for entries accepted by [`Registry::register`], which rejects
    /// declarations that disagree with the handler.
    #[error("Handler '{handler}' cannot take its arguments: {source}")]
    Argument {
        handler: String,
        #[source]
        source: ArgError,
    },

    /// The handler's own error, unchanged.
    #[error(transparent)]
    Handler(BoxError),
}

impl DispatchError {
    /// Whether the caller can fix the request (as opposed to a registration
    /// bug or a failing handler).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DispatchError::EmptyRequest
                | DispatchError::UnknownHandler(_)
                | DispatchError::Binding(BindingError::Coercion { .. })
        )
    }
}

/// Resolves requests against a [`Registry`].
///
/// Holds no per-request state; share it freely across threads.
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatchConfig,
    hints: Box<dyn HintPolicy>,
}

impl Dispatcher {
    /// Dispatcher with the default configuration.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    /// Dispatcher whose hint policy is built from `config.recent_markers`.
    pub fn with_config(registry: Arc<Registry>, config: DispatchConfig) -> Self {
        let hints = Box::new(config.hint_policy());
        Self {
            registry,
            config,
            hints,
        }
    }

    /// Replace the hint policy.
    pub fn with_hint_policy(mut self, hints: impl HintPolicy + 'static) -> Self {
        self.hints = Box::new(hints);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve and invoke a request.
    ///
    /// `query` is the question the tokens were derived from; it is only recorded
    /// for tracing.
    pub fn dispatch<S: AsRef<str>>(
        &self,
        query: &str,
        tokens: &[S],
    ) -> Result<ResultEnvelope, DispatchError> {
        let (name, args) = tokens.split_first().ok_or(DispatchError::EmptyRequest)?;
        let name = name.as_ref();

        let entry = self
            .registry
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownHandler(name.to_string()))?;

        tracing::debug!(handler = %name, query = %query, args = args.len(), "Dispatching request");

        let values = Binder::new(&self.config, self.hints.as_ref()).bind(args, &entry.parameters)?;

        // Registration checks declared tags against the adapter, so a registered
        // entry only reaches `Argument` if that check is bypassed.
        let outcome = entry
            .invocable
            .invoke(values)
            .map_err(|source| DispatchError::Argument {
                handler: entry.name.clone(),
                source,
            })?
            .map_err(|err| {
                tracing::debug!(handler = %name, error = %err, "Handler failed");
                DispatchError::Handler(err)
            })?;

        Ok(ResultEnvelope {
            handler_name: entry.name.clone(),
            description: entry.description.clone(),
            detail: outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Condition, HandlerResult, Rest};
    use crate::registry::{HandlerEntry, ParameterSpec};
    use crate::value::TypeTag;
    use serde_json::json;

    fn recent_orders(days: i32) -> HandlerResult {
        let mut condition = Condition::new();
        condition.insert("days".into(), json!(days));
        Ok(Outcome::new(condition, json!({ "orders": days * 10 })))
    }

    fn broken(_days: i32) -> HandlerResult {
        Err("search backend unavailable".into())
    }

    fn tagged(limit: i32, Rest(tags): Rest<String>) -> HandlerResult {
        Ok(Outcome::new(Condition::new(), json!({ "limit": limit, "tags": tags })))
    }

    fn dispatcher() -> Dispatcher {
        let registry = Registry::new();
        registry
            .register(HandlerEntry::new(
                "recentOrders",
                "Orders placed recently",
                vec![ParameterSpec::new("days", TypeTag::INT32, "近几天")],
                recent_orders,
            ))
            .unwrap();
        registry
            .register(HandlerEntry::new(
                "broken",
                "Always fails",
                vec![ParameterSpec::new("days", TypeTag::INT32, "")],
                broken,
            ))
            .unwrap();
        registry
            .register(HandlerEntry::new(
                "tagged",
                "Orders by tag",
                vec![
                    ParameterSpec::new("limit", TypeTag::INT32, ""),
                    ParameterSpec::new("tags", TypeTag::STRING.variadic(), ""),
                ],
                tagged,
            ))
            .unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    #[test]
    fn test_default_argument() {
        let envelope = dispatcher().dispatch("最近订单", &["recentOrders"]).unwrap();
        assert_eq!(envelope.handler_name, "recentOrders");
        assert_eq!(envelope.detail.condition["days"], json!(5));
    }

    #[test]
    fn test_explicit_argument() {
        let envelope = dispatcher().dispatch("", &["recentOrders", "12"]).unwrap();
        assert_eq!(envelope.detail.condition["days"], json!(12));
        assert_eq!(envelope.detail.data, json!({ "orders": 120 }));
    }

    #[test]
    fn test_empty_request() {
        let tokens: [&str; 0] = [];
        let err = dispatcher().dispatch("", &tokens).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyRequest));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_unknown_handler() {
        let err = dispatcher().dispatch("", &["missingHandler"]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownHandler(ref n) if n == "missingHandler"));
    }

    #[test]
    fn test_handler_error_propagates() {
        let err = dispatcher().dispatch("", &["broken", "1"]).unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "search backend unavailable");
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_variadic_dispatch() {
        let envelope = dispatcher()
            .dispatch("", &["tagged", "7", "a", "b", "c"])
            .unwrap();
        assert_eq!(envelope.detail.data, json!({ "limit": 7, "tags": ["a", "b", "c"] }));
    }

    #[test]
    fn test_strict_mode() {
        let d = dispatcher();
        let strict = Dispatcher::with_config(Arc::clone(&d.registry), DispatchConfig::default().strict(true));

        let err = strict.dispatch("", &["recentOrders", "twelve"]).unwrap_err();
        assert!(matches!(err, DispatchError::Binding(BindingError::Coercion { .. })));
        assert!(err.is_user_error());

        let lenient = d.dispatch("", &["recentOrders", "twelve"]).unwrap();
        assert_eq!(lenient.detail.condition["days"], json!(0));
    }

    #[test]
    fn test_custom_hint_policy() {
        let d = dispatcher().with_hint_policy(|_: &str| false);
        let envelope = d.dispatch("", &["recentOrders"]).unwrap();
        assert_eq!(envelope.detail.condition["days"], json!(0));
    }

    #[test]
    fn test_mismatched_entry_never_dispatches() {
        let d = dispatcher();
        let mismatched = HandlerEntry::new(
            "wideOrders",
            "",
            vec![ParameterSpec::new("days", TypeTag::INT64, "")],
            recent_orders,
        );
        assert!(d.registry().register(mismatched).is_err());

        let err = d.dispatch("", &["wideOrders", "3"]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownHandler(_)));
    }

    #[test]
    fn test_argument_error_message() {
        let err = DispatchError::Argument {
            handler: "recentOrders".to_string(),
            source: ArgError::Missing {
                index: 0,
                expected: crate::value::ValueKind::Int32,
            },
        };
        assert_eq!(
            err.to_string(),
            "Handler 'recentOrders' cannot take its arguments: Missing argument 0 (expected int32)"
        );
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_envelope_wire_format() {
        let envelope = dispatcher().dispatch("", &["recentOrders", "2"]).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({
                "api": "recentOrders",
                "comment": "Orders placed recently",
                "detail": { "cond": { "days": 2 }, "data": { "orders": 20 } }
            })
        );
    }
}
