//! Argument binding.
//!
//! Turns the positional tokens of a request into one [`Value`] per argument slot.
//! Two paths exist:
//!
//! - **positional**: the token count fits the declared arity, every token is
//!   coerced against its parameter (a variadic parameter absorbs all trailing
//!   tokens with its own kind);
//! - **default padding**: the count does not fit, every parameter is treated as
//!   absent and receives a synthesized default.

use crate::arity::fits;
use crate::coerce::{coerce, try_coerce};
use crate::config::DispatchConfig;
use crate::defaults::{default_for, HintPolicy};
use crate::registry::ParameterSpec;
use crate::value::{TypeTag, UnknownTypeError, Value, ValueKind};

/// Errors raised while binding tokens to parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),

    #[error("Invalid argument {index}: cannot parse '{token}' as {kind}")]
    Coercion {
        index: usize,
        token: String,
        kind: ValueKind,
    },

    #[error("Argument {index} has no matching parameter")]
    Unmatched { index: usize },
}

/// Binds request tokens according to a [`DispatchConfig`].
pub struct Binder<'a> {
    config: &'a DispatchConfig,
    hints: &'a dyn HintPolicy,
}

impl<'a> Binder<'a> {
    pub fn new(config: &'a DispatchConfig, hints: &'a dyn HintPolicy) -> Self {
        Self { config, hints }
    }

    /// Bind `args` (the request tokens after the handler name) to `parameters`.
    pub fn bind<S: AsRef<str>>(
        &self,
        args: &[S],
        parameters: &[ParameterSpec],
    ) -> Result<Vec<Value>, BindingError> {
        if !fits(args.len(), parameters, self.config.unbounded_variadic) {
            tracing::warn!(
                supplied = args.len(),
                declared = parameters.len(),
                "Argument count does not fit, binding defaults"
            );
            return Ok(self.defaults(parameters));
        }

        let mut variadic: Option<TypeTag> = None;
        let mut values = Vec::with_capacity(args.len());

        for (index, token) in args.iter().enumerate() {
            let tag = match variadic {
                Some(tag) => tag,
                None => {
                    let param = parameters
                        .get(index)
                        .ok_or(BindingError::Unmatched { index })?;
                    if param.tag.variadic {
                        variadic = Some(param.tag);
                    }
                    param.tag
                }
            };
            values.push(self.coerce(index, token.as_ref(), tag)?);
        }

        Ok(values)
    }

    /// One synthesized default per declared parameter.
    pub fn defaults(&self, parameters: &[ParameterSpec]) -> Vec<Value> {
        parameters
            .iter()
            .map(|p| default_for(p.tag, &p.hint, self.hints, self.config.recent_window))
            .collect()
    }

    fn coerce(&self, index: usize, token: &str, tag: TypeTag) -> Result<Value, BindingError> {
        if !self.config.strict {
            return Ok(coerce(token, tag));
        }
        try_coerce(token, tag).map_err(|err| BindingError::Coercion {
            index,
            token: err.token,
            kind: err.kind,
        })
    }
}
