//! Handler registry
//!
//! Maps handler names to their metadata and invocable adapter. The map is
//! published as an immutable snapshot: lookups load the current snapshot
//! without locking, registration builds a replacement and swaps it in.

use crate::catalog::ToolSpec;
use crate::handler::{Adapter, Handler, Invocable};
use crate::value::{TypeTag, UnknownTypeError};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Entries
// ============================================================================

/// One declared parameter of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name, for diagnostics and the catalog
    pub name: String,
    /// Declared type
    pub tag: TypeTag,
    /// Free-text description; drives the default for absent arguments
    pub hint: String,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, tag: TypeTag, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag,
            hint: hint.into(),
        }
    }

    /// Build from a textual type declaration such as `"...int32"`.
    pub fn parse(
        name: impl Into<String>,
        declared: &str,
        hint: impl Into<String>,
    ) -> Result<Self, UnknownTypeError> {
        Ok(Self::new(name, declared.parse()?, hint))
    }
}

/// A registered handler.
#[derive(Clone)]
pub struct HandlerEntry {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub invocable: Arc<dyn Invocable>,
}

impl HandlerEntry {
    /// Wrap `handler` into an entry.
    pub fn new<H, T>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        handler: H,
    ) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            invocable: Arc::new(Adapter::new(handler)),
        }
    }

    /// Check the declared parameters against themselves and the adapter.
    ///
    /// Parameter names must be unique, variadic parameters must be trailing and
    /// share one kind, and the declared tags must equal the tags of the
    /// handler's Rust signature.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut variadic: Option<TypeTag> = None;
        for (index, param) in self.parameters.iter().enumerate() {
            if self.parameters[..index].iter().any(|p| p.name == param.name) {
                return Err(RegistryError::invalid_signature(
                    &self.name,
                    format!("duplicate parameter name '{}'", param.name),
                ));
            }
            match (variadic, param.tag.variadic) {
                (None, true) => variadic = Some(param.tag),
                (Some(_), false) => {
                    return Err(RegistryError::invalid_signature(
                        &self.name,
                        format!("parameter '{}' follows a variadic parameter", param.name),
                    ));
                }
                (Some(first), true) if first.kind != param.tag.kind => {
                    return Err(RegistryError::invalid_signature(
                        &self.name,
                        format!(
                            "variadic parameter '{}' is {}, expected {}",
                            param.name, param.tag.kind, first.kind
                        ),
                    ));
                }
                _ => {}
            }
        }

        let declared: Vec<TypeTag> = self.parameters.iter().map(|p| p.tag).collect();
        let actual = self.invocable.param_tags();
        if declared != actual {
            return Err(RegistryError::SignatureMismatch {
                name: self.name.clone(),
                declared: join_tags(&declared),
                actual: join_tags(&actual),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

fn join_tags(tags: &[TypeTag]) -> String {
    let parts: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    format!("({})", parts.join(", "))
}

// ============================================================================
// Registry
// ============================================================================

type Snapshot = HashMap<String, Arc<HandlerEntry>>;

/// Name -> handler map with lock-free reads.
pub struct Registry {
    snap: ArcSwap<Snapshot>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(Snapshot::new()),
        }
    }

    /// Validate and store `entry`, replacing any entry with the same name.
    pub fn register(&self, entry: HandlerEntry) -> Result<(), RegistryError> {
        entry.validate()?;

        let name = entry.name.clone();
        let entry = Arc::new(entry);
        let previous = self.snap.rcu(|current| {
            let mut next = Snapshot::clone(current);
            next.insert(name.clone(), Arc::clone(&entry));
            next
        });

        if previous.contains_key(&name) {
            tracing::info!(handler = %name, "Handler replaced");
        } else {
            tracing::info!(handler = %name, params = entry.parameters.len(), "Handler registered");
        }
        Ok(())
    }

    /// Register a handler whose parameter types are given as text, e.g.
    /// `("days", "int32", "近几天")`.
    pub fn register_declared<H, T>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: &[(&str, &str, &str)],
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: Handler<T>,
        T: 'static,
    {
        let parameters = parameters
            .iter()
            .map(|(name, declared, hint)| ParameterSpec::parse(*name, declared, *hint))
            .collect::<Result<Vec<_>, _>>()?;

        self.register(HandlerEntry::new(name, description, parameters, handler))
    }

    /// Remove a handler by name
    pub fn unregister(&self, name: &str) -> bool {
        let previous = self.snap.rcu(|current| {
            let mut next = Snapshot::clone(current);
            next.remove(name);
            next
        });

        let removed = previous.contains_key(name);
        if removed {
            tracing::info!(handler = %name, "Handler unregistered");
        }
        removed
    }

    /// Look up a handler by name
    pub fn lookup(&self, name: &str) -> Option<Arc<HandlerEntry>> {
        self.snap.load().get(name).cloned()
    }

    /// Names of all registered handlers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snap.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Describe every handler, sorted by name
    pub fn catalog(&self) -> Vec<ToolSpec> {
        let snap = self.snap.load();
        let mut tools: Vec<ToolSpec> = snap.values().map(|e| ToolSpec::from_entry(e)).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get the number of registered handlers
    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during registration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),

    #[error("Invalid signature for handler '{name}': {reason}")]
    InvalidSignature { name: String, reason: String },

    #[error("Handler '{name}' declares {declared} but its function takes {actual}")]
    SignatureMismatch {
        name: String,
        declared: String,
        actual: String,
    },
}

impl RegistryError {
    fn invalid_signature(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
