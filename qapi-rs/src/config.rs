//! Dispatcher configuration.

use crate::defaults::{MarkerHints, DEFAULT_RECENT_MARKERS, DEFAULT_RECENT_WINDOW};
use serde::{Deserialize, Serialize};

/// Binding behavior knobs.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use qapi::DispatchConfig;
///
/// let config = DispatchConfig::from_json(r#"{ "strict": true }"#).unwrap();
/// assert!(config.strict);
/// assert_eq!(config.recent_window, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Reject unparsable tokens instead of falling back to zero / start of today.
    pub strict: bool,

    /// Let a variadic parameter absorb any number of trailing tokens.
    pub unbounded_variadic: bool,

    /// Magnitude of the "recent N" default (units for numbers, days for timestamps).
    pub recent_window: u32,

    /// Hint substrings that mark a parameter as a recent-window parameter.
    pub recent_markers: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strict: false,
            unbounded_variadic: true,
            recent_window: DEFAULT_RECENT_WINDOW,
            recent_markers: DEFAULT_RECENT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl DispatchConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn unbounded_variadic(mut self, unbounded: bool) -> Self {
        self.unbounded_variadic = unbounded;
        self
    }

    pub fn recent_window(mut self, window: u32) -> Self {
        self.recent_window = window;
        self
    }

    /// Hint policy built from `recent_markers`.
    pub fn hint_policy(&self) -> MarkerHints {
        MarkerHints::new(self.recent_markers.iter().cloned())
    }
}
