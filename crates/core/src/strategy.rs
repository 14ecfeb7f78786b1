//! Tag-to-strategy lookup shared by the image and compiler pipelines.
//!
//! A [`StrategyRegistry`] is built once at startup and shared read-only.
//! Absent tags resolve to the registry's default; unknown tags either fail
//! with [`CoreError::InvalidStrategy`] or fall back to the default,
//! depending on the configured [`ResolutionMode`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Anything selectable by a configuration tag.
pub trait Tagged {
    /// Stable tag clients use to select this strategy.
    fn tag(&self) -> &'static str;
}

/// What to do when a client names a strategy that is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Reject unknown tags with [`CoreError::InvalidStrategy`].
    #[default]
    Strict,
    /// Fall back to the default strategy and log a warning.
    Lenient,
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown resolution mode '{other}' (expected strict|lenient)")),
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

/// Immutable tag -> strategy table with a guaranteed default entry.
pub struct StrategyRegistry<S: ?Sized> {
    entries: BTreeMap<&'static str, Arc<S>>,
    default_tag: &'static str,
    mode: ResolutionMode,
}

impl<S: ?Sized> Clone for StrategyRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            default_tag: self.default_tag,
            mode: self.mode,
        }
    }
}

impl<S: ?Sized + Tagged> StrategyRegistry<S> {
    /// Create a registry whose default is `default`.
    pub fn new(default: Arc<S>, mode: ResolutionMode) -> Self {
        let default_tag = default.tag();
        let mut entries = BTreeMap::new();
        entries.insert(default_tag, default);
        Self {
            entries,
            default_tag,
            mode,
        }
    }

    /// Register another strategy. A strategy with the same tag is replaced.
    pub fn with(mut self, strategy: Arc<S>) -> Self {
        self.entries.insert(strategy.tag(), strategy);
        self
    }

    /// Change how unknown tags are handled.
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolve a client-supplied tag.
    ///
    /// `None` means the client did not choose and always yields the
    /// default. An unrecognized tag is only mapped to the default in
    /// [`ResolutionMode::Lenient`].
    pub fn resolve(&self, tag: Option<&str>) -> Result<Arc<S>, CoreError> {
        let Some(tag) = tag else {
            return Ok(self.default_strategy());
        };

        if let Some(strategy) = self.entries.get(tag) {
            return Ok(Arc::clone(strategy));
        }

        match self.mode {
            ResolutionMode::Strict => Err(CoreError::InvalidStrategy(tag.to_string())),
            ResolutionMode::Lenient => {
                tracing::warn!(
                    requested = %tag,
                    fallback = %self.default_tag,
                    "Unknown strategy tag, falling back to default",
                );
                Ok(self.default_strategy())
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<S>> {
        self.entries.get(tag)
    }

    pub fn default_strategy(&self) -> Arc<S> {
        // `new` always inserts the default entry and `with` can only replace it.
        Arc::clone(&self.entries[self.default_tag])
    }

    pub fn default_tag(&self) -> &'static str {
        self.default_tag
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<S>> {
        self.entries.values()
    }
}
