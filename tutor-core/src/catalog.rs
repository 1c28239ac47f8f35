//! Action catalog: the registry mapping stable action identifiers to
//! their capabilities.
//!
//! Populated once at process start by the surrounding application and
//! read-only thereafter.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Stable identifier for one registered capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Create an action id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Registry of all executable capabilities, keyed by [`ActionId`].
#[derive(Default)]
pub struct ActionCatalog {
    entries: HashMap<ActionId, Arc<dyn Capability>>,
}

impl ActionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a capability under the given id.
    ///
    /// Ids are expected to be unique; a duplicate registration replaces
    /// the previous capability and logs a warning.
    pub fn register(&mut self, id: impl Into<ActionId>, capability: Arc<dyn Capability>) {
        let id = id.into();
        if self.entries.insert(id.clone(), capability).is_some() {
            tracing::warn!(action = %id, "replacing previously registered capability");
        }
    }

    /// Look up a capability by id.
    pub fn lookup(&self, id: &ActionId) -> Option<Arc<dyn Capability>> {
        self.entries.get(id).cloned()
    }

    /// All registered ids, in no particular order.
    pub fn ids(&self) -> Vec<&ActionId> {
        self.entries.keys().collect()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
