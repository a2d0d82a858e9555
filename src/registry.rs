// src/registry.rs

//! Explicit registration table mapping task families to factories.
//!
//! Registration replaces declaration-time magic: an init routine registers
//! every definition before any lookup happens, and entries are immutable
//! afterwards. The table is what makes cross-process construction work:
//! given a family name and serialized parameters (the only artifacts that
//! travel), the factory rebuilds an equivalent instance with the same id.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, RwLock};

use tracing::warn;

use crate::errors::{BulkCompleteError, ParameterError};
use crate::task::{TaskArgs, TaskDef, TaskRef};

/// Per-family constructor, the unit stored in the registry.
///
/// `bulk_complete` is a capability, not a requirement: the default signals
/// [`BulkCompleteError::Unsupported`], which callers must catch specifically
/// to fall back to one-by-one completeness checks. Implementations that can
/// batch their storage lookups override it;
/// [`naive_bulk_complete`](crate::task::naive_bulk_complete) is a
/// correctness-preserving loop for the rest.
pub trait TaskFactory: Send + Sync {
    fn def(&self) -> &Arc<TaskDef>;

    /// Construct an instance from resolved arguments.
    fn build(&self, args: TaskArgs) -> Result<TaskRef, ParameterError>;

    /// Construct from a serialized name -> value mapping.
    fn from_str_params(&self, params: &BTreeMap<String, String>) -> Result<TaskRef, ParameterError> {
        let args = self.def().args_from_str_params(params)?;
        self.build(args)
    }

    /// Return the subset of `tuples` whose instances are complete.
    fn bulk_complete(&self, tuples: &[TaskArgs]) -> Result<Vec<TaskArgs>, BulkCompleteError> {
        let _ = tuples;
        Err(BulkCompleteError::Unsupported {
            family: self.def().family(),
        })
    }
}

/// Family -> factory table.
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<dyn TaskFactory>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory under its definition's family name.
    ///
    /// Identity keys off the family name alone, so a second registration
    /// under the same family shadows the first; the ids of both collide by
    /// design. Warn and replace.
    pub fn register(&self, factory: Arc<dyn TaskFactory>) {
        let family = factory.def().family();
        let mut entries = self.entries.write().expect("registry lock poisoned");
        if entries.insert(family.clone(), factory).is_some() {
            warn!(family = %family, "replacing existing registration for task family");
        }
    }

    pub fn lookup(&self, family: &str) -> Option<Arc<dyn TaskFactory>> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(family)
            .cloned()
    }

    /// All registered family names, sorted.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .entries
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        families.sort();
        families
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-global registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}
