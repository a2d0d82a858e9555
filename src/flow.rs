// src/flow.rs

//! Flow: a named set of tasks used as an assembly unit.

use std::collections::HashMap;

use crate::errors::FlowError;
use crate::task::TaskRef;

/// Bounded number of `_{n}` suffixes tried before giving up.
const AUTO_RENAME_LIMIT: usize = 100_000;

/// A named collection of tasks keyed by unique name.
///
/// Names default to the task's family. With auto-rename enabled (the
/// default), a colliding name gets an incrementing `_{n}` suffix; with it
/// disabled, a collision is a fatal [`FlowError::NameCollision`]. Storage is
/// a name-keyed map, but iteration order is insertion order, kept
/// explicitly.
pub struct Flow {
    name: String,
    auto_rename: bool,
    order: Vec<String>,
    tasks: HashMap<String, TaskRef>,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_rename: true,
            order: Vec::new(),
            tasks: HashMap::new(),
        }
    }

    /// Disable auto-rename; name collisions become errors.
    pub fn strict(mut self) -> Self {
        self.auto_rename = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a task under its family name, returning the name it was stored
    /// under (which may carry a rename suffix).
    pub fn add(&mut self, task: TaskRef) -> Result<String, FlowError> {
        let base = task.family();
        self.add_named(base, task)
    }

    /// Add a task under an explicit base name.
    pub fn add_named(
        &mut self,
        base: impl Into<String>,
        task: TaskRef,
    ) -> Result<String, FlowError> {
        let base = base.into();
        let name = if self.auto_rename {
            self.unique_name(&base)?
        } else if self.tasks.contains_key(&base) {
            return Err(FlowError::NameCollision {
                flow: self.name.clone(),
                name: base,
            });
        } else {
            base
        };

        self.order.push(name.clone());
        self.tasks.insert(name.clone(), task);
        Ok(name)
    }

    fn unique_name(&self, base: &str) -> Result<String, FlowError> {
        if !self.tasks.contains_key(base) {
            return Ok(base.to_string());
        }
        for suffix in 0..AUTO_RENAME_LIMIT {
            let candidate = format!("{base}_{suffix}");
            if !self.tasks.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(FlowError::RenameExhausted {
            flow: self.name.clone(),
            name: base.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&TaskRef> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Stored names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// `(name, task)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskRef)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), &self.tasks[name]))
    }
}
