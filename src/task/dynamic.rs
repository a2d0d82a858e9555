// src/task/dynamic.rs

use std::sync::OnceLock;

use crate::task::{output_paths, Outputs, Requires, Task, TaskRef};

/// A batch of requirements discovered while a task is running.
///
/// Wraps the nested requirement structure together with an optional custom
/// completeness predicate. The predicate receives the per-task completeness
/// function and takes over the whole check, which lets large batches be
/// verified with one cheap operation (say, a single listing of an output
/// directory) instead of one existence check per task.
///
/// The flattened requirement list and the mapped output paths are computed
/// lazily, once, and memoized for the lifetime of the wrapper.
pub struct DynamicRequirements {
    requirements: Requires,
    custom_complete: Option<CustomComplete>,
    flat: OnceLock<Vec<TaskRef>>,
    paths: OnceLock<Outputs>,
}

type CustomComplete = Box<dyn Fn(&dyn Fn(&dyn Task) -> bool) -> bool + Send + Sync>;

impl DynamicRequirements {
    pub fn new(requirements: impl Into<Requires>) -> Self {
        Self {
            requirements: requirements.into(),
            custom_complete: None,
            flat: OnceLock::new(),
            paths: OnceLock::new(),
        }
    }

    /// Attach a custom completeness predicate. It is handed the per-task
    /// completeness function and fully replaces the default all-complete
    /// check.
    pub fn with_custom_complete(
        requirements: impl Into<Requires>,
        custom: impl Fn(&dyn Fn(&dyn Task) -> bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            requirements: requirements.into(),
            custom_complete: Some(Box::new(custom)),
            flat: OnceLock::new(),
            paths: OnceLock::new(),
        }
    }

    /// The original, wrapped requirement structure.
    pub fn requirements(&self) -> &Requires {
        &self.requirements
    }

    /// Flattened view of the wrapped requirements. Memoized.
    pub fn flat_requirements(&self) -> &[TaskRef] {
        self.flat.get_or_init(|| self.requirements.flatten())
    }

    /// Outputs of the requirements in the identical structure. Memoized.
    pub fn paths(&self) -> &Outputs {
        self.paths.get_or_init(|| output_paths(&self.requirements))
    }

    /// Completeness under the default per-task check.
    pub fn complete(&self) -> bool {
        self.complete_with(|task| task.complete())
    }

    /// Completeness under a caller-supplied per-task check.
    ///
    /// When a custom predicate is attached, it is delegated to entirely and
    /// the default all-complete loop is never consulted.
    pub fn complete_with(&self, complete_fn: impl Fn(&dyn Task) -> bool) -> bool {
        if let Some(custom) = &self.custom_complete {
            return custom(&complete_fn);
        }
        self.flat_requirements()
            .iter()
            .all(|task| complete_fn(task.as_ref()))
    }
}
