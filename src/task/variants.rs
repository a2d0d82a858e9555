// src/task/variants.rs

//! Specialized task shapes: external tasks, wrapper tasks, externalization,
//! parameter-only config groups, and the naive bulk-complete fallback.
//!
//! All of these are capability tweaks expressed through delegation, not a
//! class hierarchy: an externalized task is the same task with its run step
//! nulled out; a wrapper task is a task whose completeness is its
//! dependencies'.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{BulkCompleteError, ParameterError};
use crate::param::ParamValue;
use crate::registry::TaskFactory;
use crate::task::{Outputs, Requires, RunStatus, Task, TaskArgs, TaskCore, TaskDef, TaskRef};

/// A task whose run step has been nulled out.
///
/// Signals to drivers that the output is produced by a process outside this
/// system: the task must only ever be checked for completeness, never run.
/// The wrapped original is untouched; everything except `run`/`is_external`
/// delegates to it.
pub struct Externalized {
    inner: TaskRef,
}

impl Externalized {
    pub fn from_ref(inner: TaskRef) -> Self {
        Self { inner }
    }
}

/// Externalize a task instance without mutating it.
pub fn externalize(task: impl Task + 'static) -> Externalized {
    Externalized {
        inner: Arc::new(task),
    }
}

impl Task for Externalized {
    fn core(&self) -> &TaskCore {
        self.inner.core()
    }

    fn requires(&self) -> Requires {
        self.inner.requires()
    }

    fn output(&self) -> Outputs {
        self.inner.output()
    }

    fn run(&self) -> anyhow::Result<RunStatus> {
        Ok(RunStatus::Done)
    }

    fn is_external(&self) -> bool {
        true
    }

    fn complete(&self) -> bool {
        self.inner.complete()
    }

    fn template_requires(&self) -> Requires {
        self.inner.template_requires()
    }

    fn priority(&self) -> i64 {
        self.inner.priority()
    }

    fn resources(&self) -> BTreeMap<String, usize> {
        self.inner.resources()
    }

    fn process_resources(&self) -> BTreeMap<String, usize> {
        self.inner.process_resources()
    }

    fn worker_timeout(&self) -> Option<Duration> {
        self.inner.worker_timeout()
    }

    fn retry_count(&self) -> Option<u32> {
        self.inner.retry_count()
    }

    fn disable_hard_timeout(&self) -> Option<Duration> {
        self.inner.disable_hard_timeout()
    }

    fn disable_window(&self) -> Option<Duration> {
        self.inner.disable_window()
    }

    fn accepts_messages(&self) -> bool {
        self.inner.accepts_messages()
    }

    fn on_failure(&self, error: &anyhow::Error) -> String {
        self.inner.on_failure(error)
    }

    fn on_success(&self) -> Option<String> {
        self.inner.on_success()
    }
}

/// Externalize a whole factory: instances it builds come out externalized.
pub fn externalize_factory(factory: Arc<dyn TaskFactory>) -> Arc<dyn TaskFactory> {
    Arc::new(ExternalizedFactory { inner: factory })
}

struct ExternalizedFactory {
    inner: Arc<dyn TaskFactory>,
}

impl TaskFactory for ExternalizedFactory {
    fn def(&self) -> &Arc<TaskDef> {
        self.inner.def()
    }

    fn build(&self, args: TaskArgs) -> Result<TaskRef, ParameterError> {
        let task = self.inner.build(args)?;
        Ok(Arc::new(Externalized::from_ref(task)))
    }

    fn bulk_complete(&self, tuples: &[TaskArgs]) -> Result<Vec<TaskArgs>, BulkCompleteError> {
        self.inner.bulk_complete(tuples)
    }
}

/// A task that only groups other tasks.
///
/// Has no output of its own and is done exactly when every direct
/// dependency is done, bypassing the no-output warning of the default
/// completeness check.
pub struct WrapperTask {
    core: TaskCore,
    children: Requires,
}

impl WrapperTask {
    pub fn new(core: TaskCore, children: impl Into<Requires>) -> Self {
        Self {
            core,
            children: children.into(),
        }
    }
}

impl Task for WrapperTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn requires(&self) -> Requires {
        self.children.clone()
    }

    fn complete(&self) -> bool {
        requires_complete(self)
    }
}

/// "Every flattened direct dependency is complete."
///
/// The completeness rule of wrapper tasks, exposed for custom task types
/// that want the same override.
pub fn requires_complete<T: Task + ?Sized>(task: &T) -> bool {
    task.requires()
        .flatten()
        .iter()
        .all(|dependency| dependency.complete())
}

/// A parameter-carrying group of configuration values.
///
/// Uses the same declaration, resolution, and identity machinery as tasks
/// but has no dependency or execution semantics: all values come from
/// static defaults and the installed config lookup.
pub struct Config {
    core: TaskCore,
}

impl Config {
    pub fn load(def: &Arc<TaskDef>) -> Result<Self, ParameterError> {
        Ok(Self {
            core: def.build(TaskArgs::new())?,
        })
    }

    pub fn core(&self) -> &TaskCore {
        &self.core
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.core.value(name)
    }
}

/// Loop-based `bulk_complete`: construct each tuple and check it.
///
/// Correctness-preserving but without any I/O batching advantage; suitable
/// for factories whose completeness check is cheap. Order of the returned
/// tuples follows the input.
pub fn naive_bulk_complete(
    factory: &dyn TaskFactory,
    tuples: &[TaskArgs],
) -> Result<Vec<TaskArgs>, BulkCompleteError> {
    let mut complete = Vec::new();
    for tuple in tuples {
        let task = factory.build(tuple.clone())?;
        if task.complete() {
            complete.push(tuple.clone());
        }
    }
    Ok(complete)
}
