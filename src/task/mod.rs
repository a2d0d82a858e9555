// src/task/mod.rs

//! The task model: identity, dependencies, outputs, completeness.
//!
//! - [`id`] derives the deterministic task id.
//! - [`def`] holds definitions ([`TaskDef`]) and the construction protocol
//!   producing [`TaskCore`] identity records.
//! - [`dynamic`] wraps requirement batches discovered while running.
//! - [`variants`] provides the external/wrapper/config specializations.
//!
//! The [`Task`] trait ties these together. The core never executes anything:
//! drivers call [`Task::run`] and react to [`RunStatus`]; the core only
//! answers what a task is, what it needs, and whether it is done.

pub mod def;
pub mod dynamic;
pub mod id;
pub mod variants;

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use def::{TaskArgs, TaskCore, TaskDef, TaskDefBuilder};
pub use dynamic::DynamicRequirements;
pub use id::task_id_str;
pub use variants::{
    externalize, externalize_factory, naive_bulk_complete, requires_complete, Config, Externalized,
    WrapperTask,
};

use crate::structure::Structure;
use crate::target::Target;

/// Shared reference to a task instance.
pub type TaskRef = Arc<dyn Task>;
/// Shared reference to an output handle.
pub type TargetRef = Arc<dyn Target>;
/// Nested structure of tasks, as returned by `requires()`.
pub type Requires = Structure<TaskRef>;
/// Nested structure of output handles, as returned by `output()`.
pub type Outputs = Structure<TargetRef>;

/// Outcome of one resumable execution step.
///
/// Dynamic dependencies discovered mid-run are surfaced as an explicit
/// message instead of a language-level generator: the driver satisfies the
/// yielded batch, then calls [`Task::run`] again. Tasks using this must make
/// their run step restartable up to the yield point.
pub enum RunStatus {
    /// The task's work is finished.
    Done,
    /// Additional requirements were discovered; the driver should complete
    /// them and re-run the task.
    AwaitingDynamic(DynamicRequirements),
}

/// Mutable per-run record owned by the driver, deliberately separate from
/// the immutable [`TaskCore`] identity so the identity record stays freely
/// shareable and serializable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHandles {
    pub tracking_url: Option<String>,
    pub status_message: Option<String>,
    pub progress_percentage: Option<f32>,
}

/// A unit of work.
///
/// Implementations hold a [`TaskCore`] (usually built in their constructor
/// via [`TaskDef::build`]) and override `requires`, `output`, and `run` as
/// needed. Everything else has protocol-defined defaults.
pub trait Task: Send + Sync {
    /// The identity record computed at construction.
    fn core(&self) -> &TaskCore;

    /// Tasks this task depends on. Default: none.
    fn requires(&self) -> Requires {
        Structure::None
    }

    /// Outputs this task produces. Default: none, which makes the default
    /// `complete()` always report incomplete.
    fn output(&self) -> Outputs {
        Structure::None
    }

    /// One execution step. Drivers must not call this when
    /// [`is_external`](Self::is_external) is true.
    fn run(&self) -> anyhow::Result<RunStatus> {
        Ok(RunStatus::Done)
    }

    /// True when the output is produced outside this system; such a task is
    /// only ever checked for completeness, never run.
    fn is_external(&self) -> bool {
        false
    }

    /// Whether the task is done. Default: all declared outputs exist; a
    /// task without declared outputs warns and reports incomplete, forcing
    /// authors to either declare outputs or override this.
    fn complete(&self) -> bool {
        default_complete(self)
    }

    /// Override point for template-style tasks that need to append hidden
    /// dependencies while leaving `requires()` to their users. Overrides
    /// must include the structure returned by the default.
    fn template_requires(&self) -> Requires {
        self.requires()
    }

    /// Flattened dependency list, as consumed by drivers.
    fn deps(&self) -> Vec<TaskRef> {
        self.template_requires().flatten()
    }

    /// The outputs of `requires()`, in the identical structure.
    fn input(&self) -> Outputs {
        output_paths(&self.requires())
    }

    /// Advisory scheduling priority; higher runs first. Not enforced here.
    fn priority(&self) -> i64 {
        0
    }

    /// Resource units this task needs, e.g. `{"db_connections": 1}`.
    fn resources(&self) -> BTreeMap<String, usize> {
        BTreeMap::new()
    }

    /// Override point for template tasks contributing common resources.
    fn process_resources(&self) -> BTreeMap<String, usize> {
        self.resources()
    }

    /// Timeout for the run step; `None` means the worker default applies.
    fn worker_timeout(&self) -> Option<Duration> {
        None
    }

    fn retry_count(&self) -> Option<u32> {
        None
    }

    fn disable_hard_timeout(&self) -> Option<Duration> {
        None
    }

    fn disable_window(&self) -> Option<Duration> {
        None
    }

    /// Whether scheduler messages may be delivered to this task.
    fn accepts_messages(&self) -> bool {
        false
    }

    /// User-facing explanation for a failed run. Returned to the driver as
    /// a serializable string; a failure inside an override propagates.
    fn on_failure(&self, error: &anyhow::Error) -> String {
        format!("Runtime error:\n{error:?}")
    }

    /// User-facing explanation for a successful run, if any.
    fn on_success(&self) -> Option<String> {
        None
    }

    /// The derived task id, fixed at construction.
    fn task_id(&self) -> &str {
        self.core().id()
    }

    /// The definition's family name.
    fn family(&self) -> String {
        self.core().family()
    }
}

/// Default completeness check: every declared output exists.
pub fn default_complete<T: Task + ?Sized>(task: &T) -> bool {
    let outputs = task.output().flatten();
    if outputs.is_empty() {
        warn!(
            task = %task.core(),
            "task without declared outputs has no custom complete(); reporting incomplete"
        );
        return false;
    }
    outputs.iter().all(|output| output.exists())
}

/// Replace every task in a nested structure with its `output()` structure,
/// preserving container shape. A bare task leaf becomes its output directly.
pub fn output_paths(structure: &Requires) -> Outputs {
    structure.graft(&|task| task.output())
}

/// All "real" outputs reachable from `root` without crossing a task that has
/// output of its own.
///
/// Breadth-first: a task whose output flattens non-empty contributes those
/// outputs and is not expanded; an output-less task is treated as a pure
/// wrapper and its `requires()` is expanded instead. Tasks are visited at
/// most once, keyed by task id.
pub fn flatten_output(root: &dyn Task) -> Vec<TargetRef> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<TargetRef> = Vec::new();
    let mut queue: VecDeque<TaskRef> = VecDeque::new();

    visit(root, &mut seen, &mut collected, &mut queue);
    while let Some(task) = queue.pop_front() {
        visit(task.as_ref(), &mut seen, &mut collected, &mut queue);
    }

    collected
}

fn visit(
    task: &dyn Task,
    seen: &mut HashSet<String>,
    collected: &mut Vec<TargetRef>,
    queue: &mut VecDeque<TaskRef>,
) {
    if !seen.insert(task.task_id().to_string()) {
        return;
    }
    let outputs = task.output().flatten();
    if outputs.is_empty() {
        queue.extend(task.requires().flatten());
    } else {
        collected.extend(outputs);
    }
}
