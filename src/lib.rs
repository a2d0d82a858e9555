// src/lib.rs

//! taskdag: a task-dependency execution model.
//!
//! Declares units of work (tasks), their typed parameters, their
//! dependencies on other tasks, and the outputs that mark them done, so a
//! driver can compute an execution order and skip work already completed.
//! The crate decides *what* needs to run and *in what order*; it never
//! executes anything itself. Workers, schedulers, and storage backends are
//! external collaborators consuming [`task::Task`], [`target::Target`], and
//! [`config::ConfigLookup`].
//!
//! Typical wiring:
//! - declare a [`task::TaskDef`] per family during init and register a
//!   factory in the [`registry`],
//! - construct instances via [`task::TaskDef::build`]; identity
//!   (`task_id`) is fixed at construction and stable across processes,
//! - hand root tasks to [`graph::DepGraph`] for a dependencies-first,
//!   completeness-pruned execution plan.

pub mod config;
pub mod errors;
pub mod events;
pub mod flow;
pub mod graph;
pub mod logging;
pub mod param;
pub mod registry;
pub mod structure;
pub mod target;
pub mod task;

pub use crate::errors::{BulkCompleteError, EventError, FlowError, GraphError, ParameterError};
pub use crate::flow::Flow;
pub use crate::graph::DepGraph;
pub use crate::param::{ParamKind, ParamSpec, ParamValue, Visibility};
pub use crate::registry::TaskFactory;
pub use crate::structure::Structure;
pub use crate::target::{MemoryStore, MemoryTarget, Target};
pub use crate::task::{
    externalize, flatten_output, output_paths, DynamicRequirements, Outputs, Requires, RunStatus,
    Task, TaskArgs, TaskCore, TaskDef, TaskRef, TargetRef,
};
