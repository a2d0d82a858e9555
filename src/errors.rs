// src/errors.rs

//! Structured error types for the crate.
//!
//! Construction, flow, and graph errors are fatal and surfaced to the caller
//! immediately; they indicate misuse of the declarative model and are never
//! downgraded to warnings. Informational mismatches (wrong parameter type,
//! unconsumed config keys) are emitted as `tracing` warnings instead and do
//! not appear here.

use thiserror::Error;

/// Errors raised while resolving construction arguments into a task instance.
#[derive(Debug, Error)]
pub enum ParameterError {
    /// A named argument does not match any declared parameter.
    #[error("{family}: unknown parameter '{name}'")]
    UnknownParameter { family: String, name: String },

    /// The same parameter was supplied more than once (e.g. both
    /// positionally and by name).
    #[error("{family}: parameter '{name}' was already set")]
    DuplicateParameter { family: String, name: String },

    /// No value was supplied and neither a static default nor a config
    /// entry exists.
    #[error("{family}: requires the '{name}' parameter to be set")]
    MissingParameter { family: String, name: String },

    /// More positional arguments than declared positional parameters.
    #[error("{family}: takes at most {max} positional parameters ({given} given)")]
    TooManyPositional {
        family: String,
        max: usize,
        given: usize,
    },

    /// A serialized value could not be parsed under the parameter's kind.
    #[error("{family}: invalid value for parameter '{name}': {reason}")]
    InvalidValue {
        family: String,
        name: String,
        reason: String,
    },
}

/// Errors raised by [`Flow`](crate::flow::Flow) insertion.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Auto-rename is disabled and the name is already taken.
    #[error("flow '{flow}': task name '{name}' already exists")]
    NameCollision { flow: String, name: String },

    /// Auto-rename exhausted its bounded number of suffix attempts.
    #[error("flow '{flow}': could not find a unique name for task '{name}'")]
    RenameExhausted { flow: String, name: String },
}

/// Errors raised by bulk completeness checks.
///
/// `Unsupported` is deliberately a distinct variant rather than a general
/// failure: callers are expected to match on it and fall back to one-by-one
/// [`Task::complete`](crate::task::Task::complete) calls.
#[derive(Debug, Error)]
pub enum BulkCompleteError {
    #[error("bulk_complete is not implemented for task family '{family}'")]
    Unsupported { family: String },

    /// Constructing an instance for one of the parameter tuples failed.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Errors raised while materializing the dependency DAG.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cycle detected in task dependency graph involving '{task_id}'")]
    Cycle { task_id: String },
}

/// Error type returned by event callbacks.
#[derive(Debug, Error)]
pub enum EventError {
    /// Aborts dispatch of the remaining callbacks for this trigger.
    #[error("event dispatch cancelled")]
    Cancelled,

    /// Logged and isolated; remaining callbacks still run.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
