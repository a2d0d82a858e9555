// src/param/mod.rs

//! Parameter model: typed, ordered field descriptors for task definitions.
//!
//! Responsibilities:
//! - Define the value space and its serialized string form (`value.rs`).
//! - Define the immutable per-definition descriptors with significance,
//!   visibility, and declaration ordering (`descriptor.rs`).

pub mod descriptor;
pub mod value;

pub use descriptor::{ParamSpec, Visibility};
pub use value::{ParamKind, ParamValue};
