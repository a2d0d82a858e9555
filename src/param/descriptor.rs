// src/param/descriptor.rs

use std::sync::atomic::{AtomicU64, Ordering};

use crate::param::value::{ParamKind, ParamValue};

/// Process-global declaration counter. Parameter ordering is defined by the
/// order `ParamSpec`s are created, stable across definition composition.
static DECLARATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Visibility of a parameter in externally visible serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Included everywhere, participates in the public serialized form.
    Public,
    /// Excluded from public serializations, still visible internally.
    Hidden,
    /// Never included in any externally visible serialization.
    Private,
}

/// An immutable parameter descriptor attached to a task definition.
///
/// Descriptors describe the definition, not an instance: name, kind,
/// default policy, whether the parameter participates in task identity
/// (`significant`), its visibility, and whether it can be filled
/// positionally.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    default: Option<ParamValue>,
    significant: bool,
    visibility: Visibility,
    positional: bool,
    order: u64,
}

impl ParamSpec {
    /// Declare a new parameter. The declaration-order counter is assigned
    /// here, so specs must be created in the order they should be resolved.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            significant: true,
            visibility: Visibility::Public,
            positional: true,
            order: DECLARATION_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Static default used when no value is supplied and the config lookup
    /// has no entry for this parameter.
    pub fn default_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Exclude this parameter from task identity. Insignificant parameters
    /// may vary without producing a different task.
    pub fn insignificant(mut self) -> Self {
        self.significant = false;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn hidden(self) -> Self {
        self.visibility(Visibility::Hidden)
    }

    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Only fillable by name, never positionally.
    pub fn keyword_only(mut self) -> Self {
        self.positional = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn default(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    pub fn significant(&self) -> bool {
        self.significant
    }

    pub fn vis(&self) -> Visibility {
        self.visibility
    }

    pub fn positional(&self) -> bool {
        self.positional
    }

    pub fn order(&self) -> u64 {
        self.order
    }
}
