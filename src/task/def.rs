// src/task/def.rs

//! Task definitions and the construction protocol.
//!
//! A [`TaskDef`] is the static schema of a task family: its (optionally
//! namespaced) name plus an ordered list of parameter descriptors. It is
//! built once during init, wrapped in an `Arc`, and never mutated.
//!
//! [`TaskDef::build`] resolves construction arguments into a [`TaskCore`],
//! the immutable identity record carried by every task instance. Identity
//! deliberately keys off the *family name* and serialized significant
//! parameters, not the Rust type: two definitions sharing a family and
//! parameter values produce colliding ids. That is a documented sharp edge
//! kept for cross-version id stability, not a defect to correct here.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, Mutex};

use tracing::warn;

use crate::config::{self, ConfigLookup};
use crate::errors::ParameterError;
use crate::param::{ParamSpec, ParamValue, Visibility};
use crate::task::id::task_id_str;

/// Memo of config keys already warned about, shared across threads since
/// task construction may happen concurrently.
static WARNED_UNCONSUMED: LazyLock<Mutex<HashSet<String>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Static, immutable schema for a task family.
#[derive(Debug)]
pub struct TaskDef {
    namespace: Option<String>,
    name: String,
    /// Sorted by declaration counter at build time.
    params: Vec<ParamSpec>,
    /// Config keys deliberately not consumed by any parameter; suppresses
    /// the unconsumed-key warning for them.
    ignore_unconsumed: HashSet<String>,
}

impl TaskDef {
    pub fn builder(name: impl Into<String>) -> TaskDefBuilder {
        TaskDefBuilder {
            namespace: None,
            name: name.into(),
            params: Vec::new(),
            ignore_unconsumed: HashSet::new(),
        }
    }

    /// Canonical family name: `namespace.Name`, or the bare name when no
    /// namespace is set.
    pub fn family(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Declared parameters, in declaration order (inherited ones included).
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Parameter names; insignificant ones are skipped unless
    /// `include_insignificant` is set.
    pub fn param_names(&self, include_insignificant: bool) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| include_insignificant || p.significant())
            .map(|p| p.name())
            .collect()
    }

    /// Resolve construction arguments into an immutable [`TaskCore`].
    ///
    /// Resolution order per parameter: supplied value (positional or named),
    /// then the static default, then the installed config lookup keyed by
    /// `(family, name)`. Absence of all three is a
    /// [`ParameterError::MissingParameter`].
    pub fn build(self: &Arc<Self>, args: TaskArgs) -> Result<TaskCore, ParameterError> {
        let family = self.family();
        let mut values: Vec<Option<ParamValue>> = vec![None; self.params.len()];

        let positional: Vec<usize> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.positional())
            .map(|(i, _)| i)
            .collect();

        if args.positional.len() > positional.len() {
            return Err(ParameterError::TooManyPositional {
                family,
                max: positional.len(),
                given: args.positional.len(),
            });
        }

        for (i, value) in args.positional.into_iter().enumerate() {
            let idx = positional[i];
            values[idx] = Some(self.params[idx].kind().normalize(value));
        }

        for (name, value) in args.named {
            let idx = self
                .params
                .iter()
                .position(|p| p.name() == name)
                .ok_or_else(|| ParameterError::UnknownParameter {
                    family: family.clone(),
                    name: name.clone(),
                })?;
            if values[idx].is_some() {
                return Err(ParameterError::DuplicateParameter {
                    family: family.clone(),
                    name,
                });
            }
            values[idx] = Some(self.params[idx].kind().normalize(value));
        }

        let lookup = config::get();
        for (idx, spec) in self.params.iter().enumerate() {
            if values[idx].is_some() {
                continue;
            }
            values[idx] = Some(match spec.default() {
                Some(default) => spec.kind().normalize(default.clone()),
                None => match lookup.get_value(&family, spec.name()) {
                    Some(raw) => spec.kind().parse(&raw).map_err(|reason| {
                        ParameterError::InvalidValue {
                            family: family.clone(),
                            name: spec.name().to_string(),
                            reason,
                        }
                    })?,
                    None => {
                        return Err(ParameterError::MissingParameter {
                            family,
                            name: spec.name().to_string(),
                        });
                    }
                },
            });
        }

        let values: Vec<ParamValue> = values.into_iter().map(|v| v.expect("all filled")).collect();

        // Wrong-kind values are informational, never fatal.
        for (spec, value) in self.params.iter().zip(&values) {
            if !spec.kind().accepts(value) {
                warn!(
                    family = %family,
                    param = spec.name(),
                    expected = ?spec.kind(),
                    got = value.kind_name(),
                    "parameter value does not match its declared kind"
                );
            }
        }

        self.warn_unconsumed(&family, lookup.as_ref());

        let id = task_id_str(&family, &str_params(self, &values, true, true));

        Ok(TaskCore {
            def: self.clone(),
            values,
            id,
        })
    }

    /// Construct from a serialized name -> value mapping, the inverse of
    /// [`TaskCore::to_str_params`]. Keys not matching a declared parameter
    /// are ignored; parameters absent from the mapping fall back to their
    /// defaults.
    pub fn from_str_params(
        self: &Arc<Self>,
        params: &BTreeMap<String, String>,
    ) -> Result<TaskCore, ParameterError> {
        let args = self.args_from_str_params(params)?;
        self.build(args)
    }

    /// Parse a serialized mapping into named construction arguments without
    /// building. Used by factories that construct their own instance type.
    pub fn args_from_str_params(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<TaskArgs, ParameterError> {
        let family = self.family();
        let mut args = TaskArgs::new();
        for spec in &self.params {
            if let Some(raw) = params.get(spec.name()) {
                let value = spec.kind().parse(raw).map_err(|reason| {
                    ParameterError::InvalidValue {
                        family: family.clone(),
                        name: spec.name().to_string(),
                        reason,
                    }
                })?;
                args = args.set(spec.name(), value);
            }
        }
        Ok(args)
    }

    /// Warn, at most once per family+key for the process lifetime, about
    /// config section keys no declared parameter consumes.
    fn warn_unconsumed(&self, family: &str, lookup: &dyn ConfigLookup) {
        for (key, value) in lookup.section_items(family) {
            if self.param(&key).is_some() || self.ignore_unconsumed.contains(&key) {
                continue;
            }
            let composite = format!("{family}_{key}");
            let mut warned = WARNED_UNCONSUMED.lock().expect("memo lock poisoned");
            if warned.insert(composite) {
                warn!(
                    family = %family,
                    key = %key,
                    value = %value,
                    "configuration contains a key not consumed by the task"
                );
            }
        }
    }
}

/// Builder for [`TaskDef`]; collects parameter descriptors in declaration
/// order.
pub struct TaskDefBuilder {
    namespace: Option<String>,
    name: String,
    params: Vec<ParamSpec>,
    ignore_unconsumed: HashSet<String>,
}

impl TaskDefBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Inherit all parameter descriptors from another definition. Ordering
    /// stays stable across composition because descriptors keep their
    /// original declaration counters.
    pub fn inherit(mut self, other: &TaskDef) -> Self {
        self.params.extend(other.params.iter().cloned());
        self
    }

    /// Mark a config key as deliberately unconsumed.
    pub fn ignore_unconsumed(mut self, key: impl Into<String>) -> Self {
        self.ignore_unconsumed.insert(key.into());
        self
    }

    pub fn build(mut self) -> Arc<TaskDef> {
        self.params.sort_by_key(|p| p.order());
        Arc::new(TaskDef {
            namespace: self.namespace,
            name: self.name,
            params: self.params,
            ignore_unconsumed: self.ignore_unconsumed,
        })
    }
}

/// Positional and named construction arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskArgs {
    positional: Vec<ParamValue>,
    named: Vec<(String, ParamValue)>,
}

impl TaskArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument; fills declared positional parameters
    /// left to right.
    pub fn pos(mut self, value: impl Into<ParamValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a parameter by name.
    pub fn set(mut self, name: impl AsRef<str>, value: impl Into<ParamValue>) -> Self {
        self.named.push((name.as_ref().to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// The immutable identity record of a task instance.
///
/// Holds the definition, the resolved values (parallel to the definition's
/// ordered parameters), and the derived `task_id`. Equality and hashing go
/// through `(definition identity, task_id)` only; parameter values are not
/// compared directly because the id already fingerprints them (with the
/// documented truncation collision risk).
#[derive(Debug, Clone)]
pub struct TaskCore {
    def: Arc<TaskDef>,
    values: Vec<ParamValue>,
    id: String,
}

impl TaskCore {
    pub fn def(&self) -> &Arc<TaskDef> {
        &self.def
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn family(&self) -> String {
        self.def.family()
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.def
            .params()
            .iter()
            .position(|p| p.name() == name)
            .map(|idx| &self.values[idx])
    }

    /// Descriptor/value pairs in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&ParamSpec, &ParamValue)> {
        self.def.params().iter().zip(self.values.iter())
    }

    /// Serialized name -> value mapping.
    ///
    /// Private parameters are always excluded; `only_significant` and
    /// `only_public` narrow further. The significant+public form feeds the
    /// task id and must round-trip through
    /// [`TaskDef::from_str_params`].
    pub fn to_str_params(
        &self,
        only_significant: bool,
        only_public: bool,
    ) -> BTreeMap<String, String> {
        str_params(&self.def, &self.values, only_significant, only_public)
    }

    /// Construct a related instance of the same definition, reusing current
    /// values for anything `overrides` does not name.
    pub fn clone_with(&self, overrides: TaskArgs) -> Result<TaskCore, ParameterError> {
        self.clone_as(&self.def.clone(), overrides)
    }

    /// Like [`clone_with`](Self::clone_with) but targeting another
    /// definition; shared parameter names carry their current values over.
    ///
    /// Positional overrides fill the target's declared positional parameters
    /// left to right, exactly as in [`TaskDef::build`]; supplying the same
    /// parameter both ways is a [`ParameterError::DuplicateParameter`].
    pub fn clone_as(
        &self,
        def: &Arc<TaskDef>,
        overrides: TaskArgs,
    ) -> Result<TaskCore, ParameterError> {
        let positional: Vec<&str> = def
            .params()
            .iter()
            .filter(|p| p.positional())
            .map(|p| p.name())
            .collect();
        if overrides.positional.len() > positional.len() {
            return Err(ParameterError::TooManyPositional {
                family: def.family(),
                max: positional.len(),
                given: overrides.positional.len(),
            });
        }

        let mut named: Vec<(String, ParamValue)> = overrides
            .positional
            .into_iter()
            .enumerate()
            .map(|(i, value)| (positional[i].to_string(), value))
            .collect();
        named.extend(overrides.named);

        let mut args = TaskArgs::new();
        for spec in def.params() {
            if named.iter().any(|(n, _)| n == spec.name()) {
                continue;
            }
            if let Some(value) = self.value(spec.name()) {
                args = args.set(spec.name(), value.clone());
            }
        }
        for (name, value) in named {
            args = args.set(name, value);
        }
        def.build(args)
    }
}

fn str_params(
    def: &TaskDef,
    values: &[ParamValue],
    only_significant: bool,
    only_public: bool,
) -> BTreeMap<String, String> {
    def.params()
        .iter()
        .zip(values)
        .filter(|(spec, _)| spec.vis() != Visibility::Private)
        .filter(|(spec, _)| !only_significant || spec.significant())
        .filter(|(spec, _)| !only_public || spec.vis() == Visibility::Public)
        .map(|(spec, value)| (spec.name().to_string(), value.serialize()))
        .collect()
}

impl PartialEq for TaskCore {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.id == other.id
    }
}

impl Eq for TaskCore {}

impl Hash for TaskCore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TaskCore {
    /// Renders like `MyTask(count=5, name=x)`, significant parameters only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .params()
            .filter(|(spec, _)| spec.significant())
            .map(|(spec, value)| format!("{}={}", spec.name(), value.serialize()))
            .collect();
        write!(f, "{}({})", self.family(), parts.join(", "))
    }
}
