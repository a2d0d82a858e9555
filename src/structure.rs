// src/structure.rs

//! Recursive task/output nesting.
//!
//! `requires()` and `output()` may describe a single value, an ordered list,
//! or a keyed mapping, nested arbitrarily. Rather than inspecting types at
//! runtime, the nesting is modeled as a tagged variant: [`Structure`]. The
//! flattening and shape-preserving mapping operations become plain structural
//! recursion.

/// A nested structure of leaf values.
///
/// Map entries keep their insertion order; flattening and grafting never
/// reorder anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structure<T> {
    /// No value at all. Flattens to the empty list.
    None,
    /// A single bare value.
    Leaf(T),
    /// An ordered sequence of substructures.
    List(Vec<Structure<T>>),
    /// An ordered, keyed mapping of substructures.
    Map(Vec<(String, Structure<T>)>),
}

impl<T> Structure<T> {
    /// Single leaf value.
    pub fn leaf(value: T) -> Self {
        Structure::Leaf(value)
    }

    /// Ordered list of leaves.
    pub fn list(values: impl IntoIterator<Item = T>) -> Self {
        Structure::List(values.into_iter().map(Structure::Leaf).collect())
    }

    /// Ordered map of name to leaf.
    pub fn map(entries: impl IntoIterator<Item = (String, T)>) -> Self {
        Structure::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, Structure::Leaf(v)))
                .collect(),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Structure::None)
    }

    /// Flat, order-preserving list of all leaf values.
    ///
    /// Lists contribute their elements in order; maps contribute their
    /// values in entry order.
    pub fn flatten(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut flat = Vec::new();
        self.collect_into(&mut flat);
        flat
    }

    fn collect_into(&self, flat: &mut Vec<T>)
    where
        T: Clone,
    {
        match self {
            Structure::None => {}
            Structure::Leaf(v) => flat.push(v.clone()),
            Structure::List(items) => {
                for item in items {
                    item.collect_into(flat);
                }
            }
            Structure::Map(entries) => {
                for (_, item) in entries {
                    item.collect_into(flat);
                }
            }
        }
    }

    /// Shape-preserving map where each leaf is replaced by a whole
    /// substructure.
    ///
    /// A bare leaf maps to its replacement directly (not wrapped in a
    /// singleton list), which is what lets a task's `output()` structure be
    /// grafted in place of the task itself.
    pub fn graft<U>(&self, f: &impl Fn(&T) -> Structure<U>) -> Structure<U> {
        match self {
            Structure::None => Structure::None,
            Structure::Leaf(v) => f(v),
            Structure::List(items) => {
                Structure::List(items.iter().map(|item| item.graft(f)).collect())
            }
            Structure::Map(entries) => Structure::Map(
                entries
                    .iter()
                    .map(|(k, item)| (k.clone(), item.graft(f)))
                    .collect(),
            ),
        }
    }
}

impl<T> Default for Structure<T> {
    fn default() -> Self {
        Structure::None
    }
}

impl<T> From<T> for Structure<T> {
    fn from(value: T) -> Self {
        Structure::Leaf(value)
    }
}

impl<T> From<Vec<T>> for Structure<T> {
    fn from(values: Vec<T>) -> Self {
        Structure::list(values)
    }
}
