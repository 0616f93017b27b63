//! Registry trait and default implementation for declared mixins.

use crate::error::{EngineError, EngineResult};
use crate::mixin::Mixin;
use std::collections::HashMap;
use std::sync::Arc;

/// A lookup scope for declared mixins.
///
/// This trait defines the interface for declaring and retrieving mixin
/// entries. It is object-safe and can be used as `dyn MixinRegistry`, which
/// is how declarative sources receive it while they evaluate `include`
/// directives.
///
/// # Example
///
/// ```
/// use grove::mixin::{DefaultMixinRegistry, Mixin, MixinRegistry};
///
/// let mut registry = DefaultMixinRegistry::new();
/// registry.declare(Mixin::new("exec")).unwrap();
///
/// assert!(registry.contains("exec"));
/// assert_eq!(registry.len(), 1);
/// ```
pub trait MixinRegistry {
    /// Declare a mixin, consuming it and returning the shared entry.
    ///
    /// Returns a `DuplicateMixin` error if the name is already taken in
    /// this registry.
    fn declare(&mut self, mixin: Mixin) -> EngineResult<Arc<Mixin>>;

    /// Get a declared mixin by name.
    fn get(&self, name: &str) -> Option<Arc<Mixin>>;

    /// Check whether a mixin is declared.
    fn contains(&self, name: &str) -> bool;

    /// Names of all declared mixins.
    fn names(&self) -> Vec<&str>;

    /// Number of declared mixins.
    fn len(&self) -> usize;

    /// Whether the registry is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default implementation of [`MixinRegistry`] backed by a HashMap.
#[derive(Debug, Default)]
pub struct DefaultMixinRegistry {
    mixins: HashMap<String, Arc<Mixin>>,
}

impl DefaultMixinRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over all declared mixins.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<Mixin>)> {
        self.mixins.iter()
    }
}

impl MixinRegistry for DefaultMixinRegistry {
    fn declare(&mut self, mixin: Mixin) -> EngineResult<Arc<Mixin>> {
        if self.mixins.contains_key(mixin.name()) {
            return Err(EngineError::duplicate_mixin(mixin.name()));
        }
        let entry = Arc::new(mixin);
        self.mixins.insert(entry.name().to_string(), entry.clone());
        Ok(entry)
    }

    fn get(&self, name: &str) -> Option<Arc<Mixin>> {
        self.mixins.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.mixins.contains_key(name)
    }

    fn names(&self) -> Vec<&str> {
        self.mixins.keys().map(|s| s.as_str()).collect()
    }

    fn len(&self) -> usize {
        self.mixins.len()
    }
}
