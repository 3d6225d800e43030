//! Module descriptors — declarative units of dependency bindings.
//!
//! A [`ModuleDescriptor`] is an opaque value handed to
//! [`InjectionGraph::build`](crate::injection::InjectionGraph::build): a set
//! of type-keyed bindings, the set of types those bindings require from the
//! rest of the graph, and any one-shot static-injection hooks.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::injection::InjectionGraph;

/// One concrete provider keyed by the abstract type it satisfies.
pub(crate) struct Binding {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) provider: Arc<dyn Any + Send + Sync>,
}

/// Hook run exactly once after graph validation.
///
/// Migration shim for legacy non-instance injection points; remove once all
/// consumers accept explicit dependency passing.
pub(crate) type StaticHook = Box<dyn FnOnce(&InjectionGraph) + Send>;

/// A named unit of dependency bindings.
pub struct ModuleDescriptor {
    name: &'static str,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) requires: Vec<(TypeId, &'static str)>,
    pub(crate) statics: Vec<StaticHook>,
}

impl ModuleDescriptor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            bindings: Vec::new(),
            requires: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind an owned value as the provider for its own type.
    pub fn bind<T: Any + Send + Sync>(self, value: T) -> Self {
        self.bind_shared(Arc::new(value))
    }

    /// Bind an already-shared value as the provider for its type.
    pub fn bind_shared<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        self.bindings.push(Binding {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            provider: value,
        });
        self
    }

    /// Declare that this module's bindings depend on `T` being bound
    /// somewhere in the graph. Checked during validation.
    pub fn requires<T: Any>(mut self) -> Self {
        self.requires.push((TypeId::of::<T>(), type_name::<T>()));
        self
    }

    /// Register a one-shot static-injection hook, run after validation.
    pub fn static_inject(mut self, hook: impl FnOnce(&InjectionGraph) + Send + 'static) -> Self {
        self.statics.push(Box::new(hook));
        self
    }
}
