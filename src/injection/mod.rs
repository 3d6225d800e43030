//! Dependency-injection graph — built once, validated before use.
//!
//! The graph maps abstract dependency types (`TypeId`) to shared concrete
//! providers. It is constructed exactly once per process from an ordered
//! sequence of [`ModuleDescriptor`]s, validated synchronously before anyone
//! can observe it, and immutable afterwards except for the single
//! static-injection pass performed during construction.
//!
//! The application root owns the graph through a [`GraphCell`]; collaborators
//! receive it explicitly, never through ambient static access.

mod module;

pub use module::ModuleDescriptor;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InjectionError {
    /// A declared dependency has no provider in the graph.
    #[error("no binding for {type_name} (required by module {module:?})")]
    MissingBinding {
        type_name: &'static str,
        module: &'static str,
    },

    /// Two modules bind the same type — the graph is ambiguous.
    #[error("ambiguous binding for {type_name}: bound by both {first:?} and {second:?}")]
    AmbiguousBinding {
        type_name: &'static str,
        first: &'static str,
        second: &'static str,
    },

    /// A provider lookup failed at inject/resolve time — a programming error
    /// at the call site (the target declares a dependency nobody binds).
    #[error("no binding for {0}")]
    Unbound(&'static str),

    /// Injection attempted before the graph was built.
    #[error("injection graph has not been built yet")]
    NotBuilt,

    /// A second graph build was attempted in the same process.
    #[error("injection graph already built")]
    AlreadyBuilt,
}

/// A target whose declared dependencies can be populated from the graph.
pub trait Injectable {
    fn inject(&mut self, graph: &InjectionGraph) -> Result<(), InjectionError>;
}

/// Validated, immutable dependency graph.
pub struct InjectionGraph {
    providers: HashMap<TypeId, Provider>,
    module_names: Vec<&'static str>,
}

struct Provider {
    type_name: &'static str,
    module: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for InjectionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionGraph")
            .field("module_names", &self.module_names)
            .finish_non_exhaustive()
    }
}

impl InjectionGraph {
    /// Build and validate a graph from the given module descriptors.
    ///
    /// Validation runs synchronously before the graph is returned: duplicate
    /// bindings for one type and unsatisfied requirements are both
    /// structural errors, fatal to startup. After validation the one-time
    /// static-injection pass runs, consuming every registered hook.
    pub fn build(modules: Vec<ModuleDescriptor>) -> Result<Self, InjectionError> {
        let mut providers: HashMap<TypeId, Provider> = HashMap::new();
        let mut requires: Vec<(TypeId, &'static str, &'static str)> = Vec::new();
        let mut statics = Vec::new();
        let mut module_names = Vec::with_capacity(modules.len());

        for module in modules {
            let module_name = module.name();
            module_names.push(module_name);

            for binding in module.bindings {
                if let Some(existing) = providers.get(&binding.type_id) {
                    return Err(InjectionError::AmbiguousBinding {
                        type_name: binding.type_name,
                        first: existing.module,
                        second: module_name,
                    });
                }
                providers.insert(
                    binding.type_id,
                    Provider {
                        type_name: binding.type_name,
                        module: module_name,
                        value: binding.provider,
                    },
                );
            }

            for (type_id, type_name) in module.requires {
                requires.push((type_id, type_name, module_name));
            }
            statics.extend(module.statics);
        }

        for (type_id, type_name, module) in requires {
            if !providers.contains_key(&type_id) {
                return Err(InjectionError::MissingBinding { type_name, module });
            }
        }

        let graph = Self {
            providers,
            module_names,
        };

        // One-time static-injection pass: hooks are FnOnce and consumed here,
        // so the pass cannot repeat.
        let static_count = statics.len();
        for hook in statics {
            hook(&graph);
        }

        debug!(
            modules = ?graph.module_names,
            bindings = graph.providers.len(),
            static_hooks = static_count,
            "injection graph validated"
        );

        Ok(graph)
    }

    /// Resolve the shared provider bound for `T`.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, InjectionError> {
        let provider = self
            .providers
            .get(&TypeId::of::<T>())
            .ok_or(InjectionError::Unbound(std::any::type_name::<T>()))?;
        Arc::clone(&provider.value)
            .downcast::<T>()
            .map_err(|_| InjectionError::Unbound(provider.type_name))
    }

    /// Populate `target`'s declared dependencies. Side effect only.
    pub fn inject(&self, target: &mut dyn Injectable) -> Result<(), InjectionError> {
        target.inject(self)
    }

    /// Names of the modules the graph was built from, in build order.
    pub fn modules(&self) -> &[&'static str] {
        &self.module_names
    }

    /// Number of bound providers.
    pub fn binding_count(&self) -> usize {
        self.providers.len()
    }
}

/// Root-owned holder for the process's single [`InjectionGraph`].
///
/// Explicit lifecycle: [`GraphCell::init`] once at startup, no teardown —
/// process exit reclaims it. Accessors fail fast until `init` has run.
pub struct GraphCell {
    inner: OnceLock<InjectionGraph>,
}

impl GraphCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Install the built graph. Fails if a graph was already installed.
    pub fn init(&self, graph: InjectionGraph) -> Result<(), InjectionError> {
        self.inner
            .set(graph)
            .map_err(|_| InjectionError::AlreadyBuilt)
    }

    /// Read-only access to the graph. Fails before [`GraphCell::init`].
    pub fn graph(&self) -> Result<&InjectionGraph, InjectionError> {
        self.inner.get().ok_or(InjectionError::NotBuilt)
    }

    /// Inject into `target`, failing fast if no graph has been built yet.
    pub fn inject(&self, target: &mut dyn Injectable) -> Result<(), InjectionError> {
        self.graph()?.inject(target)
    }
}

impl Default for GraphCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Dial {
        limit: u32,
    }

    #[derive(Debug)]
    struct Gauge {
        label: &'static str,
    }

    struct Panel {
        dial: Option<Arc<Dial>>,
    }

    impl Injectable for Panel {
        fn inject(&mut self, graph: &InjectionGraph) -> Result<(), InjectionError> {
            self.dial = Some(graph.resolve::<Dial>()?);
            Ok(())
        }
    }

    fn dial_module() -> ModuleDescriptor {
        ModuleDescriptor::new("dials").bind(Dial { limit: 7 })
    }

    #[test]
    fn build_and_resolve() {
        let graph = InjectionGraph::build(vec![
            dial_module(),
            ModuleDescriptor::new("gauges").bind(Gauge { label: "rpm" }),
        ])
        .unwrap();

        assert_eq!(graph.modules(), &["dials", "gauges"]);
        assert_eq!(graph.binding_count(), 2);
        assert_eq!(graph.resolve::<Dial>().unwrap().limit, 7);
        assert_eq!(graph.resolve::<Gauge>().unwrap().label, "rpm");
    }

    #[test]
    fn duplicate_binding_is_ambiguous() {
        let err = InjectionGraph::build(vec![
            dial_module(),
            ModuleDescriptor::new("spare-dials").bind(Dial { limit: 9 }),
        ])
        .unwrap_err();

        match err {
            InjectionError::AmbiguousBinding { first, second, .. } => {
                assert_eq!(first, "dials");
                assert_eq!(second, "spare-dials");
            }
            other => panic!("expected AmbiguousBinding, got {other:?}"),
        }
    }

    #[test]
    fn unsatisfied_requirement_is_missing() {
        let err = InjectionGraph::build(vec![
            ModuleDescriptor::new("panel").requires::<Dial>(),
        ])
        .unwrap_err();

        match err {
            InjectionError::MissingBinding { module, .. } => assert_eq!(module, "panel"),
            other => panic!("expected MissingBinding, got {other:?}"),
        }
    }

    #[test]
    fn requirement_satisfied_by_other_module() {
        let graph = InjectionGraph::build(vec![
            dial_module(),
            ModuleDescriptor::new("panel").requires::<Dial>(),
        ])
        .unwrap();
        assert_eq!(graph.binding_count(), 1);
    }

    #[test]
    fn static_pass_runs_exactly_once_after_validation() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let graph = InjectionGraph::build(vec![dial_module().static_inject(|g| {
            // validation has already happened: the binding is resolvable here
            assert_eq!(g.resolve::<Dial>().unwrap().limit, 7);
            CALLS.fetch_add(1, Ordering::SeqCst);
        })])
        .unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        // nothing on the built graph can re-run the pass
        let _ = graph.resolve::<Dial>().unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn static_pass_skipped_on_invalid_graph() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let result = InjectionGraph::build(vec![
            ModuleDescriptor::new("panel")
                .requires::<Dial>()
                .static_inject(|_| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                }),
        ]);

        assert!(result.is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inject_populates_declared_dependencies() {
        let graph = InjectionGraph::build(vec![dial_module()]).unwrap();
        let mut panel = Panel { dial: None };
        graph.inject(&mut panel).unwrap();
        assert_eq!(panel.dial.unwrap().limit, 7);
    }

    #[test]
    fn inject_unbound_dependency_fails() {
        let graph = InjectionGraph::build(vec![ModuleDescriptor::new("empty")]).unwrap();
        let mut panel = Panel { dial: None };
        let err = graph.inject(&mut panel).unwrap_err();
        assert!(matches!(err, InjectionError::Unbound(_)));
    }

    #[test]
    fn cell_inject_before_build_fails() {
        let cell = GraphCell::new();
        let mut panel = Panel { dial: None };
        let err = cell.inject(&mut panel).unwrap_err();
        assert!(matches!(err, InjectionError::NotBuilt));
        assert!(matches!(cell.graph(), Err(InjectionError::NotBuilt)));
    }

    #[test]
    fn cell_initializes_exactly_once() {
        let cell = GraphCell::new();
        cell.init(InjectionGraph::build(vec![dial_module()]).unwrap())
            .unwrap();

        let again = InjectionGraph::build(vec![dial_module()]).unwrap();
        assert!(matches!(
            cell.init(again),
            Err(InjectionError::AlreadyBuilt)
        ));

        // first graph still installed and usable
        let mut panel = Panel { dial: None };
        cell.inject(&mut panel).unwrap();
        assert_eq!(panel.dial.unwrap().limit, 7);
    }
}
