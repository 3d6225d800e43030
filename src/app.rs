//! Application root — owns the graph and runs the bootstrap sequence.
//!
//! Startup order is strict:
//!   1. Build and validate the injection graph (everything else may depend
//!      on injected objects).
//!   2. Register the process-lifetime preference observer.
//!   3. Initialize the crash reporter.
//!   4. Ensure the monitor daemon is running (idempotent check-then-start).
//!
//! Any failure in steps 1–3 aborts startup; step 4 is best-effort by
//! contract.

use std::sync::{Arc, OnceLock};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crash::{self, CrashContext, FileTransport};
use crate::error::AppError;
use crate::injection::{GraphCell, Injectable, InjectionGraph, ModuleDescriptor};
use crate::logger;
use crate::memstat;
use crate::monitor::{ServiceState, ServiceSupervisor};
use crate::prefs::{PrefChangeEvent, PrefStore};
use crate::settings::{DEBUG_LOGGING, SchemaKeyResolver};
use crate::version_string;

/// The application root's shared surface, bound into the graph as the one
/// module the application itself contributes.
#[derive(Clone)]
pub struct AppHandle {
    pub version: String,
    pub config: Arc<Config>,
    pub prefs: Arc<PrefStore>,
}

// Legacy static injection point. Populated exactly once by the graph's
// static pass so pre-graph call sites can reach the preference store.
// TODO: remove once the daemon IPC layer takes AppHandle explicitly.
static LEGACY_PREFS: OnceLock<Arc<PrefStore>> = OnceLock::new();

/// Legacy accessor for the preference store — migration shim only.
pub fn legacy_prefs() -> Option<Arc<PrefStore>> {
    LEGACY_PREFS.get().cloned()
}

/// The application root. Exactly one per process; owns the injection graph,
/// the preference observer, and the service supervisor.
pub struct App {
    config: Arc<Config>,
    graph: GraphCell,
    prefs: Arc<PrefStore>,
    supervisor: ServiceSupervisor,
    observer_cancel: CancellationToken,
    // Retained for the life of the process; never unsubscribed in production.
    observer_task: JoinHandle<()>,
}

impl App {
    /// Bootstrap with production collaborators.
    pub async fn bootstrap(config: Config) -> Result<Self, AppError> {
        let supervisor = ServiceSupervisor::from_config(&config.monitor);
        Self::bootstrap_with(config, supervisor).await
    }

    /// Bootstrap with an explicit supervisor (tests substitute fakes here).
    pub async fn bootstrap_with(
        config: Config,
        supervisor: ServiceSupervisor,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let version = version_string();

        info!(
            app = %config.app_name,
            version = %version,
            work_dir = %config.work_dir.display(),
            "bootstrapping"
        );

        let prefs = Arc::new(PrefStore::open(&config.prefs_path())?);

        // 1. Injection graph: build, validate, one-time static pass.
        let handle = AppHandle {
            version: version.clone(),
            config: Arc::clone(&config),
            prefs: Arc::clone(&prefs),
        };
        let graph = InjectionGraph::build(vec![app_module(handle)])?;
        let cell = GraphCell::new();
        cell.init(graph)?;

        // 2. Preference observer, subscribed for the life of the process.
        let observer_cancel = CancellationToken::new();
        let observer_task = spawn_pref_observer(
            version.clone(),
            prefs.subscribe(),
            observer_cancel.clone(),
        );

        // 3. Crash reporter: custom file transport replaces the default,
        //    individual keys excluded via the schema resolver.
        crash::init(CrashContext {
            version,
            prefs: Arc::clone(&prefs),
            resolver: Arc::new(SchemaKeyResolver),
            transport: Arc::new(FileTransport::new(config.crash_dir())?),
        })?;

        memstat::log_report(&memstat::sample());

        // 4. Monitor daemon, last: check-then-start, fire-and-forget.
        let state = supervisor.ensure_running(&config.monitor.service_name);
        if state == ServiceState::Absent {
            info!(service = %config.monitor.service_name, "start request issued");
        }

        info!("bootstrap complete");
        Ok(Self {
            config,
            graph: cell,
            prefs,
            supervisor,
            observer_cancel,
            observer_task,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn prefs(&self) -> &Arc<PrefStore> {
        &self.prefs
    }

    pub fn supervisor(&self) -> &ServiceSupervisor {
        &self.supervisor
    }

    /// Read-only access to the validated graph.
    pub fn graph(&self) -> Result<&InjectionGraph, AppError> {
        Ok(self.graph.graph()?)
    }

    /// Populate `target`'s declared dependencies from the graph.
    pub fn inject(&self, target: &mut dyn Injectable) -> Result<(), AppError> {
        Ok(self.graph.inject(target)?)
    }

    /// Tear down the observer task. Production never calls this — the
    /// subscription is designed to live exactly as long as the process —
    /// but tests and embedders need a clean stop.
    pub async fn shutdown(self) {
        self.observer_cancel.cancel();
        if self.observer_task.await.is_err() {
            warn!("preference observer task panicked during shutdown");
        }
        info!("shutdown complete");
    }
}

/// The application's module descriptor: itself, as a bound value, plus the
/// legacy static injection hook.
fn app_module(handle: AppHandle) -> ModuleDescriptor {
    let prefs = Arc::clone(&handle.prefs);
    ModuleDescriptor::new("app")
        .bind(handle)
        .requires::<AppHandle>()
        .static_inject(move |_graph| {
            let _ = LEGACY_PREFS.set(prefs);
        })
}

/// Decide how to react to one preference change.
///
/// `Some(debug_enabled)` when the debug-logging flag changed (absent value
/// defaults to false); `None` for every other key.
fn observer_reaction(event: &PrefChangeEvent) -> Option<bool> {
    if event.key == DEBUG_LOGGING {
        Some(event.snapshot.get_bool(DEBUG_LOGGING, false))
    } else {
        None
    }
}

/// Run the observer loop until cancelled or the store is dropped.
fn spawn_pref_observer(
    version: String,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<PrefChangeEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("preference observer stopping");
                    break;
                }

                event = rx.recv() => {
                    match event {
                        Some(event) => match observer_reaction(&event) {
                            Some(debug_enabled) => {
                                if let Err(e) = logger::reinit(&version, debug_enabled) {
                                    warn!(%e, "logger reinit failed");
                                }
                            }
                            None => debug!(key = %event.key, "ignoring preference change"),
                        },
                        None => {
                            debug!("preference store dropped, observer exiting");
                            break;
                        }
                    }
                }
            }
        }
    })
}
