//! Service supervisor — idempotent check-then-start for the monitor daemon.
//!
//! Two observable states per service: `Absent` and `Running`. The only
//! transition the supervisor drives is `Absent -> Running`, by issuing one
//! start request; a service found running is left alone.
//!
//! The check and the start are not transactional. Another actor stopping the
//! service between them, or a concurrent `ensure_running`, can produce
//! duplicate start requests; the daemon is assumed (not verified) to be
//! idempotent under duplicate starts.

mod registry;

pub use registry::{ProcessTable, ServiceRecord, ServiceRegistry};

use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::AppError;

/// Enumeration bound applied to registry queries.
pub const DEFAULT_MAX_ENUMERATION: usize = i32::MAX as usize;

/// Point-in-time service state as observed by a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Absent,
    Running,
}

/// Issues service start requests. Fire-and-forget: implementations must not
/// wait for the service to finish starting.
pub trait ServiceLauncher: Send + Sync {
    fn start(&self, service_name: &str) -> Result<(), AppError>;
}

/// Production launcher: spawns the configured daemon command detached from
/// the host's stdio. The child manages its own lifecycle from there.
pub struct CommandLauncher {
    command: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

impl ServiceLauncher for CommandLauncher {
    fn start(&self, service_name: &str) -> Result<(), AppError> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AppError::Service(format!(
                    "cannot start {service_name} ({}): {e}",
                    self.command
                ))
            })?;
        Ok(())
    }
}

/// Check-then-start supervisor over a registry and a launcher.
pub struct ServiceSupervisor {
    registry: Arc<dyn ServiceRegistry>,
    launcher: Arc<dyn ServiceLauncher>,
    max_enumeration: usize,
}

impl ServiceSupervisor {
    pub fn new(registry: Arc<dyn ServiceRegistry>, launcher: Arc<dyn ServiceLauncher>) -> Self {
        Self {
            registry,
            launcher,
            max_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }

    /// Production supervisor for the configured monitor daemon.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            Arc::new(ProcessTable::new()),
            Arc::new(CommandLauncher::new(
                config.command.clone(),
                config.args.clone(),
            )),
        )
    }

    /// Lower the enumeration bound (tests; production keeps the default).
    pub fn with_max_enumeration(mut self, max_enumeration: usize) -> Self {
        self.max_enumeration = max_enumeration;
        self
    }

    /// Point-in-time check: is a service with exactly this name running?
    ///
    /// Exact, case-sensitive match. Not synchronized with concurrent
    /// starts/stops by other actors.
    pub fn is_service_running(&self, service_name: &str) -> bool {
        self.registry
            .list_running(self.max_enumeration)
            .iter()
            .any(|record| record.name == service_name)
    }

    /// Check, and issue a single start request if the service is absent.
    ///
    /// Returns the state observed at check time. The start request is
    /// best-effort and unchecked: no wait for startup completion, no retry,
    /// and a synchronous spawn failure is only logged.
    pub fn ensure_running(&self, service_name: &str) -> ServiceState {
        if self.is_service_running(service_name) {
            debug!(service = service_name, "service already running");
            return ServiceState::Running;
        }

        info!(service = service_name, "service absent, issuing start request");
        if let Err(e) = self.launcher.start(service_name) {
            warn!(service = service_name, %e, "start request failed");
        }
        ServiceState::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory registry fake; the name list stands in for the OS table.
    pub(crate) struct FakeRegistry {
        names: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        pub(crate) fn with_names(names: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                names: Mutex::new(names.iter().map(|s| s.to_string()).collect()),
            })
        }

        pub(crate) fn add(&self, name: &str) {
            self.names.lock().unwrap().push(name.to_string());
        }
    }

    impl ServiceRegistry for FakeRegistry {
        fn list_running(&self, max_count: usize) -> Vec<ServiceRecord> {
            self.names
                .lock()
                .unwrap()
                .iter()
                .take(max_count)
                .enumerate()
                .map(|(i, name)| ServiceRecord {
                    name: name.clone(),
                    pid: i as u32 + 1,
                })
                .collect()
        }
    }

    /// Launcher fake counting start requests per service name.
    pub(crate) struct CountingLauncher {
        pub(crate) starts: Mutex<Vec<String>>,
    }

    impl CountingLauncher {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                starts: Mutex::new(Vec::new()),
            })
        }
    }

    impl ServiceLauncher for CountingLauncher {
        fn start(&self, service_name: &str) -> Result<(), AppError> {
            self.starts.lock().unwrap().push(service_name.to_string());
            Ok(())
        }
    }

    fn supervisor(
        registry: Arc<FakeRegistry>,
        launcher: Arc<CountingLauncher>,
    ) -> ServiceSupervisor {
        ServiceSupervisor::new(registry, launcher)
    }

    #[test]
    fn running_check_requires_exact_match() {
        let registry = FakeRegistry::with_names(&["Monitor", "monitord"]);
        let sup = supervisor(registry, CountingLauncher::new());

        assert!(sup.is_service_running("Monitor"));
        assert!(sup.is_service_running("monitord"));
        assert!(!sup.is_service_running("monitor")); // case-sensitive
        assert!(!sup.is_service_running("Monito")); // no prefix match
    }

    #[test]
    fn enumeration_cap_bounds_the_check() {
        let registry = FakeRegistry::with_names(&["first", "Monitor"]);
        let launcher = CountingLauncher::new();
        let sup = supervisor(registry, launcher).with_max_enumeration(1);

        // "Monitor" sits beyond the cap, so the bounded check cannot see it
        assert!(!sup.is_service_running("Monitor"));
        assert!(sup.is_service_running("first"));
    }

    #[test]
    fn ensure_running_starts_only_when_absent() {
        let registry = FakeRegistry::with_names(&[]);
        let launcher = CountingLauncher::new();
        let sup = supervisor(Arc::clone(&registry), Arc::clone(&launcher));

        assert_eq!(sup.ensure_running("Monitor"), ServiceState::Absent);
        assert_eq!(launcher.starts.lock().unwrap().as_slice(), ["Monitor"]);

        // simulate the daemon now present: no further start requests
        registry.add("Monitor");
        assert_eq!(sup.ensure_running("Monitor"), ServiceState::Running);
        assert_eq!(launcher.starts.lock().unwrap().len(), 1);
    }

    #[test]
    fn start_failure_is_swallowed() {
        struct FailingLauncher;
        impl ServiceLauncher for FailingLauncher {
            fn start(&self, name: &str) -> Result<(), AppError> {
                Err(AppError::Service(format!("cannot start {name}")))
            }
        }

        let registry = FakeRegistry::with_names(&[]);
        let sup = ServiceSupervisor::new(registry, Arc::new(FailingLauncher));
        // best-effort: the failed start request is logged, not propagated
        assert_eq!(sup.ensure_running("Monitor"), ServiceState::Absent);
    }

    #[test]
    fn command_launcher_error_names_service_and_command() {
        let launcher = CommandLauncher::new("/nonexistent/vigil-monitord".into(), vec![]);
        let err = launcher.start("vigil-monitord").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("vigil-monitord"));
        assert!(msg.contains("/nonexistent/vigil-monitord"));
    }
}
