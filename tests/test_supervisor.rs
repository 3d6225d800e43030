//! Integration tests for the check-then-start service supervisor.
//!
//! Run with:
//!   cargo test --test test_supervisor

use std::sync::{Arc, Mutex};

use vigil_host::error::AppError;
use vigil_host::monitor::{
    ServiceLauncher, ServiceRecord, ServiceRegistry, ServiceState, ServiceSupervisor,
};

// ── helpers ──────────────────────────────────────────────────────────────────

/// Registry fake whose name list stands in for the OS process table.
struct TableStub {
    names: Mutex<Vec<String>>,
}

impl TableStub {
    fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: Mutex::new(names.iter().map(|s| s.to_string()).collect()),
        })
    }

    fn add(&self, name: &str) {
        self.names.lock().unwrap().push(name.to_string());
    }
}

impl ServiceRegistry for TableStub {
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

/// Launcher fake recording every start request. When `registers` is set, a
/// started service also appears in the stub table, like a real daemon would.
struct LauncherStub {
    starts: Mutex<Vec<String>>,
    registers: Option<Arc<TableStub>>,
}

impl LauncherStub {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            starts: Mutex::new(Vec::new()),
            registers: None,
        })
    }

    fn registering(table: Arc<TableStub>) -> Arc<Self> {
        Arc::new(Self {
            starts: Mutex::new(Vec::new()),
            registers: Some(table),
        })
    }

    fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }
}

impl ServiceLauncher for LauncherStub {
    fn start(&self, service_name: &str) -> Result<(), AppError> {
        self.starts.lock().unwrap().push(service_name.to_string());
        if let Some(table) = &self.registers {
            table.add(service_name);
        }
        Ok(())
    }
}

// ── check-then-start ──────────────────────────────────────────────────────────

#[test]
fn absent_service_gets_exactly_one_start_request() {
    let table = TableStub::new(&["init", "sshd"]);
    let launcher = LauncherStub::registering(Arc::clone(&table));
    let sup = ServiceSupervisor::new(table, Arc::clone(&launcher) as Arc<dyn ServiceLauncher>);

    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Absent);
    assert_eq!(launcher.start_count(), 1);

    // now that the daemon registered itself, repeated calls are no-ops
    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Running);
    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Running);
    assert_eq!(launcher.start_count(), 1);
}

#[test]
fn running_service_is_left_alone() {
    let table = TableStub::new(&["vigil-monitord"]);
    let launcher = LauncherStub::new();
    let sup = ServiceSupervisor::new(table, Arc::clone(&launcher) as Arc<dyn ServiceLauncher>);

    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Running);
    assert_eq!(launcher.start_count(), 0);
}

#[test]
fn name_match_is_exact_and_case_sensitive() {
    let table = TableStub::new(&["Vigil-Monitord", "vigil-monitord-helper"]);
    let launcher = LauncherStub::new();
    let sup = ServiceSupervisor::new(table, Arc::clone(&launcher) as Arc<dyn ServiceLauncher>);

    // neither a case variant nor a prefixed sibling counts as running
    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Absent);
    assert_eq!(launcher.start_count(), 1);
}

#[test]
fn start_failure_does_not_propagate() {
    struct Broken;
    impl ServiceLauncher for Broken {
        fn start(&self, name: &str) -> Result<(), AppError> {
            Err(AppError::Service(format!("cannot start {name}")))
        }
    }

    let table = TableStub::new(&[]);
    let sup = ServiceSupervisor::new(table, Arc::new(Broken));
    // best-effort contract: the caller only learns the observed state
    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Absent);
}

#[test]
fn enumeration_cap_is_honored() {
    let table = TableStub::new(&["a", "b", "vigil-monitord"]);
    let launcher = LauncherStub::new();
    let sup = ServiceSupervisor::new(table, Arc::clone(&launcher) as Arc<dyn ServiceLauncher>).with_max_enumeration(2);

    // the daemon is running but sits past the cap, so the bounded check
    // misses it and a duplicate start request goes out
    assert_eq!(sup.ensure_running("vigil-monitord"), ServiceState::Absent);
    assert_eq!(launcher.start_count(), 1);
}
