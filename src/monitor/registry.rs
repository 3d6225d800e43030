//! OS service registry — who is running right now.
//!
//! [`ServiceRegistry`] is the platform seam: production queries the OS
//! process table through `sysinfo`; tests substitute an in-memory fake.

use std::sync::Mutex;

use sysinfo::{ProcessesToUpdate, System};

/// One running service as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Process (class) name, matched exactly against service identifiers.
    pub name: String,
    pub pid: u32,
}

/// Point-in-time enumeration of running services.
///
/// The result is queried, never stored: callers use it for one check and
/// drop it. `max_count` bounds the enumeration.
pub trait ServiceRegistry: Send + Sync {
    fn list_running(&self, max_count: usize) -> Vec<ServiceRecord>;
}

/// Production registry over the OS process table.
pub struct ProcessTable {
    // sysinfo wants &mut for refresh; the trait takes &self.
    system: Mutex<System>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for ProcessTable {
    fn list_running(&self, max_count: usize) -> Vec<ServiceRecord> {
        let mut system = self.system.lock().expect("process table lock poisoned");
        system.refresh_processes(ProcessesToUpdate::All, true);
        system
            .processes()
            .iter()
            .take(max_count)
            .map(|(pid, process)| ServiceRecord {
                name: process.name().to_string_lossy().into_owned(),
                pid: pid.as_u32(),
            })
            .collect()
    }
}
