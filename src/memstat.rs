//! Memory pressure reporting — observational only.
//!
//! The host logs a point-in-time memory snapshot at bootstrap and whenever a
//! caller asks for one. Nothing here evicts or throttles; the numbers exist
//! so low-memory incidents are visible in the log stream.

use sysinfo::System;
use tracing::info;

/// Point-in-time memory figures, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReport {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

/// Sample current system memory.
pub fn sample() -> MemoryReport {
    let mut system = System::new();
    system.refresh_memory();
    MemoryReport {
        total: system.total_memory(),
        used: system.used_memory(),
        available: system.available_memory(),
    }
}

/// Log a memory report at info level.
pub fn log_report(report: &MemoryReport) {
    info!(
        total_bytes = report.total,
        used_bytes = report.used,
        available_bytes = report.available,
        "memory report"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reports_plausible_figures() {
        let report = sample();
        assert!(report.total > 0);
        assert!(report.used <= report.total);
        assert!(report.available <= report.total);
    }
}
