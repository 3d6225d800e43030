//! Report transports — where finished crash reports go.
//!
//! The reporter always has exactly one transport. [`StderrTransport`] is the
//! default; the bootstrap replaces it with [`FileTransport`] so reports
//! survive the process that produced them.

use std::{fs, path::PathBuf};

use crate::crash::CrashReport;
use crate::error::AppError;

pub trait ReportTransport: Send + Sync {
    fn name(&self) -> &'static str;
    fn send(&self, report: &CrashReport) -> Result<(), AppError>;
}

/// Default transport: JSON report to stderr.
pub struct StderrTransport;

impl ReportTransport for StderrTransport {
    fn name(&self) -> &'static str {
        "stderr"
    }

    fn send(&self, report: &CrashReport) -> Result<(), AppError> {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::Crash(format!("cannot serialize report: {e}")))?;
        eprintln!("{rendered}");
        Ok(())
    }
}

/// File transport: one `<report-id>.json` per crash under a spool directory.
pub struct FileTransport {
    dir: PathBuf,
}

impl FileTransport {
    /// Create the transport, ensuring the spool directory exists.
    pub fn new(dir: PathBuf) -> Result<Self, AppError> {
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Crash(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn report_path(&self, report: &CrashReport) -> PathBuf {
        self.dir.join(format!("{}.json", report.id))
    }
}

impl ReportTransport for FileTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    fn send(&self, report: &CrashReport) -> Result<(), AppError> {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::Crash(format!("cannot serialize report: {e}")))?;
        let path = self.report_path(report);
        fs::write(&path, rendered)
            .map_err(|e| AppError::Crash(format!("cannot write {}: {e}", path.display())))
    }
}
