//! Crash reporter — panic-hook capture with a pluggable transport.
//!
//! Installed exactly once per process, after the injection graph exists. A
//! panic produces a [`CrashReport`] carrying the application version, the
//! panic message and location, and a scrubbed preference snapshot: keys named
//! by the settings-key resolver are removed before the report leaves the
//! builder. The exclusion set is queried at panic time, not frozen at init.
//!
//! Failures while installing the reporter propagate to startup failure — a
//! crash reporter that cannot initialize has no failure-reporting surface of
//! its own.

mod transport;

pub use transport::{FileTransport, ReportTransport, StderrTransport};

use std::{
    collections::BTreeMap,
    panic::PanicHookInfo,
    sync::{Arc, OnceLock},
};

use chrono::Utc;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::prefs::{PrefStore, PrefValue};
use crate::settings::KeyResolver;

/// One captured crash, ready for a transport.
#[derive(Debug, Serialize)]
pub struct CrashReport {
    pub id: String,
    /// RFC 3339 capture time.
    pub timestamp: String,
    pub version: String,
    pub message: String,
    /// `file:line` of the panic site, when known.
    pub location: Option<String>,
    pub thread: String,
    /// Preference snapshot with individual keys removed, values stringified.
    pub prefs: BTreeMap<String, String>,
}

/// Everything the panic hook needs, captured at init.
pub struct CrashContext {
    pub version: String,
    pub prefs: Arc<PrefStore>,
    pub resolver: Arc<dyn KeyResolver>,
    pub transport: Arc<dyn ReportTransport>,
}

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Install the crash reporter. Fails if one is already installed.
///
/// The previous panic hook is chained after report capture, so default
/// panic output (and backtraces) still appear.
pub fn init(ctx: CrashContext) -> Result<(), AppError> {
    INSTALLED
        .set(())
        .map_err(|_| AppError::Crash("crash reporter already initialized".into()))?;

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let report = report_from_panic(&ctx, info);
        if let Err(e) = ctx.transport.send(&report) {
            // last resort: the report and the transport failure both go to stderr
            error!(transport = ctx.transport.name(), %e, "crash transport failed");
            eprintln!("crash report {} lost: {e}", report.id);
        }
        previous(info);
    }));
    Ok(())
}

fn report_from_panic(ctx: &CrashContext, info: &PanicHookInfo<'_>) -> CrashReport {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    };

    let location = info.location().map(|l| format!("{}:{}", l.file(), l.line()));
    let thread = std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string();

    let excluded = ctx.resolver.resolve_individual_keys();
    CrashReport {
        id: Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: ctx.version.clone(),
        message,
        location,
        thread,
        prefs: scrub_prefs(&ctx.prefs, &excluded),
    }
}

/// Stringify the preference table, dropping every excluded key.
fn scrub_prefs(
    prefs: &PrefStore,
    excluded: &std::collections::HashSet<String>,
) -> BTreeMap<String, String> {
    prefs
        .snapshot()
        .iter()
        .filter(|(key, _)| !excluded.contains(*key))
        .map(|(key, value)| {
            let rendered = match value {
                PrefValue::Bool(b) => b.to_string(),
                PrefValue::Int(i) => i.to_string(),
                PrefValue::Text(s) => s.clone(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
