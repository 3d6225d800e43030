//! vigil-host — bootstrap host for the vigil monitor daemon.
//!
//! The library wires four concerns behind [`app::App::bootstrap`]:
//!
//! - a validated dependency-injection graph ([`injection`])
//! - a preference store with change fan-out ([`prefs`]) and the observer
//!   that retunes logging when the debug flag flips ([`logger`])
//! - a panic-hook crash reporter with pluggable transports ([`crash`])
//! - an idempotent check-then-start supervisor for the daemon ([`monitor`])

pub mod app;
pub mod config;
pub mod crash;
pub mod error;
pub mod injection;
pub mod logger;
pub mod memstat;
pub mod monitor;
pub mod prefs;
pub mod settings;

/// Version banner used in logs and crash reports.
pub fn version_string() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
