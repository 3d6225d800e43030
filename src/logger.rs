//! Logging subsystem — `tracing` with a reloadable filter.
//!
//! The host bootstraps logging at a default level before configuration is
//! available, then reconfigures it once the configured level (and later the
//! `debug_logging` preference) is known. Reconfiguration swaps the active
//! `EnvFilter` through a `reload` handle in one atomic step, so concurrent
//! log callers never observe a half-applied configuration.
//!
//! The global subscriber is installed once per process; every later `init`
//! or `reinit` call degrades to a filter swap.

use std::sync::OnceLock;

use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

use crate::error::AppError;

static RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber with the given filter directive, or swap
/// the filter if the subscriber is already installed.
pub fn init(directive: &str) -> Result<(), AppError> {
    if let Some(handle) = RELOAD_HANDLE.get() {
        return swap(handle, directive);
    }

    let filter = parse(directive)?;
    let (filter_layer, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| AppError::Logger(format!("cannot install subscriber: {e}")))?;

    // Lost race means another init already stored the handle; the swap path
    // above would have been taken instead, so this cannot actually fail.
    let _ = RELOAD_HANDLE.set(handle);
    Ok(())
}

/// Reinitialize logging from the debug-logging preference.
///
/// `debug_enabled = true` raises the filter to `debug`, otherwise it drops
/// back to `info`. Logs the applied state together with the application
/// version so log streams record which build produced them.
pub fn reinit(version: &str, debug_enabled: bool) -> Result<(), AppError> {
    let handle = RELOAD_HANDLE
        .get()
        .ok_or_else(|| AppError::Logger("logger not initialized".into()))?;

    let directive = if debug_enabled { "debug" } else { "info" };
    swap(handle, directive)?;

    info!(version, debug_enabled, "logging reconfigured");
    Ok(())
}

/// The currently active filter directive, if logging is installed.
pub fn active_filter() -> Option<String> {
    let handle = RELOAD_HANDLE.get()?;
    handle.with_current(|f| f.to_string()).ok()
}

fn swap(handle: &reload::Handle<EnvFilter, Registry>, directive: &str) -> Result<(), AppError> {
    let filter = parse(directive)?;
    handle
        .reload(filter)
        .map_err(|e| AppError::Logger(format!("cannot swap filter: {e}")))
}

fn parse(directive: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(directive)
        .map_err(|e| AppError::Logger(format!("invalid filter directive {directive:?}: {e}")))
}
