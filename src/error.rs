//! Application-wide error types.

use thiserror::Error;

use crate::injection::InjectionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("preference store error: {0}")]
    Prefs(String),

    #[error("crash reporter error: {0}")]
    Crash(String),

    #[error("service supervisor error: {0}")]
    Service(String),

    #[error("injection error: {0}")]
    Injection(#[from] InjectionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
