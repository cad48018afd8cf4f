//! Error types for objperm operations.

use std::fmt;

/// Errors raised by misuse of the [`Loggable`](crate::log::Loggable) API.
///
/// These indicate an incorrect calling sequence and are always returned to the
/// caller, never swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// A log with this name is already being written.
    AlreadyActive(String),
    /// `log`, `end_log` or `discard_log` was called with no active log.
    NoActiveLog,
    /// No finished log exists with this name.
    NotFound(String),
    /// No log has been finished yet.
    NoneFinished,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::AlreadyActive(name) => write!(f, "A log named '{}' is already active", name),
            LogError::NoActiveLog => write!(f, "No active log"),
            LogError::NotFound(name) => write!(f, "No finished log named '{}'", name),
            LogError::NoneFinished => write!(f, "No finished logs"),
        }
    }
}

impl std::error::Error for LogError {}

/// Errors that can occur while loading or validating [`OlpConfig`](crate::config::OlpConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A value was present but is not acceptable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "objperm config load error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid objperm config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Returned by an object access check to explicitly deny a permission.
///
/// The backend treats it exactly like the check returning `false` for that
/// scope; it never propagates out of the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionDenied;

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Permission denied")
    }
}

impl std::error::Error for PermissionDenied {}
