use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(soonly::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(soonly::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(soonly::google_calendar))]
    GoogleCalendar(String),

    #[error("Event cache error: {0}")]
    #[diagnostic(code(soonly::cache))]
    Cache(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(soonly::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(soonly::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(soonly::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(soonly::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::GoogleCalendar(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::GoogleCalendar(format!("Invalid URL: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type SoonlyResult<T> = Result<T, Error>;

/// Why a single calendar event was left out of a computation.
///
/// These never abort a refresh or a display tick; they are collected next to
/// the result so callers can log and count them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EventError {
    #[error("event has no {0} time")]
    #[diagnostic(code(soonly::event::missing_time))]
    MissingTime(&'static str),

    #[error("invalid {field} time '{value}'")]
    #[diagnostic(code(soonly::event::invalid_timestamp))]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create event cache errors
pub fn cache_error(message: &str) -> Error {
    Error::Cache(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
