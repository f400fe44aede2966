//! Error types for the requester client.
//!
//! # Design
//! Validation failures (`MissingUrl`, `MissingBody`, `ConfigConflict`, ...)
//! are raised before any network I/O and carry no engine code. `Transfer`
//! and `BatchTransfer` are only produced after an attempt and keep the
//! engine's numeric code so callers can decide on their own retry policy.
//! `Engine` covers the engine refusing an option or a resource allocation,
//! which is neither a validation nor a transfer failure.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::Method;
use crate::options::OptionId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    #[error("setting a URL is mandatory")]
    MissingUrl,

    #[error("no parameters or raw body to POST")]
    MissingBody,

    #[error("request body can't be used with {0} (only POST, PUT or DELETE)")]
    InvalidBodyUsage(Method),

    #[error("URL requested doesn't require SSL: {0}")]
    UnnecessarySsl(String),

    #[error("option {option} already covered by {method}()")]
    ConfigConflict { option: OptionId, method: &'static str },

    #[error("header {header} already covered by {method}()")]
    HeaderConflict { header: String, method: &'static str },

    #[error("unsupported request method: {0}")]
    UnsupportedMethod(Method),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("download requests require a target file (set_file)")]
    MissingFileTarget,

    #[error("PUT uploads require a source file (set_file)")]
    MissingFileSource,

    #[error("malformed cookie: {0}")]
    MalformedCookie(String),

    /// A single transfer failed (connection, DNS, TLS, timeout, ...).
    #[error("transfer failed ({code}): {message}")]
    Transfer { message: String, code: i32 },

    /// The pool driving a batch failed; no member response is produced.
    #[error("batch transfer failed ({code}): {message}")]
    BatchTransfer { message: String, code: i32 },

    #[error("engine error ({code}): {message}")]
    Engine { message: String, code: i32 },

    #[error("form error: {0}")]
    Form(String),

    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),

    #[error("response body is not valid JSON: {0}")]
    Decode(serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Translate an engine error raised by `perform`.
    pub(crate) fn transfer(e: curl::Error) -> Self {
        Error::Transfer {
            message: describe(&e),
            code: e.code() as i32,
        }
    }

    /// Translate an engine error raised while setting an option or reading info.
    pub(crate) fn engine(e: curl::Error) -> Self {
        Error::Engine {
            message: describe(&e),
            code: e.code() as i32,
        }
    }

    pub(crate) fn batch(e: curl::MultiError) -> Self {
        Error::BatchTransfer {
            message: e.description().to_string(),
            code: e.code() as i32,
        }
    }

    /// Engine code carried by transfer-level errors.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Transfer { code, .. }
            | Error::BatchTransfer { code, .. }
            | Error::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<curl::Error> for Error {
    fn from(e: curl::Error) -> Self {
        Error::engine(e)
    }
}

impl From<curl::MultiError> for Error {
    fn from(e: curl::MultiError) -> Self {
        Error::batch(e)
    }
}

impl From<curl::FormError> for Error {
    fn from(e: curl::FormError) -> Self {
        Error::Form(e.to_string())
    }
}

fn describe(e: &curl::Error) -> String {
    match e.extra_description() {
        Some(extra) => format!("{}: {extra}", e.description()),
        None => e.description().to_string(),
    }
}
