//! Error types for the wsk client.

use std::time::Duration;

use thiserror::Error;

use crate::data_models::DateWindow;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The caller handed in a request the engine cannot run.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    #[error("configuration error ({key}): {message}")]
    Config { key: String, message: String },

    /// The request never produced a status code (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The service kept rejecting a one-day window.
    #[error("query too broad at minimum granularity: window {window} rejected with status {status}")]
    QueryTooBroad { window: DateWindow, status: u16 },

    #[error("traversal cancelled")]
    Cancelled,

    #[error("traversal stopped after {limit} requests")]
    RequestLimitExceeded { limit: u64 },

    #[error("traversal stopped after {limit:?}")]
    TimeLimitExceeded { limit: Duration },

    #[error("result sink error: {0:#}")]
    Sink(anyhow::Error),
}

impl Error {
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failures while pulling one value out of a service response.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("bad selector {0}")]
    Selector(String),
}
