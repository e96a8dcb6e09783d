//! Error types for the trade center core

use pyo3::exceptions::{PyConnectionError, PyPermissionError, PyRuntimeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

/// Main error type for the trade center core
#[derive(Error, Debug)]
pub enum TradeCenterError {
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Realtime connection error: {0}")]
    Realtime(String),
}

impl From<reqwest::Error> for TradeCenterError {
    fn from(err: reqwest::Error) -> Self {
        TradeCenterError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for TradeCenterError {
    fn from(err: serde_json::Error) -> Self {
        TradeCenterError::Serialization(err.to_string())
    }
}

impl From<TradeCenterError> for PyErr {
    fn from(err: TradeCenterError) -> PyErr {
        let msg = err.to_string();
        match err {
            TradeCenterError::InvalidPredicate(_)
            | TradeCenterError::InvalidConstraint(_)
            | TradeCenterError::Config(_)
            | TradeCenterError::Serialization(_) => PyValueError::new_err(msg),
            TradeCenterError::Unauthorized => PyPermissionError::new_err(msg),
            TradeCenterError::Http(_) | TradeCenterError::Realtime(_) => {
                PyConnectionError::new_err(msg)
            }
            TradeCenterError::Backend { .. } => PyRuntimeError::new_err(msg),
        }
    }
}

/// Result type alias for the trade center core
pub type Result<T> = std::result::Result<T, TradeCenterError>;
