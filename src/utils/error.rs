// src/utils/error.rs
use thiserror::Error;

use crate::fnguide::models::DocumentKind;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Document {kind} not available for {code}")]
    NotAvailable { code: String, kind: DocumentKind },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    /// A section rule is misconfigured. This is a broken extraction rule, not a data anomaly.
    #[error("Invalid period policy: {0}")]
    InvalidPolicy(String),

    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl ExtractError {
    /// Fatal errors abort the whole run instead of being contained to one company.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::InvalidPolicy(_))
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Fetching failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
