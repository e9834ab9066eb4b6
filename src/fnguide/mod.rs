// src/fnguide/mod.rs
pub mod cache;
pub mod client;
pub mod models;
pub mod universe;

use crate::utils::error::FetchError;
use models::DocumentKind;

/// Anything that can hand over the raw body of a company page.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, code: &str, kind: DocumentKind) -> Result<String, FetchError>;
}
