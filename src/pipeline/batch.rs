// src/pipeline/batch.rs

use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{extract_company, ExtractionConfig};
use crate::documents::RawDocument;
use crate::fnguide::models::{CollectionTarget, ListedCompany};
use crate::fnguide::DocumentSource;
use crate::record::CompanyRecord;
use crate::utils::error::{ExtractError, FetchError};

/// A task that did not return normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    #[error("task panicked: {0}")]
    Panicked(String),
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs `task` for every item with at most `concurrency` in flight and
/// collects the outputs keyed by `key`, so the result order never depends on
/// completion order. A panicking task becomes a [`TaskFailure`] for its key.
///
/// When `abort_on` returns true for an output, remaining tasks are cancelled
/// and the map collected so far is returned.
pub async fn map_by_key<T, K, R, Fut>(
    items: Vec<T>,
    concurrency: usize,
    key: impl Fn(&T) -> K,
    task: impl Fn(T) -> Fut,
    abort_on: impl Fn(&R) -> bool,
) -> BTreeMap<K, Result<R, TaskFailure>>
where
    K: Ord + Send + 'static,
    R: Send + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for item in items {
        let item_key = key(&item);
        let work = task(item);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let outcome = AssertUnwindSafe(work).catch_unwind().await;
            (item_key, outcome.map_err(|payload| TaskFailure::Panicked(panic_message(payload))))
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((item_key, outcome)) => {
                let abort = outcome.as_ref().is_ok_and(&abort_on);
                results.insert(item_key, outcome);
                if abort {
                    tracing::error!("Aborting batch, {} tasks cancelled", tasks.len());
                    tasks.abort_all();
                    break;
                }
            }
            Err(e) => tracing::error!("Task join error: {}", e),
        }
    }
    results
}

/// Outcome of one collection run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    /// Assembled records in company code order.
    pub records: Vec<CompanyRecord>,
    /// Companies whose primary page had no data.
    pub no_data: Vec<String>,
    /// `(code, cause)` of companies that failed.
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }
}

/// Fetches the pages `target` needs for `code`, primary page first.
///
/// Only the primary page is mandatory; other pages that fail are left out.
pub async fn fetch_documents<S: DocumentSource + ?Sized>(
    source: &S,
    code: &str,
    target: CollectionTarget,
) -> Result<Vec<RawDocument>, FetchError> {
    let mut documents = Vec::new();
    for (position, kind) in target.documents().iter().enumerate() {
        match source.fetch(code, *kind).await {
            Ok(body) => documents.push(RawDocument::new(*kind, body)),
            Err(e) if position == 0 => return Err(e),
            Err(e) => tracing::warn!("{}: {} page unavailable: {}", code, kind, e),
        }
    }
    Ok(documents)
}

/// Collects records for every company. A failure of one company never blocks
/// the others; only a fatal extraction error aborts the run.
pub async fn collect<S: DocumentSource + 'static>(
    source: Arc<S>,
    companies: Vec<ListedCompany>,
    target: CollectionTarget,
    config: ExtractionConfig,
    concurrency: usize,
) -> Result<BatchReport, ExtractError> {
    collect_with(source, companies, target, concurrency, move |company, documents| {
        extract_company(company, documents, &config)
    })
    .await
}

/// [`collect`] with the per-company extraction step supplied by the caller.
pub async fn collect_with<S, F>(
    source: Arc<S>,
    companies: Vec<ListedCompany>,
    target: CollectionTarget,
    concurrency: usize,
    extract: F,
) -> Result<BatchReport, ExtractError>
where
    S: DocumentSource + 'static,
    F: Fn(&ListedCompany, &[RawDocument]) -> Result<Option<CompanyRecord>, ExtractError> + Send + Sync + 'static,
{
    let extract = Arc::new(extract);
    let total = companies.len();
    tracing::info!("Collecting {} for {} companies (concurrency {})", target.file_stem(), total, concurrency);

    let results = map_by_key(
        companies,
        concurrency,
        |company| company.code.clone(),
        |company| {
            let source = Arc::clone(&source);
            let extract = Arc::clone(&extract);
            async move {
                let documents = fetch_documents(source.as_ref(), &company.code, target).await?;
                (*extract)(&company, documents.as_slice())
            }
        },
        |outcome: &Result<Option<CompanyRecord>, ExtractError>| matches!(outcome, Err(e) if e.is_fatal()),
    )
    .await;

    let mut report = BatchReport { total, ..BatchReport::default() };
    for (code, outcome) in results {
        match outcome {
            Ok(Ok(Some(record))) => report.records.push(record),
            Ok(Ok(None)) => report.no_data.push(code),
            Ok(Err(e)) if e.is_fatal() => return Err(e),
            Ok(Err(e)) => {
                tracing::warn!("{}: {}", code, e);
                report.failures.push((code, e.to_string()));
            }
            Err(failure) => {
                tracing::warn!("{}: {}", code, failure);
                report.failures.push((code, failure.to_string()));
            }
        }
    }

    tracing::info!("Success: {} / Total: {}", report.succeeded(), report.total);
    Ok(report)
}
