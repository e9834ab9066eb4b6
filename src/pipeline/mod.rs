// src/pipeline/mod.rs

pub mod batch;

use crate::documents::{extract_document, section_rules, RawDocument};
use crate::extractors::selection::YearWindow;
use crate::fnguide::models::{CollectionTarget, ListedCompany};
use crate::record::{CompanyRecord, IdentityField, RecordAssembler};
use crate::utils::error::ExtractError;

const DEFAULT_ANNUAL_YEARS: usize = 4;
const DEFAULT_QUARTERLY_PERIODS: usize = 3;
const DEFAULT_STATEMENT_QUARTERS: usize = 4;
const DEFAULT_HIGHLIGHT_WINDOW: YearWindow = YearWindow { back: 3, forward: 1 };
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Run-wide extraction settings. Built once from the CLI, shared read-only by every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Reference year for windowed selection.
    pub current_year: i32,
    pub annual_years: usize,
    pub quarterly_periods: usize,
    pub statement_quarters: usize,
    pub highlight_window: YearWindow,
}

impl ExtractionConfig {
    pub fn for_year(current_year: i32) -> Self {
        Self {
            current_year,
            annual_years: DEFAULT_ANNUAL_YEARS,
            quarterly_periods: DEFAULT_QUARTERLY_PERIODS,
            statement_quarters: DEFAULT_STATEMENT_QUARTERS,
            highlight_window: DEFAULT_HIGHLIGHT_WINDOW,
        }
    }

    /// Rejects settings that would build a broken section rule for `target`.
    pub fn validate(&self, target: CollectionTarget) -> Result<(), ExtractError> {
        if !SUPPORTED_YEARS.contains(&self.current_year) {
            return Err(ExtractError::InvalidPolicy(format!(
                "current year {} outside {:?}",
                self.current_year, SUPPORTED_YEARS
            )));
        }
        for kind in target.documents() {
            for rule in section_rules(*kind, self) {
                rule.validate()?;
            }
        }
        Ok(())
    }
}

/// Builds one company's record from its already fetched documents.
///
/// `documents` must be in fold order with the target's primary page first.
/// `Ok(None)` means no data: the primary page contributed nothing.
pub fn extract_company(
    listing: &ListedCompany,
    documents: &[RawDocument],
    config: &ExtractionConfig,
) -> Result<Option<CompanyRecord>, ExtractError> {
    let mut assembler = RecordAssembler::new(&listing.code);
    assembler.seed_identity(IdentityField::Name, listing.name.as_str());
    assembler.seed_identity(IdentityField::Industry, listing.industry.as_str());
    assembler.seed_identity(IdentityField::MainProducts, listing.products.as_str());

    for (position, document) in documents.iter().enumerate() {
        let is_primary = position == 0;
        match extract_document(document, config) {
            Ok(Some(partial)) => assembler.absorb(partial),
            Ok(None) if is_primary => {
                tracing::debug!("{}: {} page has no data", listing.code, document.kind);
                return Ok(None);
            }
            Ok(None) => tracing::debug!("{}: {} page contributed nothing", listing.code, document.kind),
            Err(e) if is_primary || e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("{}: skipping {} page: {}", listing.code, document.kind, e),
        }
    }

    Ok(assembler.finish())
}
