// src/documents/mod.rs
//! Per-page parsers. Each turns one fetched page into the partial record it
//! contributes to a company.

pub mod finance;
pub mod finance_ratio;
pub mod invest;
pub mod multi_factor;
pub mod snapshot;

use scraper::Html;

use crate::extractors::company::parse_company_header;
use crate::extractors::section::{apply_observations, IndicatorObservation, SectionRule};
use crate::fnguide::models::DocumentKind;
use crate::pipeline::ExtractionConfig;
use crate::record::{IdentityField, PartialRecord};
use crate::utils::error::ExtractError;

/// A fetched page body. Parsed on demand, never shared across companies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub kind: DocumentKind,
    pub body: String,
}

impl RawDocument {
    pub fn new(kind: DocumentKind, body: impl Into<String>) -> Self {
        Self { kind, body: body.into() }
    }
}

/// Extracts what `document` contributes. `Ok(None)` when the page lacks the
/// data this kind of document is read for.
pub fn extract_document(document: &RawDocument, config: &ExtractionConfig) -> Result<Option<PartialRecord>, ExtractError> {
    if document.kind.is_json() {
        return multi_factor::extract(&document.body);
    }

    let html = Html::parse_document(&document.body);
    match document.kind {
        DocumentKind::Snapshot => snapshot::extract(&html, config),
        DocumentKind::Finance => finance::extract(&html, config),
        DocumentKind::FinanceRatio => finance_ratio::extract(&html, config),
        DocumentKind::InvestIndex => invest::extract(&html, config),
        DocumentKind::MultiFactor => multi_factor::extract(&document.body),
    }
}

/// Section rules a document kind runs with `config`; used to reject a broken
/// configuration before any page is fetched.
pub fn section_rules(kind: DocumentKind, config: &ExtractionConfig) -> Vec<SectionRule> {
    match kind {
        DocumentKind::Snapshot => vec![snapshot::highlight_rule(config)],
        DocumentKind::Finance => finance::statement_rules(config).to_vec(),
        DocumentKind::FinanceRatio => vec![finance_ratio::annual_rule(config), finance_ratio::quarterly_rule(config)],
        DocumentKind::InvestIndex => vec![invest::valuation_rule(config)],
        DocumentKind::MultiFactor => Vec::new(),
    }
}

/// Identity fields every company page shows in its header.
pub(crate) fn header_identity(html: &Html) -> PartialRecord {
    let header = parse_company_header(html);
    let mut partial = PartialRecord::default();
    partial.set_identity(IdentityField::Name, header.name);
    partial.set_identity(IdentityField::MarketSector, header.market_sector);
    partial.set_identity(IdentityField::FicsSector, header.fics_sector);
    if let Some(month) = header.fiscal_month {
        partial.set_identity(IdentityField::FiscalMonth, month);
    }
    partial
}

/// Runs `rules` in order into `partial`, returning every observation seen.
///
/// `Ok(None)` as soon as a required section is missing.
pub(crate) fn extract_sections(
    html: &Html,
    rules: &[SectionRule],
    config: &ExtractionConfig,
    partial: &mut PartialRecord,
) -> Result<Option<Vec<IndicatorObservation>>, ExtractError> {
    let mut seen = Vec::new();
    for rule in rules {
        match rule.extract(html, config.current_year)? {
            Some(observations) => {
                let inserted = apply_observations(partial, &observations);
                tracing::debug!("Section '{}': {} indicator values", rule.name, inserted);
                seen.extend(observations);
            }
            None if rule.required => {
                tracing::debug!("Required section '{}' missing", rule.name);
                return Ok(None);
            }
            None => tracing::debug!("Optional section '{}' missing", rule.name),
        }
    }
    Ok(Some(seen))
}
