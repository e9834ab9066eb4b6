// src/extractors/section.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::cell::extract_row_values;
use super::locator::{is_family_member, locate, SectionDescriptor};
use super::normalizer::{IndicatorNormalizer, NameScope};
use super::period::{parse_period_headers, HeaderRow, PeriodKey};
use super::row::extract_row_label;
use super::selection::{PeriodPolicy, SelectedPeriod};
use crate::record::PartialRecord;
use crate::utils::error::ExtractError;

static BODY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody tr").expect("Failed to compile BODY_ROW_SELECTOR")
});

/// Which rows of a located table carry indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowScope {
    /// Only rows whose id is `{prefix}_{digits}`.
    IdFamily(&'static str),
    /// Every `tbody` row.
    Body,
}

/// Everything needed to pull one table out of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionRule {
    pub name: &'static str,
    pub descriptor: SectionDescriptor,
    pub header: HeaderRow,
    pub rows: RowScope,
    pub policy: PeriodPolicy,
    pub scope: NameScope,
    /// A required section missing from the page means the document contributes nothing.
    pub required: bool,
}

/// One (row, selected period) cell after label normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorObservation {
    pub raw_label: String,
    pub canonical_label: Option<&'static str>,
    pub period: PeriodKey,
    pub value: Option<f64>,
}

impl SectionRule {
    pub fn validate(&self) -> Result<(), ExtractError> {
        self.policy
            .validate()
            .map_err(|e| ExtractError::InvalidPolicy(format!("section '{}': {}", self.name, e)))
    }

    /// Finds the table and resolves which columns to read.
    ///
    /// `None` when the table is absent or has no usable period header.
    pub fn resolve<'a>(&self, document: &'a Html, current_year: i32) -> Option<(ElementRef<'a>, Vec<SelectedPeriod>)> {
        let table = locate(document, &self.descriptor)?;
        let periods = parse_period_headers(table, self.header);
        if periods.is_empty() {
            tracing::debug!("Section '{}' has no period header, skipping", self.name);
            return None;
        }
        let selected = self.policy.select(&periods, current_year);
        let estimates = selected.iter().filter(|s| periods[s.column].is_estimate).count();
        tracing::debug!(
            "Section '{}': {} header periods, {} selected ({} estimates)",
            self.name,
            periods.len(),
            selected.len(),
            estimates
        );
        Some((table, selected))
    }

    fn rows<'a>(&self, table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let scope = self.rows;
        table.select(&BODY_ROW_SELECTOR).filter(move |row| match scope {
            RowScope::Body => true,
            RowScope::IdFamily(prefix) => row.value().id().is_some_and(|id| is_family_member(id, prefix)),
        })
    }

    /// Runs the rule against a page.
    ///
    /// `Ok(None)` means the section is structurally absent; `Err` only for a misconfigured rule.
    pub fn extract(&self, document: &Html, current_year: i32) -> Result<Option<Vec<IndicatorObservation>>, ExtractError> {
        self.validate()?;
        let Some((table, selected)) = self.resolve(document, current_year) else {
            return Ok(None);
        };

        let normalizer = IndicatorNormalizer::for_scope(self.scope);
        let mut observations = Vec::new();
        for row in self.rows(table) {
            let label = extract_row_label(row);
            if label.is_empty() {
                continue;
            }
            observations.extend(observe_row(row, &label, normalizer, &selected));
        }
        Ok(Some(observations))
    }
}

/// Reads the selected columns of one row under an already extracted label.
pub fn observe_row(
    row: ElementRef,
    label: &str,
    normalizer: &IndicatorNormalizer,
    selected: &[SelectedPeriod],
) -> Vec<IndicatorObservation> {
    let canonical_label = normalizer.normalize(label);
    let values = extract_row_values(row);
    selected
        .iter()
        .map(|period| IndicatorObservation {
            raw_label: label.to_string(),
            canonical_label,
            period: period.key,
            value: values.get(period.column).copied().flatten(),
        })
        .collect()
}

/// Moves recognized, non-missing observations into `partial`. Within a
/// section the first value for a column wins.
pub fn apply_observations(partial: &mut PartialRecord, observations: &[IndicatorObservation]) -> usize {
    let mut inserted = 0;
    for observation in observations {
        let (Some(canonical), Some(value)) = (observation.canonical_label, observation.value) else {
            continue;
        };
        if partial.insert_indicator(canonical, observation.period, value) {
            inserted += 1;
        }
    }
    inserted
}
