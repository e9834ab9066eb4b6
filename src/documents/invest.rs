// src/documents/invest.rs
//! Investment index page (`SVD_Invest.asp`): the enterprise value table.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::header_identity;
use crate::extractors::locator::{is_family_member, SectionDescriptor};
use crate::extractors::normalizer::{IndicatorNormalizer, NameScope};
use crate::extractors::period::HeaderRow;
use crate::extractors::row::{extract_row_label, normalize_whitespace, raw_row_label};
use crate::extractors::section::{apply_observations, observe_row, RowScope, SectionRule};
use crate::extractors::selection::PeriodPolicy;
use crate::pipeline::ExtractionConfig;
use crate::record::{ColumnLayout, PartialRecord};
use crate::utils::error::ExtractError;

static BODY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody tr").expect("Failed to compile BODY_ROW_SELECTOR")
});

const TOP_LEVEL_FAMILY: &str = "p_grid1";
const DETAIL_ROW_CLASS_PREFIX: &str = "c_grid";
const GROUP_TITLE_CLASS: &str = "tbody_tit";
const FCF_GROUP_MARKER: &str = "FCF";
const FCF_ROW_CLASS: &str = "rwf";
const COLLAPSED_ROW_CLASS: &str = "acd_dep_start_close";
/// FCF sub-items are indented with non-breaking spaces; three marks a top-level item.
const FCF_TOP_INDENT: usize = 3;

pub const INDICATOR_ORDER: &[&str] = &[
    "EPS", "EBITDAPS", "CFPS", "SPS", "BPS", "DPS(보통주)", "DPS(1우선주)", "배당성향(현금)",
    "PER", "PCR", "PSR", "PBR", "EV/Sales", "EV/EBITDA",
    "총현금흐름", "총투자", "FCFF",
];

pub const LAYOUT: ColumnLayout = ColumnLayout::new(INDICATOR_ORDER, &[super::multi_factor::SECTOR_ATTRIBUTE]);

pub fn valuation_rule(config: &ExtractionConfig) -> SectionRule {
    SectionRule {
        name: "enterprise value",
        descriptor: SectionDescriptor::Caption("기업가치 지표"),
        header: HeaderRow::First,
        rows: RowScope::Body,
        policy: PeriodPolicy::latest_per_year(config.annual_years),
        scope: NameScope::Valuation,
        required: true,
    }
}

/// How a body row of the enterprise value table is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ValuationRow {
    GroupTitle { is_fcf: bool },
    Indicator(String),
    Skip,
}

fn classify_row(row: ElementRef, in_fcf: bool) -> ValuationRow {
    let element = row.value();
    if element.classes().any(|c| c == GROUP_TITLE_CLASS) {
        let text: String = row.text().collect();
        return ValuationRow::GroupTitle { is_fcf: text.contains(FCF_GROUP_MARKER) };
    }
    if element.classes().any(|c| c.starts_with(DETAIL_ROW_CLASS_PREFIX)) {
        return ValuationRow::Skip;
    }
    if element.id().is_some_and(|id| is_family_member(id, TOP_LEVEL_FAMILY)) {
        return ValuationRow::Indicator(extract_row_label(row));
    }

    let is_fcf_row = in_fcf
        && element.classes().any(|c| c == FCF_ROW_CLASS)
        && !element.classes().any(|c| c == COLLAPSED_ROW_CLASS);
    if is_fcf_row {
        let raw = raw_row_label(row);
        let indent = raw.chars().take_while(|c| *c == '\u{a0}').count();
        if indent == FCF_TOP_INDENT {
            return ValuationRow::Indicator(normalize_whitespace(&raw));
        }
    }
    ValuationRow::Skip
}

pub fn extract(html: &Html, config: &ExtractionConfig) -> Result<Option<PartialRecord>, ExtractError> {
    let rule = valuation_rule(config);
    rule.validate()?;
    let Some((table, selected)) = rule.resolve(html, config.current_year) else {
        return Ok(None);
    };

    let mut partial = header_identity(html);
    let normalizer = IndicatorNormalizer::for_scope(rule.scope);
    let mut in_fcf = false;
    let mut inserted = 0;

    for row in table.select(&BODY_ROW_SELECTOR) {
        match classify_row(row, in_fcf) {
            ValuationRow::GroupTitle { is_fcf } => in_fcf = in_fcf || is_fcf,
            ValuationRow::Indicator(label) if !label.is_empty() => {
                let observations = observe_row(row, &label, normalizer, &selected);
                inserted += apply_observations(&mut partial, &observations);
            }
            _ => {}
        }
    }

    tracing::debug!("Section '{}': {} indicator values", rule.name, inserted);
    Ok(Some(partial))
}
