// src/documents/snapshot.rs
//! Snapshot page (`SVD_Main.asp`): the consolidated annual "Financial Highlight" table.

use scraper::Html;

use super::{extract_sections, header_identity};
use crate::extractors::locator::SectionDescriptor;
use crate::extractors::normalizer::NameScope;
use crate::extractors::period::HeaderRow;
use crate::extractors::section::{RowScope, SectionRule};
use crate::extractors::selection::PeriodPolicy;
use crate::pipeline::ExtractionConfig;
use crate::record::{ColumnLayout, PartialRecord};
use crate::utils::error::ExtractError;

const SHARES_ROW_LABEL: &str = "발행주식수";
pub const SHARES_ATTRIBUTE: &str = "발행주식수(천주)";

pub const INDICATOR_ORDER: &[&str] = &[
    "영업이익률(%)",
    "부채비율(%)",
    "유보율(%)",
    "지배주주순이익률(%)",
    "PER(배)",
    "EPS(원)",
    "PBR(배)",
    "BPS(원)",
    "ROA(배)",
    "ROE(배)",
    "배당수익률(%)",
];

pub const LAYOUT: ColumnLayout = ColumnLayout::new(INDICATOR_ORDER, &[SHARES_ATTRIBUTE]);

pub fn highlight_rule(config: &ExtractionConfig) -> SectionRule {
    SectionRule {
        name: "financial highlight (annual)",
        descriptor: SectionDescriptor::ElementId("highlight_D_Y"),
        header: HeaderRow::Marked,
        rows: RowScope::Body,
        policy: PeriodPolicy::LatestPerYear {
            max_years: None,
            window: Some(config.highlight_window),
        },
        scope: NameScope::Highlight,
        required: true,
    }
}

pub fn extract(html: &Html, config: &ExtractionConfig) -> Result<Option<PartialRecord>, ExtractError> {
    let mut partial = header_identity(html);
    let Some(observations) = extract_sections(html, &[highlight_rule(config)], config, &mut partial)? else {
        return Ok(None);
    };

    // Share count is a single figure: the most recent selected year that has one.
    let shares = observations
        .iter()
        .filter(|o| o.raw_label == SHARES_ROW_LABEL)
        .filter_map(|o| o.value.map(|value| (o.period, value)))
        .max_by_key(|(period, _)| *period);
    if let Some((period, value)) = shares {
        tracing::trace!("Share count taken from {}", period);
        partial.insert_attribute(SHARES_ATTRIBUTE, value);
    }

    Ok(Some(partial))
}
