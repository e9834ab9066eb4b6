// src/documents/multi_factor.rs
//! Multi-factor style exposure feed (`05_05/A{code}.json`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::record::PartialRecord;
use crate::utils::error::ExtractError;

pub const SECTOR_ATTRIBUTE: &str = "팩터_업종명";
const COMPANY_SUFFIX: &str = "_종목";
const SECTOR_SUFFIX: &str = "_업종";

static SECTOR_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\(업종\)\s*$").expect("Failed to compile SECTOR_MARKER_RE")
});

/// `CHART_H` names the compared series, `CHART_D` has one entry per factor.
#[derive(Debug, Deserialize)]
struct FactorFeed {
    #[serde(rename = "CHART_H", default)]
    series: Vec<SeriesHeader>,
    #[serde(rename = "CHART_D")]
    factors: Option<Vec<FactorScore>>,
}

#[derive(Debug, Deserialize)]
struct SeriesHeader {
    #[serde(rename = "NAME", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct FactorScore {
    #[serde(rename = "NM", default)]
    name: Value,
    #[serde(rename = "VAL1", default)]
    company: Value,
    #[serde(rename = "VAL2", default)]
    sector: Value,
}

/// Scores arrive as numbers or numeric strings.
fn score(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn factor_name(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

/// Parses the feed body. A leading byte order mark is tolerated.
///
/// A feed without factor data contributes nothing; malformed JSON is an error.
pub fn extract(body: &str) -> Result<Option<PartialRecord>, ExtractError> {
    let feed: FactorFeed = serde_json::from_str(body.trim_start_matches('\u{feff}'))?;
    let Some(factors) = feed.factors else {
        tracing::debug!("Multi-factor feed has no factor data");
        return Ok(None);
    };

    let mut partial = PartialRecord::default();
    if let Some(sector) = feed.series.get(1) {
        let sector_name = SECTOR_MARKER_RE.replace(&sector.name, "");
        partial.insert_attribute(SECTOR_ATTRIBUTE, sector_name.trim());
    }

    for factor in &factors {
        let name = factor_name(&factor.name);
        if name.is_empty() {
            continue;
        }
        if let Some(value) = score(&factor.company) {
            partial.insert_attribute(&format!("{}{}", name, COMPANY_SUFFIX), value);
        }
        if let Some(value) = score(&factor.sector) {
            partial.insert_attribute(&format!("{}{}", name, SECTOR_SUFFIX), value);
        }
    }

    tracing::debug!("Multi-factor feed: {} factors", factors.len());
    Ok(Some(partial))
}
