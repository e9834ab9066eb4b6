// src/extractors/cell.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static DATA_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR")
});

/// Attribute carrying the unrounded value when the display text is truncated.
const PRECISION_ATTRIBUTE: &str = "title";

const MISSING_MARKERS: [&str; 3] = ["", "-", "N/A"];

/// Parses a displayed number. Missing markers and anything non-numeric become `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && *c != '\u{a0}')
        .collect();
    let cleaned = cleaned.trim();

    if MISSING_MARKERS.contains(&cleaned) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Value of one data cell: precision attribute first, display text otherwise.
pub fn extract_cell_value(cell: ElementRef) -> Option<f64> {
    if let Some(value) = cell.value().attr(PRECISION_ATTRIBUTE).and_then(parse_number) {
        return Some(value);
    }
    parse_number(&cell.text().collect::<String>())
}

/// Values of every `td` of a row, in column order.
pub fn extract_row_values(row: ElementRef) -> Vec<Option<f64>> {
    row.select(&DATA_CELL_SELECTOR).map(extract_cell_value).collect()
}
