// src/extractors/period.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::cmp::Ordering;
use std::fmt;

use super::row::normalize_whitespace;

static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    // Prefix match: header anchors may carry tooltip text after the label.
    Regex::new(r"^(\d{4})/(\d{2})\s*(\(E\))?").expect("Failed to compile YEAR_MONTH_RE")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})$").expect("Failed to compile YEAR_RE")
});

static THEAD_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("thead tr").expect("Failed to compile THEAD_ROW_SELECTOR")
});

static MARKED_HEADER_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("thead tr.td_gapcolor2").expect("Failed to compile MARKED_HEADER_ROW_SELECTOR")
});

static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th, td").expect("Failed to compile HEADER_CELL_SELECTOR")
});

static TIP_IN_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.tip_in").expect("Failed to compile TIP_IN_SELECTOR")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Year,
    YearMonth,
}

/// A reporting period parsed from a column header.
///
/// Equality and ordering only look at the calendar position; the estimate
/// flag is carried along for labeling.
#[derive(Debug, Clone, Copy)]
pub struct Period {
    pub kind: PeriodKind,
    pub year: i32,
    pub month: Option<u32>,
    pub is_estimate: bool,
}

impl Period {
    pub fn year(year: i32) -> Self {
        Self { kind: PeriodKind::Year, year, month: None, is_estimate: false }
    }

    pub fn year_month(year: i32, month: u32, is_estimate: bool) -> Self {
        Self { kind: PeriodKind::YearMonth, year, month: Some(month), is_estimate }
    }

    pub fn key(&self) -> PeriodKey {
        match self.month {
            Some(month) => PeriodKey::year_month(self.year, month),
            None => PeriodKey::year(self.year),
        }
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.year == other.year && self.month == other.month
    }
}

impl Eq for Period {}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Textual period used as the prefix of indicator column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Option<u32>,
}

impl PeriodKey {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn year_month(year: i32, month: u32) -> Self {
        Self { year, month: Some(month) }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:04}/{:02}", self.year, month),
            None => write!(f, "{:04}", self.year),
        }
    }
}

/// Which `thead` row carries the period labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRow {
    /// `tr.td_gapcolor2`, falling back to the last `thead` row.
    Marked,
    /// The first `thead` row.
    First,
}

/// Parses one header label. Returns `None` for anything that is not a period.
pub fn parse_period_label(text: &str) -> Option<Period> {
    let text = text.trim();

    if let Some(caps) = YEAR_MONTH_RE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        return Some(Period::year_month(year, month, caps.get(3).is_some()));
    }

    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .map(Period::year)
}

/// Returns one period per data column, in document column order.
///
/// Cells that do not parse are skipped and do not take a column index, so the
/// n-th returned period lines up with the n-th data cell of each body row.
pub fn parse_period_headers(table: ElementRef, header: HeaderRow) -> Vec<Period> {
    let header_row = match header {
        HeaderRow::Marked => table
            .select(&MARKED_HEADER_ROW_SELECTOR)
            .next()
            .or_else(|| table.select(&THEAD_ROW_SELECTOR).last()),
        HeaderRow::First => table.select(&THEAD_ROW_SELECTOR).next(),
    };

    let Some(header_row) = header_row else {
        tracing::debug!("No header row found in table");
        return Vec::new();
    };

    header_row
        .select(&HEADER_CELL_SELECTOR)
        .filter_map(|cell| {
            let source = cell.select(&TIP_IN_SELECTOR).next().unwrap_or(cell);
            let text = normalize_whitespace(&source.text().collect::<String>());
            let period = parse_period_label(&text);
            if period.is_none() {
                tracing::trace!("Skipping non-period header cell '{}'", text);
            }
            period
        })
        .collect()
}
