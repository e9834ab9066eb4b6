// src/extractors/company.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::row::normalize_whitespace;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to compile TITLE_SELECTOR")
});

static COMPANY_NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#giName").expect("Failed to compile COMPANY_NAME_SELECTOR")
});

static SECTOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p.stxt_group span.stxt").expect("Failed to compile SECTOR_SELECTOR")
});

static FISCAL_HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.corp_group1 h2").expect("Failed to compile FISCAL_HEADING_SELECTOR")
});

// "삼성전자(A005930) | Snapshot | 기업정보 | Company Guide"
static TITLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^(]+)\(A\d+\)").expect("Failed to compile TITLE_NAME_RE")
});

static FISCAL_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)월\s*결산").expect("Failed to compile FISCAL_MONTH_RE")
});

const MARKET_PREFIXES: [&str; 4] = ["KSE", "KOSDAQ", "K-OTC", "KONEX"];
const FICS_PREFIX: &str = "FICS";

/// Identity information shown at the top of every company page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyHeader {
    pub name: String,
    pub market_sector: String,
    pub fics_sector: String,
    pub fiscal_month: Option<u32>,
}

pub fn parse_company_header(document: &Html) -> CompanyHeader {
    let (market_sector, fics_sector) = parse_sectors(document);
    CompanyHeader {
        name: parse_company_name(document),
        market_sector,
        fics_sector,
        fiscal_month: parse_fiscal_month(document),
    }
}

fn parse_company_name(document: &Html) -> String {
    let explicit = document
        .select(&COMPANY_NAME_SELECTOR)
        .next()
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|name| !name.is_empty());
    if let Some(name) = explicit {
        return name;
    }

    document
        .select(&TITLE_SELECTOR)
        .next()
        .and_then(|title| {
            let text = normalize_whitespace(&title.text().collect::<String>());
            TITLE_NAME_RE.captures(&text).map(|caps| caps[1].trim().to_string())
        })
        .unwrap_or_default()
}

fn parse_sectors(document: &Html) -> (String, String) {
    let mut market_sector = String::new();
    let mut fics_sector = String::new();

    for span in document.select(&SECTOR_SELECTOR) {
        let text = normalize_whitespace(&span.text().collect::<String>());
        if let Some(rest) = text.strip_prefix(FICS_PREFIX) {
            fics_sector = rest.trim().to_string();
        } else if let Some(rest) = MARKET_PREFIXES.iter().find_map(|prefix| text.strip_prefix(prefix)) {
            market_sector = rest.trim().to_string();
        }
    }

    (market_sector, fics_sector)
}

fn parse_fiscal_month(document: &Html) -> Option<u32> {
    let month = document.select(&FISCAL_HEADING_SELECTOR).find_map(|heading| {
        let text = heading.text().collect::<String>();
        FISCAL_MONTH_RE.captures(&text).and_then(|caps| caps[1].parse::<u32>().ok())
    });
    if month.is_none() {
        tracing::debug!("No fiscal month heading found");
    }
    month.filter(|m| (1..=12).contains(m))
}
