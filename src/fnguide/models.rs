// src/fnguide/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::documents::{finance, finance_ratio, invest, snapshot};
use crate::record::ColumnLayout;

const FNGUIDE_ASP_BASE: &str = "https://comp.fnguide.com/SVO2/ASP";
const FNGUIDE_JSON_BASE: &str = "https://comp.fnguide.com/SVO2/json/chart";

/// The FnGuide company pages (and one JSON feed) this tool reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DocumentKind {
    Snapshot,
    Finance,
    FinanceRatio,
    InvestIndex,
    MultiFactor,
}

impl DocumentKind {
    /// `(page, NewMenuID)` of the ASP company pages.
    fn asp_page(&self) -> Option<(&'static str, &'static str)> {
        match self {
            DocumentKind::Snapshot => Some(("SVD_Main.asp", "101")),
            DocumentKind::Finance => Some(("SVD_Finance.asp", "103")),
            DocumentKind::FinanceRatio => Some(("SVD_FinanceRatio.asp", "104")),
            DocumentKind::InvestIndex => Some(("SVD_Invest.asp", "105")),
            DocumentKind::MultiFactor => None,
        }
    }

    pub fn url(&self, code: &str) -> String {
        match self.asp_page() {
            Some((page, menu_id)) => format!(
                "{}/{}?pGB=1&gicode=A{}&cID=&MenuYn=Y&ReportGB=&NewMenuID={}&stkGb=701",
                FNGUIDE_ASP_BASE, page, code, menu_id
            ),
            None => format!("{}/05_05/A{}.json", FNGUIDE_JSON_BASE, code),
        }
    }

    /// Prefix of the monthly cache directory. The multi-factor feed shares the
    /// investment index directory.
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Snapshot => "fnguide_snapshot_",
            DocumentKind::Finance => "fnguide_finance_",
            DocumentKind::FinanceRatio => "fnguide_FinanceRatio_",
            DocumentKind::InvestIndex | DocumentKind::MultiFactor => "fnguide_InvestIdx_",
        }
    }

    pub fn cache_file_name(&self, code: &str) -> String {
        match self {
            DocumentKind::MultiFactor => format!("factor_{}.json", code),
            _ => format!("{}.html", code),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, DocumentKind::MultiFactor)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Snapshot => "snapshot",
            DocumentKind::Finance => "finance",
            DocumentKind::FinanceRatio => "finance-ratio",
            DocumentKind::InvestIndex => "invest-index",
            DocumentKind::MultiFactor => "multi-factor",
        };
        f.write_str(name)
    }
}

/// Which collection to run; selects the pages folded into each company record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionTarget {
    Snapshot,
    Finance,
    FinanceRatio,
    InvestIndex,
}

impl CollectionTarget {
    /// Fold order; earlier documents win identity and column conflicts.
    pub fn documents(&self) -> &'static [DocumentKind] {
        match self {
            CollectionTarget::Snapshot => &[DocumentKind::Snapshot],
            CollectionTarget::Finance => &[DocumentKind::Finance, DocumentKind::Snapshot],
            CollectionTarget::FinanceRatio => &[DocumentKind::FinanceRatio],
            CollectionTarget::InvestIndex => &[DocumentKind::InvestIndex, DocumentKind::MultiFactor],
        }
    }

    pub fn layout(&self) -> ColumnLayout {
        match self {
            CollectionTarget::Snapshot => snapshot::LAYOUT,
            CollectionTarget::Finance => finance::LAYOUT,
            CollectionTarget::FinanceRatio => finance_ratio::LAYOUT,
            CollectionTarget::InvestIndex => invest::LAYOUT,
        }
    }

    /// Stem of output file names.
    pub fn file_stem(&self) -> &'static str {
        match self {
            CollectionTarget::Snapshot => "investment_indicators",
            CollectionTarget::Finance => "finance",
            CollectionTarget::FinanceRatio => "finance_ratio",
            CollectionTarget::InvestIndex => "invest_index",
        }
    }

    /// Whether the output is additionally split into one sheet per industry type.
    pub fn partitions_by_industry(&self) -> bool {
        matches!(self, CollectionTarget::FinanceRatio)
    }
}

/// One row of the listed-company universe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListedCompany {
    #[serde(rename = "종목코드")]
    pub code: String,
    #[serde(rename = "회사명", default)]
    pub name: String,
    #[serde(rename = "업종", default)]
    pub industry: String,
    #[serde(rename = "주요제품", default)]
    pub products: String,
}

impl ListedCompany {
    /// A bare listing for ad-hoc runs; names and sectors come from the pages.
    pub fn from_code(code: &str) -> Self {
        Self { code: code.to_string(), ..Self::default() }
    }
}
