// src/extractors/normalizer.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PARENTHESIZED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^)]+\)").expect("Failed to compile PARENTHESIZED_RE")
});

/// Section family a raw label comes from. Each family has its own table so a
/// label reused with a different meaning in another section cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Financial ratio grids, shared by all five industry archetypes.
    FinanceRatio,
    /// Snapshot "Financial Highlight"; canonical names carry their unit.
    Highlight,
    /// Enterprise value table of the investment index page.
    Valuation,
    /// Income statement, balance sheet and cash flow tables.
    Statements,
}

// Ratio grid labels. Industry-specific synonyms of one concept share a canonical key.
const FINANCE_RATIO_NAMES: &[(&str, &str)] = &[
    // Stability
    ("유동비율", "유동비율"),
    ("부채비율", "부채비율"),
    ("유보율", "유보율"),
    ("순차입금비율", "순차입금비율"),
    ("이자보상배율", "이자보상배율"),
    ("자기자본비율", "자기자본비율"),
    ("예대율", "예대율"),
    ("유가증권보유율", "유가증권보유율"),
    ("운용자산비율", "운용자산비율"),
    // Growth: revenue equivalents per archetype
    ("매출액증가율", "매출증가율"),
    ("이자수익증가율", "매출증가율"),   // banking
    ("순영업수익증가율", "매출증가율"), // securities
    ("보험료수익증가율", "매출증가율"), // insurance
    ("판관비증가율", "판관비증가율"),
    ("EBIT증가율", "영업이익증가율"),
    ("영업이익증가율", "영업이익증가율"),
    ("EBITDA증가율", "EBITDA증가율"),
    ("EPS증가율", "EPS증가율"),
    ("순이익증가율", "순이익증가율"),
    ("총자산증가율", "총자산증가율"),
    ("대출채권증가율", "대출채권증가율"),
    ("예수부채증가율", "예수부채증가율"),
    // Profitability
    ("매출총이익률", "매출총이익률"),
    ("세전계속사업이익률", "세전계속이익률"),
    ("EBIT마진율", "영업이익률"),
    ("영업이익율", "영업이익률"),
    ("영업이익률", "영업이익률"),
    ("EBITDA마진율", "EBITDA마진율"),
    ("ROA", "ROA"),
    ("총자산이익률", "ROA"),
    ("ROE", "ROE"),
    ("자기자본이익률", "ROE"),
    ("ROIC", "ROIC"),
    ("판관비율", "판관비율"),
    ("순이자마진율", "NIM"),
    ("예대마진율", "예대마진율"),
    ("순이익률", "순이익률"),
    ("운용자산이익률", "운용자산이익률"),
    ("손해율", "손해율"),
    ("순사업비율", "순사업비율"),
    // Activity
    ("총자산회전율", "총자산회전율"),
    ("타인자본회전율", "타인자본회전율"),
    ("자기자본회전율", "자기자본회전율"),
    ("순운전자본회전율", "순운전자본회전율"),
];

const HIGHLIGHT_NAMES: &[(&str, &str)] = &[
    ("영업이익률", "영업이익률(%)"),
    ("부채비율", "부채비율(%)"),
    ("유보율", "유보율(%)"),
    ("지배주주순이익률", "지배주주순이익률(%)"),
    ("PER", "PER(배)"),
    ("EPS", "EPS(원)"),
    ("PBR", "PBR(배)"),
    ("BPS", "BPS(원)"),
    ("ROA", "ROA(배)"),
    ("ROE", "ROE(배)"),
    ("배당수익률", "배당수익률(%)"),
];

const VALUATION_NAMES: &[(&str, &str)] = &[
    // Per share
    ("EPS", "EPS"),
    ("EBITDAPS", "EBITDAPS"),
    ("CFPS", "CFPS"),
    ("SPS", "SPS"),
    ("BPS", "BPS"),
    ("DPS(보통주)", "DPS(보통주)"),
    ("DPS(1우선주)", "DPS(1우선주)"),
    ("배당성향(현금)", "배당성향(현금)"),
    // Multiples
    ("PER", "PER"),
    ("PCR", "PCR"),
    ("PSR", "PSR"),
    ("PBR", "PBR"),
    ("EV/Sales", "EV/Sales"),
    ("EV/EBITDA", "EV/EBITDA"),
    // FCF
    ("총현금흐름", "총현금흐름"),
    ("총투자", "총투자"),
    ("FCFF", "FCFF"),
];

const STATEMENT_NAMES: &[(&str, &str)] = &[
    // Income statement
    ("매출액", "매출액"),
    ("매출원가", "매출원가"),
    ("매출총이익", "매출총이익"),
    ("판매비와관리비", "판매비와관리비"),
    ("영업이익", "영업이익"),
    ("세전계속사업이익", "세전계속사업이익"),
    ("당기순이익", "당기순이익"),
    ("지배주주순이익", "지배주주순이익"),
    // Balance sheet
    ("자산", "자산"),
    ("유동자산", "유동자산"),
    ("비유동자산", "비유동자산"),
    ("부채", "부채"),
    ("유동부채", "유동부채"),
    ("비유동부채", "비유동부채"),
    ("자본", "자본"),
    ("지배기업주주지분", "지배기업주주지분"),
    // Cash flow
    ("영업활동으로인한현금흐름", "영업활동현금흐름"),
    ("투자활동으로인한현금흐름", "투자활동현금흐름"),
    ("재무활동으로인한현금흐름", "재무활동현금흐름"),
];

static FINANCE_RATIO: Lazy<IndicatorNormalizer> = Lazy::new(|| IndicatorNormalizer::from_table(FINANCE_RATIO_NAMES));
static HIGHLIGHT: Lazy<IndicatorNormalizer> = Lazy::new(|| IndicatorNormalizer::from_table(HIGHLIGHT_NAMES));
static VALUATION: Lazy<IndicatorNormalizer> = Lazy::new(|| IndicatorNormalizer::from_table(VALUATION_NAMES));
static STATEMENTS: Lazy<IndicatorNormalizer> = Lazy::new(|| IndicatorNormalizer::from_table(STATEMENT_NAMES));

/// Maps raw row labels onto canonical indicator names.
#[derive(Debug)]
pub struct IndicatorNormalizer {
    names: HashMap<&'static str, &'static str>,
}

impl IndicatorNormalizer {
    pub fn from_table(table: &'static [(&'static str, &'static str)]) -> Self {
        Self { names: table.iter().copied().collect() }
    }

    pub fn for_scope(scope: NameScope) -> &'static IndicatorNormalizer {
        match scope {
            NameScope::FinanceRatio => &FINANCE_RATIO,
            NameScope::Highlight => &HIGHLIGHT,
            NameScope::Valuation => &VALUATION,
            NameScope::Statements => &STATEMENTS,
        }
    }

    /// Exact match, then without parenthesized groups, then without whitespace.
    pub fn normalize(&self, raw_label: &str) -> Option<&'static str> {
        let raw_label = raw_label.trim();
        if let Some(canonical) = self.names.get(raw_label) {
            return Some(*canonical);
        }

        let without_parens = PARENTHESIZED_RE.replace_all(raw_label, "");
        let without_parens = without_parens.trim();
        if let Some(canonical) = self.names.get(without_parens) {
            return Some(*canonical);
        }

        let compact: String = without_parens.chars().filter(|c| !c.is_whitespace()).collect();
        let canonical = self.names.get(compact.as_str()).copied();
        if canonical.is_none() {
            tracing::trace!("Unrecognized indicator label '{}'", raw_label);
        }
        canonical
    }
}
