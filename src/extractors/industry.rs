// src/extractors/industry.rs

use serde::Serialize;
use std::fmt;

/// Reporting archetype of a company. Decides which canonical indicators are relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum IndustryType {
    #[default]
    Manufacturing,
    Banking,
    Securities,
    Insurance,
    Venture,
}

impl IndustryType {
    pub const ALL: [IndustryType; 5] = [
        IndustryType::Manufacturing,
        IndustryType::Banking,
        IndustryType::Securities,
        IndustryType::Insurance,
        IndustryType::Venture,
    ];

    /// Label used in output columns and partition file names.
    pub fn label(&self) -> &'static str {
        match self {
            IndustryType::Manufacturing => "제조업",
            IndustryType::Banking => "은행업",
            IndustryType::Securities => "증권업",
            IndustryType::Insurance => "보험업",
            IndustryType::Venture => "창투업",
        }
    }

    /// Canonical finance-ratio indicators shown for this archetype.
    pub fn relevant_indicators(&self) -> &'static [&'static str] {
        match self {
            IndustryType::Manufacturing => &[
                "유동비율", "부채비율", "유보율", "순차입금비율", "이자보상배율", "자기자본비율",
                "매출증가율", "판관비증가율", "EPS증가율", "영업이익증가율", "EBITDA증가율",
                "매출총이익률", "세전계속이익률", "영업이익률", "EBITDA마진율",
                "ROIC", "ROA", "ROE",
                "총자산회전율", "타인자본회전율", "자기자본회전율", "순운전자본회전율",
            ],
            IndustryType::Banking => &[
                "예대율",
                "매출증가율", "영업이익증가율", "순이익증가율", "EPS증가율",
                "총자산증가율", "대출채권증가율", "예수부채증가율",
                "판관비율", "ROA", "NIM", "예대마진율", "ROE",
            ],
            IndustryType::Securities => &[
                "예대율", "유가증권보유율", "부채비율", "유보율",
                "매출증가율", "영업이익증가율", "순이익증가율", "EPS증가율",
                "영업이익률", "ROA", "ROE",
            ],
            IndustryType::Insurance => &[
                "운용자산비율", "자기자본비율",
                "매출증가율", "영업이익증가율", "순이익증가율", "EPS증가율",
                "영업이익률", "순이익률", "운용자산이익률", "ROA", "ROE",
                "손해율", "순사업비율",
            ],
            IndustryType::Venture => &[
                "부채비율", "유보율",
                "매출증가율", "영업이익증가율", "순이익증가율", "EPS증가율",
                "영업이익률", "순이익률", "ROA", "ROE",
            ],
        }
    }
}

impl fmt::Display for IndustryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classification rule: the market text must contain any of `market_any`
/// and the FICS text must contain any of `fics_any`.
struct ClassificationRule {
    industry: IndustryType,
    market_any: &'static [&'static str],
    fics_any: &'static [&'static str],
}

impl ClassificationRule {
    fn matches(&self, market: &str, fics: &str) -> bool {
        self.market_any.iter().any(|marker| market.contains(marker))
            && self.fics_any.iter().any(|marker| fics.contains(marker))
    }
}

// Order matters: first match wins.
const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule { industry: IndustryType::Insurance, market_any: &["보험"], fics_any: &["보험"] },
    ClassificationRule { industry: IndustryType::Banking, market_any: &["금융", "은행"], fics_any: &["상업은행"] },
    ClassificationRule { industry: IndustryType::Securities, market_any: &["금융", "증권"], fics_any: &["증권"] },
    ClassificationRule { industry: IndustryType::Venture, market_any: &["금융"], fics_any: &["창업투자 및 종금"] },
];

/// Infers the reporting archetype from the market sector and FICS sector texts.
pub fn classify_industry(market_sector: &str, fics_sector: &str) -> IndustryType {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(market_sector, fics_sector))
        .map_or(IndustryType::Manufacturing, |rule| rule.industry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_financial_archetypes() {
        assert_eq!(classify_industry("금융", "상업은행"), IndustryType::Banking);
        assert_eq!(classify_industry("보험", "생명보험"), IndustryType::Insurance);
        assert_eq!(classify_industry("코스피 증권", "증권"), IndustryType::Securities);
        assert_eq!(classify_industry("코스닥 금융", "창업투자 및 종금"), IndustryType::Venture);
    }

    #[test]
    fn defaults_to_manufacturing() {
        assert_eq!(classify_industry("제조", "반도체"), IndustryType::Manufacturing);
        assert_eq!(classify_industry("", ""), IndustryType::Manufacturing);
        // Market marker alone is not enough.
        assert_eq!(classify_industry("금융", "반도체"), IndustryType::Manufacturing);
    }

    #[test]
    fn insurance_rule_precedes_banking() {
        assert_eq!(classify_industry("보험 금융", "손해보험 상업은행"), IndustryType::Insurance);
    }

    #[test]
    fn every_archetype_lists_revenue_growth() {
        for industry in IndustryType::ALL {
            assert!(industry.relevant_indicators().contains(&"매출증가율"), "{}", industry);
        }
    }
}
