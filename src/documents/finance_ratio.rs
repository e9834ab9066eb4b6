// src/documents/finance_ratio.rs
//! Financial ratio page (`SVD_FinanceRatio.asp`).
//!
//! The same two grids serve every industry archetype: `p_grid1_*` rows hold
//! the consolidated annual ratios, `p_grid2_*` rows the consolidated
//! three-month ratios. Banks, brokers and insurers label their rows
//! differently; the finance-ratio name table folds those labels together.

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

const ANNUAL_GRID: &str = "p_grid1";
const QUARTERLY_GRID: &str = "p_grid2";

/// Output order: stability, growth, profitability, activity.
pub const INDICATOR_ORDER: &[&str] = &[
    "유동비율", "부채비율", "유보율", "순차입금비율", "이자보상배율", "자기자본비율",
    "예대율", "유가증권보유율", "운용자산비율",
    "매출증가율", "판관비증가율", "영업이익증가율", "EBITDA증가율", "EPS증가율", "순이익증가율",
    "총자산증가율", "대출채권증가율", "예수부채증가율",
    "매출총이익률", "세전계속이익률", "영업이익률", "EBITDA마진율", "순이익률", "판관비율",
    "ROIC", "ROA", "ROE", "NIM", "예대마진율", "운용자산이익률", "손해율", "순사업비율",
    "총자산회전율", "타인자본회전율", "자기자본회전율", "순운전자본회전율",
];

pub const LAYOUT: ColumnLayout = ColumnLayout::new(INDICATOR_ORDER, &[]);

pub fn annual_rule(config: &ExtractionConfig) -> SectionRule {
    SectionRule {
        name: "financial ratios (annual)",
        descriptor: SectionDescriptor::RowFamily(ANNUAL_GRID),
        header: HeaderRow::Marked,
        rows: RowScope::IdFamily(ANNUAL_GRID),
        policy: PeriodPolicy::latest_per_year(config.annual_years),
        scope: NameScope::FinanceRatio,
        required: true,
    }
}

pub fn quarterly_rule(config: &ExtractionConfig) -> SectionRule {
    SectionRule {
        name: "financial ratios (quarterly)",
        descriptor: SectionDescriptor::RowFamily(QUARTERLY_GRID),
        header: HeaderRow::Marked,
        rows: RowScope::IdFamily(QUARTERLY_GRID),
        policy: PeriodPolicy::TrailingN(config.quarterly_periods),
        scope: NameScope::FinanceRatio,
        required: false,
    }
}

pub fn extract(html: &Html, config: &ExtractionConfig) -> Result<Option<PartialRecord>, ExtractError> {
    let mut partial = header_identity(html);
    let rules = [annual_rule(config), quarterly_rule(config)];
    Ok(extract_sections(html, &rules, config, &mut partial)?.map(|_| partial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::period::PeriodKey;
    use crate::record::IndicatorColumn;

    fn grid(family: &str, periods: &[&str], rows: &[(&str, &[&str])]) -> String {
        let header: String = periods.iter().map(|p| format!("<th scope=\"col\">{}</th>", p)).collect();
        let body: String = rows
            .iter()
            .enumerate()
            .map(|(i, (label, values))| {
                let cells: String = values.iter().map(|v| format!("<td>{}</td>", v)).collect();
                format!(
                    "<tr id=\"{}_{}\"><th scope=\"row\"><div><a class=\"tip_in\"><span class=\"txt_acd\">{}</span></a></div></th>{}</tr>",
                    family,
                    i + 1,
                    label,
                    cells
                )
            })
            .collect();
        format!(
            "<table><thead><tr class=\"td_gapcolor2\"><th>IFRS(연결)</th>{}</tr></thead><tbody>{}</tbody></table>",
            header, body
        )
    }

    fn page(grids: &[String]) -> Html {
        Html::parse_document(&format!(
            "<html><head><title>KB금융(A105560) | 재무비율</title></head><body>{}</body></html>",
            grids.concat()
        ))
    }

    fn value(partial: &PartialRecord, indicator: &str, period: PeriodKey) -> Option<f64> {
        partial.indicators.get(&IndicatorColumn::new(indicator, period)).copied()
    }

    #[test]
    fn banking_labels_map_onto_shared_columns() {
        let annual = grid(
            ANNUAL_GRID,
            &["2020/12", "2021/12", "2022/12", "2023/12", "2024/09"],
            &[
                ("이자수익증가율", &["1", "2", "3", "4", "5"]),
                ("순이자마진율(NIM)", &["1.5", "1.6", "1.7", "1.8", "1.9"]),
                ("총자산이익률(ROA)", &["0.5", "0.6", "0.7", "0.8", "0.9"]),
            ],
        );
        let html = page(&[annual]);
        let partial = extract(&html, &ExtractionConfig::for_year(2024)).unwrap().unwrap();

        assert_eq!(value(&partial, "매출증가율", PeriodKey::year(2021)), Some(2.0));
        assert_eq!(value(&partial, "NIM", PeriodKey::year(2024)), Some(1.9));
        assert_eq!(value(&partial, "ROA", PeriodKey::year(2020)), None);
        assert_eq!(partial.indicators.len(), 12);
    }

    #[test]
    fn missing_quarterly_grid_keeps_annual_columns_only() {
        let annual = grid(ANNUAL_GRID, &["2022/12", "2023/12"], &[("ROE", &["10", "11"])]);
        let html = page(&[annual]);
        let partial = extract(&html, &ExtractionConfig::for_year(2024)).unwrap().unwrap();
        assert!(partial.indicators.keys().all(|column| column.period.month.is_none()));
        assert_eq!(partial.indicators.len(), 2);
    }

    #[test]
    fn quarterly_grid_keeps_trailing_periods() {
        let annual = grid(ANNUAL_GRID, &["2023/12"], &[("ROE", &["10"])]);
        let quarterly = grid(
            QUARTERLY_GRID,
            &["2023/09", "2023/12", "2024/03", "2024/06"],
            &[("ROE", &["1", "2", "3", "4"])],
        );
        let html = page(&[annual, quarterly]);
        let partial = extract(&html, &ExtractionConfig::for_year(2024)).unwrap().unwrap();

        assert_eq!(value(&partial, "ROE", PeriodKey::year_month(2023, 9)), None);
        assert_eq!(value(&partial, "ROE", PeriodKey::year_month(2023, 12)), Some(2.0));
        assert_eq!(value(&partial, "ROE", PeriodKey::year_month(2024, 6)), Some(4.0));
        assert_eq!(value(&partial, "ROE", PeriodKey::year(2023)), Some(10.0));
    }

    #[test]
    fn missing_annual_grid_contributes_nothing() {
        let quarterly = grid(QUARTERLY_GRID, &["2024/03"], &[("ROE", &["3"])]);
        let html = page(&[quarterly]);
        assert!(extract(&html, &ExtractionConfig::for_year(2024)).unwrap().is_none());
    }
}
