// src/documents/finance.rs
//! Financial statements page (`SVD_Finance.asp`).

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{extract_sections, header_identity};
use crate::extractors::cell::parse_number;
use crate::extractors::locator::SectionDescriptor;
use crate::extractors::normalizer::NameScope;
use crate::extractors::period::HeaderRow;
use crate::extractors::section::{RowScope, SectionRule};
use crate::extractors::selection::PeriodPolicy;
use crate::pipeline::ExtractionConfig;
use crate::record::{ColumnLayout, PartialRecord};
use crate::utils::error::ExtractError;

static MULTIPLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#corp_group2 dl").expect("Failed to compile MULTIPLE_SELECTOR")
});

static MULTIPLE_VALUE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("dd").expect("Failed to compile MULTIPLE_VALUE_SELECTOR")
});

/// Header multiples by position in `#corp_group2`: PER, 12M PER, industry PER, PBR, dividend yield.
const HEADER_MULTIPLES: [(usize, &str); 2] = [(0, "PER"), (3, "PBR")];

pub const INDICATOR_ORDER: &[&str] = &[
    "매출액", "매출원가", "매출총이익", "판매비와관리비", "영업이익", "세전계속사업이익",
    "당기순이익", "지배주주순이익",
    "자산", "유동자산", "비유동자산", "부채", "유동부채", "비유동부채", "자본", "지배기업주주지분",
    "영업활동현금흐름", "투자활동현금흐름", "재무활동현금흐름",
];

pub const LAYOUT: ColumnLayout = ColumnLayout::new(INDICATOR_ORDER, &["PER", "PBR"]);

fn statement_rule(name: &'static str, id: &'static str, policy: PeriodPolicy, required: bool) -> SectionRule {
    SectionRule {
        name,
        descriptor: SectionDescriptor::ElementId(id),
        header: HeaderRow::Marked,
        rows: RowScope::Body,
        policy,
        scope: NameScope::Statements,
        required,
    }
}

/// Income statement, balance sheet and cash flow, annual then quarterly.
/// Only the annual income statement is required.
pub fn statement_rules(config: &ExtractionConfig) -> [SectionRule; 6] {
    let annual = PeriodPolicy::latest_per_year(config.annual_years);
    let quarterly = PeriodPolicy::TrailingN(config.statement_quarters);
    [
        statement_rule("income statement (annual)", "divSonikY", annual, true),
        statement_rule("income statement (quarterly)", "divSonikQ", quarterly, false),
        statement_rule("balance sheet (annual)", "divDaechaY", annual, false),
        statement_rule("balance sheet (quarterly)", "divDaechaQ", quarterly, false),
        statement_rule("cash flow (annual)", "divCashY", annual, false),
        statement_rule("cash flow (quarterly)", "divCashQ", quarterly, false),
    ]
}

pub fn extract(html: &Html, config: &ExtractionConfig) -> Result<Option<PartialRecord>, ExtractError> {
    let mut partial = header_identity(html);
    if extract_sections(html, &statement_rules(config), config, &mut partial)?.is_none() {
        return Ok(None);
    }

    let entries: Vec<_> = html.select(&MULTIPLE_SELECTOR).collect();
    for (position, name) in HEADER_MULTIPLES {
        let value = entries
            .get(position)
            .and_then(|dl| dl.select(&MULTIPLE_VALUE_SELECTOR).next())
            .and_then(|dd| parse_number(&dd.text().collect::<String>()));
        match value {
            Some(value) => partial.insert_attribute(name, value),
            None => tracing::debug!("Header multiple {} not available", name),
        }
    }

    Ok(Some(partial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::period::PeriodKey;
    use crate::record::{FieldValue, IdentityField, IndicatorColumn};

    fn statement(id: &str, periods: &[&str], rows: &[(&str, &[&str])]) -> String {
        let header: String = periods.iter().map(|p| format!("<th scope=\"col\">{}</th>", p)).collect();
        let body: String = rows
            .iter()
            .map(|(label, values)| {
                let cells: String = values.iter().map(|v| format!("<td class=\"r\">{}</td>", v)).collect();
                format!("<tr><th scope=\"row\"><div>{}</div></th>{}</tr>", label, cells)
            })
            .collect();
        format!(
            "<div id=\"{}\"><table><thead><tr><th>IFRS(연결)</th>{}<th>전년동기</th></tr></thead><tbody>{}</tbody></table></div>",
            id, header, body
        )
    }

    fn page(sections: &[String]) -> Html {
        Html::parse_document(&format!(
            "<html><body><h1 id=\"giName\">삼성전자</h1>\
             <div id=\"corp_group2\" class=\"corp_group2\">\
               <dl><dt>PER</dt><dd>13.21</dd></dl><dl><dt>12M PER</dt><dd>10.0</dd></dl>\
               <dl><dt>업종 PER</dt><dd>20.1</dd></dl><dl><dt>PBR</dt><dd>1.10</dd></dl>\
               <dl><dt>배당수익률</dt><dd>2.1%</dd></dl>\
             </div>{}</body></html>",
            sections.concat()
        ))
    }

    fn value(partial: &PartialRecord, indicator: &str, period: PeriodKey) -> Option<f64> {
        partial.indicators.get(&IndicatorColumn::new(indicator, period)).copied()
    }

    #[test]
    fn annual_and_quarterly_statements_use_distinct_period_keys() {
        let html = page(&[
            statement(
                "divSonikY",
                &["2021/12", "2022/12", "2023/12", "2024/12"],
                &[("매출액", &["2,796,048", "3,022,314", "2,589,355", "3,008,709"])],
            ),
            statement(
                "divSonikQ",
                &["2024/03", "2024/06", "2024/09", "2024/12", "2025/03"],
                &[("매출액", &["1", "2", "3", "4", "5"])],
            ),
            statement(
                "divCashY",
                &["2023/12", "2024/12"],
                &[("영업활동으로인한현금흐름", &["444,137", "729,826"])],
            ),
        ]);
        let partial = extract(&html, &ExtractionConfig::for_year(2025)).unwrap().unwrap();

        assert_eq!(value(&partial, "매출액", PeriodKey::year(2021)), Some(2_796_048.0));
        assert_eq!(value(&partial, "매출액", PeriodKey::year_month(2024, 3)), None);
        assert_eq!(value(&partial, "매출액", PeriodKey::year_month(2024, 6)), Some(2.0));
        assert_eq!(value(&partial, "매출액", PeriodKey::year_month(2025, 3)), Some(5.0));
        assert_eq!(value(&partial, "영업활동현금흐름", PeriodKey::year(2024)), Some(729_826.0));
    }

    #[test]
    fn header_multiples_and_name_are_attributes() {
        let html = page(&[statement("divSonikY", &["2024/12"], &[("매출액", &["1"])])]);
        let partial = extract(&html, &ExtractionConfig::for_year(2025)).unwrap().unwrap();
        assert_eq!(partial.attributes.get("PER"), Some(&FieldValue::Number(13.21)));
        assert_eq!(partial.attributes.get("PBR"), Some(&FieldValue::Number(1.1)));
        assert_eq!(partial.identity.get(&IdentityField::Name), Some(&FieldValue::from("삼성전자")));
    }

    #[test]
    fn missing_income_statement_contributes_nothing() {
        let html = page(&[statement("divDaechaY", &["2024/12"], &[("자산", &["1"])])]);
        assert!(extract(&html, &ExtractionConfig::for_year(2025)).unwrap().is_none());
    }
}
