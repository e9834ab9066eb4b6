// src/record/columns.rs

use std::collections::{BTreeMap, BTreeSet};

use super::{CompanyRecord, IdentityField};
use crate::extractors::industry::IndustryType;
use crate::extractors::period::PeriodKey;

/// Deterministic column order for a table of company records.
///
/// Identity columns come first, then the prioritized indicators (each with
/// its periods ascending), then prioritized attributes, then everything else
/// in name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub indicator_priority: &'static [&'static str],
    pub attribute_priority: &'static [&'static str],
}

impl ColumnLayout {
    pub const fn new(
        indicator_priority: &'static [&'static str],
        attribute_priority: &'static [&'static str],
    ) -> Self {
        Self { indicator_priority, attribute_priority }
    }

    pub fn ordered_columns(&self, records: &[CompanyRecord]) -> Vec<String> {
        let mut columns = identity_columns(records);

        let mut periods_by_indicator = periods_by_indicator(records);
        for indicator in self.indicator_priority {
            if let Some(periods) = periods_by_indicator.remove(*indicator) {
                columns.extend(periods.iter().map(|period| format!("{}_{}", period, indicator)));
            }
        }

        let mut attributes: BTreeSet<&str> = records
            .iter()
            .flat_map(|record| record.attributes.keys().map(String::as_str))
            .collect();
        for name in self.attribute_priority {
            if attributes.remove(name) {
                columns.push(name.to_string());
            }
        }

        let mut leftovers: Vec<String> = periods_by_indicator
            .into_iter()
            .flat_map(|(indicator, periods)| {
                periods.into_iter().map(move |period| format!("{}_{}", period, indicator))
            })
            .collect();
        leftovers.extend(attributes.into_iter().map(str::to_string));
        leftovers.sort();
        columns.extend(leftovers);

        columns
    }

    /// Columns of one industry sheet: identity plus the indicators relevant to `industry`.
    pub fn partition_columns(&self, records: &[CompanyRecord], industry: IndustryType) -> Vec<String> {
        let mut columns = identity_columns(records);
        let periods_by_indicator = periods_by_indicator(records);
        for indicator in industry.relevant_indicators() {
            if let Some(periods) = periods_by_indicator.get(*indicator) {
                columns.extend(periods.iter().map(|period| format!("{}_{}", period, indicator)));
            }
        }
        columns
    }
}

fn identity_columns(records: &[CompanyRecord]) -> Vec<String> {
    IdentityField::ORDER
        .iter()
        .filter(|field| records.iter().any(|record| record.identity.contains_key(field)))
        .map(|field| field.column().to_string())
        .collect()
}

fn periods_by_indicator(records: &[CompanyRecord]) -> BTreeMap<&str, BTreeSet<PeriodKey>> {
    let mut periods: BTreeMap<&str, BTreeSet<PeriodKey>> = BTreeMap::new();
    for column in records.iter().flat_map(|record| record.indicators.keys()) {
        periods.entry(column.indicator.as_str()).or_default().insert(column.period);
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{assemble, PartialRecord};

    const LAYOUT: ColumnLayout = ColumnLayout::new(&["ROE", "부채비율"], &["발행주식수(천주)"]);

    fn record(code: &str, values: &[(&str, PeriodKey, f64)], attributes: &[(&str, f64)]) -> CompanyRecord {
        let mut partial = PartialRecord::default();
        partial.set_identity(IdentityField::Name, "회사");
        for (indicator, period, value) in values {
            partial.insert_indicator(indicator, *period, *value);
        }
        for (name, value) in attributes {
            partial.insert_attribute(name, *value);
        }
        assemble(code, [partial]).unwrap()
    }

    #[test]
    fn identity_then_priority_then_leftovers() {
        let records = vec![
            record(
                "000001",
                &[
                    ("부채비율", PeriodKey::year(2023), 40.0),
                    ("ROE", PeriodKey::year(2023), 9.0),
                    ("ZZZ", PeriodKey::year(2023), 1.0),
                ],
                &[("발행주식수(천주)", 100.0), ("AAA_종목", 0.5)],
            ),
            record("000002", &[("ROE", PeriodKey::year(2021), 7.0)], &[]),
        ];

        let columns = LAYOUT.ordered_columns(&records);
        assert_eq!(
            columns,
            vec![
                "종목코드",
                "종목명",
                "업종타입",
                "2021_ROE",
                "2023_ROE",
                "2023_부채비율",
                "발행주식수(천주)",
                "2023_ZZZ",
                "AAA_종목",
            ]
        );
    }

    #[test]
    fn annual_periods_sort_before_quarters_of_the_same_year() {
        let records = vec![record(
            "000001",
            &[
                ("ROE", PeriodKey::year_month(2024, 6), 2.0),
                ("ROE", PeriodKey::year(2024), 1.0),
                ("ROE", PeriodKey::year_month(2024, 3), 3.0),
            ],
            &[],
        )];
        let columns = LAYOUT.ordered_columns(&records);
        let roe: Vec<_> = columns.iter().filter(|c| c.ends_with("_ROE")).collect();
        assert_eq!(roe, vec!["2024_ROE", "2024/03_ROE", "2024/06_ROE"]);
    }

    #[test]
    fn partition_keeps_only_relevant_indicators() {
        let records = vec![record(
            "105560",
            &[("NIM", PeriodKey::year(2023), 1.8), ("ROIC", PeriodKey::year(2023), 5.0)],
            &[],
        )];
        let banking = LAYOUT.partition_columns(&records, IndustryType::Banking);
        assert!(banking.contains(&"2023_NIM".to_string()));
        assert!(!banking.contains(&"2023_ROIC".to_string()));
        assert_eq!(banking[0], "종목코드");
    }

    #[test]
    fn empty_table_has_no_columns() {
        assert!(LAYOUT.ordered_columns(&[]).is_empty());
    }
}
