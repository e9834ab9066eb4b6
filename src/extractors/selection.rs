// src/extractors/selection.rs

use std::collections::BTreeMap;

use super::period::{Period, PeriodKey};
use crate::utils::error::ExtractError;

/// Years kept around an externally supplied current year: `[current - back, current + forward]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub back: u32,
    pub forward: u32,
}

impl YearWindow {
    fn contains(&self, year: i32, current_year: i32) -> bool {
        let back = i32::try_from(self.back).unwrap_or(i32::MAX);
        let forward = i32::try_from(self.forward).unwrap_or(i32::MAX);
        year >= current_year.saturating_sub(back) && year <= current_year.saturating_add(forward)
    }
}

/// How the columns of a section are reduced to the periods that end up in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPolicy {
    /// One column per year (the one with the latest month), most recent `max_years` years.
    LatestPerYear {
        max_years: Option<usize>,
        window: Option<YearWindow>,
    },
    /// The last `n` columns in chronological order.
    TrailingN(usize),
    /// Every column. No shipped page rule keeps unbounded history.
    #[allow(dead_code)]
    All,
}

/// A kept period and the data column it reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedPeriod {
    pub key: PeriodKey,
    pub column: usize,
}

impl PeriodPolicy {
    pub fn latest_per_year(max_years: usize) -> Self {
        PeriodPolicy::LatestPerYear { max_years: Some(max_years), window: None }
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        match self {
            PeriodPolicy::LatestPerYear { max_years: Some(0), .. } => Err(ExtractError::InvalidPolicy(
                "LatestPerYear must keep at least one year".to_string(),
            )),
            PeriodPolicy::TrailingN(0) => Err(ExtractError::InvalidPolicy(
                "TrailingN must keep at least one period".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Picks the periods to extract. `periods[i]` describes data column `i`.
    ///
    /// Columns with the same (year, month) collapse onto the rightmost one.
    /// Output is in ascending period order.
    pub fn select(&self, periods: &[Period], current_year: i32) -> Vec<SelectedPeriod> {
        match *self {
            PeriodPolicy::LatestPerYear { max_years, window } => {
                let mut per_year: BTreeMap<i32, (Period, usize)> = BTreeMap::new();
                for (column, period) in periods.iter().enumerate() {
                    if let Some(window) = window {
                        if !window.contains(period.year, current_year) {
                            tracing::trace!("Period {} outside year window", period.key());
                            continue;
                        }
                    }
                    per_year
                        .entry(period.year)
                        .and_modify(|kept| {
                            if *period >= kept.0 {
                                *kept = (*period, column);
                            }
                        })
                        .or_insert((*period, column));
                }

                let skip = max_years.map_or(0, |max| per_year.len().saturating_sub(max));
                per_year
                    .into_iter()
                    .skip(skip)
                    .map(|(year, (_, column))| SelectedPeriod { key: PeriodKey::year(year), column })
                    .collect()
            }
            PeriodPolicy::TrailingN(n) => {
                let all = rightmost_per_period(periods);
                let skip = all.len().saturating_sub(n);
                all.into_iter().skip(skip).collect()
            }
            PeriodPolicy::All => rightmost_per_period(periods),
        }
    }
}

fn rightmost_per_period(periods: &[Period]) -> Vec<SelectedPeriod> {
    let mut by_key: BTreeMap<PeriodKey, usize> = BTreeMap::new();
    for (column, period) in periods.iter().enumerate() {
        by_key.insert(period.key(), column);
    }
    by_key
        .into_iter()
        .map(|(key, column)| SelectedPeriod { key, column })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> Period {
        Period::year_month(year, month, false)
    }

    fn rendered(selected: &[SelectedPeriod]) -> Vec<(String, usize)> {
        selected.iter().map(|s| (s.key.to_string(), s.column)).collect()
    }

    #[test]
    fn latest_per_year_keeps_max_month_column() {
        let periods = [ym(2021, 12), ym(2022, 3), ym(2022, 12), ym(2023, 6)];
        let selected = PeriodPolicy::latest_per_year(4).select(&periods, 2024);
        assert_eq!(
            rendered(&selected),
            vec![("2021".to_string(), 0), ("2022".to_string(), 2), ("2023".to_string(), 3)]
        );
    }

    #[test]
    fn latest_per_year_limits_to_most_recent_years() {
        let periods = [ym(2019, 12), ym(2020, 12), ym(2021, 12), ym(2022, 12), ym(2023, 12)];
        let selected = PeriodPolicy::latest_per_year(4).select(&periods, 2024);
        assert_eq!(selected.first().map(|s| s.key), Some(PeriodKey::year(2020)));
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn window_excludes_stale_and_far_future_years() {
        let periods = [ym(2019, 12), ym(2021, 12), ym(2024, 12), ym(2025, 12), ym(2026, 12)];
        let policy = PeriodPolicy::LatestPerYear {
            max_years: None,
            window: Some(YearWindow { back: 3, forward: 1 }),
        };
        let selected = policy.select(&periods, 2024);
        assert_eq!(
            rendered(&selected),
            vec![("2021".to_string(), 1), ("2024".to_string(), 2), ("2025".to_string(), 3)]
        );
    }

    #[test]
    fn window_bounds_saturate_at_extreme_years() {
        let window = YearWindow { back: 3, forward: 1 };
        assert!(window.contains(i32::MAX, i32::MAX));
        assert!(window.contains(i32::MIN, i32::MIN + 1));
        assert!(!window.contains(i32::MAX - 10, i32::MAX));
    }

    #[test]
    fn duplicate_columns_resolve_to_rightmost() {
        let periods = [ym(2023, 12), ym(2023, 12), Period::year_month(2024, 12, true)];
        let latest = PeriodPolicy::latest_per_year(4).select(&periods, 2024);
        assert_eq!(latest[0].column, 1);

        let all = PeriodPolicy::All.select(&periods, 2024);
        assert_eq!(rendered(&all), vec![("2023/12".to_string(), 1), ("2024/12".to_string(), 2)]);
    }

    #[test]
    fn trailing_n_keeps_last_columns_in_chronological_order() {
        let periods = [ym(2023, 9), ym(2023, 12), ym(2024, 3), ym(2024, 6)];
        let selected = PeriodPolicy::TrailingN(3).select(&periods, 2024);
        assert_eq!(
            rendered(&selected),
            vec![("2023/12".to_string(), 1), ("2024/03".to_string(), 2), ("2024/06".to_string(), 3)]
        );
    }

    #[test]
    fn trailing_n_with_fewer_columns_keeps_everything() {
        let periods = [ym(2024, 3)];
        assert_eq!(PeriodPolicy::TrailingN(3).select(&periods, 2024).len(), 1);
        assert!(PeriodPolicy::TrailingN(3).select(&[], 2024).is_empty());
    }

    #[test]
    fn zero_sized_policies_are_rejected() {
        assert!(PeriodPolicy::TrailingN(0).validate().unwrap_err().is_fatal());
        assert!(PeriodPolicy::latest_per_year(0).validate().is_err());
        assert!(PeriodPolicy::All.validate().is_ok());
        assert!(PeriodPolicy::TrailingN(3).validate().is_ok());
    }
}
