// src/record/mod.rs
//! Per-company wide records and the partial records documents contribute to them.

pub mod assembler;
pub mod columns;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::extractors::industry::IndustryType;
use crate::extractors::period::PeriodKey;

pub use assembler::RecordAssembler;
#[cfg(test)]
pub use assembler::assemble;
pub use columns::ColumnLayout;

/// A single output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(value) => write!(f, "{}", value),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

/// Fixed, non-period columns. Declaration order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityField {
    Code,
    Name,
    Industry,
    MainProducts,
    MarketSector,
    FicsSector,
    FiscalMonth,
    IndustryType,
}

impl IdentityField {
    pub const ORDER: [IdentityField; 8] = [
        IdentityField::Code,
        IdentityField::Name,
        IdentityField::Industry,
        IdentityField::MainProducts,
        IdentityField::MarketSector,
        IdentityField::FicsSector,
        IdentityField::FiscalMonth,
        IdentityField::IndustryType,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            IdentityField::Code => "종목코드",
            IdentityField::Name => "종목명",
            IdentityField::Industry => "업종",
            IdentityField::MainProducts => "주요제품",
            IdentityField::MarketSector => "마켓분야",
            IdentityField::FicsSector => "FICS분야",
            IdentityField::FiscalMonth => "결산월",
            IdentityField::IndustryType => "업종타입",
        }
    }
}

/// A canonical indicator at one period; rendered as `"{period}_{indicator}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorColumn {
    pub indicator: String,
    pub period: PeriodKey,
}

impl IndicatorColumn {
    pub fn new(indicator: &str, period: PeriodKey) -> Self {
        Self { indicator: indicator.to_string(), period }
    }

    pub fn column_name(&self) -> String {
        format!("{}_{}", self.period, self.indicator)
    }
}

/// What one document contributes to a company record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub identity: BTreeMap<IdentityField, FieldValue>,
    pub indicators: BTreeMap<IndicatorColumn, f64>,
    pub attributes: BTreeMap<String, FieldValue>,
}

impl PartialRecord {
    /// Sets an identity field unless the value is empty.
    pub fn set_identity(&mut self, field: IdentityField, value: impl Into<FieldValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.identity.insert(field, value);
        }
    }

    /// Records an indicator value. The first value seen for a column is kept.
    pub fn insert_indicator(&mut self, indicator: &str, period: PeriodKey, value: f64) -> bool {
        let column = IndicatorColumn::new(indicator, period);
        if self.indicators.contains_key(&column) {
            tracing::trace!("Keeping earlier value for {}", column.column_name());
            return false;
        }
        self.indicators.insert(column, value);
        true
    }

    pub fn insert_attribute(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.attributes.entry(name.to_string()).or_insert(value);
        }
    }

}

/// The assembled wide row for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub code: String,
    pub industry: IndustryType,
    pub identity: BTreeMap<IdentityField, FieldValue>,
    pub indicators: BTreeMap<IndicatorColumn, f64>,
    pub attributes: BTreeMap<String, FieldValue>,
}

impl CompanyRecord {
    #[cfg(test)]
    pub fn identity_text(&self, field: IdentityField) -> &str {
        self.identity.get(&field).and_then(FieldValue::as_text).unwrap_or("")
    }

    #[cfg(test)]
    pub fn indicator(&self, indicator: &str, period: PeriodKey) -> Option<f64> {
        self.indicators.get(&IndicatorColumn::new(indicator, period)).copied()
    }

    /// Every populated column, keyed by column name.
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let identity = self
            .identity
            .iter()
            .map(|(field, value)| (field.column().to_string(), value.clone()));
        let indicators = self
            .indicators
            .iter()
            .map(|(column, value)| (column.column_name(), FieldValue::Number(*value)));
        let attributes = self.attributes.iter().map(|(name, value)| (name.clone(), value.clone()));
        identity.chain(indicators).chain(attributes).collect()
    }
}
