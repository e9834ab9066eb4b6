// src/record/assembler.rs

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::{CompanyRecord, FieldValue, IdentityField, IndicatorColumn, PartialRecord};
use crate::extractors::industry::classify_industry;

/// Folds per-document partial records into one [`CompanyRecord`].
///
/// Identity fields are fill-if-empty (first non-empty value wins). Indicator
/// and attribute columns are never overwritten once set; later documents only
/// add columns that are still missing.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    code: String,
    identity: BTreeMap<IdentityField, FieldValue>,
    indicators: BTreeMap<IndicatorColumn, f64>,
    attributes: BTreeMap<String, FieldValue>,
    documents: usize,
}

impl RecordAssembler {
    pub fn new(code: &str) -> Self {
        let mut identity = BTreeMap::new();
        identity.insert(IdentityField::Code, FieldValue::from(code));
        Self {
            code: code.to_string(),
            identity,
            indicators: BTreeMap::new(),
            attributes: BTreeMap::new(),
            documents: 0,
        }
    }

    /// Seeds an identity field from outside the documents (e.g. the listing).
    /// Seeds do not count as a successful extraction.
    pub fn seed_identity(&mut self, field: IdentityField, value: impl Into<FieldValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.identity.entry(field).or_insert(value);
        }
    }

    pub fn absorb(&mut self, partial: PartialRecord) {
        self.documents += 1;

        for (field, value) in partial.identity {
            let slot = self.identity.entry(field).or_insert_with(|| FieldValue::Text(String::new()));
            if slot.is_empty() && !value.is_empty() {
                *slot = value;
            }
        }

        let mut added = 0usize;
        for (column, value) in partial.indicators {
            if let Entry::Vacant(slot) = self.indicators.entry(column) {
                slot.insert(value);
                added += 1;
            }
        }
        for (name, value) in partial.attributes {
            self.attributes.entry(name).or_insert(value);
        }

        tracing::trace!("{}: absorbed document #{} (+{} indicator columns)", self.code, self.documents, added);
    }

    /// Returns `None` when no document contributed, meaning "no data" for this company.
    pub fn finish(mut self) -> Option<CompanyRecord> {
        if self.documents == 0 {
            tracing::debug!("{}: no document extracted, no record", self.code);
            return None;
        }

        self.identity.retain(|_, value| !value.is_empty());
        let market = self.identity_text(IdentityField::MarketSector);
        let fics = self.identity_text(IdentityField::FicsSector);
        let industry = classify_industry(&market, &fics);
        self.identity
            .insert(IdentityField::IndustryType, FieldValue::from(industry.label()));

        Some(CompanyRecord {
            code: self.code,
            industry,
            identity: self.identity,
            indicators: self.indicators,
            attributes: self.attributes,
        })
    }

    fn identity_text(&self, field: IdentityField) -> String {
        self.identity
            .get(&field)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string()
    }
}

/// Folds `partials` in order for company `code`.
#[cfg(test)]
pub fn assemble(code: &str, partials: impl IntoIterator<Item = PartialRecord>) -> Option<CompanyRecord> {
    let mut assembler = RecordAssembler::new(code);
    for partial in partials {
        assembler.absorb(partial);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::industry::IndustryType;
    use crate::extractors::period::PeriodKey;

    fn partial(name: &str, market: &str, values: &[(&str, PeriodKey, f64)]) -> PartialRecord {
        let mut partial = PartialRecord::default();
        partial.set_identity(IdentityField::Name, name);
        partial.set_identity(IdentityField::MarketSector, market);
        for (indicator, period, value) in values {
            partial.insert_indicator(indicator, *period, *value);
        }
        partial
    }

    #[test]
    fn identity_is_fill_if_empty() {
        let first = partial("", "", &[]);
        let second = partial("KB금융", "코스피 금융", &[]);
        let third = partial("다른이름", "코스닥", &[]);

        let record = assemble("105560", [first, second, third]).unwrap();
        assert_eq!(record.identity_text(IdentityField::Name), "KB금융");
        assert_eq!(record.identity_text(IdentityField::MarketSector), "코스피 금융");
        assert_eq!(record.identity_text(IdentityField::Code), "105560");
    }

    #[test]
    fn earlier_indicator_values_are_never_overwritten() {
        let y2023 = PeriodKey::year(2023);
        let q = PeriodKey::year_month(2024, 6);
        let first = partial("A", "", &[("ROE", y2023, 10.0)]);
        let second = partial("A", "", &[("ROE", y2023, 99.0), ("ROE", q, 3.0)]);

        let record = assemble("000001", [first, second]).unwrap();
        assert_eq!(record.indicator("ROE", y2023), Some(10.0));
        assert_eq!(record.indicator("ROE", q), Some(3.0));
        assert_eq!(record.indicators.len(), 2);
    }

    #[test]
    fn zero_documents_yield_no_record() {
        let mut assembler = RecordAssembler::new("000002");
        assembler.seed_identity(IdentityField::Name, "리스팅이름");
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn folding_is_idempotent() {
        let parts = vec![
            partial("삼성전자", "코스피 전기·전자", &[("ROE", PeriodKey::year(2022), 17.1)]),
            partial("", "", &[("ROE", PeriodKey::year(2023), 4.1), ("ROE", PeriodKey::year(2022), 1.0)]),
        ];
        let once = assemble("005930", parts.clone());
        assert_eq!(once, assemble("005930", parts.clone()));

        // Re-absorbing the same sequence changes nothing either.
        let doubled = assemble("005930", parts.iter().cloned().chain(parts.iter().cloned()));
        assert_eq!(once, doubled);
        assert_eq!(once.unwrap().indicator("ROE", PeriodKey::year(2022)), Some(17.1));
    }

    #[test]
    fn seeded_identity_precedes_document_identity() {
        let mut assembler = RecordAssembler::new("005930");
        assembler.seed_identity(IdentityField::Name, "삼성전자");
        assembler.absorb(partial("삼성전자(주)", "", &[]));
        let record = assembler.finish().unwrap();
        assert_eq!(record.identity_text(IdentityField::Name), "삼성전자");
    }

    #[test]
    fn industry_type_is_classified_from_sectors() {
        let mut fics = PartialRecord::default();
        fics.set_identity(IdentityField::MarketSector, "코스피 금융");
        fics.set_identity(IdentityField::FicsSector, "상업은행");
        let record = assemble("105560", [fics]).unwrap();
        assert_eq!(record.industry, IndustryType::Banking);
        assert_eq!(record.identity_text(IdentityField::IndustryType), "은행업");
    }
}
