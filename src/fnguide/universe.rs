// src/fnguide/universe.rs
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

use super::models::ListedCompany;
use crate::utils::error::StorageError;

const SPAC_MARKER: &str = "스팩";
const CODE_WIDTH: usize = 6;

/// Loads the listed-company universe from a CSV with the columns
/// `종목코드,회사명,업종,주요제품`.
pub fn load_universe<P: AsRef<Path>>(path: P) -> Result<Vec<ListedCompany>, StorageError> {
    let file = std::fs::File::open(path.as_ref())?;
    let companies = read_universe(file)?;
    tracing::info!("Loaded {} companies from {}", companies.len(), path.as_ref().display());
    Ok(companies)
}

pub fn read_universe<R: Read>(reader: R) -> Result<Vec<ListedCompany>, StorageError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut companies = Vec::new();
    for result in rdr.deserialize() {
        let mut company: ListedCompany = result?;
        if company.name.contains(SPAC_MARKER) {
            tracing::trace!("Skipping SPAC {}", company.name);
            continue;
        }
        company.code = normalize_code(&company.code);
        if company.code.is_empty() {
            continue;
        }
        companies.push(company);
    }
    Ok(companies)
}

/// Spreadsheet exports drop leading zeros (`5930` for `005930`).
pub fn normalize_code(raw: &str) -> String {
    let code = raw.trim().trim_start_matches('A');
    if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", code, width = CODE_WIDTH)
    } else {
        code.to_string()
    }
}
