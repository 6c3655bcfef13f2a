//! Decoding of the three input files into batch inputs.

use std::io::Read;
use std::path::Path;

use crate::error::InputError;

/// First column of a headerless CSV, blank cells dropped, order kept.
pub fn load_codes(path: &Path) -> Result<Vec<String>, InputError> {
    let file = std::fs::File::open(path)
        .map_err(|e| InputError::CodeSource(format!("{}: {}", path.display(), e)))?;
    read_first_column(file)
        .map_err(|e| InputError::CodeSource(format!("{}: {}", path.display(), e)))
}

/// Whole file as the prompt template.
pub fn load_template(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path)
        .map_err(|e| InputError::TemplateSource(format!("{}: {}", path.display(), e)))
}

/// One URL per row of a headerless, single-column CSV. Blank rows are skipped.
pub fn load_urls(path: &Path) -> Result<Vec<String>, InputError> {
    let file = std::fs::File::open(path)
        .map_err(|e| InputError::UrlSource(format!("{}: {}", path.display(), e)))?;
    read_first_column(file).map_err(|e| InputError::UrlSource(format!("{}: {}", path.display(), e)))
}

fn read_first_column<R: Read>(reader: R) -> Result<Vec<String>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(value) = record.get(0).filter(|v| !v.is_empty()) {
            values.push(value.to_string());
        }
    }
    Ok(values)
}
