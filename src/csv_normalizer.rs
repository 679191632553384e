//! CSV parsing and header normalization for equipment uploads.
//!
//! Headers are trimmed, lower-cased and whitespace-collapsed, then matched
//! against a fixed alias table once per parse. Cells are trimmed and cast to
//! numbers when they look numeric; no schema validation happens here. Only
//! truly empty lines are skipped, so a row of bare separators still counts.

use std::collections::HashMap;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use crate::error::EquipmentError;

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Renders the cell as a label; numbers use their shortest decimal form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(value) => Some(value.to_string()),
            CellValue::Text(text) => Some(text.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Name,
    Type,
    Flowrate,
    Pressure,
    Temperature,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Name,
        CanonicalField::Type,
        CanonicalField::Flowrate,
        CanonicalField::Pressure,
        CanonicalField::Temperature,
    ];

    /// Accepted header spellings after normalization, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Name => &["name", "equipment name"],
            CanonicalField::Type => &["type"],
            CanonicalField::Flowrate => &["flowrate"],
            CanonicalField::Pressure => &["pressure"],
            CanonicalField::Temperature => &["temperature"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Type => "type",
            CanonicalField::Flowrate => "flowrate",
            CanonicalField::Pressure => "pressure",
            CanonicalField::Temperature => "temperature",
        }
    }
}

pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches(UTF8_BOM)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Which normalized header keys feed each canonical field, in alias order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    keys: HashMap<CanonicalField, Vec<String>>,
}

impl ColumnMapping {
    pub fn resolve(headers: &[String]) -> Self {
        let mut keys = HashMap::new();

        for field in CanonicalField::ALL {
            let present: Vec<String> = field
                .aliases()
                .iter()
                .filter(|alias| headers.iter().any(|header| header == *alias))
                .map(|alias| alias.to_string())
                .collect();

            if !present.is_empty() {
                keys.insert(field, present);
            }
        }

        Self { keys }
    }

    pub fn keys_for(&self, field: CanonicalField) -> &[String] {
        self.keys.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.keys.contains_key(&field)
    }

    pub fn missing_fields(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| !self.has_field(*field))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    values: HashMap<String, CellValue>,
}

impl NormalizedRecord {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.values.get(key)
    }

    /// First non-empty cell among the field's aliases.
    pub fn resolve(&self, field: CanonicalField, columns: &ColumnMapping) -> Option<&CellValue> {
        columns
            .keys_for(field)
            .iter()
            .filter_map(|key| self.values.get(key))
            .find(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for NormalizedRecord {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub columns: ColumnMapping,
    pub records: Vec<NormalizedRecord>,
}

pub fn parse_csv(content: &str) -> Result<ParsedCsv, EquipmentError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EquipmentError::Parse {
            message: format!("Failed to read CSV headers: {}", e),
        })?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|header| header.is_empty()) {
        return Err(EquipmentError::Parse {
            message: "CSV file has no header row".to_string(),
        });
    }
    debug!("Normalized CSV headers: {:?}", headers);

    let columns = ColumnMapping::resolve(&headers);
    let missing = columns.missing_fields();
    if !missing.is_empty() {
        debug!(
            "CSV is missing columns {:?}; defaults will apply",
            missing.iter().map(CanonicalField::as_str).collect::<Vec<_>>()
        );
    }

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| EquipmentError::Parse {
            message: format!("Failed to parse CSV row {}: {}", line + 1, e),
        })?;

        let normalized: NormalizedRecord = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), CellValue::from_raw(cell)))
            .collect();

        records.push(normalized);
    }

    info!(
        "Parsed {} records across {} columns",
        records.len(),
        headers.len()
    );

    Ok(ParsedCsv {
        headers,
        columns,
        records,
    })
}
