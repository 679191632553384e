use crate::csv_normalizer::{CanonicalField, CellValue, ColumnMapping, NormalizedRecord};
use crate::domain::NewEquipmentRow;
use crate::error::EquipmentError;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const NUMERIC_DEFAULT: f64 = 0.0;

/// Coerces a cell to a finite number, substituting `default` for anything
/// absent, blank or non-numeric.
pub fn parse_numeric_or_default(value: Option<&CellValue>, default: f64) -> f64 {
    match value {
        Some(CellValue::Number(number)) if number.is_finite() => *number,
        Some(CellValue::Text(text)) => match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => number,
            _ => default,
        },
        _ => default,
    }
}

fn resolve_label(
    record: &NormalizedRecord,
    field: CanonicalField,
    columns: &ColumnMapping,
) -> String {
    record
        .resolve(field, columns)
        .and_then(CellValue::as_text)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

fn resolve_number(
    record: &NormalizedRecord,
    field: CanonicalField,
    columns: &ColumnMapping,
) -> f64 {
    parse_numeric_or_default(record.resolve(field, columns), NUMERIC_DEFAULT)
}

pub fn map_record(
    record: &NormalizedRecord,
    columns: &ColumnMapping,
    dataset_id: &str,
    row_index: i32,
) -> NewEquipmentRow {
    NewEquipmentRow {
        dataset_id: dataset_id.to_string(),
        row_index,
        name: resolve_label(record, CanonicalField::Name, columns),
        equipment_type: resolve_label(record, CanonicalField::Type, columns),
        flowrate: resolve_number(record, CanonicalField::Flowrate, columns),
        pressure: resolve_number(record, CanonicalField::Pressure, columns),
        temperature: resolve_number(record, CanonicalField::Temperature, columns),
    }
}

/// Maps every record in source order; row N keeps index N.
pub fn map_records(
    records: &[NormalizedRecord],
    columns: &ColumnMapping,
    dataset_id: &str,
) -> Result<Vec<NewEquipmentRow>, EquipmentError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let row_index = i32::try_from(index).map_err(|_| EquipmentError::Ingestion {
                message: format!("Row {} exceeds the supported row count", index),
            })?;
            Ok(map_record(record, columns, dataset_id, row_index))
        })
        .collect()
}
