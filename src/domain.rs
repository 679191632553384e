use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proto::equipment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub owner_id: i64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// A dataset record that has been allocated but not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDataset {
    pub id: String,
    pub owner_id: i64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl NewDataset {
    pub fn into_dataset(self) -> Dataset {
        Dataset {
            id: self.id,
            owner_id: self.owner_id,
            filename: self.filename,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRow {
    pub id: i64,
    pub dataset_id: String,
    pub row_index: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// An equipment reading mapped from one CSV record, ready for bulk insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEquipmentRow {
    pub dataset_id: String,
    pub row_index: i32,
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedDataset {
    pub dataset: Dataset,
    pub rows_inserted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStatistics {
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: BTreeMap<String, u64>,
}

impl From<Dataset> for equipment::Dataset {
    fn from(domain: Dataset) -> Self {
        Self {
            id: domain.id,
            owner_id: domain.owner_id,
            filename: domain.filename,
            created_at: domain.created_at.to_rfc3339(),
        }
    }
}

impl From<EquipmentRow> for equipment::EquipmentRow {
    fn from(domain: EquipmentRow) -> Self {
        Self {
            id: domain.id,
            dataset_id: domain.dataset_id,
            row_index: domain.row_index,
            name: domain.name,
            r#type: domain.equipment_type,
            flowrate: domain.flowrate,
            pressure: domain.pressure,
            temperature: domain.temperature,
        }
    }
}

impl From<DatasetStatistics> for equipment::DatasetStatistics {
    fn from(domain: DatasetStatistics) -> Self {
        Self {
            total_count: domain.total_count,
            avg_flowrate: domain.avg_flowrate,
            avg_pressure: domain.avg_pressure,
            avg_temperature: domain.avg_temperature,
            type_distribution: domain.type_distribution.into_iter().collect(),
        }
    }
}
