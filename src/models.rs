use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{Dataset, EquipmentRow, NewDataset, NewEquipmentRow};
use crate::schema::{datasets, equipment_rows};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = datasets)]
#[diesel(primary_key(id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DatasetModel {
    pub id: String,
    pub owner_id: i64,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = datasets)]
pub struct NewDatasetModel<'a> {
    pub id: &'a str,
    pub owner_id: i64,
    pub filename: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = equipment_rows)]
#[diesel(belongs_to(DatasetModel, foreign_key = dataset_id))]
#[diesel(primary_key(id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EquipmentRowModel {
    pub id: i64,
    pub dataset_id: String,
    pub row_index: i32,
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

#[derive(Insertable)]
#[diesel(table_name = equipment_rows)]
pub struct NewEquipmentRowModel<'a> {
    pub dataset_id: &'a str,
    pub row_index: i32,
    pub name: &'a str,
    pub equipment_type: &'a str,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl<'a> From<&'a NewDataset> for NewDatasetModel<'a> {
    fn from(dataset: &'a NewDataset) -> Self {
        NewDatasetModel {
            id: &dataset.id,
            owner_id: dataset.owner_id,
            filename: &dataset.filename,
            created_at: dataset.created_at,
        }
    }
}

impl<'a> From<&'a NewEquipmentRow> for NewEquipmentRowModel<'a> {
    fn from(row: &'a NewEquipmentRow) -> Self {
        NewEquipmentRowModel {
            dataset_id: &row.dataset_id,
            row_index: row.row_index,
            name: &row.name,
            equipment_type: &row.equipment_type,
            flowrate: row.flowrate,
            pressure: row.pressure,
            temperature: row.temperature,
        }
    }
}

impl From<DatasetModel> for Dataset {
    fn from(dataset: DatasetModel) -> Self {
        Dataset {
            id: dataset.id,
            owner_id: dataset.owner_id,
            filename: dataset.filename,
            created_at: dataset.created_at,
        }
    }
}

impl From<EquipmentRowModel> for EquipmentRow {
    fn from(row: EquipmentRowModel) -> Self {
        EquipmentRow {
            id: row.id,
            dataset_id: row.dataset_id,
            row_index: row.row_index,
            name: row.name,
            equipment_type: row.equipment_type,
            flowrate: row.flowrate,
            pressure: row.pressure,
            temperature: row.temperature,
        }
    }
}
