use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{Dataset, EquipmentRow, NewDataset, NewEquipmentRow, PersistedDataset};
use crate::error::EquipmentError;

/// Persistence seam for datasets and their equipment rows.
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// Creates the dataset and bulk-inserts its rows as one atomic unit.
    /// Either both land or neither does.
    async fn create_dataset_with_rows(
        &self,
        dataset: NewDataset,
        rows: Vec<NewEquipmentRow>,
    ) -> Result<PersistedDataset, EquipmentError>;

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<Dataset>, EquipmentError>;

    /// The owner's datasets, newest first, at most `limit` of them.
    async fn list_datasets(&self, owner_id: i64, limit: usize)
        -> Result<Vec<Dataset>, EquipmentError>;

    /// All rows of a dataset in source order.
    async fn get_equipment_rows(&self, dataset_id: &str)
        -> Result<Vec<EquipmentRow>, EquipmentError>;

    async fn health_check(&self) -> Result<(), EquipmentError>;
}

pub(crate) fn ensure_rows_belong_to(
    dataset: &NewDataset,
    rows: &[NewEquipmentRow],
) -> Result<(), EquipmentError> {
    match rows.iter().find(|row| row.dataset_id != dataset.id) {
        Some(row) => Err(EquipmentError::Ingestion {
            message: format!(
                "Row {} references dataset {} instead of {}",
                row.row_index, row.dataset_id, dataset.id
            ),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    datasets: Vec<Dataset>,
    rows: Vec<EquipmentRow>,
    next_row_id: i64,
}

/// Process-local store; each upload is applied under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn create_dataset_with_rows(
        &self,
        dataset: NewDataset,
        rows: Vec<NewEquipmentRow>,
    ) -> Result<PersistedDataset, EquipmentError> {
        ensure_rows_belong_to(&dataset, &rows)?;

        let mut state = self.state.write().await;
        if state.datasets.iter().any(|existing| existing.id == dataset.id) {
            return Err(EquipmentError::Ingestion {
                message: format!("Dataset {} already exists", dataset.id),
            });
        }

        let dataset = dataset.into_dataset();
        let rows_inserted = rows.len();
        for row in rows {
            state.next_row_id += 1;
            let id = state.next_row_id;
            state.rows.push(EquipmentRow {
                id,
                dataset_id: row.dataset_id,
                row_index: row.row_index,
                name: row.name,
                equipment_type: row.equipment_type,
                flowrate: row.flowrate,
                pressure: row.pressure,
                temperature: row.temperature,
            });
        }
        state.datasets.push(dataset.clone());

        info!(
            "Stored dataset {} with {} rows in memory",
            dataset.id, rows_inserted
        );
        Ok(PersistedDataset {
            dataset,
            rows_inserted,
        })
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<Dataset>, EquipmentError> {
        let state = self.state.read().await;
        Ok(state
            .datasets
            .iter()
            .find(|dataset| dataset.id == dataset_id)
            .cloned())
    }

    async fn list_datasets(
        &self,
        owner_id: i64,
        limit: usize,
    ) -> Result<Vec<Dataset>, EquipmentError> {
        let state = self.state.read().await;
        let mut owned: Vec<Dataset> = state
            .datasets
            .iter()
            .filter(|dataset| dataset.owner_id == owner_id)
            .cloned()
            .collect();

        // Insertion order breaks timestamp ties, newest last in storage.
        owned.reverse();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn get_equipment_rows(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<EquipmentRow>, EquipmentError> {
        let state = self.state.read().await;
        let mut rows: Vec<EquipmentRow> = state
            .rows
            .iter()
            .filter(|row| row.dataset_id == dataset_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.row_index);
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), EquipmentError> {
        Ok(())
    }
}
