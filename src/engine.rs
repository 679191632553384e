use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::domain::{Dataset, DatasetStatistics, EquipmentRow};
use crate::error::EquipmentError;
use crate::ingestion::{ingest_upload, UploadRequest};
use crate::report::render_report;
use crate::statistics::compute_statistics;
use crate::store::EquipmentStore;

pub struct EquipmentEngine {
    store: Arc<dyn EquipmentStore>,
    config: EngineConfig,
}

impl EquipmentEngine {
    pub fn new(store: Arc<dyn EquipmentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub async fn connect(
        database_url: &str,
        config: EngineConfig,
    ) -> Result<Self, EquipmentError> {
        info!("Initializing Equipment Engine");

        let database = DatabaseManager::new(database_url).await?;

        info!("Equipment Engine initialized successfully");
        Ok(Self::new(Arc::new(database), config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Looks up a dataset on behalf of `owner_id`. Datasets belonging to
    /// someone else are reported exactly like missing ones.
    async fn owned_dataset(
        &self,
        owner_id: i64,
        dataset_id: &str,
    ) -> Result<Dataset, EquipmentError> {
        match self.store.get_dataset(dataset_id).await? {
            Some(dataset) if dataset.owner_id == owner_id => Ok(dataset),
            Some(_) => {
                warn!(
                    "Owner {} requested dataset {} owned by another user",
                    owner_id, dataset_id
                );
                Err(EquipmentError::DatasetNotFound {
                    dataset_id: dataset_id.to_string(),
                })
            }
            None => Err(EquipmentError::DatasetNotFound {
                dataset_id: dataset_id.to_string(),
            }),
        }
    }

    pub async fn upload_dataset(
        &self,
        owner_id: i64,
        filename: String,
        content: Vec<u8>,
    ) -> Result<Dataset, EquipmentError> {
        let request = UploadRequest {
            owner_id,
            filename,
            content,
        };
        ingest_upload(self.store.as_ref(), request, self.config.max_upload_bytes).await
    }

    pub async fn list_datasets(&self, owner_id: i64) -> Result<Vec<Dataset>, EquipmentError> {
        self.store
            .list_datasets(owner_id, self.config.recent_datasets_limit)
            .await
    }

    pub async fn get_dataset(
        &self,
        owner_id: i64,
        dataset_id: &str,
    ) -> Result<Dataset, EquipmentError> {
        self.owned_dataset(owner_id, dataset_id).await
    }

    pub async fn get_equipment(
        &self,
        owner_id: i64,
        dataset_id: &str,
    ) -> Result<Vec<EquipmentRow>, EquipmentError> {
        let dataset = self.owned_dataset(owner_id, dataset_id).await?;
        self.store.get_equipment_rows(&dataset.id).await
    }

    pub async fn get_statistics(
        &self,
        owner_id: i64,
        dataset_id: &str,
    ) -> Result<DatasetStatistics, EquipmentError> {
        let rows = self.get_equipment(owner_id, dataset_id).await?;
        Ok(compute_statistics(&rows))
    }

    pub async fn get_report(
        &self,
        owner_id: i64,
        dataset_id: &str,
    ) -> Result<(Dataset, Vec<u8>), EquipmentError> {
        let dataset = self.owned_dataset(owner_id, dataset_id).await?;
        let rows = self.store.get_equipment_rows(&dataset.id).await?;
        let report = render_report(&dataset, &compute_statistics(&rows))?;
        Ok((dataset, report))
    }

    pub async fn health_check(&self) -> Result<(), EquipmentError> {
        self.store.health_check().await
    }
}
