//! Upload pipeline: decode, parse, map and persist a CSV file as one dataset.
//!
//! Everything up to the final write happens in memory. The dataset record and
//! its rows reach the store in a single atomic call, so a failed upload never
//! leaves an empty dataset behind.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::csv_normalizer::parse_csv;
use crate::domain::{Dataset, NewDataset};
use crate::error::EquipmentError;
use crate::row_mapper::map_records;
use crate::store::EquipmentStore;

pub const DEFAULT_UPLOAD_FILENAME: &str = "upload.csv";

const INGESTION_FAILURE_MESSAGE: &str = "Failed to store the uploaded dataset";

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: i64,
    pub filename: String,
    pub content: Vec<u8>,
}

pub fn new_dataset_id() -> String {
    format!("ds_{}", Uuid::new_v4().simple())
}

fn decode_utf8(content: &[u8]) -> Result<&str, EquipmentError> {
    std::str::from_utf8(content).map_err(|e| EquipmentError::Parse {
        message: format!("File is not valid UTF-8 text: {}", e),
    })
}

fn upload_filename(filename: &str) -> String {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        DEFAULT_UPLOAD_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub async fn ingest_upload(
    store: &dyn EquipmentStore,
    request: UploadRequest,
    max_upload_bytes: usize,
) -> Result<Dataset, EquipmentError> {
    let filename = upload_filename(&request.filename);
    info!(
        "Ingesting upload '{}' ({} bytes) for owner {}",
        filename,
        request.content.len(),
        request.owner_id
    );

    if request.content.is_empty() {
        return Err(EquipmentError::InvalidRequest {
            message: "No file uploaded".to_string(),
        });
    }
    if request.content.len() > max_upload_bytes {
        return Err(EquipmentError::InvalidRequest {
            message: format!(
                "File of {} bytes exceeds the {} byte upload limit",
                request.content.len(),
                max_upload_bytes
            ),
        });
    }

    let text = decode_utf8(&request.content)?;
    let dataset = NewDataset {
        id: new_dataset_id(),
        owner_id: request.owner_id,
        filename,
        created_at: Utc::now(),
    };

    let parsed = parse_csv(text)?;
    let rows = map_records(&parsed.records, &parsed.columns, &dataset.id)?;

    let dataset_id = dataset.id.clone();
    let persisted = store
        .create_dataset_with_rows(dataset, rows)
        .await
        .map_err(|e| {
            error!("Failed to persist dataset {}: {}", dataset_id, e);
            EquipmentError::Ingestion {
                message: INGESTION_FAILURE_MESSAGE.to_string(),
            }
        })?;

    info!(
        "Dataset {} created with {} equipment rows",
        persisted.dataset.id, persisted.rows_inserted
    );
    Ok(persisted.dataset)
}
