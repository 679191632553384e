use std::sync::{Arc, Once};

use async_trait::async_trait;
use equipment_analytics_service::config::EngineConfig;
use equipment_analytics_service::domain::{
    Dataset, EquipmentRow, NewDataset, NewEquipmentRow, PersistedDataset,
};
use equipment_analytics_service::{EquipmentEngine, EquipmentError, EquipmentStore, MemoryStore};

static INIT: Once = Once::new();

fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

const SAMPLE_CSV: &str = "Name,Type,Flowrate,Pressure,Temperature\n\
P-101,Pump,120.5,300,45\n\
V-201,Valve,,150,30\n";

fn engine_with(store: Arc<dyn EquipmentStore>, config: EngineConfig) -> EquipmentEngine {
    init_test_logging();
    EquipmentEngine::new(store, config)
}

fn memory_engine() -> (Arc<MemoryStore>, EquipmentEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(store.clone(), EngineConfig::default());
    (store, engine)
}

#[tokio::test]
async fn test_upload_persists_rows_and_serves_statistics() {
    // Given: An engine over an empty store
    let (_store, engine) = memory_engine();

    // When: Uploading a CSV with a missing flowrate cell
    let dataset = engine
        .upload_dataset(42, "plant-a.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await
        .expect("upload should succeed");

    // Then: The dataset belongs to the uploader and keeps the filename
    assert_eq!(dataset.owner_id, 42);
    assert_eq!(dataset.filename, "plant-a.csv");
    assert!(dataset.id.starts_with("ds_"));

    // And: Both rows are persisted in source order with the missing cell defaulted
    let rows = engine.get_equipment(42, &dataset.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "P-101");
    assert_eq!(rows[0].equipment_type, "Pump");
    assert_eq!(rows[0].flowrate, 120.5);
    assert_eq!(rows[1].name, "V-201");
    assert_eq!(rows[1].flowrate, 0.0);
    assert!(rows.iter().all(|row| row.dataset_id == dataset.id));

    // And: Statistics are computed from those rows
    let stats = engine.get_statistics(42, &dataset.id).await.unwrap();
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.avg_pressure, 225.0);
    assert_eq!(stats.avg_flowrate, 60.25);
    assert_eq!(stats.avg_temperature, 37.5);
    assert_eq!(stats.type_distribution.len(), 2);
    assert_eq!(stats.type_distribution["Pump"], 1);
    assert_eq!(stats.type_distribution["Valve"], 1);

    // And: Asking again yields the same snapshot
    let again = engine.get_statistics(42, &dataset.id).await.unwrap();
    assert_eq!(stats, again);
}

#[tokio::test]
async fn test_mapping_round_trip_for_canonical_header() {
    let (_store, engine) = memory_engine();
    let readings = [
        ("C-1", "Compressor", 10.0, 800.0, 90.0),
        ("HX-2", "HeatExchanger", 55.5, 210.25, 140.0),
        ("R-3", "Reactor", 3.75, 1200.0, 310.5),
    ];
    let mut csv = String::from("name,type,flowrate,pressure,temperature\n");
    for (name, kind, flowrate, pressure, temperature) in &readings {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            name, kind, flowrate, pressure, temperature
        ));
    }

    let dataset = engine
        .upload_dataset(1, "round-trip.csv".to_string(), csv.into_bytes())
        .await
        .unwrap();
    let rows = engine.get_equipment(1, &dataset.id).await.unwrap();

    assert_eq!(rows.len(), readings.len());
    for (row, (name, kind, flowrate, pressure, temperature)) in rows.iter().zip(readings) {
        assert_eq!(row.name, name);
        assert_eq!(row.equipment_type, kind);
        assert_eq!(row.flowrate, flowrate);
        assert_eq!(row.pressure, pressure);
        assert_eq!(row.temperature, temperature);
    }
}

#[tokio::test]
async fn test_alias_header_and_missing_columns() {
    let (_store, engine) = memory_engine();

    // Given: A file using the "Equipment Name" alias and no flowrate column
    let csv = " Equipment Name ,TYPE,Pressure,Temperature\nB-7,Boiler,not-measured,210\n";

    let dataset = engine
        .upload_dataset(5, "alias.csv".to_string(), csv.as_bytes().to_vec())
        .await
        .unwrap();
    let rows = engine.get_equipment(5, &dataset.id).await.unwrap();

    // Then: The alias resolves as the name and numeric gaps become zero
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "B-7");
    assert_eq!(rows[0].equipment_type, "Boiler");
    assert_eq!(rows[0].flowrate, 0.0);
    assert_eq!(rows[0].pressure, 0.0);
    assert_eq!(rows[0].temperature, 210.0);
}

#[tokio::test]
async fn test_header_only_file_creates_empty_dataset() {
    let (_store, engine) = memory_engine();

    let dataset = engine
        .upload_dataset(
            3,
            "empty.csv".to_string(),
            b"name,type,flowrate,pressure,temperature\n".to_vec(),
        )
        .await
        .unwrap();

    let stats = engine.get_statistics(3, &dataset.id).await.unwrap();
    assert_eq!(stats.total_count, 0);
    assert_eq!(stats.avg_flowrate, 0.0);
    assert_eq!(stats.avg_pressure, 0.0);
    assert_eq!(stats.avg_temperature, 0.0);
    assert!(stats.type_distribution.is_empty());

    let listed = engine.list_datasets(3).await.unwrap();
    assert_eq!(listed, vec![dataset]);
}

#[tokio::test]
async fn test_parse_failure_leaves_no_dataset() {
    let (_store, engine) = memory_engine();

    let not_utf8 = engine
        .upload_dataset(9, "binary.csv".to_string(), vec![0xc3, 0x28, 0x0a])
        .await;
    assert!(matches!(not_utf8, Err(EquipmentError::Parse { .. })));

    let no_header = engine
        .upload_dataset(9, "blank.csv".to_string(), b"\n\n\n".to_vec())
        .await;
    assert!(matches!(no_header, Err(EquipmentError::Parse { .. })));

    assert!(engine.list_datasets(9).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let store: Arc<dyn EquipmentStore> = Arc::new(MemoryStore::new());
    let engine = engine_with(
        store,
        EngineConfig {
            recent_datasets_limit: 5,
            max_upload_bytes: 16,
        },
    );

    let result = engine
        .upload_dataset(1, "big.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await;

    assert!(matches!(result, Err(EquipmentError::InvalidRequest { .. })));
    assert!(engine.list_datasets(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_owners_cannot_see_dataset() {
    let (_store, engine) = memory_engine();
    let dataset = engine
        .upload_dataset(1, "private.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await
        .unwrap();

    let foreign_get = engine.get_dataset(2, &dataset.id).await;
    let foreign_rows = engine.get_equipment(2, &dataset.id).await;
    let foreign_stats = engine.get_statistics(2, &dataset.id).await;
    let missing = engine.get_dataset(1, "ds_does_not_exist").await;

    assert!(matches!(foreign_get, Err(EquipmentError::DatasetNotFound { .. })));
    assert!(matches!(foreign_rows, Err(EquipmentError::DatasetNotFound { .. })));
    assert!(matches!(foreign_stats, Err(EquipmentError::DatasetNotFound { .. })));
    assert!(matches!(missing, Err(EquipmentError::DatasetNotFound { .. })));

    // A foreign id and a missing id read the same to the caller
    assert_eq!(
        foreign_get.unwrap_err().to_string(),
        format!("Dataset not found: {}", dataset.id)
    );
    assert!(engine.list_datasets(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_is_recent_first_and_capped() {
    let store: Arc<dyn EquipmentStore> = Arc::new(MemoryStore::new());
    let engine = engine_with(
        store,
        EngineConfig {
            recent_datasets_limit: 3,
            max_upload_bytes: 1024,
        },
    );

    let mut uploaded = Vec::new();
    for index in 0..5 {
        let dataset = engine
            .upload_dataset(
                11,
                format!("batch-{}.csv", index),
                SAMPLE_CSV.as_bytes().to_vec(),
            )
            .await
            .unwrap();
        uploaded.push(dataset.id);
    }
    engine
        .upload_dataset(12, "other.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await
        .unwrap();

    let listed: Vec<String> = engine
        .list_datasets(11)
        .await
        .unwrap()
        .into_iter()
        .map(|dataset| dataset.id)
        .collect();

    let expected: Vec<String> = uploaded.iter().rev().take(3).cloned().collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_report_summarizes_dataset() {
    let (_store, engine) = memory_engine();
    let dataset = engine
        .upload_dataset(4, "report.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await
        .unwrap();

    let (reported, report) = engine.get_report(4, &dataset.id).await.unwrap();

    assert_eq!(reported, dataset);
    assert!(report.starts_with(b"%PDF"));

    let text = String::from_utf8_lossy(&report);
    assert!(text.contains("Chemical Equipment Analysis Report"));
    assert!(text.contains("Filename: report.csv"));
    assert!(text.contains("Total Count: 2"));
    assert!(text.contains("Avg Pressure: 225.00 kPa"));
    assert!(text.contains("  Pump: 1"));
    assert!(text.contains("  Valve: 1"));
}

#[tokio::test]
async fn test_separator_only_rows_count_as_unknown_equipment() {
    // Given: A file whose last line holds separators but no values
    let (_store, engine) = memory_engine();
    let content = "name,type,flowrate,pressure,temperature\nP-1,Pump,1,2,3\n,,,,\n";

    // When: It is uploaded
    let dataset = engine
        .upload_dataset(6, "sparse.csv".to_string(), content.as_bytes().to_vec())
        .await
        .unwrap();
    let statistics = engine.get_statistics(6, &dataset.id).await.unwrap();

    // Then: That line becomes a defaulted row in the statistics
    assert_eq!(statistics.total_count, 2);
    assert_eq!(statistics.avg_flowrate, 0.5);
    assert_eq!(statistics.type_distribution.get("Unknown"), Some(&1));
    assert_eq!(statistics.type_distribution.get("Pump"), Some(&1));
}

#[tokio::test]
async fn test_store_rejects_rows_for_another_dataset() {
    let store = MemoryStore::new();
    let dataset = NewDataset {
        id: "ds_target".to_string(),
        owner_id: 1,
        filename: "mixed.csv".to_string(),
        created_at: chrono::Utc::now(),
    };
    let stray = NewEquipmentRow {
        dataset_id: "ds_elsewhere".to_string(),
        row_index: 0,
        name: "P-1".to_string(),
        equipment_type: "Pump".to_string(),
        flowrate: 1.0,
        pressure: 2.0,
        temperature: 3.0,
    };

    let result = store.create_dataset_with_rows(dataset, vec![stray]).await;

    assert!(matches!(result, Err(EquipmentError::Ingestion { .. })));
    assert!(store.get_dataset("ds_target").await.unwrap().is_none());
    assert!(store.get_equipment_rows("ds_elsewhere").await.unwrap().is_empty());
}

struct UnavailableStore;

#[async_trait]
impl EquipmentStore for UnavailableStore {
    async fn create_dataset_with_rows(
        &self,
        _dataset: NewDataset,
        _rows: Vec<NewEquipmentRow>,
    ) -> Result<PersistedDataset, EquipmentError> {
        Err(EquipmentError::Database {
            message: "connection refused".to_string(),
        })
    }

    async fn get_dataset(&self, _dataset_id: &str) -> Result<Option<Dataset>, EquipmentError> {
        Ok(None)
    }

    async fn list_datasets(
        &self,
        _owner_id: i64,
        _limit: usize,
    ) -> Result<Vec<Dataset>, EquipmentError> {
        Ok(Vec::new())
    }

    async fn get_equipment_rows(
        &self,
        _dataset_id: &str,
    ) -> Result<Vec<EquipmentRow>, EquipmentError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> Result<(), EquipmentError> {
        Err(EquipmentError::Database {
            message: "connection refused".to_string(),
        })
    }
}

#[tokio::test]
async fn test_persistence_failure_surfaces_generic_ingestion_error() {
    let engine = engine_with(Arc::new(UnavailableStore), EngineConfig::default());

    let result = engine
        .upload_dataset(1, "plant.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await;

    match result {
        Err(EquipmentError::Ingestion { message }) => {
            assert!(!message.contains("connection refused"));
        }
        other => panic!("expected ingestion error, got {:?}", other),
    }
    assert!(engine.health_check().await.is_err());
}

#[tokio::test]
async fn test_statistics_serialize_with_dashboard_field_names() {
    let (_store, engine) = memory_engine();
    let dataset = engine
        .upload_dataset(8, "json.csv".to_string(), SAMPLE_CSV.as_bytes().to_vec())
        .await
        .unwrap();

    let stats = engine.get_statistics(8, &dataset.id).await.unwrap();
    let json = serde_json::to_value(&stats).unwrap();

    assert_eq!(json["totalCount"], 2);
    assert_eq!(json["avgPressure"], 225.0);
    assert_eq!(json["typeDistribution"]["Valve"], 1);

    let rows = engine.get_equipment(8, &dataset.id).await.unwrap();
    let row_json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(row_json["type"], "Pump");
    assert_eq!(row_json["datasetId"], dataset.id.as_str());
}
