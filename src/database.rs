use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::domain::{Dataset, EquipmentRow, NewDataset, NewEquipmentRow, PersistedDataset};
use crate::error::EquipmentError;
use crate::models::*;
use crate::schema::*;
use crate::store::{ensure_rows_belong_to, EquipmentStore};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// Seven bind parameters per row keeps each statement far below the
// PostgreSQL limit of 65535.
const INSERT_BATCH_SIZE: usize = 1000;

#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<AsyncPgConnection>,
}

impl DatabaseManager {
    pub async fn new(database_url: &str) -> Result<Self, EquipmentError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(config)
            .build()
            .map_err(|e| EquipmentError::ConfigError {
                message: format!("Failed to create database pool: {}", e),
            })?;

        let manager = Self { pool };
        manager.run_migrations(database_url).await?;

        Ok(manager)
    }

    pub async fn run_migrations(&self, database_url: &str) -> Result<(), EquipmentError> {
        let database_url = database_url.to_string();

        // diesel_migrations is synchronous; the wrapper drives the async
        // connection from a blocking thread.
        tokio::task::spawn_blocking(move || -> Result<(), EquipmentError> {
            let mut connection =
                <AsyncConnectionWrapper<AsyncPgConnection> as diesel::Connection>::establish(
                    &database_url,
                )
                .map_err(|e| EquipmentError::ConfigError {
                    message: format!("Failed to establish connection for migrations: {}", e),
                })?;

            let applied = connection
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| EquipmentError::ConfigError {
                    message: format!("Failed to run migrations: {}", e),
                })?;

            info!("Applied {} pending migrations", applied.len());
            Ok(())
        })
        .await
        .map_err(|e| EquipmentError::InternalError {
            message: format!("Migration task failed: {}", e),
        })?
    }

    async fn connection(&self) -> Result<Object<AsyncPgConnection>, EquipmentError> {
        self.pool
            .get()
            .await
            .map_err(|e| EquipmentError::Database {
                message: format!("Failed to get database connection: {}", e),
            })
    }
}

#[async_trait]
impl EquipmentStore for DatabaseManager {
    async fn create_dataset_with_rows(
        &self,
        dataset: NewDataset,
        rows: Vec<NewEquipmentRow>,
    ) -> Result<PersistedDataset, EquipmentError> {
        ensure_rows_belong_to(&dataset, &rows)?;
        info!(
            "Persisting dataset {} ({}) with {} rows",
            dataset.id,
            dataset.filename,
            rows.len()
        );

        let mut conn = self.connection().await?;
        let new_dataset = NewDatasetModel::from(&dataset);
        let new_rows: Vec<NewEquipmentRowModel> =
            rows.iter().map(NewEquipmentRowModel::from).collect();

        let (created, rows_inserted) = conn
            .transaction::<_, EquipmentError, _>(|conn| {
                Box::pin(async move {
                    let created = diesel::insert_into(datasets::table)
                        .values(&new_dataset)
                        .returning(DatasetModel::as_returning())
                        .get_result::<DatasetModel>(conn)
                        .await?;

                    let mut rows_inserted = 0;
                    for batch in new_rows.chunks(INSERT_BATCH_SIZE) {
                        rows_inserted += diesel::insert_into(equipment_rows::table)
                            .values(batch)
                            .execute(conn)
                            .await?;
                    }

                    Ok((created, rows_inserted))
                })
            })
            .await?;

        Ok(PersistedDataset {
            dataset: created.into(),
            rows_inserted,
        })
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<Dataset>, EquipmentError> {
        let mut conn = self.connection().await?;

        let dataset = datasets::table
            .filter(datasets::id.eq(dataset_id))
            .select(DatasetModel::as_select())
            .first::<DatasetModel>(&mut conn)
            .await
            .optional()
            .map_err(|e| EquipmentError::Database {
                message: format!("Failed to fetch dataset: {}", e),
            })?;

        Ok(dataset.map(|d| d.into()))
    }

    async fn list_datasets(
        &self,
        owner_id: i64,
        limit: usize,
    ) -> Result<Vec<Dataset>, EquipmentError> {
        let mut conn = self.connection().await?;

        let dataset_list = datasets::table
            .filter(datasets::owner_id.eq(owner_id))
            .order((datasets::created_at.desc(), datasets::id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(DatasetModel::as_select())
            .load::<DatasetModel>(&mut conn)
            .await
            .map_err(|e| EquipmentError::Database {
                message: format!("Failed to fetch datasets: {}", e),
            })?;

        Ok(dataset_list.into_iter().map(|d| d.into()).collect())
    }

    async fn get_equipment_rows(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<EquipmentRow>, EquipmentError> {
        let mut conn = self.connection().await?;

        let rows = equipment_rows::table
            .filter(equipment_rows::dataset_id.eq(dataset_id))
            .order(equipment_rows::row_index.asc())
            .select(EquipmentRowModel::as_select())
            .load::<EquipmentRowModel>(&mut conn)
            .await
            .map_err(|e| EquipmentError::Database {
                message: format!("Failed to load equipment rows: {}", e),
            })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn health_check(&self) -> Result<(), EquipmentError> {
        let mut conn = self.connection().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }
}
