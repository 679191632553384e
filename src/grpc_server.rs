use std::net::SocketAddr;
use std::sync::Arc;
use tonic::{transport::Server, Request, Response, Status};
use tracing::{error, info};

use crate::engine::EquipmentEngine;
use crate::error::EquipmentError;
use crate::proto::equipment::{
    equipment_service_server::{EquipmentService, EquipmentServiceServer},
    GetDatasetRequest, GetDatasetResponse, GetEquipmentRequest, GetEquipmentResponse,
    GetReportRequest, GetReportResponse, GetStatisticsRequest, GetStatisticsResponse,
    HealthCheckRequest, HealthCheckResponse, ListDatasetsRequest, ListDatasetsResponse,
    UploadDatasetRequest, UploadDatasetResponse,
};
use crate::report::REPORT_FILENAME;

// Room for the request envelope around the file bytes.
const UPLOAD_ENVELOPE_BYTES: usize = 64 * 1024;

pub struct GrpcServer {
    engine: Arc<EquipmentEngine>,
}

impl GrpcServer {
    pub fn new(engine: Arc<EquipmentEngine>) -> Self {
        Self { engine }
    }

    pub async fn start(&self, addr: SocketAddr) -> Result<(), EquipmentError> {
        info!("Starting gRPC server on {}", addr);

        let max_message_bytes = self.engine.config().max_upload_bytes + UPLOAD_ENVELOPE_BYTES;
        let equipment_service = EquipmentServiceImpl {
            engine: self.engine.clone(),
        };

        Server::builder()
            .add_service(
                EquipmentServiceServer::new(equipment_service)
                    .max_decoding_message_size(max_message_bytes),
            )
            .serve(addr)
            .await?;

        Ok(())
    }
}

pub(crate) struct EquipmentServiceImpl {
    engine: Arc<EquipmentEngine>,
}

fn require_dataset_id(dataset_id: &str) -> Result<(), Status> {
    if dataset_id.trim().is_empty() {
        return Err(Status::invalid_argument("Dataset id is required"));
    }
    Ok(())
}

#[tonic::async_trait]
impl EquipmentService for EquipmentServiceImpl {
    async fn upload_dataset(
        &self,
        request: Request<UploadDatasetRequest>,
    ) -> Result<Response<UploadDatasetResponse>, Status> {
        let req = request.into_inner();
        info!(
            "gRPC: Received upload_dataset request '{}' from owner {}",
            req.filename, req.owner_id
        );

        match self
            .engine
            .upload_dataset(req.owner_id, req.filename, req.content)
            .await
        {
            Ok(dataset) => {
                info!("gRPC: Created dataset '{}'", dataset.id);
                Ok(Response::new(UploadDatasetResponse {
                    dataset: Some(dataset.into()),
                }))
            }
            Err(e) => {
                error!("gRPC: Upload failed for owner {}: {}", req.owner_id, e);
                Err(Status::from(e))
            }
        }
    }

    async fn list_datasets(
        &self,
        request: Request<ListDatasetsRequest>,
    ) -> Result<Response<ListDatasetsResponse>, Status> {
        let req = request.into_inner();
        info!(
            "gRPC: Received list_datasets request from owner {}",
            req.owner_id
        );

        let datasets = self.engine.list_datasets(req.owner_id).await.map_err(|e| {
            error!("gRPC: Failed to list datasets: {}", e);
            Status::from(e)
        })?;
        let response = ListDatasetsResponse {
            datasets: datasets.into_iter().map(|d| d.into()).collect(),
        };

        info!("gRPC: Returning {} datasets", response.datasets.len());
        Ok(Response::new(response))
    }

    async fn get_dataset(
        &self,
        request: Request<GetDatasetRequest>,
    ) -> Result<Response<GetDatasetResponse>, Status> {
        let req = request.into_inner();
        require_dataset_id(&req.dataset_id)?;

        let dataset = self
            .engine
            .get_dataset(req.owner_id, &req.dataset_id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(GetDatasetResponse {
            dataset: Some(dataset.into()),
        }))
    }

    async fn get_equipment(
        &self,
        request: Request<GetEquipmentRequest>,
    ) -> Result<Response<GetEquipmentResponse>, Status> {
        let req = request.into_inner();
        require_dataset_id(&req.dataset_id)?;
        info!(
            "gRPC: Received get_equipment request for dataset '{}'",
            req.dataset_id
        );

        match self.engine.get_equipment(req.owner_id, &req.dataset_id).await {
            Ok(rows) => {
                info!(
                    "gRPC: Returning {} rows for dataset '{}'",
                    rows.len(),
                    req.dataset_id
                );
                Ok(Response::new(GetEquipmentResponse {
                    rows: rows.into_iter().map(|r| r.into()).collect(),
                }))
            }
            Err(e) => {
                error!(
                    "gRPC: Failed to get equipment for dataset '{}': {}",
                    req.dataset_id, e
                );
                Err(Status::from(e))
            }
        }
    }

    async fn get_statistics(
        &self,
        request: Request<GetStatisticsRequest>,
    ) -> Result<Response<GetStatisticsResponse>, Status> {
        let req = request.into_inner();
        require_dataset_id(&req.dataset_id)?;
        info!(
            "gRPC: Received get_statistics request for dataset '{}'",
            req.dataset_id
        );

        match self.engine.get_statistics(req.owner_id, &req.dataset_id).await {
            Ok(statistics) => Ok(Response::new(GetStatisticsResponse {
                statistics: Some(statistics.into()),
            })),
            Err(e) => {
                error!(
                    "gRPC: Failed to compute statistics for dataset '{}': {}",
                    req.dataset_id, e
                );
                Err(Status::from(e))
            }
        }
    }

    async fn get_report(
        &self,
        request: Request<GetReportRequest>,
    ) -> Result<Response<GetReportResponse>, Status> {
        let req = request.into_inner();
        require_dataset_id(&req.dataset_id)?;

        let (dataset, report) = self
            .engine
            .get_report(req.owner_id, &req.dataset_id)
            .await
            .map_err(|e| {
                error!(
                    "gRPC: Failed to render report for dataset '{}': {}",
                    req.dataset_id, e
                );
                Status::from(e)
            })?;

        info!(
            "gRPC: Rendered {} byte report for dataset '{}' ({})",
            report.len(),
            dataset.id,
            dataset.filename
        );
        Ok(Response::new(GetReportResponse {
            filename: REPORT_FILENAME.to_string(),
            report,
        }))
    }

    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        info!("gRPC: Received health_check request");

        match self.engine.health_check().await {
            Ok(_) => {
                info!("gRPC: Health check passed");
                Ok(Response::new(HealthCheckResponse {
                    status: "healthy".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                }))
            }
            Err(e) => {
                error!("gRPC: Health check failed: {}", e);
                Err(Status::internal("Health check failed"))
            }
        }
    }
}
