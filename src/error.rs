use thiserror::Error;

#[derive(Error, Debug)]
pub enum EquipmentError {
    #[error("Dataset not found: {dataset_id}")]
    DatasetNotFound { dataset_id: String },

    #[error("Failed to parse CSV: {message}")]
    Parse { message: String },

    #[error("Ingestion failed: {message}")]
    Ingestion { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Report rendering failed: {message}")]
    Report { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("gRPC transport error: {0}")]
    GrpcError(#[from] tonic::transport::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl From<csv::Error> for EquipmentError {
    fn from(err: csv::Error) -> Self {
        EquipmentError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<lopdf::Error> for EquipmentError {
    fn from(err: lopdf::Error) -> Self {
        EquipmentError::Report {
            message: err.to_string(),
        }
    }
}

impl From<diesel::result::Error> for EquipmentError {
    fn from(err: diesel::result::Error) -> Self {
        EquipmentError::Database {
            message: err.to_string(),
        }
    }
}

impl From<EquipmentError> for tonic::Status {
    fn from(err: EquipmentError) -> Self {
        match err {
            EquipmentError::DatasetNotFound { .. } => tonic::Status::not_found(err.to_string()),
            EquipmentError::Parse { .. } | EquipmentError::InvalidRequest { .. } => {
                tonic::Status::invalid_argument(err.to_string())
            }
            EquipmentError::Ingestion { message } => tonic::Status::internal(message),
            _ => tonic::Status::internal("Internal server error"),
        }
    }
}
