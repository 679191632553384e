pub mod proto {
    pub mod equipment {
        tonic::include_proto!("equipment");
    }
}

pub mod config;
pub mod csv_normalizer;
pub mod database;
pub mod domain;
pub mod engine;
pub mod error;
pub mod grpc_server;
pub mod ingestion;
pub mod models;
pub mod report;
pub mod row_mapper;
pub mod schema;
pub mod statistics;
pub mod store;

pub use engine::EquipmentEngine;
pub use error::EquipmentError;
pub use grpc_server::GrpcServer;
pub use store::{EquipmentStore, MemoryStore};
