/// MAAS API client implementation
pub mod auth;
pub mod client;
pub mod cluster;
pub mod error;
pub mod models;

pub use client::MaasClient;
pub use cluster::ClusterManager;
pub use error::MaasError;
