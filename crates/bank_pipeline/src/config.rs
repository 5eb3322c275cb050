//! Command-line and environment configuration shared by the binaries.
//!
//! Every setting has a flag and an environment variable. Credentials are
//! never configured here; S3 uses the default AWS provider chain.

use std::path::PathBuf;
use std::sync::Arc;

use bank_core::object_store::{LocalFsObjectStore, ObjectStore};
use bank_core::pipeline::WarehouseLayout;
use bank_core::storage_keys::DEFAULT_ROOT_PREFIX;
use bank_core::ValidationError;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};

use crate::adapters::s3::{S3ObjectStore, S3Settings};
use crate::tasks::StagingLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Directory tree under `--local-root/<bucket>`.
    Local,
    S3,
}

#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    #[arg(long = "store-backend", env = "BANK_STORE_BACKEND", value_enum, default_value_t = StoreBackend::Local)]
    pub backend: StoreBackend,

    #[arg(long, env = "BANK_BUCKET", default_value = "bank-staging")]
    pub bucket: String,

    #[arg(long, env = "BANK_ROOT_PREFIX", default_value = DEFAULT_ROOT_PREFIX)]
    pub root_prefix: String,

    #[arg(long, env = "BANK_LOCAL_ROOT", default_value = ".bank_store")]
    pub local_root: PathBuf,

    /// S3-compatible endpoint, e.g. `http://localhost:9000`.
    #[arg(long, env = "BANK_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl StoreArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let bucket = self.bucket.trim();
        if bucket.is_empty() {
            return Err(ValidationError::new("bucket cannot be empty"));
        }
        if bucket.contains('/') {
            return Err(ValidationError::new(format!(
                "bucket '{bucket}' must be a bare name without '/'"
            )));
        }
        if self.root_prefix.split('/').any(|segment| segment == "..") {
            return Err(ValidationError::new("root prefix cannot contain '..'"));
        }
        if let Some(endpoint) = &self.s3_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ValidationError::new(
                    "s3 endpoint must start with http:// or https://",
                ));
            }
        }
        Ok(())
    }

    pub fn staging_location(&self) -> StagingLocation {
        StagingLocation {
            bucket: self.bucket.trim().to_string(),
            root_prefix: self.root_prefix.clone(),
        }
    }

    pub async fn build_store(&self) -> Result<Arc<dyn ObjectStore>, ValidationError> {
        self.validate()?;
        let bucket = self.bucket.trim();
        let store: Arc<dyn ObjectStore> = match self.backend {
            StoreBackend::Local => Arc::new(LocalFsObjectStore::new(self.local_root.join(bucket))),
            StoreBackend::S3 => Arc::new(
                S3ObjectStore::connect(&S3Settings {
                    bucket: bucket.to_string(),
                    region: self.region.clone(),
                    endpoint_url: self.s3_endpoint.clone(),
                })
                .await,
            ),
        };
        Ok(store)
    }
}

#[derive(Debug, Clone, Args)]
pub struct WarehouseArgs {
    #[arg(long, env = "BANK_WAREHOUSE_PROJECT", default_value = "bank-data")]
    pub project: String,

    #[arg(long, env = "BANK_RAW_DATASET", default_value = "Raw_Dataset")]
    pub raw_dataset: String,

    #[arg(long, env = "BANK_TRANSFORMED_DATASET", default_value = "Transformed_dataset")]
    pub transformed_dataset: String,

    /// Keep warehouse tables in this directory instead of the staging store.
    #[arg(long, env = "BANK_WAREHOUSE_ROOT")]
    pub warehouse_root: Option<PathBuf>,
}

impl WarehouseArgs {
    pub fn layout(&self) -> Result<WarehouseLayout, ValidationError> {
        for (name, value) in [
            ("project", &self.project),
            ("raw dataset", &self.raw_dataset),
            ("transformed dataset", &self.transformed_dataset),
        ] {
            if value.trim().is_empty() || value.contains(['.', '/']) {
                return Err(ValidationError::new(format!(
                    "{name} '{value}' must be non-empty without '.' or '/'"
                )));
            }
        }

        Ok(WarehouseLayout {
            project: self.project.clone(),
            raw_dataset: self.raw_dataset.clone(),
            transformed_dataset: self.transformed_dataset.clone(),
            ..WarehouseLayout::default()
        })
    }

    pub fn storage(&self, staging: &Arc<dyn ObjectStore>) -> Arc<dyn ObjectStore> {
        match &self.warehouse_root {
            Some(root) => Arc::new(LocalFsObjectStore::new(root.clone())),
            None => staging.clone(),
        }
    }
}

pub fn parse_run_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| format!("expected YYYY-MM-DD, got '{value}': {error}"))
}
