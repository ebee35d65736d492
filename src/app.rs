use axum::Router;
use object_store::memory::InMemory;
use std::{sync::Arc, time::Duration};
use tracing::info;

use crate::{
    adapters::{
        inbound::http::{create_router, AppState},
        outbound::{
            imaging::{BlockingPool, ImageDerivativeGenerator},
            persistence::ObjectStoreDocumentRepository,
            storage::{
                s3::{create_s3_store, S3Config},
                ApacheObjectStoreAdapter, LocalUploadSigner, ObjectStoreUploadSigner,
            },
        },
    },
    ports::{
        imaging::DerivativeGenerator,
        repositories::DocumentRepository,
        storage::{ObjectStore, UploadSigner},
    },
    services::{
        AssetPipeline, CatalogServiceImpl, UploadServiceImpl, DEFAULT_MAX_COMMIT_ATTEMPTS,
        DEFAULT_UPLOAD_URL_TTL,
    },
};

pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Lifetime of direct-upload URLs
    pub upload_url_ttl: Duration,
    /// Image worker count; `None` means one per available core
    pub image_workers: Option<usize>,
    /// Base of locally signed upload URLs (in-memory backend)
    pub public_base_url: String,
    /// Signing secret for local uploads; a random one is generated when unset
    pub local_upload_secret: Option<String>,
    pub max_commit_attempts: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::InMemory,
            upload_url_ttl: DEFAULT_UPLOAD_URL_TTL,
            image_workers: None,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            local_upload_secret: None,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3(S3Config),
}

/// Application dependencies container
#[derive(Clone)]
pub struct AppDependencies {
    pub object_store: Arc<dyn ObjectStore>,
    pub upload_signer: Arc<dyn UploadSigner>,
    pub local_signer: Option<Arc<LocalUploadSigner>>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub derivative_generator: Arc<dyn DerivativeGenerator>,
}

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    pub catalog_service: Arc<CatalogServiceImpl>,
    pub upload_service: Arc<UploadServiceImpl>,
    pub object_store: Arc<dyn ObjectStore>,
    pub local_signer: Option<Arc<LocalUploadSigner>>,
}

impl AppServices {
    pub fn app_state(&self) -> AppState {
        AppState {
            catalog: self.catalog_service.clone(),
            uploads: self.upload_service.clone(),
            store: self.object_store.clone(),
            local_signer: self.local_signer.clone(),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.app_state())
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_image_workers(mut self, workers: usize) -> Self {
        self.config.image_workers = Some(workers);
        self
    }

    /// Build the application dependencies
    pub async fn build_dependencies(&self) -> Result<AppDependencies, AppError> {
        let (object_store, upload_signer, local_signer) = self.create_storage_adapters()?;

        let document_repository: Arc<dyn DocumentRepository> =
            Arc::new(ObjectStoreDocumentRepository::new(object_store.clone()));

        let pool = match self.config.image_workers {
            Some(0) => {
                return Err(AppError::Configuration {
                    message: "image worker count must be at least 1".to_string(),
                })
            }
            Some(workers) => BlockingPool::new(workers),
            None => BlockingPool::with_available_parallelism(),
        };
        info!(workers = pool.size(), "Image worker pool ready");
        let derivative_generator: Arc<dyn DerivativeGenerator> =
            Arc::new(ImageDerivativeGenerator::new(pool));

        Ok(AppDependencies {
            object_store,
            upload_signer,
            local_signer,
            document_repository,
            derivative_generator,
        })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        if self.config.max_commit_attempts == 0 {
            return Err(AppError::Configuration {
                message: "max commit attempts must be at least 1".to_string(),
            });
        }

        let deps = self.build_dependencies().await?;

        // Create services with dependency injection
        let pipeline = AssetPipeline::new(
            deps.object_store.clone(),
            deps.derivative_generator.clone(),
        );

        let catalog_service = CatalogServiceImpl::new(deps.document_repository, pipeline.clone())
            .with_max_commit_attempts(self.config.max_commit_attempts);

        let upload_service = UploadServiceImpl::new(deps.upload_signer, pipeline)
            .with_url_ttl(self.config.upload_url_ttl);

        Ok(AppServices {
            catalog_service: Arc::new(catalog_service),
            upload_service: Arc::new(upload_service),
            object_store: deps.object_store,
            local_signer: deps.local_signer,
        })
    }

    /// Create storage adapters based on configuration
    #[allow(clippy::type_complexity)]
    fn create_storage_adapters(
        &self,
    ) -> Result<
        (
            Arc<dyn ObjectStore>,
            Arc<dyn UploadSigner>,
            Option<Arc<LocalUploadSigner>>,
        ),
        AppError,
    > {
        match &self.config.storage_backend {
            StorageBackend::InMemory => {
                let store: Arc<dyn ObjectStore> =
                    Arc::new(ApacheObjectStoreAdapter::new(Arc::new(InMemory::new())));
                let secret = self
                    .config
                    .local_upload_secret
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
                let signer = Arc::new(LocalUploadSigner::new(
                    self.config.public_base_url.clone(),
                    secret,
                ));
                let upload_signer: Arc<dyn UploadSigner> = signer.clone();
                Ok((store, upload_signer, Some(signer)))
            }
            StorageBackend::S3(config) => {
                let s3 = create_s3_store(config).map_err(|e| AppError::StorageInit {
                    message: format!("{:#}", e),
                })?;
                let store: Arc<dyn ObjectStore> = Arc::new(ApacheObjectStoreAdapter::new(s3.clone()));
                let signer: Arc<dyn UploadSigner> = Arc::new(ObjectStoreUploadSigner::new(s3));
                Ok((store, signer, None))
            }
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },
}

/// Convenience functions for common configurations
///
/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

/// Create an S3-backed application
pub async fn create_s3_app(config: S3Config) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(config))
        .build()
        .await
}
