pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - records, assets and their errors
pub use domain::{
    AssetReference,
    AssetRole,
    CatalogError,
    CatalogResult,
    CollectionDocument,
    CreateRecordRequest,
    DeletionReport,
    DerivativeSpec,
    DerivativeVariant,
    DocumentVersion,
    ImageError,
    // Value objects
    Namespace,
    ObjectKey,
    // Models
    Record,
    RecordFields,
    RecordPatch,
    // Errors
    StorageError,
    UploadIntent,
    UploadIntentRequest,
    ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{
    // Service ports
    CatalogService,
    // Imaging port
    DerivativeGenerator,
    // Repository ports
    DocumentRepository,
    // Storage ports
    ObjectStore,
    UploadService,
    UploadSigner,
};

// Service implementations - business logic
pub use services::{AssetPipeline, CatalogServiceImpl, UploadServiceImpl};

// Application factory and configuration
pub use app::{
    create_in_memory_app, create_s3_app, AppBuilder, AppConfig, AppDependencies, AppError,
    AppServices, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::{
    imaging::{render_derivatives, BlockingPool, ImageDerivativeGenerator},
    persistence::ObjectStoreDocumentRepository,
    storage::{ApacheObjectStoreAdapter, LocalUploadSigner, ObjectStoreUploadSigner},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, create_s3_app, ApacheObjectStoreAdapter, AppBuilder, AppServices,
        CatalogService, CatalogServiceImpl, Namespace, ObjectKey, ObjectStore, Record,
        UploadService, UploadServiceImpl,
    };
}
