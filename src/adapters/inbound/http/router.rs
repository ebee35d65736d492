use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    handlers::{
        add_asset, create_record, create_upload_intent, delete_record, get_record, health,
        list_records, move_record, put_signed_upload, remove_asset, reorder_records,
        update_record, upload_files,
    },
    middleware::response_headers,
};
use crate::{
    adapters::outbound::storage::LocalUploadSigner,
    ports::{
        services::{CatalogService, UploadService},
        storage::ObjectStore,
    },
};

/// Largest request body accepted on upload routes
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state containing all services
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogService>,
    pub uploads: Arc<dyn UploadService>,
    /// Raw store, written by locally signed uploads
    pub store: Arc<dyn ObjectStore>,
    /// Present when upload URLs point back at this server
    pub local_signer: Option<Arc<LocalUploadSigner>>,
}

/// Create the main application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/{namespace}", create_api_router())
        .route(
            "/uploads/{*key}",
            put(put_signed_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(middleware::from_fn(response_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Namespace-scoped routes, nested under `/api/{namespace}`
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        // Uploads
        .route("/uploads/intent", post(create_upload_intent))
        .route(
            "/uploads",
            post(upload_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Records
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/{id}",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/records/{id}/move", post(move_record))
        .route(
            "/records/{id}/assets",
            post(add_asset).delete(remove_asset),
        )
        // Ordering
        .route("/reorder", post(reorder_records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::create_in_memory_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    async fn server() -> TestServer {
        let services = create_in_memory_app().await.unwrap();
        TestServer::new(create_router(services.app_state())).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = server().await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn responses_are_not_cacheable_and_carry_request_id() {
        let server = server().await;
        let response = server.get("/api/artworks/records").await;
        response.assert_status_ok();
        assert_eq!(response.header("cache-control"), "no-store");
        let request_id = response.header("x-request-id");
        assert!(uuid::Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn unknown_namespace_is_bad_request() {
        let server = server().await;
        let response = server.get("/api/posters/records").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
