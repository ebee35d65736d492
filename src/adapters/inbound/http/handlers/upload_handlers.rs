use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{
    adapters::inbound::http::{
        dto::{
            catalog_error, signature_error, storage_error, validation_error, ErrorResponseDto,
            HandlerError, SignedUploadQuery, UploadBatchResponseDto, UploadIntentRequestDto,
            UploadIntentResponseDto,
        },
        handlers::parse_namespace,
        router::AppState,
    },
    domain::{
        models::UploadedFile,
        naming::{self, METADATA_HEADER_PREFIX},
        value_objects::ObjectKey,
    },
    ports::storage::PutObjectOptions,
};

/// Issue direct-upload URLs for a batch of files
pub async fn create_upload_intent(
    State(app_state): State<AppState>,
    Path(namespace): Path<String>,
    Json(body): Json<UploadIntentRequestDto>,
) -> Result<(StatusCode, Json<UploadIntentResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let intent = app_state
        .uploads
        .issue_upload_intent(namespace, body.into())
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(intent.into())))
}

/// Multipart upload through the application tier.
/// File parts are stored with their derivatives; text parts become object metadata.
pub async fn upload_files(
    State(app_state): State<AppState>,
    Path(namespace): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadBatchResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;

    let mut files = Vec::new();
    let mut metadata = BTreeMap::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponseDto::bad_request(&format!(
                "Invalid multipart body: {}",
                e
            ))),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext);
                        naming::mime_for_extension(extension.unwrap_or_default()).to_string()
                    });
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponseDto::bad_request(&format!(
                            "Failed to read file '{}': {}",
                            file_name, e
                        ))),
                    )
                })?;
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponseDto::bad_request(&format!(
                            "Failed to read field '{}': {}",
                            name, e
                        ))),
                    )
                })?;
                metadata.insert(name, value);
            }
        }
    }
    debug!(namespace = %namespace, files = files.len(), fields = metadata.len(), "Multipart upload received");

    let batch = app_state
        .uploads
        .upload_batch(namespace, files, metadata)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// Target of URLs produced by the local upload signer
pub async fn put_signed_upload(
    State(app_state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, HandlerError> {
    let Some(signer) = app_state.local_signer.as_ref() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponseDto::not_found(
                "Local uploads are not enabled for this storage backend",
            )),
        ));
    };

    let key = ObjectKey::new(key).map_err(validation_error)?;
    signer
        .verify(&key, query.expires, &query.signature, Utc::now())
        .map_err(signature_error)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let options = PutObjectOptions::builder()
        .maybe_content_type(content_type)
        .metadata(extract_metadata_from_headers(&headers))
        .build();

    let size = body.len();
    app_state
        .store
        .put_object(&key, body, options)
        .await
        .map_err(storage_error)?;

    info!(key = %key, size, "Signed upload stored");
    Ok(StatusCode::OK)
}

/// `x-amz-meta-*` request headers as object metadata
fn extract_metadata_from_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let field = name.as_str().strip_prefix(METADATA_HEADER_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((field.to_string(), value.to_string()))
        })
        .collect()
}
