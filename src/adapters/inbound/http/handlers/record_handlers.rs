use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    adapters::inbound::http::{
        dto::{
            catalog_error, validation_error, AddAssetDto, AssetReferenceQuery, CreateRecordDto,
            DeleteRecordResponseDto, HandlerError, MoveRecordDto, MoveRecordResponseDto,
            PatchRecordDto, RecordListResponseDto, RecordResponseDto, ReorderRequestDto,
            ReorderResponseDto,
        },
        router::AppState,
    },
    domain::value_objects::Namespace,
};

/// Parse the `{namespace}` path segment; unknown names are a bad request
pub fn parse_namespace(raw: &str) -> Result<Namespace, HandlerError> {
    raw.parse::<Namespace>().map_err(validation_error)
}

pub async fn list_records(
    State(app_state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<(StatusCode, Json<RecordListResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let records = app_state
        .catalog
        .list(namespace)
        .await
        .map_err(catalog_error)?;

    Ok((
        StatusCode::OK,
        Json(RecordListResponseDto::new(namespace, records)),
    ))
}

pub async fn get_record(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<RecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let record = app_state
        .catalog
        .get(namespace, &id)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(RecordResponseDto::new(record))))
}

/// Commit a record whose uploads have completed
pub async fn create_record(
    State(app_state): State<AppState>,
    Path(namespace): Path<String>,
    Json(body): Json<CreateRecordDto>,
) -> Result<(StatusCode, Json<RecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let record = app_state
        .catalog
        .create(namespace, body.into())
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::CREATED, Json(RecordResponseDto::new(record))))
}

pub async fn update_record(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    Json(body): Json<PatchRecordDto>,
) -> Result<(StatusCode, Json<RecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let record = app_state
        .catalog
        .update(namespace, &id, body.into())
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(RecordResponseDto::new(record))))
}

/// Delete a record. Cleanup failures are listed in the response, not raised.
pub async fn delete_record(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<DeleteRecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let report = app_state
        .catalog
        .delete(namespace, &id)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(report.into())))
}

pub async fn move_record(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    Json(body): Json<MoveRecordDto>,
) -> Result<(StatusCode, Json<MoveRecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let outcome = app_state
        .catalog
        .move_record(namespace, &id, body.direction)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(outcome.into())))
}

pub async fn reorder_records(
    State(app_state): State<AppState>,
    Path(namespace): Path<String>,
    Json(body): Json<ReorderRequestDto>,
) -> Result<(StatusCode, Json<ReorderResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let report = app_state
        .catalog
        .reorder_records(namespace, body.into())
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(report.into())))
}

pub async fn add_asset(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    Json(body): Json<AddAssetDto>,
) -> Result<(StatusCode, Json<RecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let record = app_state
        .catalog
        .add_asset(namespace, &id, &body.key)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(RecordResponseDto::new(record))))
}

pub async fn remove_asset(
    State(app_state): State<AppState>,
    Path((namespace, id)): Path<(String, String)>,
    Query(query): Query<AssetReferenceQuery>,
) -> Result<(StatusCode, Json<RecordResponseDto>), HandlerError> {
    let namespace = parse_namespace(&namespace)?;
    let record = app_state
        .catalog
        .remove_asset(namespace, &id, &query.reference)
        .await
        .map_err(catalog_error)?;

    Ok((StatusCode::OK, Json(RecordResponseDto::new(record))))
}
