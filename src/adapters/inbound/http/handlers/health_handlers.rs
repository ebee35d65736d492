use axum::Json;

use crate::adapters::inbound::http::dto::HealthResponseDto;

pub async fn health() -> Json<HealthResponseDto> {
    Json(HealthResponseDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
