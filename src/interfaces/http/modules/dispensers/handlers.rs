//! Dispenser API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::dto::{
    CreateDispenserRequest, DispenserDetailResponse, DispenserResponse, SpendingResponse,
    StatusResponse, UpdateStatusRequest,
};
use crate::application::DispenserService;
use crate::domain::{DispenserStatus, DomainError};
use crate::interfaces::http::common::{ApiError, ApiResponse, FieldErrors, ValidatedJson};

pub const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Dispenser handler state
#[derive(Clone)]
pub struct DispenserAppState {
    pub service: Arc<DispenserService>,
}

/// Unparseable ids can't name a dispenser, so they are simply not found.
fn parse_dispenser_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::dispenser_not_found(raw).into())
}

#[utoipa::path(
    post,
    path = "/api/v1/dispensers",
    tag = "Dispensers",
    request_body = CreateDispenserRequest,
    responses(
        (status = 201, description = "Dispenser created", body = ApiResponse<DispenserResponse>),
        (status = 400, description = "Missing or invalid flow_volume")
    )
)]
pub async fn create_dispenser(
    State(state): State<DispenserAppState>,
    ValidatedJson(body): ValidatedJson<CreateDispenserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DispenserResponse>>), ApiError> {
    let flow_volume = body.flow_volume()?;
    let dispenser = state.service.create(flow_volume.value()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(DispenserResponse::from_domain(&dispenser))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispensers/{dispenser_id}",
    tag = "Dispensers",
    params(("dispenser_id" = String, Path, description = "Dispenser UUID")),
    responses(
        (status = 200, description = "Dispenser details", body = ApiResponse<DispenserDetailResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_dispenser(
    State(state): State<DispenserAppState>,
    Path(dispenser_id): Path<String>,
) -> Result<Json<ApiResponse<DispenserDetailResponse>>, ApiError> {
    let id = parse_dispenser_id(&dispenser_id)?;
    let dispenser = state.service.get(id).await?;
    Ok(Json(ApiResponse::success(
        DispenserDetailResponse::from_domain(&dispenser),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/dispensers/{dispenser_id}/status",
    tag = "Dispensers",
    params(("dispenser_id" = String, Path, description = "Dispenser UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<StatusResponse>),
        (status = 400, description = "Invalid status or timestamp"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Dispenser is already opened/closed")
    )
)]
pub async fn update_status(
    State(state): State<DispenserAppState>,
    Path(dispenser_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<StatusResponse>>, ApiError> {
    let id = parse_dispenser_id(&dispenser_id)?;

    let raw_status = body.raw_status();

    let mut errors = FieldErrors::new();
    let status = body
        .status
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(DispenserStatus::parse);
    if status.is_none() {
        errors.insert(
            "status".into(),
            vec![format!("\"{}\" is not a valid choice.", raw_status)],
        );
    }
    let updated_at = body.updated_at();
    if updated_at.is_none() {
        errors.insert("updated_at".into(), vec![INVALID_DATETIME.to_string()]);
    }
    let (Some(status), Some(updated_at)) = (status, updated_at) else {
        return Err(ApiError::Fields(errors));
    };

    state.service.set_status(id, status, updated_at).await?;
    Ok(Json(ApiResponse::success(StatusResponse {
        status: status.to_string(),
        updated_at,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispensers/{dispenser_id}/spending",
    tag = "Dispensers",
    params(("dispenser_id" = String, Path, description = "Dispenser UUID")),
    responses(
        (status = 200, description = "Spend per usage and in total", body = ApiResponse<SpendingResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_spending(
    State(state): State<DispenserAppState>,
    Path(dispenser_id): Path<String>,
) -> Result<Json<ApiResponse<SpendingResponse>>, ApiError> {
    let id = parse_dispenser_id(&dispenser_id)?;
    let report = state.service.spending(id).await?;
    Ok(Json(ApiResponse::success(report.into())))
}
