// src/handlers/stages.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, rbac::RequireAdmin},
    models::rooms::{CreateStagePayload, Stage, StageSummary, UpdateStagePayload},
};

#[utoipa::path(
    get,
    path = "/api/stages",
    tag = "Stages",
    responses((status = 200, description = "Estágios em ordem de sequência", body = Vec<Stage>)),
    security(("api_jwt" = []))
)]
pub async fn list_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let stages = app_state
        .stage_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stages))
}

#[utoipa::path(
    get,
    path = "/api/stages/summary",
    tag = "Stages",
    responses((status = 200, description = "Soma dos intervalos e se fecha 60 dias", body = StageSummary)),
    security(("api_jwt" = []))
)]
pub async fn stage_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .stage_service
        .summary()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/stages",
    tag = "Stages",
    request_body = CreateStagePayload,
    responses(
        (status = 201, description = "Estágio criado", body = Stage),
        (status = 400, description = "Dados inválidos ou limite de 60 dias excedido"),
        (status = 409, description = "Nome ou ordem já usados")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Json(payload): Json<CreateStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let stage = app_state
        .stage_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(stage)))
}

#[utoipa::path(
    put,
    path = "/api/stages/{id}",
    tag = "Stages",
    request_body = UpdateStagePayload,
    params(("id" = Uuid, Path, description = "ID do estágio")),
    responses(
        (status = 200, description = "Estágio atualizado", body = Stage),
        (status = 404, description = "Estágio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let stage = app_state
        .stage_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stage))
}

#[utoipa::path(
    delete,
    path = "/api/stages/{id}",
    tag = "Stages",
    params(("id" = Uuid, Path, description = "ID do estágio")),
    responses(
        (status = 204, description = "Estágio removido; salas nele voltam a ficar sem estágio"),
        (status = 404, description = "Estágio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .stage_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
