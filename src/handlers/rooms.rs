// src/handlers/rooms.rs

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
    middleware::{
        i18n::Locale,
        rbac::{PermRoomActivitiesEdit, PermRoomStagesEdit, PermRoomStatusView, RequireAdmin, RequirePermission},
    },
    models::rooms::{
        CreateRoomPayload, GrowingRoom, MoveStagePayload, RoomStatus, ToggleActivityPayload, UpdateRoomPayload,
    },
};

// ---
// Cadastro (somente admin)
// ---

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    responses((status = 200, description = "Salas de cultivo", body = Vec<GrowingRoom>)),
    security(("api_jwt" = []))
)]
pub async fn list_rooms(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = app_state
        .room_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rooms))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    request_body = CreateRoomPayload,
    responses(
        (status = 201, description = "Sala criada", body = GrowingRoom),
        (status = 409, description = "Nome já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state
        .room_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    request_body = UpdateRoomPayload,
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala atualizada", body = GrowingRoom),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state
        .room_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 204, description = "Sala removida"),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .room_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Painel e ciclo de estágios
// ---

#[utoipa::path(
    get,
    path = "/api/rooms/status",
    tag = "Rooms",
    responses(
        (status = 200, description = "Estágio atual, próximo estágio e atividades do dia de cada sala", body = Vec<RoomStatus>),
        (status = 403, description = "Sem permissão de estágios ou atividades")
    ),
    security(("api_jwt" = []))
)]
pub async fn room_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRoomStatusView>,
) -> Result<impl IntoResponse, ApiError> {
    let board = app_state
        .room_service
        .status_board()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(board))
}

#[utoipa::path(
    post,
    path = "/api/rooms/{id}/init-stage",
    tag = "Rooms",
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala colocada no primeiro estágio", body = GrowingRoom),
        (status = 409, description = "Sala já tem estágio ou não há estágios")
    ),
    security(("api_jwt" = []))
)]
pub async fn init_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRoomStagesEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let room = app_state
        .room_service
        .init_stage(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

/// Sem `stageId` avança para o próximo estágio do ciclo.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/move-stage",
    tag = "Rooms",
    request_body(content = Option<MoveStagePayload>, description = "Estágio de destino (opcional)"),
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala movida", body = GrowingRoom),
        (status = 404, description = "Sala ou estágio não encontrado"),
        (status = 409, description = "Não há estágios configurados")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRoomStagesEdit>,
    Path(id): Path<Uuid>,
    payload: Option<Json<MoveStagePayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let target = payload.and_then(|Json(p)| p.stage_id);

    let room = app_state
        .room_service
        .move_stage(id, target)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    post,
    path = "/api/rooms/{id}/activities",
    tag = "Rooms",
    request_body = ToggleActivityPayload,
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Atividade marcada", body = GrowingRoom),
        (status = 409, description = "Sala sem estágio ou atividade não habilitada no estágio")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRoomActivitiesEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleActivityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let room = app_state
        .room_service
        .toggle_activity(id, payload.activity, payload.done)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}
