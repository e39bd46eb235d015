// src/handlers/materials.rs

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
        rbac::{PermMaterialsCreate, PermMaterialsDelete, PermMaterialsEdit, PermMaterialsView, RequirePermission},
    },
    models::materials::{CreateMaterialPayload, Material, UpdateMaterialPayload},
};

#[utoipa::path(
    get,
    path = "/api/materials",
    tag = "Materials",
    responses((status = 200, description = "Materiais", body = Vec<Material>)),
    security(("api_jwt" = []))
)]
pub async fn list_materials(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaterialsView>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = app_state
        .material_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(materials))
}

#[utoipa::path(
    get,
    path = "/api/materials/{id}",
    tag = "Materials",
    params(("id" = Uuid, Path, description = "ID do material")),
    responses(
        (status = 200, description = "Material", body = Material),
        (status = 404, description = "Material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_material(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaterialsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let material = app_state
        .material_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(material))
}

#[utoipa::path(
    post,
    path = "/api/materials",
    tag = "Materials",
    request_body = CreateMaterialPayload,
    responses(
        (status = 201, description = "Material criado e fornecedores sincronizados", body = Material),
        (status = 400, description = "Dados inválidos ou fornecedores inexistentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaterialsCreate>,
    Json(payload): Json<CreateMaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .material_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(material)))
}

#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    tag = "Materials",
    request_body = UpdateMaterialPayload,
    params(("id" = Uuid, Path, description = "ID do material")),
    responses(
        (status = 200, description = "Material atualizado", body = Material),
        (status = 404, description = "Material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_material(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaterialsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .material_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(material))
}

#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    tag = "Materials",
    params(("id" = Uuid, Path, description = "ID do material")),
    responses(
        (status = 204, description = "Material removido de todos os fornecedores"),
        (status = 404, description = "Material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_material(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaterialsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .material_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
