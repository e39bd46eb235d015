// src/handlers/vendors.rs

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
        rbac::{PermVendorsCreate, PermVendorsDelete, PermVendorsEdit, PermVendorsView, RequirePermission},
    },
    models::vendors::{CreateVendorPayload, UpdateVendorPayload, Vendor},
};

#[utoipa::path(
    get,
    path = "/api/vendors",
    tag = "Vendors",
    responses((status = 200, description = "Fornecedores", body = Vec<Vendor>)),
    security(("api_jwt" = []))
)]
pub async fn list_vendors(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVendorsView>,
) -> Result<impl IntoResponse, ApiError> {
    let vendors = app_state
        .vendor_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vendors))
}

#[utoipa::path(
    get,
    path = "/api/vendors/{id}",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Vendor),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vendor(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVendorsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = app_state
        .vendor_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vendor))
}

#[utoipa::path(
    post,
    path = "/api/vendors",
    tag = "Vendors",
    request_body = CreateVendorPayload,
    responses(
        (status = 201, description = "Fornecedor criado e materiais sincronizados", body = Vendor),
        (status = 400, description = "Dados inválidos ou materiais inexistentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vendor(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVendorsCreate>,
    Json(payload): Json<CreateVendorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vendor = app_state
        .vendor_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vendor)))
}

#[utoipa::path(
    put,
    path = "/api/vendors/{id}",
    tag = "Vendors",
    request_body = UpdateVendorPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor atualizado", body = Vendor),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vendor(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVendorsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVendorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vendor = app_state
        .vendor_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vendor))
}

#[utoipa::path(
    delete,
    path = "/api/vendors/{id}",
    tag = "Vendors",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 204, description = "Fornecedor removido"),
        (status = 404, description = "Fornecedor não encontrado"),
        (status = 409, description = "Fornecedor possui vouchers")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vendor(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVendorsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .vendor_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
