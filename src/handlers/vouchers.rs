// src/handlers/vouchers.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermVouchersCreate, PermVouchersDelete, PermVouchersEdit, PermVouchersView, RequirePermission},
    },
    models::vouchers::{CreateVoucherPayload, UpdateVoucherPayload, Voucher},
};

#[utoipa::path(
    get,
    path = "/api/vouchers",
    tag = "Vouchers",
    responses((status = 200, description = "Vouchers, compra mais recente primeiro", body = Vec<Voucher>)),
    security(("api_jwt" = []))
)]
pub async fn list_vouchers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVouchersView>,
) -> Result<impl IntoResponse, ApiError> {
    let vouchers = app_state
        .voucher_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vouchers))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/{id}",
    tag = "Vouchers",
    params(("id" = Uuid, Path, description = "ID do voucher")),
    responses(
        (status = 200, description = "Voucher", body = Voucher),
        (status = 404, description = "Voucher não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVouchersView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = app_state
        .voucher_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(voucher))
}

#[utoipa::path(
    post,
    path = "/api/vouchers",
    tag = "Vouchers",
    request_body = CreateVoucherPayload,
    responses(
        (status = 201, description = "Voucher criado com totais calculados", body = Voucher),
        (status = 400, description = "Itens inválidos ou material não fornecido pelo fornecedor"),
        (status = 404, description = "Fornecedor ou material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermVouchersCreate>,
    Json(payload): Json<CreateVoucherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let voucher = app_state
        .voucher_service
        .create(payload, &user.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(voucher)))
}

#[utoipa::path(
    put,
    path = "/api/vouchers/{id}",
    tag = "Vouchers",
    request_body = UpdateVoucherPayload,
    params(("id" = Uuid, Path, description = "ID do voucher")),
    responses(
        (status = 200, description = "Voucher atualizado e totais recalculados", body = Voucher),
        (status = 404, description = "Voucher não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermVouchersEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVoucherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let voucher = app_state
        .voucher_service
        .update(id, payload, &user.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(voucher))
}

#[utoipa::path(
    delete,
    path = "/api/vouchers/{id}",
    tag = "Vouchers",
    params(("id" = Uuid, Path, description = "ID do voucher")),
    responses(
        (status = 204, description = "Voucher removido"),
        (status = 404, description = "Voucher não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermVouchersDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .voucher_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
