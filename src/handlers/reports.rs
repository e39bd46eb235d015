// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermReportsView, RequirePermission},
    },
    models::reports::{DateRange, ExpenseTotals, MaterialSummary, TaxPaymentReport, VendorExpense},
};

#[utoipa::path(
    get,
    path = "/api/reports/vendor-expenses",
    tag = "Reports",
    params(DateRange),
    responses((status = 200, description = "Gasto por fornecedor, maior primeiro", body = Vec<VendorExpense>)),
    security(("api_jwt" = []))
)]
pub async fn vendor_expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .vendor_expenses(range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/reports/material-summary",
    tag = "Reports",
    params(DateRange),
    responses((status = 200, description = "Quantidade e gasto por material", body = Vec<MaterialSummary>)),
    security(("api_jwt" = []))
)]
pub async fn material_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .material_summary(range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/reports/expenses",
    tag = "Reports",
    params(DateRange),
    responses((status = 200, description = "Totais de gasto e imposto no período", body = ExpenseTotals)),
    security(("api_jwt" = []))
)]
pub async fn expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let totals = app_state
        .report_service
        .expenses(range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(totals))
}

#[utoipa::path(
    get,
    path = "/api/reports/tax-payments",
    tag = "Reports",
    params(DateRange),
    responses((status = 200, description = "Impostos e totais por status e forma de pagamento", body = TaxPaymentReport)),
    security(("api_jwt" = []))
)]
pub async fn tax_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .tax_payments(range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
