// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Filtro opcional por data de compra (inclusivo nas duas pontas).
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorExpense {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    #[schema(value_type = f64)]
    pub total_spend: Decimal,
    pub voucher_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSummary {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: Option<String>,
    #[schema(value_type = f64)]
    pub total_quantity: Decimal,
    #[schema(value_type = f64)]
    pub total_spend: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTotals {
    #[schema(value_type = f64)]
    pub total_spend: Decimal,
    #[schema(value_type = f64)]
    pub total_tax: Decimal,
    pub voucher_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxTotals {
    #[schema(value_type = f64)]
    pub total_tax: Decimal,
    #[schema(value_type = f64)]
    pub total_payable: Decimal,
}

/// Total e contagem de vouchers agrupados por um rótulo (status ou forma de pagamento).
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupedTotal {
    #[schema(example = "Pending")]
    pub label: String,
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxPaymentReport {
    pub tax: TaxTotals,
    pub payment_status: Vec<GroupedTotal>,
    pub payment_method: Vec<GroupedTotal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub expenses: ExpenseTotals,
    /// Soma de `finalAmount` dos vouchers ainda não quitados.
    #[schema(value_type = f64)]
    pub outstanding_amount: Decimal,
    pub outstanding_count: i64,
    pub vendor_count: i64,
    pub active_vendor_count: i64,
    pub material_count: i64,
}
