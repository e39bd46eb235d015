// src/models/vouchers.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    None,
    Percent,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    Paid,
    Pending,
    #[sqlx(rename = "Partially Paid")]
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
}

// ---
// Validação Customizada
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if *val < Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("not_negative".into());
        return Err(err);
    }
    Ok(())
}

// --- Itens ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherItem {
    pub material_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 10)]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 20)]
    pub price_per_unit: Decimal,
    #[serde(default)]
    pub comment: String,
}

// --- Voucher ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: Uuid,
    pub vendor_id: Uuid,
    #[schema(value_type = Vec<VoucherItem>)]
    pub items: Json<Vec<VoucherItem>>,
    pub date_of_purchase: NaiveDate,
    #[schema(value_type = f64)]
    pub sub_total: Decimal,
    #[schema(value_type = f64)]
    pub tax_percent: Decimal,
    #[schema(value_type = f64)]
    pub tax_amount: Decimal,
    pub discount_type: DiscountType,
    #[schema(value_type = f64)]
    pub discount_value: Decimal,
    #[schema(value_type = f64)]
    pub final_amount: Decimal,
    #[schema(example = "PIX")]
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub paid_by_mode: String,
    pub payment_comments: String,
    pub created_by_name: String,
    pub status_updated_by_name: String,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucherPayload {
    pub vendor_id: Uuid,

    #[validate(length(min = 1, message = "items_required"), nested)]
    pub items: Vec<VoucherItem>,

    pub date_of_purchase: NaiveDate,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub tax_percent: Option<Decimal>,

    pub discount_type: Option<DiscountType>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub discount_value: Option<Decimal>,

    #[validate(length(min = 1, message = "required"))]
    pub payment_method: String,

    pub payment_status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub paid_by_mode: Option<String>,
    pub payment_comments: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoucherPayload {
    pub vendor_id: Option<Uuid>,

    #[validate(length(min = 1, message = "items_required"), nested)]
    pub items: Option<Vec<VoucherItem>>,

    pub date_of_purchase: Option<NaiveDate>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub tax_percent: Option<Decimal>,

    pub discount_type: Option<DiscountType>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub discount_value: Option<Decimal>,

    #[validate(length(min = 1, message = "required"))]
    pub payment_method: Option<String>,

    pub payment_status: Option<PaymentStatus>,

    /// Ausente: mantém. `null`: limpa a data.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<NaiveDate>)]
    pub payment_date: Option<Option<NaiveDate>>,

    pub paid_by_mode: Option<String>,
    pub payment_comments: Option<String>,
}

// Distingue campo ausente (None) de campo enviado como null (Some(None)).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resultado do cálculo de totais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherTotals {
    #[schema(value_type = f64)]
    pub sub_total: Decimal,
    #[schema(value_type = f64)]
    pub tax_amount: Decimal,
    #[schema(value_type = f64)]
    pub final_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_status_uses_display_labels() {
        let status: PaymentStatus = serde_json::from_value(json!("Partially Paid")).unwrap();
        assert_eq!(status, PaymentStatus::PartiallyPaid);
        assert!(serde_json::from_value::<PaymentStatus>(json!("Refunded")).is_err());
    }

    #[test]
    fn negative_quantities_fail_nested_validation() {
        let payload: CreateVoucherPayload = serde_json::from_value(json!({
            "vendorId": Uuid::new_v4(),
            "items": [{ "materialId": Uuid::new_v4(), "quantity": -1, "pricePerUnit": 5 }],
            "dateOfPurchase": "2025-03-01",
            "paymentMethod": "Cash",
            "paymentStatus": "Paid"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn empty_items_are_rejected() {
        let payload: CreateVoucherPayload = serde_json::from_value(json!({
            "vendorId": Uuid::new_v4(),
            "items": [],
            "dateOfPurchase": "2025-03-01",
            "paymentMethod": "Cash",
            "paymentStatus": "Pending"
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn payment_date_distinguishes_null_from_absent() {
        let absent: UpdateVoucherPayload = serde_json::from_value(json!({})).unwrap();
        let cleared: UpdateVoucherPayload = serde_json::from_value(json!({ "paymentDate": null })).unwrap();

        assert_eq!(absent.payment_date, None);
        assert_eq!(cleared.payment_date, Some(None));
    }
}
