// src/models/vendors.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vendor_status")]
pub enum VendorStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    #[schema(example = "Agro Substratos Ltda")]
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    /// Lado "fornecedor" da associação com materiais.
    pub materials_supplied: Vec<Uuid>,
    pub status: VendorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    #[serde(default)]
    pub materials_supplied: Vec<Uuid>,
    #[serde(default)]
    pub status: VendorStatus,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    /// Quando presente, substitui a lista e ressincroniza os materiais.
    pub materials_supplied: Option<Vec<Uuid>>,
    pub status: Option<VendorStatus>,
}
