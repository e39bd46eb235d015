// src/services/voucher_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::distinct_ids,
        error::{AppError, Resource},
    },
    db::{voucher_repo::VoucherRecord, MaterialRepository, VendorRepository, VoucherRepository},
    models::{
        materials::Material,
        vouchers::{CreateVoucherPayload, DiscountType, UpdateVoucherPayload, Voucher, VoucherItem, VoucherTotals},
    },
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// ---
// Cálculo de totais (núcleo puro)
// ---

/// subTotal = Σ quantidade × preço; imposto sobre o subtotal; desconto sobre (subtotal + imposto).
/// Sem arredondamento; o valor final nunca fica negativo. Estouro numérico vira `AmountOverflow`.
pub fn calculate_totals(
    items: &[VoucherItem],
    tax_percent: Decimal,
    discount_type: DiscountType,
    discount_value: Decimal,
) -> Result<VoucherTotals, AppError> {
    let sub_total = items.iter().try_fold(Decimal::ZERO, |acc, i| {
        i.quantity
            .checked_mul(i.price_per_unit)
            .and_then(|line| acc.checked_add(line))
            .ok_or(AppError::AmountOverflow)
    })?;
    let tax_amount = percent_of(sub_total, tax_percent)?;
    let gross = sub_total.checked_add(tax_amount).ok_or(AppError::AmountOverflow)?;

    let discounted = match discount_type {
        DiscountType::None => Some(gross),
        DiscountType::Percent => gross.checked_sub(percent_of(gross, discount_value)?),
        DiscountType::Flat => gross.checked_sub(discount_value),
    }
    .ok_or(AppError::AmountOverflow)?;

    Ok(VoucherTotals {
        sub_total,
        tax_amount,
        final_amount: discounted.max(Decimal::ZERO),
    })
}

fn percent_of(base: Decimal, percent: Decimal) -> Result<Decimal, AppError> {
    base.checked_mul(percent)
        .and_then(|v| v.checked_div(HUNDRED))
        .ok_or(AppError::AmountOverflow)
}

/// Todo material dos itens precisa existir e estar ligado ao fornecedor.
pub fn check_vendor_mapping(vendor_id: Uuid, item_material_ids: &[Uuid], materials: &[Material]) -> Result<(), AppError> {
    let wanted = distinct_ids(item_material_ids);
    if materials.len() != wanted.len() || !wanted.iter().all(|id| materials.iter().any(|m| m.id == *id)) {
        return Err(AppError::NotFound(Resource::Material));
    }
    if let Some(unmapped) = materials.iter().find(|m| !m.vendor_ids.contains(&vendor_id)) {
        return Err(AppError::MaterialNotSuppliedByVendor(unmapped.name.clone()));
    }
    Ok(())
}

fn normalize_items(items: Vec<VoucherItem>) -> Vec<VoucherItem> {
    items
        .into_iter()
        .map(|item| VoucherItem { comment: item.comment.trim().to_string(), ..item })
        .collect()
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct VoucherService {
    repo: VoucherRepository,
    vendor_repo: VendorRepository,
    material_repo: MaterialRepository,
    pool: PgPool,
}

impl VoucherService {
    pub fn new(
        repo: VoucherRepository,
        vendor_repo: VendorRepository,
        material_repo: MaterialRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, vendor_repo, material_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<Voucher>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Voucher, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Voucher))
    }

    pub async fn create(&self, payload: CreateVoucherPayload, author: &str) -> Result<Voucher, AppError> {
        let items = normalize_items(payload.items);
        let tax_percent = payload.tax_percent.unwrap_or(Decimal::ZERO);
        let discount_type = payload.discount_type.unwrap_or_default();
        let discount_value = payload.discount_value.unwrap_or(Decimal::ZERO);

        let mut tx = self.pool.begin().await?;

        // 1. Fornecedor e vínculo dos materiais
        self.vendor_repo
            .find_by_id(&mut *tx, payload.vendor_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Vendor))?;
        self.validate_mapping(&mut tx, payload.vendor_id, &items).await?;

        // 2. Totais calculados no servidor
        let totals = calculate_totals(&items, tax_percent, discount_type, discount_value)?;

        // 3. Grava com auditoria
        let record = VoucherRecord {
            vendor_id: payload.vendor_id,
            items,
            date_of_purchase: payload.date_of_purchase,
            sub_total: totals.sub_total,
            tax_percent,
            tax_amount: totals.tax_amount,
            discount_type,
            discount_value,
            final_amount: totals.final_amount,
            payment_method: payload.payment_method.trim().to_string(),
            payment_status: payload.payment_status,
            payment_date: payload.payment_date,
            paid_by_mode: payload.paid_by_mode.unwrap_or_default(),
            payment_comments: payload.payment_comments.unwrap_or_default(),
            created_by_name: author.to_string(),
            status_updated_by_name: author.to_string(),
            status_updated_at: Some(Utc::now()),
        };
        let voucher = self.repo.insert(&mut *tx, &record).await?;
        tx.commit().await?;

        tracing::info!("🧾 Voucher {} criado por {} (total {})", voucher.id, author, voucher.final_amount);
        Ok(voucher)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateVoucherPayload, author: &str) -> Result<Voucher, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Voucher))?;

        // 1. Mescla os valores enviados com os atuais
        let vendor_id = payload.vendor_id.unwrap_or(current.vendor_id);
        let items = payload.items.map(normalize_items).unwrap_or_else(|| current.items.0.clone());
        let tax_percent = payload.tax_percent.unwrap_or(current.tax_percent);
        let discount_type = payload.discount_type.unwrap_or(current.discount_type);
        let discount_value = payload.discount_value.unwrap_or(current.discount_value);

        // 2. Revalida o vínculo e recalcula
        self.vendor_repo
            .find_by_id(&mut *tx, vendor_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Vendor))?;
        self.validate_mapping(&mut tx, vendor_id, &items).await?;
        let totals = calculate_totals(&items, tax_percent, discount_type, discount_value)?;

        // 3. Auditoria só quando o status realmente muda
        let (payment_status, status_updated_by_name, status_updated_at) = match payload.payment_status {
            Some(status) if status != current.payment_status => (status, author.to_string(), Some(Utc::now())),
            _ => (current.payment_status, current.status_updated_by_name.clone(), current.status_updated_at),
        };

        let record = VoucherRecord {
            vendor_id,
            items,
            date_of_purchase: payload.date_of_purchase.unwrap_or(current.date_of_purchase),
            sub_total: totals.sub_total,
            tax_percent,
            tax_amount: totals.tax_amount,
            discount_type,
            discount_value,
            final_amount: totals.final_amount,
            payment_method: payload.payment_method.map(|m| m.trim().to_string()).unwrap_or(current.payment_method),
            payment_status,
            payment_date: payload.payment_date.unwrap_or(current.payment_date),
            paid_by_mode: payload.paid_by_mode.unwrap_or(current.paid_by_mode),
            payment_comments: payload.payment_comments.unwrap_or(current.payment_comments),
            created_by_name: current.created_by_name,
            status_updated_by_name,
            status_updated_at,
        };

        let voucher = self
            .repo
            .update(&mut *tx, id, &record)
            .await?
            .ok_or(AppError::NotFound(Resource::Voucher))?;
        tx.commit().await?;

        Ok(voucher)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(Resource::Voucher));
        }
        Ok(())
    }

    async fn validate_mapping(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        vendor_id: Uuid,
        items: &[VoucherItem],
    ) -> Result<(), AppError> {
        let material_ids: Vec<Uuid> = items.iter().map(|i| i.material_id).collect();
        let materials = self
            .material_repo
            .find_by_ids(&mut **tx, &distinct_ids(&material_ids))
            .await?;
        check_vendor_mapping(vendor_id, &material_ids, &materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use axum::http::StatusCode;
    use validator::Validate;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn item(quantity: &str, price: &str) -> VoucherItem {
        VoucherItem {
            material_id: Uuid::new_v4(),
            quantity: d(quantity),
            price_per_unit: d(price),
            comment: String::new(),
        }
    }

    fn material(id: Uuid, name: &str, vendor_ids: Vec<Uuid>) -> Material {
        Material {
            id,
            name: name.into(),
            category: None,
            unit: Some("kg".into()),
            description: None,
            vendor_ids,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn percent_discount_applies_after_tax() {
        let items = [item("2", "50"), item("1", "100")];
        let totals = calculate_totals(&items, d("10"), DiscountType::Percent, d("5")).unwrap();

        assert_eq!(totals.sub_total, d("200"));
        assert_eq!(totals.tax_amount, d("20"));
        assert_eq!(totals.final_amount, d("209.00"));
    }

    #[test]
    fn flat_discount_never_goes_below_zero() {
        let totals = calculate_totals(&[item("1", "10")], Decimal::ZERO, DiscountType::Flat, d("999")).unwrap();
        assert_eq!(totals.sub_total, d("10"));
        assert_eq!(totals.final_amount, Decimal::ZERO);
    }

    #[test]
    fn no_discount_ignores_discount_value() {
        let totals = calculate_totals(&[item("3", "1.5")], d("0"), DiscountType::None, d("50")).unwrap();
        assert_eq!(totals.final_amount, d("4.5"));
    }

    #[test]
    fn fractional_values_are_not_rounded() {
        let totals = calculate_totals(&[item("0.1", "0.2")], d("12.5"), DiscountType::None, Decimal::ZERO).unwrap();
        assert_eq!(totals.sub_total, d("0.02"));
        assert_eq!(totals.tax_amount, d("0.0025"));
        assert_eq!(totals.final_amount, d("0.0225"));
    }

    #[test]
    fn huge_amounts_fail_with_a_typed_error() {
        // Cada valor passa pela validação de não-negativo; o produto não cabe em Decimal
        let payload: CreateVoucherPayload = serde_json::from_value(serde_json::json!({
            "vendorId": Uuid::new_v4(),
            "items": [{ "materialId": Uuid::new_v4(), "quantity": 1e15, "pricePerUnit": 1e15 }],
            "dateOfPurchase": "2025-03-01",
            "paymentMethod": "PIX",
            "paymentStatus": "Pending"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());

        let err = calculate_totals(&payload.items, Decimal::ZERO, DiscountType::None, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::AmountOverflow));
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn huge_tax_percent_fails_with_a_typed_error() {
        let err = calculate_totals(&[item("1000", "1000")], Decimal::MAX, DiscountType::None, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::AmountOverflow));
    }

    #[test]
    fn mapping_requires_every_material_to_list_the_vendor() {
        let vendor = Uuid::new_v4();
        let (spawn, bags) = (Uuid::new_v4(), Uuid::new_v4());
        let materials = vec![material(spawn, "Spawn", vec![vendor]), material(bags, "Bags", vec![Uuid::new_v4()])];

        let err = check_vendor_mapping(vendor, &[spawn, bags], &materials).unwrap_err();
        assert!(matches!(err, AppError::MaterialNotSuppliedByVendor(ref name) if name == "Bags"));

        assert!(check_vendor_mapping(vendor, &[spawn, spawn], &materials[..1]).is_ok());
    }

    #[test]
    fn mapping_reports_missing_materials() {
        let vendor = Uuid::new_v4();
        let known = Uuid::new_v4();
        let materials = vec![material(known, "Spawn", vec![vendor])];

        let err = check_vendor_mapping(vendor, &[known, Uuid::new_v4()], &materials).unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Material)));
    }
}
