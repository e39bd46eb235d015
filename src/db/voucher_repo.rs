// src/db/voucher_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::vouchers::{DiscountType, PaymentStatus, Voucher, VoucherItem},
};

const VOUCHER_COLUMNS: &str = "id, vendor_id, items, date_of_purchase, sub_total, tax_percent, tax_amount, \
                               discount_type, discount_value, final_amount, payment_method, payment_status, \
                               payment_date, paid_by_mode, payment_comments, created_by_name, \
                               status_updated_by_name, status_updated_at, created_at, updated_at";

/// Linha completa de voucher pronta para gravar (totais já calculados).
#[derive(Debug, Clone)]
pub struct VoucherRecord {
    pub vendor_id: Uuid,
    pub items: Vec<VoucherItem>,
    pub date_of_purchase: NaiveDate,
    pub sub_total: Decimal,
    pub tax_percent: Decimal,
    pub tax_amount: Decimal,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub final_amount: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub paid_by_mode: String,
    pub payment_comments: String,
    pub created_by_name: String,
    pub status_updated_by_name: String,
    pub status_updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct VoucherRepository {
    pool: PgPool,
}

impl VoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Mais recentes primeiro
    pub async fn list(&self) -> Result<Vec<Voucher>, AppError> {
        let vouchers = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers ORDER BY date_of_purchase DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(vouchers)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(voucher)
    }

    pub async fn insert<'e, E>(&self, executor: E, record: &VoucherRecord) -> Result<Voucher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            r#"
            INSERT INTO vouchers (
                vendor_id, items, date_of_purchase, sub_total, tax_percent, tax_amount,
                discount_type, discount_value, final_amount, payment_method, payment_status,
                payment_date, paid_by_mode, payment_comments, created_by_name,
                status_updated_by_name, status_updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {VOUCHER_COLUMNS}
            "#
        ))
        .bind(record.vendor_id)
        .bind(Json(&record.items))
        .bind(record.date_of_purchase)
        .bind(record.sub_total)
        .bind(record.tax_percent)
        .bind(record.tax_amount)
        .bind(record.discount_type)
        .bind(record.discount_value)
        .bind(record.final_amount)
        .bind(&record.payment_method)
        .bind(record.payment_status)
        .bind(record.payment_date)
        .bind(&record.paid_by_mode)
        .bind(&record.payment_comments)
        .bind(&record.created_by_name)
        .bind(&record.status_updated_by_name)
        .bind(record.status_updated_at)
        .fetch_one(executor)
        .await?;
        Ok(voucher)
    }

    // `created_by_name` nunca muda depois da criação
    pub async fn update<'e, E>(&self, executor: E, id: Uuid, record: &VoucherRecord) -> Result<Option<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            r#"
            UPDATE vouchers
            SET vendor_id = $2, items = $3, date_of_purchase = $4, sub_total = $5, tax_percent = $6,
                tax_amount = $7, discount_type = $8, discount_value = $9, final_amount = $10,
                payment_method = $11, payment_status = $12, payment_date = $13, paid_by_mode = $14,
                payment_comments = $15, status_updated_by_name = $16, status_updated_at = $17,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VOUCHER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(record.vendor_id)
        .bind(Json(&record.items))
        .bind(record.date_of_purchase)
        .bind(record.sub_total)
        .bind(record.tax_percent)
        .bind(record.tax_amount)
        .bind(record.discount_type)
        .bind(record.discount_value)
        .bind(record.final_amount)
        .bind(&record.payment_method)
        .bind(record.payment_status)
        .bind(record.payment_date)
        .bind(&record.paid_by_mode)
        .bind(&record.payment_comments)
        .bind(&record.status_updated_by_name)
        .bind(record.status_updated_at)
        .fetch_optional(executor)
        .await?;
        Ok(voucher)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vouchers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
