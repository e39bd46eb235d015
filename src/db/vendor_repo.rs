// src/db/vendor_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::is_foreign_key_violation, error::AppError},
    models::vendors::{Vendor, VendorStatus},
};

const VENDOR_COLUMNS: &str = "id, name, address, contact_person, contact_number, email, materials_supplied, \
                              status, created_at, updated_at";

/// Campos gravados de um fornecedor (criação ou atualização já mesclada).
#[derive(Debug, Clone)]
pub struct VendorRecord {
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub materials_supplied: Vec<Uuid>,
    pub status: VendorStatus,
}

#[derive(Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Vendor>, AppError> {
        let vendors = sqlx::query_as::<_, Vendor>(&format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(vendors)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(&format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(vendor)
    }

    pub async fn count_existing<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn insert<'e, E>(&self, executor: E, record: &VendorRecord) -> Result<Vendor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            r#"
            INSERT INTO vendors (name, address, contact_person, contact_number, email, materials_supplied, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(&record.name)
        .bind(record.address.as_deref())
        .bind(record.contact_person.as_deref())
        .bind(record.contact_number.as_deref())
        .bind(record.email.as_deref())
        .bind(&record.materials_supplied)
        .bind(record.status)
        .fetch_one(executor)
        .await?;
        Ok(vendor)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, record: &VendorRecord) -> Result<Option<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            r#"
            UPDATE vendors
            SET name = $2, address = $3, contact_person = $4, contact_number = $5, email = $6,
                materials_supplied = $7, status = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&record.name)
        .bind(record.address.as_deref())
        .bind(record.contact_person.as_deref())
        .bind(record.contact_number.as_deref())
        .bind(record.email.as_deref())
        .bind(&record.materials_supplied)
        .bind(record.status)
        .fetch_optional(executor)
        .await?;
        Ok(vendor)
    }

    // Vouchers referenciam o fornecedor com ON DELETE RESTRICT
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::VendorHasVouchers;
                }
                e.into()
            })?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Lado inverso da associação (chamado pelas escritas de materiais)
    // ---

    /// Deixa `material_id` exatamente nos fornecedores de `vendor_ids`.
    pub async fn sync_material<'e, E>(&self, executor: E, material_id: Uuid, vendor_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Remoção na CTE e inclusão no UPDATE principal; as linhas são disjuntas
        sqlx::query(
            r#"
            WITH pulled AS (
                UPDATE vendors
                SET materials_supplied = array_remove(materials_supplied, $1), updated_at = NOW()
                WHERE $1 = ANY(materials_supplied) AND NOT (id = ANY($2))
                RETURNING id
            )
            UPDATE vendors
            SET materials_supplied = array_append(materials_supplied, $1), updated_at = NOW()
            WHERE id = ANY($2) AND NOT ($1 = ANY(materials_supplied))
            "#,
        )
        .bind(material_id)
        .bind(vendor_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn pull_material_everywhere<'e, E>(&self, executor: E, material_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE vendors
            SET materials_supplied = array_remove(materials_supplied, $1), updated_at = NOW()
            WHERE $1 = ANY(materials_supplied)
            "#,
        )
        .bind(material_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
