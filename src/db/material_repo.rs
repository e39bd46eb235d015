// src/db/material_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::materials::Material};

const MATERIAL_COLUMNS: &str = "id, name, category, unit, description, vendor_ids, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub vendor_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct MaterialRepository {
    pool: PgPool,
}

impl MaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Material>, AppError> {
        let materials = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(material)
    }

    pub async fn find_by_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materials = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(materials)
    }

    pub async fn count_existing<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn insert<'e, E>(&self, executor: E, record: &MaterialRecord) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            INSERT INTO materials (name, category, unit, description, vendor_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MATERIAL_COLUMNS}
            "#
        ))
        .bind(&record.name)
        .bind(record.category.as_deref())
        .bind(record.unit.as_deref())
        .bind(record.description.as_deref())
        .bind(&record.vendor_ids)
        .fetch_one(executor)
        .await?;
        Ok(material)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        record: &MaterialRecord,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            UPDATE materials
            SET name = $2, category = $3, unit = $4, description = $5, vendor_ids = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {MATERIAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&record.name)
        .bind(record.category.as_deref())
        .bind(record.unit.as_deref())
        .bind(record.description.as_deref())
        .bind(&record.vendor_ids)
        .fetch_optional(executor)
        .await?;
        Ok(material)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Lado inverso da associação (chamado pelas escritas de fornecedores)
    // ---

    /// Deixa `vendor_id` exatamente nos materiais de `material_ids`.
    pub async fn sync_vendor<'e, E>(&self, executor: E, vendor_id: Uuid, material_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // As duas partes tocam linhas disjuntas, então cabem no mesmo statement
        sqlx::query(
            r#"
            WITH pulled AS (
                UPDATE materials
                SET vendor_ids = array_remove(vendor_ids, $1), updated_at = NOW()
                WHERE $1 = ANY(vendor_ids) AND NOT (id = ANY($2))
                RETURNING id
            )
            UPDATE materials
            SET vendor_ids = array_append(vendor_ids, $1), updated_at = NOW()
            WHERE id = ANY($2) AND NOT ($1 = ANY(vendor_ids))
            "#,
        )
        .bind(vendor_id)
        .bind(material_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn pull_vendor_everywhere<'e, E>(&self, executor: E, vendor_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET vendor_ids = array_remove(vendor_ids, $1), updated_at = NOW()
            WHERE $1 = ANY(vendor_ids)
            "#,
        )
        .bind(vendor_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
