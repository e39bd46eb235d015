// src/db/stage_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::rooms::{Stage, StageFields},
};

const STAGE_COLUMNS: &str = "id, name, sequence_order, interval_days, humidity, temperature, co2_level, \
                             notes, activities, created_at, updated_at";

fn map_stage_write_error(e: sqlx::Error, stage: &StageFields) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "stages_name_key" => Some(AppError::StageNameAlreadyExists(stage.name.clone())),
        "stages_sequence_order_key" => Some(AppError::SequenceOrderInUse(stage.sequence_order)),
        _ => None,
    })
}

#[derive(Clone)]
pub struct StageRepository {
    pool: PgPool,
}

impl StageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Catálogo completo em ordem de sequência.
    pub async fn list_ordered<'e, E>(&self, executor: E) -> Result<Vec<Stage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages ORDER BY sequence_order"
        ))
        .fetch_all(executor)
        .await?;
        Ok(stages)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Stage>, AppError> {
        let stage = sqlx::query_as::<_, Stage>(&format!("SELECT {STAGE_COLUMNS} FROM stages WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stage)
    }

    /// Soma de `interval_days`, opcionalmente ignorando um estágio (o que está sendo editado).
    pub async fn total_interval_days<'e, E>(&self, executor: E, exclude: Option<Uuid>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(interval_days), 0)::BIGINT FROM stages WHERE $1::uuid IS NULL OR id <> $1",
        )
        .bind(exclude)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn insert<'e, E>(&self, executor: E, stage: &StageFields) -> Result<Stage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Stage>(&format!(
            r#"
            INSERT INTO stages (name, sequence_order, interval_days, humidity, temperature, co2_level, notes, activities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(&stage.name)
        .bind(stage.sequence_order)
        .bind(stage.interval_days)
        .bind(stage.humidity)
        .bind(stage.temperature)
        .bind(stage.co2_level)
        .bind(&stage.notes)
        .bind(Json(stage.activities))
        .fetch_one(executor)
        .await
        .map_err(|e| map_stage_write_error(e, stage))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stage: &StageFields,
    ) -> Result<Option<Stage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Stage>(&format!(
            r#"
            UPDATE stages
            SET name = $2, sequence_order = $3, interval_days = $4, humidity = $5, temperature = $6,
                co2_level = $7, notes = $8, activities = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&stage.name)
        .bind(stage.sequence_order)
        .bind(stage.interval_days)
        .bind(stage.humidity)
        .bind(stage.temperature)
        .bind(stage.co2_level)
        .bind(&stage.notes)
        .bind(Json(stage.activities))
        .fetch_optional(executor)
        .await
        .map_err(|e| map_stage_write_error(e, stage))
    }

    // O serviço limpa as salas antes; ON DELETE SET NULL cobre o resto
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM stages WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
