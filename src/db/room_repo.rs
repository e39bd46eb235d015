// src/db/room_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::rooms::{ActivityFlags, GrowingRoom, RoomCycle, StageTenure},
};

const ROOM_COLUMNS: &str = "id, name, max_bag_capacity, power_backup_source, current_stage_id, stage_started_at, \
                            activity_day, activity_status, created_at, updated_at";

fn map_room_write_error(e: sqlx::Error, name: &str) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "growing_rooms_name_key" => Some(AppError::RoomNameAlreadyExists(name.to_string())),
        _ => None,
    })
}

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<GrowingRoom>, AppError> {
        let rooms = sqlx::query_as::<_, GrowingRoom>(&format!(
            "SELECT {ROOM_COLUMNS} FROM growing_rooms ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GrowingRoom>, AppError> {
        let room = sqlx::query_as::<_, GrowingRoom>(&format!("SELECT {ROOM_COLUMNS} FROM growing_rooms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    // Trava a linha até o fim da transação (transições concorrentes na mesma sala)
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<GrowingRoom>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, GrowingRoom>(&format!(
            "SELECT {ROOM_COLUMNS} FROM growing_rooms WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(room)
    }

    /// Insere as salas fixas se a tabela estiver vazia. Retorna quantas foram criadas.
    pub async fn seed_if_empty(&self, names: &[&str]) -> Result<u64, AppError> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let result = sqlx::query(
            r#"
            INSERT INTO growing_rooms (name)
            SELECT unnest($1::text[])
            WHERE NOT EXISTS (SELECT 1 FROM growing_rooms)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&names)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert(
        &self,
        name: &str,
        max_bag_capacity: i32,
        power_backup_source: &str,
    ) -> Result<GrowingRoom, AppError> {
        sqlx::query_as::<_, GrowingRoom>(&format!(
            r#"
            INSERT INTO growing_rooms (name, max_bag_capacity, power_backup_source)
            VALUES ($1, $2, $3)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(max_bag_capacity)
        .bind(power_backup_source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_room_write_error(e, name))
    }

    pub async fn update_details(
        &self,
        id: Uuid,
        name: &str,
        max_bag_capacity: i32,
        power_backup_source: &str,
    ) -> Result<Option<GrowingRoom>, AppError> {
        sqlx::query_as::<_, GrowingRoom>(&format!(
            r#"
            UPDATE growing_rooms
            SET name = $2, max_bag_capacity = $3, power_backup_source = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(max_bag_capacity)
        .bind(power_backup_source)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_room_write_error(e, name))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM growing_rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Grava o estado do ciclo calculado pelas transições.
    pub async fn save_cycle<'e, E>(&self, executor: E, id: Uuid, cycle: &RoomCycle) -> Result<GrowingRoom, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (stage_id, started_at, activity_day, status) = match cycle {
            RoomCycle::Unseeded => (None, None, 0, ActivityFlags::default()),
            RoomCycle::InStage(t) => (Some(t.stage_id), Some(t.started_at), t.activity_day, t.activity_status),
        };

        let room = sqlx::query_as::<_, GrowingRoom>(&format!(
            r#"
            UPDATE growing_rooms
            SET current_stage_id = $2, stage_started_at = $3, activity_day = $4, activity_status = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(stage_id)
        .bind(started_at)
        .bind(activity_day)
        .bind(Json(status))
        .fetch_one(executor)
        .await?;
        Ok(room)
    }

    /// Virada de dia: zera o checklist só se a sala continuar no mesmo período lido
    /// (estágio e início) e ninguém já tiver gravado o mesmo dia.
    pub async fn persist_day_rollover(&self, id: Uuid, tenure: &StageTenure) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE growing_rooms
            SET activity_day = $2, activity_status = $3, updated_at = NOW()
            WHERE id = $1 AND activity_day <> $2
              AND current_stage_id = $4 AND stage_started_at = $5
            "#,
        )
        .bind(id)
        .bind(tenure.activity_day)
        .bind(Json(ActivityFlags::default()))
        .bind(tenure.stage_id)
        .bind(tenure.started_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Salas no estágio removido voltam a "sem estágio".
    pub async fn clear_stage<'e, E>(&self, executor: E, stage_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE growing_rooms
            SET current_stage_id = NULL, stage_started_at = NULL, activity_day = 0,
                activity_status = $2, updated_at = NOW()
            WHERE current_stage_id = $1
            "#,
        )
        .bind(stage_id)
        .bind(Json(ActivityFlags::default()))
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
