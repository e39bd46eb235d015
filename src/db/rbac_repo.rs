// src/db/rbac_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::rbac::{PermissionSet, Role},
};

fn map_role_write_error(e: sqlx::Error, name: &str) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "roles_name_key" => Some(AppError::RoleNameAlreadyExists(name.to_string())),
        _ => None,
    })
}

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, permissions, created_at, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    // Só os cargos referenciados (ids inexistentes simplesmente não voltam)
    pub async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, permissions, created_at, updated_at FROM roles WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn find_role_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, permissions, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    /// Quantos dos ids informados existem (a lista deve chegar sem repetições).
    pub async fn count_existing<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        permissions: &PermissionSet,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, permissions)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, permissions, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Json(permissions))
        .fetch_one(executor)
        .await
        .map_err(|e| map_role_write_error(e, name))
    }

    pub async fn update_role<'e, E>(&self, executor: E, role: &Role) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, permissions, created_at, updated_at
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(role.description.as_deref())
        .bind(&role.permissions)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_role_write_error(e, &role.name))
    }

    pub async fn delete_role<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
