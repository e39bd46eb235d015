// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::distinct_ids,
        error::{AppError, Resource},
    },
    db::{RbacRepository, UserRepository},
    models::auth::{CreateUserPayload, UpdateUserPayload, User},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    rbac_repo: RbacRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(repo: UserRepository, rbac_repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, rbac_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.repo.list().await
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        let password_hash = hash_password(&payload.password).await?;
        let role_ids = distinct_ids(&payload.role_ids);

        let mut tx = self.pool.begin().await?;
        self.check_roles_exist(&mut tx, &role_ids).await?;

        let user = self
            .repo
            .create_user(
                &mut *tx,
                payload.name.trim(),
                &payload.email.trim().to_lowercase(),
                &password_hash,
                payload.role.unwrap_or_default(),
                &role_ids,
            )
            .await?;
        tx.commit().await?;

        tracing::info!("👤 Usuário {} criado", user.email);
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        let mut user = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound(Resource::User))?;

        // 1. Mescla os campos enviados
        if let Some(name) = payload.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = payload.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(password) = payload.password {
            user.password_hash = hash_password(&password).await?;
        }
        if let Some(role) = payload.role {
            user.role = role;
        }
        if let Some(role_ids) = payload.role_ids {
            user.role_ids = distinct_ids(&role_ids);
        }

        // 2. Valida cargos e grava na mesma transação
        let mut tx = self.pool.begin().await?;
        self.check_roles_exist(&mut tx, &user.role_ids).await?;
        let updated = self.repo.update_user(&mut *tx, &user).await?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete_user(&self.pool, id).await? {
            return Err(AppError::NotFound(Resource::User));
        }
        Ok(())
    }

    async fn check_roles_exist(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if role_ids.is_empty() {
            return Ok(());
        }
        let found = self.rbac_repo.count_existing(&mut **tx, role_ids).await?;
        if found != role_ids.len() as i64 {
            return Err(AppError::UnknownRoles);
        }
        Ok(())
    }
}
