// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{RbacRepository, UserRepository},
    models::{
        auth::{User, UserRole},
        rbac::{CreateRolePayload, EffectivePermissions, PermissionSet, Role, UpdateRolePayload},
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    /// Permissões efetivas do usuário. Admin não precisa consultar os cargos.
    pub async fn effective_permissions(&self, user: &User) -> Result<EffectivePermissions, AppError> {
        if user.role == UserRole::Admin {
            return Ok(EffectivePermissions::for_user(user.role, PermissionSet::full()));
        }
        let roles = self.repo.find_roles_by_ids(&user.role_ids).await?;
        let resolved = PermissionSet::resolve(&user.role_ids, &roles);
        Ok(EffectivePermissions::for_user(user.role, resolved))
    }

    // ---
    // Gestão de cargos
    // ---

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles().await
    }

    pub async fn create_role(&self, payload: CreateRolePayload) -> Result<Role, AppError> {
        let permissions = payload.permissions.unwrap_or_default().normalized();
        let description = payload.description.as_deref().map(str::trim);

        let role = self
            .repo
            .create_role(&self.pool, payload.name.trim(), description, &permissions)
            .await?;

        tracing::info!("🔐 Cargo '{}' criado", role.name);
        Ok(role)
    }

    pub async fn update_role(&self, id: Uuid, payload: UpdateRolePayload) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut role = self
            .repo
            .find_role_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;

        if let Some(name) = payload.name {
            role.name = name.trim().to_string();
        }
        if let Some(description) = payload.description {
            role.description = Some(description.trim().to_string());
        }
        if let Some(permissions) = payload.permissions {
            role.permissions.0 = permissions.normalized();
        }

        let updated = self
            .repo
            .update_role(&mut *tx, &role)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Remove o cargo e tira o id dele de todos os usuários.
    pub async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let detached = self.user_repo.remove_role_everywhere(&mut *tx, id).await?;
        if !self.repo.delete_role(&mut *tx, id).await? {
            return Err(AppError::NotFound(Resource::Role));
        }
        tx.commit().await?;

        tracing::info!("🔐 Cargo {} removido ({} usuário(s) afetados)", id, detached);
        Ok(())
    }
}
