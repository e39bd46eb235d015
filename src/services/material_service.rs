// src/services/material_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::distinct_ids,
        error::{AppError, Resource},
    },
    db::{material_repo::MaterialRecord, MaterialRepository, VendorRepository},
    models::materials::{CreateMaterialPayload, Material, UpdateMaterialPayload},
};

#[derive(Clone)]
pub struct MaterialService {
    repo: MaterialRepository,
    vendor_repo: VendorRepository,
    pool: PgPool,
}

impl MaterialService {
    pub fn new(repo: MaterialRepository, vendor_repo: VendorRepository, pool: PgPool) -> Self {
        Self { repo, vendor_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<Material>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Material, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Material))
    }

    pub async fn create(&self, payload: CreateMaterialPayload) -> Result<Material, AppError> {
        let record = MaterialRecord {
            name: payload.name.trim().to_string(),
            category: payload.category,
            unit: payload.unit,
            description: payload.description,
            vendor_ids: distinct_ids(&payload.vendor_ids),
        };

        let mut tx = self.pool.begin().await?;

        self.check_vendors_exist(&mut tx, &record.vendor_ids).await?;
        let material = self.repo.insert(&mut *tx, &record).await?;
        self.vendor_repo
            .sync_material(&mut *tx, material.id, &material.vendor_ids)
            .await?;
        tx.commit().await?;

        tracing::info!("📦 Material '{}' criado", material.name);
        Ok(material)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateMaterialPayload) -> Result<Material, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Material))?;

        let record = MaterialRecord {
            name: payload.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
            category: payload.category.or(current.category),
            unit: payload.unit.or(current.unit),
            description: payload.description.or(current.description),
            vendor_ids: payload
                .vendor_ids
                .map(|ids| distinct_ids(&ids))
                .unwrap_or(current.vendor_ids),
        };

        // 1. Fornecedores precisam existir
        self.check_vendors_exist(&mut tx, &record.vendor_ids).await?;

        // 2. Grava e ressincroniza o lado dos fornecedores
        let material = self
            .repo
            .update(&mut *tx, id, &record)
            .await?
            .ok_or(AppError::NotFound(Resource::Material))?;
        self.vendor_repo
            .sync_material(&mut *tx, material.id, &material.vendor_ids)
            .await?;
        tx.commit().await?;

        Ok(material)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.vendor_repo.pull_material_everywhere(&mut *tx, id).await?;
        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::NotFound(Resource::Material));
        }
        tx.commit().await?;

        tracing::info!("📦 Material {} removido", id);
        Ok(())
    }

    async fn check_vendors_exist(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        vendor_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if vendor_ids.is_empty() {
            return Ok(());
        }
        let found = self.vendor_repo.count_existing(&mut **tx, vendor_ids).await?;
        if found != vendor_ids.len() as i64 {
            return Err(AppError::UnknownVendors);
        }
        Ok(())
    }
}
