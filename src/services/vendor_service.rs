// src/services/vendor_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::distinct_ids,
        error::{AppError, Resource},
    },
    db::{vendor_repo::VendorRecord, MaterialRepository, VendorRepository},
    models::vendors::{CreateVendorPayload, UpdateVendorPayload, Vendor},
};

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct VendorService {
    repo: VendorRepository,
    material_repo: MaterialRepository,
    pool: PgPool,
}

impl VendorService {
    pub fn new(repo: VendorRepository, material_repo: MaterialRepository, pool: PgPool) -> Self {
        Self { repo, material_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<Vendor>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Vendor, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Vendor))
    }

    pub async fn create(&self, payload: CreateVendorPayload) -> Result<Vendor, AppError> {
        let record = VendorRecord {
            name: payload.name.trim().to_string(),
            address: clean(payload.address),
            contact_person: clean(payload.contact_person),
            contact_number: clean(payload.contact_number),
            email: clean(payload.email).map(|e| e.to_lowercase()),
            materials_supplied: distinct_ids(&payload.materials_supplied),
            status: payload.status,
        };

        let mut tx = self.pool.begin().await?;

        // 1. Materiais precisam existir
        self.check_materials_exist(&mut tx, &record.materials_supplied).await?;

        // 2. Grava e sincroniza o outro lado
        let vendor = self.repo.insert(&mut *tx, &record).await?;
        self.material_repo
            .sync_vendor(&mut *tx, vendor.id, &vendor.materials_supplied)
            .await?;
        tx.commit().await?;

        tracing::info!("🏪 Fornecedor '{}' criado", vendor.name);
        Ok(vendor)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateVendorPayload) -> Result<Vendor, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Vendor))?;

        let resync = payload.materials_supplied.is_some();
        let record = VendorRecord {
            name: payload.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
            address: payload.address.map_or(current.address, |v| clean(Some(v))),
            contact_person: payload.contact_person.map_or(current.contact_person, |v| clean(Some(v))),
            contact_number: payload.contact_number.map_or(current.contact_number, |v| clean(Some(v))),
            email: payload
                .email
                .map_or(current.email, |v| clean(Some(v)).map(|e| e.to_lowercase())),
            materials_supplied: payload
                .materials_supplied
                .map(|ids| distinct_ids(&ids))
                .unwrap_or(current.materials_supplied),
            status: payload.status.unwrap_or(current.status),
        };

        if resync {
            self.check_materials_exist(&mut tx, &record.materials_supplied).await?;
        }

        let vendor = self
            .repo
            .update(&mut *tx, id, &record)
            .await?
            .ok_or(AppError::NotFound(Resource::Vendor))?;

        // Sem lista explícita o lado dos materiais não muda
        if resync {
            self.material_repo
                .sync_vendor(&mut *tx, vendor.id, &vendor.materials_supplied)
                .await?;
        }
        tx.commit().await?;

        Ok(vendor)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.material_repo.pull_vendor_everywhere(&mut *tx, id).await?;
        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::NotFound(Resource::Vendor));
        }
        tx.commit().await?;

        tracing::info!("🏪 Fornecedor {} removido", id);
        Ok(())
    }

    async fn check_materials_exist(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        material_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if material_ids.is_empty() {
            return Ok(());
        }
        let found = self.material_repo.count_existing(&mut **tx, material_ids).await?;
        if found != material_ids.len() as i64 {
            return Err(AppError::UnknownMaterials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::clean;

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" Rua A ".into())), Some("Rua A".into()));
        assert_eq!(clean(None), None);
    }
}
