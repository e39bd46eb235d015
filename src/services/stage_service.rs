// src/services/stage_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{RoomRepository, StageRepository},
    models::rooms::{CreateStagePayload, Stage, StageFields, StageSummary, UpdateStagePayload},
};

/// Soma máxima de `interval_days` aceita numa escrita de estágio.
pub const INTERVAL_BUDGET_DAYS: i64 = 60;

// ---
// Catálogo (núcleo puro)
// ---

/// Estágios ordenados por `sequence_order`, base para as transições das salas.
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    stages: Vec<Stage>,
}

impl StageCatalog {
    pub fn new(mut stages: Vec<Stage>) -> Self {
        stages.sort_by_key(|s| s.sequence_order);
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn get(&self, id: Uuid) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Estágio de ordem 1; se nenhum tiver exatamente 1, o primeiro na ordem.
    pub fn first(&self) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.sequence_order == 1)
            .or_else(|| self.stages.first())
    }

    /// Próximo estágio do ciclo (o último volta para o primeiro da lista).
    /// Para um id fora do catálogo devolve o primeiro da lista.
    pub fn successor(&self, id: Uuid) -> Option<&Stage> {
        if self.stages.is_empty() {
            return None;
        }
        let next = match self.stages.iter().position(|s| s.id == id) {
            Some(index) => (index + 1) % self.stages.len(),
            None => 0,
        };
        self.stages.get(next)
    }

    pub fn total_interval_days(&self) -> i64 {
        self.stages.iter().map(|s| i64::from(s.interval_days)).sum()
    }

    pub fn summary(&self) -> StageSummary {
        let total_days = self.total_interval_days();
        StageSummary { total_days, is_valid: total_days == INTERVAL_BUDGET_DAYS }
    }
}

/// Regra de escrita: os outros estágios + o novo intervalo não podem passar de 60 dias.
pub fn check_interval_budget(other_stages_total: i64, interval_days: i32) -> Result<(), AppError> {
    let total = other_stages_total + i64::from(interval_days);
    if total > INTERVAL_BUDGET_DAYS {
        return Err(AppError::IntervalBudgetExceeded { total, limit: INTERVAL_BUDGET_DAYS });
    }
    Ok(())
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct StageService {
    repo: StageRepository,
    room_repo: RoomRepository,
    pool: PgPool,
}

impl StageService {
    pub fn new(repo: StageRepository, room_repo: RoomRepository, pool: PgPool) -> Self {
        Self { repo, room_repo, pool }
    }

    pub async fn catalog(&self) -> Result<StageCatalog, AppError> {
        let stages = self.repo.list_ordered(&self.pool).await?;
        Ok(StageCatalog::new(stages))
    }

    pub async fn list(&self) -> Result<Vec<Stage>, AppError> {
        self.repo.list_ordered(&self.pool).await
    }

    pub async fn summary(&self) -> Result<StageSummary, AppError> {
        Ok(self.catalog().await?.summary())
    }

    pub async fn create(&self, payload: CreateStagePayload) -> Result<Stage, AppError> {
        let fields = StageFields::from(payload);

        let mut tx = self.pool.begin().await?;

        let others = self.repo.total_interval_days(&mut *tx, None).await?;
        check_interval_budget(others, fields.interval_days)?;

        let stage = self.repo.insert(&mut *tx, &fields).await?;
        tx.commit().await?;

        tracing::info!("🌱 Estágio '{}' criado (ordem {})", stage.name, stage.sequence_order);
        Ok(stage)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateStagePayload) -> Result<Stage, AppError> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Stage))?;
        let fields = current.merged_with(payload);

        let mut tx = self.pool.begin().await?;

        // O intervalo antigo do próprio estágio não conta
        let others = self.repo.total_interval_days(&mut *tx, Some(id)).await?;
        check_interval_budget(others, fields.interval_days)?;

        let stage = self
            .repo
            .update(&mut *tx, id, &fields)
            .await?
            .ok_or(AppError::NotFound(Resource::Stage))?;
        tx.commit().await?;

        Ok(stage)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let cleared = self.room_repo.clear_stage(&mut *tx, id).await?;
        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::NotFound(Resource::Stage));
        }
        tx.commit().await?;

        if cleared > 0 {
            tracing::info!("Estágio {} removido; {} sala(s) voltaram a ficar sem estágio", id, cleared);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::{common::error::ErrorKind, models::rooms::ActivityFlags};

    pub(crate) fn stage(name: &str, order: i32, days: i32, activities: ActivityFlags) -> Stage {
        Stage {
            id: Uuid::new_v4(),
            name: name.into(),
            sequence_order: order,
            interval_days: days,
            humidity: 0.0,
            temperature: 0.0,
            co2_level: 0.0,
            notes: String::new(),
            activities: Json(activities),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn catalog_orders_by_sequence_and_wraps() {
        let fruiting = stage("Fruiting", 3, 20, ActivityFlags::default());
        let spawn = stage("Spawn", 1, 20, ActivityFlags::default());
        let pinning = stage("Pinning", 2, 20, ActivityFlags::default());
        let catalog = StageCatalog::new(vec![fruiting.clone(), spawn.clone(), pinning.clone()]);

        assert_eq!(catalog.first().unwrap().id, spawn.id);
        assert_eq!(catalog.successor(spawn.id).unwrap().id, pinning.id);
        assert_eq!(catalog.successor(pinning.id).unwrap().id, fruiting.id);
        assert_eq!(catalog.successor(fruiting.id).unwrap().id, spawn.id);
    }

    #[test]
    fn first_falls_back_when_no_stage_has_order_one() {
        let a = stage("A", 5, 10, ActivityFlags::default());
        let b = stage("B", 3, 10, ActivityFlags::default());
        let catalog = StageCatalog::new(vec![a, b.clone()]);
        assert_eq!(catalog.first().unwrap().id, b.id);
    }

    #[test]
    fn successor_of_unknown_stage_is_first_in_order() {
        let a = stage("A", 1, 10, ActivityFlags::default());
        let catalog = StageCatalog::new(vec![a.clone()]);
        assert_eq!(catalog.successor(Uuid::new_v4()).unwrap().id, a.id);
        assert!(StageCatalog::default().successor(a.id).is_none());
        assert!(StageCatalog::default().first().is_none());
    }

    #[test]
    fn summary_is_valid_only_at_exactly_sixty_days() {
        let full = StageCatalog::new(vec![
            stage("A", 1, 20, ActivityFlags::default()),
            stage("B", 2, 25, ActivityFlags::default()),
            stage("C", 3, 15, ActivityFlags::default()),
        ]);
        let summary = full.summary();
        assert_eq!(summary.total_days, 60);
        assert!(summary.is_valid);

        let short = StageCatalog::new(vec![stage("A", 1, 20, ActivityFlags::default())]);
        assert!(!short.summary().is_valid);
    }

    #[test]
    fn budget_rejects_a_fourth_stage_past_sixty_days() {
        // Três estágios já somam 55 dias
        assert!(check_interval_budget(55, 5).is_ok());

        let err = check_interval_budget(55, 6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(matches!(err, AppError::IntervalBudgetExceeded { total: 61, limit: 60 }));
    }
}
