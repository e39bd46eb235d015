// src/services/room_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{RoomRepository, StageRepository},
    models::rooms::{
        Activity, CreateRoomPayload, GrowingRoom, RoomCycle, RoomStatus, UpdateRoomPayload,
    },
    services::{
        room_cycle::board_entry,
        stage_service::StageCatalog,
    },
};

/// Salas fixas criadas na primeira subida do sistema.
pub const SEED_ROOMS: [&str; 8] = ["Orion", "Nova", "Cosmos", "Nebula", "Pulsar", "Atlas", "Apollo", "Zenith"];

#[derive(Clone)]
pub struct RoomService {
    repo: RoomRepository,
    stage_repo: StageRepository,
    pool: PgPool,
}

impl RoomService {
    pub fn new(repo: RoomRepository, stage_repo: StageRepository, pool: PgPool) -> Self {
        Self { repo, stage_repo, pool }
    }

    pub async fn ensure_seeded(&self) -> Result<(), AppError> {
        let created = self.repo.seed_if_empty(&SEED_ROOMS).await?;
        if created > 0 {
            tracing::info!("✅ {} salas de cultivo criadas", created);
        }
        Ok(())
    }

    // ---
    // Administração
    // ---

    pub async fn list(&self) -> Result<Vec<GrowingRoom>, AppError> {
        self.repo.list().await
    }

    pub async fn create(&self, payload: CreateRoomPayload) -> Result<GrowingRoom, AppError> {
        self.repo
            .insert(payload.name.trim(), payload.max_bag_capacity, &payload.power_backup_source)
            .await
    }

    pub async fn update(&self, id: Uuid, payload: UpdateRoomPayload) -> Result<GrowingRoom, AppError> {
        let current = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound(Resource::Room))?;

        let name = payload.name.map(|n| n.trim().to_string()).unwrap_or(current.name);
        let capacity = payload.max_bag_capacity.unwrap_or(current.max_bag_capacity);
        let backup = payload.power_backup_source.unwrap_or(current.power_backup_source);

        self.repo
            .update_details(id, &name, capacity, &backup)
            .await?
            .ok_or(AppError::NotFound(Resource::Room))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(Resource::Room));
        }
        Ok(())
    }

    // ---
    // Painel e transições
    // ---

    /// Painel das salas. A leitura aplica a virada de dia e grava as salas afetadas.
    pub async fn status_board(&self) -> Result<Vec<RoomStatus>, AppError> {
        let now = Utc::now();
        let catalog = StageCatalog::new(self.stage_repo.list_ordered(&self.pool).await?);
        let rooms = self.repo.list().await?;

        let mut board = Vec::with_capacity(rooms.len());
        for room in rooms {
            let (status, rollover) = board_entry(&room, &catalog, now);
            if let Some(tenure) = rollover {
                if self.repo.persist_day_rollover(room.id, &tenure).await? {
                    tracing::debug!("Sala {} virou para o dia {}", room.name, tenure.activity_day);
                }
            }
            board.push(status);
        }
        Ok(board)
    }

    pub async fn init_stage(&self, id: Uuid) -> Result<GrowingRoom, AppError> {
        self.transition(id, |cycle, catalog| cycle.init(catalog, Utc::now())).await
    }

    /// Sem alvo: próximo estágio do ciclo. Com alvo: salto direto.
    pub async fn move_stage(&self, id: Uuid, target: Option<Uuid>) -> Result<GrowingRoom, AppError> {
        self.transition(id, |cycle, catalog| match target {
            Some(stage_id) => cycle.move_to_stage(catalog, stage_id, Utc::now()),
            None => cycle.move_to_next(catalog, Utc::now()),
        })
        .await
    }

    pub async fn toggle_activity(&self, id: Uuid, activity: Activity, done: bool) -> Result<GrowingRoom, AppError> {
        self.transition(id, |cycle, catalog| cycle.toggle_activity(catalog, activity, done)).await
    }

    // Lê a sala travada, aplica a transição pura e grava, tudo na mesma transação.
    async fn transition<F>(&self, id: Uuid, apply: F) -> Result<GrowingRoom, AppError>
    where
        F: FnOnce(&RoomCycle, &StageCatalog) -> Result<RoomCycle, AppError>,
    {
        let mut tx = self.pool.begin().await?;

        let room = self
            .repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Room))?;
        let catalog = StageCatalog::new(self.stage_repo.list_ordered(&mut *tx).await?);

        let next = apply(&room.cycle(), &catalog)?;
        let saved = self.repo.save_cycle(&mut *tx, id, &next).await?;
        tx.commit().await?;

        if let (Some(before), Some(after)) = (room.current_stage_id, saved.current_stage_id) {
            if before != after {
                tracing::info!("🔁 Sala {} mudou de estágio: {} -> {}", saved.name, before, after);
            }
        } else if room.current_stage_id.is_none() && saved.current_stage_id.is_some() {
            tracing::info!("🌱 Sala {} iniciou o ciclo", saved.name);
        }

        Ok(saved)
    }
}
