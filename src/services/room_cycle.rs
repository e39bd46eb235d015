// src/services/room_cycle.rs
//
// Máquina de estados do ciclo de cultivo. Tudo aqui é puro: recebe o estado atual,
// o catálogo de estágios e o "agora", e devolve o novo estado. Quem persiste é o
// RoomService.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    models::rooms::{Activity, ActivityFlags, GrowingRoom, RoomCycle, RoomStatus, StageRef, StageTenure},
    services::stage_service::StageCatalog,
};

const DAY_MS: i64 = 86_400_000;

/// Dias completos desde `started_at` (piso da divisão).
pub fn days_elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_milliseconds().div_euclid(DAY_MS)
}

// Entrada num estágio: relógio e checklist zerados
fn enter(stage_id: Uuid, now: DateTime<Utc>) -> RoomCycle {
    RoomCycle::InStage(StageTenure {
        stage_id,
        started_at: now,
        activity_day: 0,
        activity_status: ActivityFlags::default(),
    })
}

impl RoomCycle {
    pub fn tenure(&self) -> Option<&StageTenure> {
        match self {
            RoomCycle::Unseeded => None,
            RoomCycle::InStage(tenure) => Some(tenure),
        }
    }

    /// Primeiro estágio do ciclo. Só vale para salas sem estágio.
    pub fn init(&self, catalog: &StageCatalog, now: DateTime<Utc>) -> Result<RoomCycle, AppError> {
        if let RoomCycle::InStage(_) = self {
            return Err(AppError::RoomAlreadyStaged);
        }
        let first = catalog.first().ok_or(AppError::NoStagesConfigured)?;
        Ok(enter(first.id, now))
    }

    /// Avança para o próximo estágio (o último volta para o primeiro).
    pub fn move_to_next(&self, catalog: &StageCatalog, now: DateTime<Utc>) -> Result<RoomCycle, AppError> {
        match self {
            RoomCycle::Unseeded => self.init(catalog, now),
            RoomCycle::InStage(tenure) => {
                let next = catalog.successor(tenure.stage_id).ok_or(AppError::NoStagesConfigured)?;
                Ok(enter(next.id, now))
            }
        }
    }

    /// Salto explícito para qualquer estágio do catálogo.
    pub fn move_to_stage(
        &self,
        catalog: &StageCatalog,
        target: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RoomCycle, AppError> {
        if catalog.is_empty() {
            return Err(AppError::NoStagesConfigured);
        }
        let stage = catalog.get(target).ok_or(AppError::NotFound(Resource::Stage))?;
        Ok(enter(stage.id, now))
    }

    /// Marca/desmarca uma atividade do dia. Dia e demais atividades não mudam.
    pub fn toggle_activity(
        &self,
        catalog: &StageCatalog,
        activity: Activity,
        done: bool,
    ) -> Result<RoomCycle, AppError> {
        let tenure = self.tenure().ok_or(AppError::RoomHasNoActiveStage)?;
        let stage = catalog.get(tenure.stage_id).ok_or(AppError::RoomHasNoActiveStage)?;

        if !stage.activities.get(activity) {
            return Err(AppError::ActivityNotEnabled(activity));
        }

        Ok(RoomCycle::InStage(StageTenure {
            activity_status: tenure.activity_status.with(activity, done),
            ..*tenure
        }))
    }

    /// Detecta virada de dia. Devolve o estado (talvez novo) e se ele precisa ser gravado.
    /// Aplicar duas vezes com o mesmo `now` não muda nada na segunda.
    pub fn tick(&self, catalog: &StageCatalog, now: DateTime<Utc>) -> (RoomCycle, bool) {
        let Some(tenure) = self.tenure() else {
            return (*self, false);
        };
        if catalog.get(tenure.stage_id).is_none() {
            return (*self, false);
        }

        let elapsed = days_elapsed(tenure.started_at, now);
        let day = i32::try_from(elapsed).unwrap_or(i32::MAX);
        if day == tenure.activity_day {
            return (*self, false);
        }

        let rolled = RoomCycle::InStage(StageTenure {
            activity_day: day,
            activity_status: ActivityFlags::default(),
            ..*tenure
        });
        (rolled, true)
    }
}

/// Monta a visão do painel para uma sala já "tickada".
pub fn room_status(room: &GrowingRoom, cycle: &RoomCycle, catalog: &StageCatalog, now: DateTime<Utc>) -> RoomStatus {
    let tenure = cycle.tenure();
    let current = tenure.and_then(|t| catalog.get(t.stage_id));

    let next = match current {
        Some(stage) => catalog.successor(stage.id),
        None => catalog.stages().first(),
    };

    let stage_interval_days = current.map(|s| s.interval_days).unwrap_or(0);
    let due_at = match (tenure, current) {
        (Some(t), Some(stage)) => Some(t.started_at + Duration::days(i64::from(stage.interval_days))),
        _ => None,
    };

    RoomStatus {
        id: room.id,
        name: room.name.clone(),
        current_stage: current.map(StageRef::from),
        next_stage: next.map(StageRef::from),
        stage_started_at: tenure.map(|t| t.started_at),
        days_elapsed: tenure.map(|t| days_elapsed(t.started_at, now)).unwrap_or(0),
        stage_interval_days,
        due_at,
        due_next_stage: due_at.is_some_and(|due| now >= due),
        activity_day: tenure.map(|t| t.activity_day).unwrap_or(0),
        activity_status: tenure.map(|t| t.activity_status).unwrap_or_default(),
    }
}

/// Linha do painel já com a virada de dia aplicada. Quando houve virada, devolve também
/// o período a gravar; a escrita só vale se a sala ainda estiver nesse mesmo período.
pub fn board_entry(room: &GrowingRoom, catalog: &StageCatalog, now: DateTime<Utc>) -> (RoomStatus, Option<StageTenure>) {
    let (cycle, dirty) = room.cycle().tick(catalog, now);
    let rollover = if dirty { cycle.tenure().copied() } else { None };
    (room_status(room, &cycle, catalog, now), rollover)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::error::ErrorKind, services::stage_service::tests::stage};
    use chrono::TimeZone;
    use sqlx::types::Json;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn all_enabled() -> ActivityFlags {
        ActivityFlags { watering: true, ruffling: true, thumping: true }
    }

    fn three_stage_catalog() -> (StageCatalog, [Uuid; 3]) {
        let spawn = stage("Spawn", 1, 20, all_enabled());
        let pinning = stage("Pinning", 2, 20, ActivityFlags { watering: true, ..Default::default() });
        let fruiting = stage("Fruiting", 3, 20, ActivityFlags::default());
        let ids = [spawn.id, pinning.id, fruiting.id];
        (StageCatalog::new(vec![fruiting, pinning, spawn]), ids)
    }

    fn staged(stage_id: Uuid, started_at: DateTime<Utc>) -> RoomCycle {
        enter(stage_id, started_at)
    }

    fn room(cycle: &RoomCycle) -> GrowingRoom {
        let tenure = cycle.tenure();
        GrowingRoom {
            id: Uuid::new_v4(),
            name: "Orion".into(),
            max_bag_capacity: 0,
            power_backup_source: String::new(),
            current_stage_id: tenure.map(|t| t.stage_id),
            stage_started_at: tenure.map(|t| t.started_at),
            activity_day: tenure.map(|t| t.activity_day).unwrap_or(0),
            activity_status: Json(tenure.map(|t| t.activity_status).unwrap_or_default()),
            created_at: at(1, 0),
            updated_at: at(1, 0),
        }
    }

    #[test]
    fn init_starts_at_the_first_stage() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let cycle = RoomCycle::Unseeded.init(&catalog, at(1, 8)).unwrap();

        assert_eq!(cycle, staged(spawn, at(1, 8)));
    }

    #[test]
    fn init_is_only_valid_from_unseeded() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let err = staged(spawn, at(1, 8)).init(&catalog, at(2, 8)).unwrap_err();
        assert!(matches!(err, AppError::RoomAlreadyStaged));
    }

    #[test]
    fn transitions_fail_without_stages() {
        let empty = StageCatalog::default();
        let err = RoomCycle::Unseeded.init(&empty, at(1, 8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        let err = RoomCycle::Unseeded.move_to_next(&empty, at(1, 8)).unwrap_err();
        assert!(matches!(err, AppError::NoStagesConfigured));

        let err = RoomCycle::Unseeded.move_to_stage(&empty, Uuid::new_v4(), at(1, 8)).unwrap_err();
        assert!(matches!(err, AppError::NoStagesConfigured));
    }

    #[test]
    fn move_to_next_wraps_from_last_to_first() {
        let (catalog, [spawn, pinning, fruiting]) = three_stage_catalog();
        let now = at(10, 9);

        assert_eq!(staged(spawn, at(1, 8)).move_to_next(&catalog, now).unwrap(), staged(pinning, now));
        assert_eq!(staged(pinning, at(1, 8)).move_to_next(&catalog, now).unwrap(), staged(fruiting, now));
        assert_eq!(staged(fruiting, at(1, 8)).move_to_next(&catalog, now).unwrap(), staged(spawn, now));
    }

    #[test]
    fn move_to_next_from_unseeded_behaves_like_init() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let now = at(3, 12);
        assert_eq!(RoomCycle::Unseeded.move_to_next(&catalog, now).unwrap(), staged(spawn, now));
    }

    #[test]
    fn move_to_next_from_a_removed_stage_restarts_the_cycle() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let now = at(3, 12);
        let dangling = staged(Uuid::new_v4(), at(1, 0));
        assert_eq!(dangling.move_to_next(&catalog, now).unwrap(), staged(spawn, now));
    }

    #[test]
    fn moves_reset_day_and_checklist() {
        let (catalog, [spawn, _, fruiting]) = three_stage_catalog();
        let busy = RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 0),
            activity_day: 4,
            activity_status: all_enabled(),
        });

        let moved = busy.move_to_stage(&catalog, fruiting, at(5, 0)).unwrap();
        let tenure = moved.tenure().unwrap();
        assert_eq!(tenure.stage_id, fruiting);
        assert_eq!(tenure.started_at, at(5, 0));
        assert_eq!(tenure.activity_day, 0);
        assert_eq!(tenure.activity_status, ActivityFlags::default());
    }

    #[test]
    fn move_to_missing_stage_is_not_found() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let err = staged(spawn, at(1, 0)).move_to_stage(&catalog, Uuid::new_v4(), at(2, 0)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Stage)));
    }

    #[test]
    fn toggle_requires_an_enabled_activity() {
        let (catalog, [_, pinning, _]) = three_stage_catalog();
        let cycle = staged(pinning, at(1, 0));

        let watered = cycle.toggle_activity(&catalog, Activity::Watering, true).unwrap();
        assert!(watered.tenure().unwrap().activity_status.watering);

        // Desmarcar algo não habilitado também é conflito
        let err = cycle.toggle_activity(&catalog, Activity::Thumping, false).unwrap_err();
        assert!(matches!(err, AppError::ActivityNotEnabled(Activity::Thumping)));

        let err = RoomCycle::Unseeded.toggle_activity(&catalog, Activity::Watering, true).unwrap_err();
        assert!(matches!(err, AppError::RoomHasNoActiveStage));
    }

    #[test]
    fn toggle_touches_only_one_flag() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let cycle = RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 0),
            activity_day: 2,
            activity_status: ActivityFlags { watering: true, ruffling: false, thumping: true },
        });

        let next = cycle.toggle_activity(&catalog, Activity::Ruffling, true).unwrap();
        let tenure = next.tenure().unwrap();
        assert_eq!(tenure.activity_day, 2);
        assert_eq!(tenure.activity_status, all_enabled());
    }

    #[test]
    fn tick_resets_the_checklist_on_a_new_day() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let cycle = RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 8),
            activity_day: 0,
            activity_status: all_enabled(),
        });

        // Mesmo dia: nada muda
        let (same, dirty) = cycle.tick(&catalog, at(2, 7));
        assert!(!dirty);
        assert_eq!(same, cycle);

        let (rolled, dirty) = cycle.tick(&catalog, at(3, 9));
        assert!(dirty);
        let tenure = rolled.tenure().unwrap();
        assert_eq!(tenure.activity_day, 2);
        assert_eq!(tenure.activity_status, ActivityFlags::default());
        assert_eq!(tenure.started_at, at(1, 8));
    }

    #[test]
    fn tick_is_idempotent() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let cycle = RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 8),
            activity_day: 0,
            activity_status: all_enabled(),
        });
        let now = at(4, 10);

        let (first, _) = cycle.tick(&catalog, now);
        let (second, dirty) = first.tick(&catalog, now);
        assert!(!dirty);
        assert_eq!(first, second);

        // Duas leituras "concorrentes" partindo do mesmo estado chegam ao mesmo resultado
        let (other, _) = cycle.tick(&catalog, now);
        assert_eq!(first, other);
    }

    #[test]
    fn tick_ignores_unseeded_and_dangling_rooms() {
        let (catalog, _) = three_stage_catalog();
        assert_eq!(RoomCycle::Unseeded.tick(&catalog, at(9, 0)), (RoomCycle::Unseeded, false));

        let dangling = staged(Uuid::new_v4(), at(1, 0));
        assert_eq!(dangling.tick(&catalog, at(9, 0)), (dangling, false));
    }

    #[test]
    fn status_reports_due_and_next_stage() {
        let (catalog, [_, pinning, fruiting]) = three_stage_catalog();
        let cycle = staged(pinning, at(1, 0));
        let r = room(&cycle);

        let before = room_status(&r, &cycle, &catalog, at(20, 23));
        assert_eq!(before.days_elapsed, 19);
        assert_eq!(before.stage_interval_days, 20);
        assert!(!before.due_next_stage);
        assert_eq!(before.next_stage.as_ref().unwrap().id, fruiting);

        let after = room_status(&r, &cycle, &catalog, at(21, 0));
        assert!(after.due_next_stage);
        assert_eq!(after.due_at, Some(at(21, 0)));
    }

    #[test]
    fn unseeded_status_points_to_the_first_stage() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let status = room_status(&room(&RoomCycle::Unseeded), &RoomCycle::Unseeded, &catalog, at(5, 0));

        assert!(status.current_stage.is_none());
        assert_eq!(status.next_stage.unwrap().id, spawn);
        assert_eq!(status.days_elapsed, 0);
        assert!(!status.due_next_stage);
        assert!(status.due_at.is_none());
    }

    #[test]
    fn board_shows_the_rolled_over_day_and_what_to_persist() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let r = room(&RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 8),
            activity_day: 0,
            activity_status: all_enabled(),
        }));

        let (status, rollover) = board_entry(&r, &catalog, at(4, 9));
        assert_eq!(status.activity_day, 3);
        assert_eq!(status.activity_status, ActivityFlags::default());

        // O período gravado carrega estágio e início lidos, que guardam a escrita condicional
        let tenure = rollover.unwrap();
        assert_eq!(tenure.stage_id, spawn);
        assert_eq!(tenure.started_at, at(1, 8));
        assert_eq!(tenure.activity_day, 3);
    }

    #[test]
    fn board_has_nothing_to_persist_on_the_same_day() {
        let (catalog, [spawn, ..]) = three_stage_catalog();
        let r = room(&RoomCycle::InStage(StageTenure {
            stage_id: spawn,
            started_at: at(1, 8),
            activity_day: 2,
            activity_status: all_enabled(),
        }));

        let (status, rollover) = board_entry(&r, &catalog, at(3, 20));
        assert!(rollover.is_none());
        assert_eq!(status.activity_day, 2);
        assert_eq!(status.activity_status, all_enabled());

        let (_, rollover) = board_entry(&room(&RoomCycle::Unseeded), &catalog, at(9, 0));
        assert!(rollover.is_none());
    }
}
