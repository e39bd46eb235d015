// src/models/rooms.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Atividades diárias ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Watering,
    Ruffling,
    Thumping,
}

impl Activity {
    pub fn key(self) -> &'static str {
        match self {
            Activity::Watering => "watering",
            Activity::Ruffling => "ruffling",
            Activity::Thumping => "thumping",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Trio de flags: no estágio diz o que é permitido, na sala diz o que já foi feito hoje.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ActivityFlags {
    pub watering: bool,
    pub ruffling: bool,
    pub thumping: bool,
}

impl ActivityFlags {
    pub fn get(&self, activity: Activity) -> bool {
        match activity {
            Activity::Watering => self.watering,
            Activity::Ruffling => self.ruffling,
            Activity::Thumping => self.thumping,
        }
    }

    pub fn with(mut self, activity: Activity, value: bool) -> Self {
        match activity {
            Activity::Watering => self.watering = value,
            Activity::Ruffling => self.ruffling = value,
            Activity::Thumping => self.thumping = value,
        }
        self
    }
}

// --- Estágios ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: Uuid,
    #[schema(example = "Spawn Run")]
    pub name: String,
    #[schema(example = 1)]
    pub sequence_order: i32,
    #[schema(example = 14)]
    pub interval_days: i32,
    #[schema(example = 90.0)]
    pub humidity: f64,
    #[schema(example = 24.0)]
    pub temperature: f64,
    #[schema(example = 5000.0)]
    pub co2_level: f64,
    pub notes: String,
    #[schema(value_type = ActivityFlags)]
    pub activities: Json<ActivityFlags>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos editáveis de um estágio, já mesclados e prontos para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFields {
    pub name: String,
    pub sequence_order: i32,
    pub interval_days: i32,
    pub humidity: f64,
    pub temperature: f64,
    pub co2_level: f64,
    pub notes: String,
    pub activities: ActivityFlags,
}

impl From<CreateStagePayload> for StageFields {
    fn from(p: CreateStagePayload) -> Self {
        Self {
            name: p.name.trim().to_string(),
            sequence_order: p.sequence_order,
            interval_days: p.interval_days,
            humidity: p.humidity,
            temperature: p.temperature,
            co2_level: p.co2_level,
            notes: p.notes,
            activities: p.activities,
        }
    }
}

impl Stage {
    /// Aplica uma atualização parcial sobre os valores atuais.
    pub fn merged_with(&self, p: UpdateStagePayload) -> StageFields {
        StageFields {
            name: p.name.map(|n| n.trim().to_string()).unwrap_or_else(|| self.name.clone()),
            sequence_order: p.sequence_order.unwrap_or(self.sequence_order),
            interval_days: p.interval_days.unwrap_or(self.interval_days),
            humidity: p.humidity.unwrap_or(self.humidity),
            temperature: p.temperature.unwrap_or(self.temperature),
            co2_level: p.co2_level.unwrap_or(self.co2_level),
            notes: p.notes.unwrap_or_else(|| self.notes.clone()),
            activities: p.activities.unwrap_or(self.activities.0),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStagePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(range(min = 1, message = "positive"))]
    pub sequence_order: i32,
    #[validate(range(min = 1, message = "positive"))]
    pub interval_days: i32,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub co2_level: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub activities: ActivityFlags,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStagePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "positive"))]
    pub sequence_order: Option<i32>,
    #[validate(range(min = 1, message = "positive"))]
    pub interval_days: Option<i32>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub co2_level: Option<f64>,
    pub notes: Option<String>,
    pub activities: Option<ActivityFlags>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    #[schema(example = 60)]
    pub total_days: i64,
    pub is_valid: bool,
}

// --- Salas de cultivo ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrowingRoom {
    pub id: Uuid,
    #[schema(example = "Orion")]
    pub name: String,
    #[schema(example = 1200)]
    pub max_bag_capacity: i32,
    #[schema(example = "Gerador diesel")]
    pub power_backup_source: String,
    pub current_stage_id: Option<Uuid>,
    pub stage_started_at: Option<DateTime<Utc>>,
    pub activity_day: i32,
    #[schema(value_type = ActivityFlags)]
    pub activity_status: Json<ActivityFlags>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Período da sala num estágio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTenure {
    pub stage_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub activity_day: i32,
    pub activity_status: ActivityFlags,
}

/// Estado do ciclo de cultivo de uma sala.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCycle {
    Unseeded,
    InStage(StageTenure),
}

impl GrowingRoom {
    // Ponteiro sem data de início (ou o inverso) é tratado como sala sem estágio.
    pub fn cycle(&self) -> RoomCycle {
        match (self.current_stage_id, self.stage_started_at) {
            (Some(stage_id), Some(started_at)) => RoomCycle::InStage(StageTenure {
                stage_id,
                started_at,
                activity_day: self.activity_day,
                activity_status: self.activity_status.0,
            }),
            _ => RoomCycle::Unseeded,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_bag_capacity: i32,
    #[serde(default)]
    pub power_backup_source: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_bag_capacity: Option<i32>,
    pub power_backup_source: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveStagePayload {
    /// Sem `stageId` a sala avança para o próximo estágio do ciclo.
    pub stage_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleActivityPayload {
    pub activity: Activity,
    pub done: bool,
}

/// Resumo de estágio exibido no painel das salas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub interval_days: i32,
    pub activities: ActivityFlags,
}

impl From<&Stage> for StageRef {
    fn from(stage: &Stage) -> Self {
        Self {
            id: stage.id,
            name: stage.name.clone(),
            sequence_order: stage.sequence_order,
            interval_days: stage.interval_days,
            activities: stage.activities.0,
        }
    }
}

/// Visão calculada de uma sala (não é persistida).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    pub id: Uuid,
    pub name: String,
    pub current_stage: Option<StageRef>,
    pub next_stage: Option<StageRef>,
    pub stage_started_at: Option<DateTime<Utc>>,
    pub days_elapsed: i64,
    pub stage_interval_days: i32,
    pub due_at: Option<DateTime<Utc>>,
    pub due_next_stage: bool,
    pub activity_day: i32,
    pub activity_status: ActivityFlags,
}
