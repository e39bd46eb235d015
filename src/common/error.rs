// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::{
        rbac::{Action, Module},
        rooms::Activity,
    },
};

/// Taxonomia dos erros de domínio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    PermissionDenied,
    StateConflict,
    Unauthorized,
    Internal,
}

/// Entidades que podem ser referenciadas e não existir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Role,
    Stage,
    Room,
    Vendor,
    Material,
    Voucher,
}

impl Resource {
    fn message_key(self) -> &'static str {
        match self {
            Resource::User => "user.not_found",
            Resource::Role => "role.not_found",
            Resource::Stage => "stage.not_found",
            Resource::Room => "room.not_found",
            Resource::Vendor => "vendor.not_found",
            Resource::Material => "material.not_found",
            Resource::Voucher => "voucher.not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    // --- Validação ---
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Cargo já existe: {0}")]
    RoleNameAlreadyExists(String),

    #[error("Estágio já existe: {0}")]
    StageNameAlreadyExists(String),

    #[error("Ordem de sequência já usada: {0}")]
    SequenceOrderInUse(i32),

    #[error("Sala já existe: {0}")]
    RoomNameAlreadyExists(String),

    #[error("Soma dos intervalos ({total}) excede o limite de {limit} dias")]
    IntervalBudgetExceeded { total: i64, limit: i64 },

    #[error("Um ou mais cargos não existem")]
    UnknownRoles,

    #[error("Um ou mais fornecedores não existem")]
    UnknownVendors,

    #[error("Um ou mais materiais não existem")]
    UnknownMaterials,

    #[error("Material {0} não é fornecido por este fornecedor")]
    MaterialNotSuppliedByVendor(String),

    #[error("Valores do voucher excedem o limite numérico")]
    AmountOverflow,

    // --- Recursos ausentes ---
    #[error("Recurso não encontrado: {0:?}")]
    NotFound(Resource),

    // --- Permissões ---
    #[error("Sem permissão: {module}.{action}")]
    PermissionDenied { module: Module, action: Action },

    #[error("Apenas administradores")]
    AdminRequired,

    // --- Conflitos de estado ---
    #[error("Nenhum estágio configurado")]
    NoStagesConfigured,

    #[error("Sala já possui estágio ativo")]
    RoomAlreadyStaged,

    #[error("Sala sem estágio ativo")]
    RoomHasNoActiveStage,

    #[error("Atividade {0} não habilitada no estágio atual")]
    ActivityNotEnabled(Activity),

    #[error("Fornecedor possui vouchers")]
    VendorHasVouchers,

    #[error("Usuários já existem")]
    AlreadySeeded,

    // --- Autenticação ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // --- Infraestrutura ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::EmailAlreadyExists
            | AppError::RoleNameAlreadyExists(_)
            | AppError::StageNameAlreadyExists(_)
            | AppError::SequenceOrderInUse(_)
            | AppError::RoomNameAlreadyExists(_)
            | AppError::IntervalBudgetExceeded { .. }
            | AppError::UnknownRoles
            | AppError::UnknownVendors
            | AppError::UnknownMaterials
            | AppError::MaterialNotSuppliedByVendor(_)
            | AppError::AmountOverflow => ErrorKind::ValidationFailed,

            AppError::NotFound(_) => ErrorKind::NotFound,

            AppError::PermissionDenied { .. } | AppError::AdminRequired => ErrorKind::PermissionDenied,

            AppError::NoStagesConfigured
            | AppError::RoomAlreadyStaged
            | AppError::RoomHasNoActiveStage
            | AppError::ActivityNotEnabled(_)
            | AppError::VendorHasVouchers
            | AppError::AlreadySeeded => ErrorKind::StateConflict,

            AppError::InvalidCredentials | AppError::InvalidToken => ErrorKind::Unauthorized,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Duplicidades de chave única
            AppError::EmailAlreadyExists
            | AppError::RoleNameAlreadyExists(_)
            | AppError::StageNameAlreadyExists(_)
            | AppError::SequenceOrderInUse(_)
            | AppError::RoomNameAlreadyExists(_) => StatusCode::CONFLICT,
            _ => match self.kind() {
                ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                ErrorKind::StateConflict => StatusCode::CONFLICT,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::EmailAlreadyExists => "user.email_taken",
            AppError::RoleNameAlreadyExists(_) => "role.name_taken",
            AppError::StageNameAlreadyExists(_) => "stage.name_taken",
            AppError::SequenceOrderInUse(_) => "stage.sequence_taken",
            AppError::RoomNameAlreadyExists(_) => "room.name_taken",
            AppError::IntervalBudgetExceeded { .. } => "stage.interval_budget",
            AppError::UnknownRoles => "user.unknown_roles",
            AppError::UnknownVendors => "material.unknown_vendors",
            AppError::UnknownMaterials => "vendor.unknown_materials",
            AppError::MaterialNotSuppliedByVendor(_) => "voucher.material_not_mapped",
            AppError::AmountOverflow => "voucher.amount_overflow",
            AppError::NotFound(resource) => resource.message_key(),
            AppError::PermissionDenied { .. } => "permission.denied",
            AppError::AdminRequired => "permission.admin_required",
            AppError::NoStagesConfigured => "room.no_stages",
            AppError::RoomAlreadyStaged => "room.already_staged",
            AppError::RoomHasNoActiveStage => "room.no_active_stage",
            AppError::ActivityNotEnabled(_) => "room.activity_disabled",
            AppError::VendorHasVouchers => "vendor.has_vouchers",
            AppError::AlreadySeeded => "auth.already_seeded",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal",
        }
    }

    fn message_params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::RoleNameAlreadyExists(name)
            | AppError::StageNameAlreadyExists(name)
            | AppError::RoomNameAlreadyExists(name)
            | AppError::MaterialNotSuppliedByVendor(name) => vec![("name", name.clone())],
            AppError::SequenceOrderInUse(order) => vec![("order", order.to_string())],
            AppError::IntervalBudgetExceeded { total, limit } => {
                vec![("total", total.to_string()), ("limit", limit.to_string())]
            }
            AppError::PermissionDenied { module, action } => vec![
                ("module", module.key().to_string()),
                ("action", action.key().to_string()),
            ],
            AppError::ActivityNotEnabled(activity) => vec![("activity", activity.key().to_string())],
            _ => Vec::new(),
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status.is_server_error() {
            // O detalhe técnico fica só no log, nunca na resposta.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let error = store.translate(&locale.0, self.message_key(), &self.message_params());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = BTreeMap::new();
                collect_validation_details("", errors, locale, store, &mut fields);
                Some(json!(fields))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Achata erros aninhados (ex.: "items[0].quantity") num único mapa campo -> mensagens.
fn collect_validation_details(
    prefix: &str,
    errors: &ValidationErrors,
    locale: &Locale,
    store: &I18nStore,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                        store.translate(&locale.0, &format!("validation.{}", key), &[])
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_details(&path, nested, locale, store, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_details(&format!("{}[{}]", path, index), nested, locale, store, out);
                }
            }
        }
    }
}

/// Erro já pronto para o cliente: status + mensagem traduzida (+ detalhes de validação).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn taxonomy_matches_the_error_categories() {
        assert_eq!(AppError::NotFound(Resource::Room).kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::IntervalBudgetExceeded { total: 61, limit: 60 }.kind(),
            ErrorKind::ValidationFailed
        );
        assert_eq!(
            AppError::PermissionDenied { module: Module::Vouchers, action: Action::Edit }.kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(AppError::ActivityNotEnabled(Activity::Thumping).kind(), ErrorKind::StateConflict);
        assert_eq!(AppError::NoStagesConfigured.kind(), ErrorKind::StateConflict);
        assert_eq!(AppError::InvalidToken.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn duplicates_map_to_conflict_and_budget_to_bad_request() {
        assert_eq!(AppError::StageNameAlreadyExists("Spawn".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::IntervalBudgetExceeded { total: 70, limit: 60 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::AdminRequired.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound(Resource::Voucher).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"));
        let (status, body) = body_of(err.to_api_error(&Locale("en".into()), &store())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("hunter2"));
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn validation_errors_carry_translated_field_details() {
        let errors = Probe { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());
        let (status, body) = body_of(api).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let messages = body["details"]["name"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_ne!(messages[0], "validation.required");
    }

    #[tokio::test]
    async fn messages_follow_the_requested_locale() {
        let err = AppError::NotFound(Resource::Stage);
        let (_, en) = body_of(err.to_api_error(&Locale("en".into()), &store())).await;
        let (_, pt) = body_of(err.to_api_error(&Locale("pt".into()), &store())).await;
        assert_ne!(en["error"], pt["error"]);
    }
}
