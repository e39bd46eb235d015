// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::UserRole,
        rbac::{Action, Module},
    },
};

/// 1. O Trait que define o que é uma Permissão.
/// Basta UM dos pares (módulo, ação) para liberar o acesso.
pub trait PermissionDef: Send + Sync + 'static {
    fn required() -> &'static [(Module, Action)];
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

fn request_locale(parts: &Parts) -> Locale {
    Locale::from_header(
        parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
    )
}

fn authenticated(parts: &Parts, app_state: &AppState, locale: &Locale) -> Result<AuthenticatedUser, ApiError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::InvalidToken.to_api_error(locale, &app_state.i18n_store))
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = request_locale(parts);

        // A. Usuário colocado pelo auth_guard
        let AuthenticatedUser(user) = authenticated(parts, &app_state, &locale)?;

        // B. Permissões efetivas (cargos lidos a cada requisição)
        let effective = app_state
            .rbac_service
            .effective_permissions(&user)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        let required = T::required();
        if effective.allows_any(required) {
            return Ok(RequirePermission(PhantomData));
        }

        // C. Negado: reporta o primeiro par exigido
        let (module, action) = required[0];
        tracing::warn!("⛔ Usuário {} sem permissão {}.{}", user.email, module, action);
        Err(AppError::PermissionDenied { module, action }.to_api_error(&locale, &app_state.i18n_store))
    }
}

/// Rotas exclusivas de administradores (cargos, usuários, estágios e cadastro de salas).
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = request_locale(parts);

        let AuthenticatedUser(user) = authenticated(parts, &app_state, &locale)?;
        if user.role != UserRole::Admin {
            tracing::warn!("⛔ Usuário {} tentou acessar rota de administrador", user.email);
            return Err(AppError::AdminRequired.to_api_error(&locale, &app_state.i18n_store));
        }
        Ok(RequireAdmin)
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident => $(($module:ident, $action:ident)),+ $(,)?) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn required() -> &'static [(Module, Action)] {
                &[$((Module::$module, Action::$action)),+]
            }
        }
    };
}

permission!(PermDashboardView => (Dashboard, View));
permission!(PermReportsView => (Reports, View));

permission!(PermVendorsView => (Vendors, View));
permission!(PermVendorsCreate => (Vendors, Create));
permission!(PermVendorsEdit => (Vendors, Edit));
permission!(PermVendorsDelete => (Vendors, Delete));

permission!(PermMaterialsView => (Materials, View));
permission!(PermMaterialsCreate => (Materials, Create));
permission!(PermMaterialsEdit => (Materials, Edit));
permission!(PermMaterialsDelete => (Materials, Delete));

permission!(PermVouchersView => (Vouchers, View));
permission!(PermVouchersCreate => (Vouchers, Create));
permission!(PermVouchersEdit => (Vouchers, Edit));
permission!(PermVouchersDelete => (Vouchers, Delete));

// Painel das salas: quem cuida de estágios ou de atividades enxerga
permission!(PermRoomStatusView =>
    (RoomStages, View),
    (RoomStages, Edit),
    (RoomActivities, View),
    (RoomActivities, Edit),
);
permission!(PermRoomStagesEdit => (RoomStages, Edit));
permission!(PermRoomActivitiesEdit => (RoomActivities, Edit));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::{EffectivePermissions, PermissionSet};

    fn grant(json: serde_json::Value) -> EffectivePermissions {
        let set: PermissionSet = serde_json::from_value(json).unwrap();
        EffectivePermissions::for_user(UserRole::Viewer, set)
    }

    #[test]
    fn room_status_accepts_any_room_permission() {
        let activities_only = grant(serde_json::json!({"roomActivities": {"view": true}}));
        assert!(activities_only.allows_any(PermRoomStatusView::required()));
        assert!(!activities_only.allows_any(PermRoomStagesEdit::required()));

        let none = grant(serde_json::json!({"vouchers": {"view": true}}));
        assert!(!none.allows_any(PermRoomStatusView::required()));
    }

    #[test]
    fn single_permission_types_require_exactly_their_pair() {
        assert_eq!(PermVouchersEdit::required(), &[(Module::Vouchers, Action::Edit)]);
        let viewer = grant(serde_json::json!({"vouchers": {"view": true}}));
        assert!(viewer.allows_any(PermVouchersView::required()));
        assert!(!viewer.allows_any(PermVouchersEdit::required()));
    }
}
