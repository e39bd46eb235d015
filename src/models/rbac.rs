// src/models/rbac.rs

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::UserRole;

// ---
// Módulos e ações (conjuntos fechados)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Module {
    Dashboard,
    Vendors,
    Materials,
    Vouchers,
    Reports,
    Rooms,
    RoomStages,
    RoomActivities,
    Roles,
    Users,
}

impl Module {
    pub const ALL: [Module; 10] = [
        Module::Dashboard,
        Module::Vendors,
        Module::Materials,
        Module::Vouchers,
        Module::Reports,
        Module::Rooms,
        Module::RoomStages,
        Module::RoomActivities,
        Module::Roles,
        Module::Users,
    ];

    /// Chave usada no JSON e nas mensagens (`roomStages`, `vouchers`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Vendors => "vendors",
            Module::Materials => "materials",
            Module::Vouchers => "vouchers",
            Module::Reports => "reports",
            Module::Rooms => "rooms",
            Module::RoomStages => "roomStages",
            Module::RoomActivities => "roomActivities",
            Module::Roles => "roles",
            Module::Users => "users",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Create,
    Edit,
    View,
    Delete,
}

impl Action {
    pub fn key(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::View => "view",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---
// Flags e conjuntos de permissões
// ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionFlags {
    pub create: bool,
    pub edit: bool,
    pub view: bool,
    pub delete: bool,
}

impl PermissionFlags {
    pub const ALL: PermissionFlags = PermissionFlags { create: true, edit: true, view: true, delete: true };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::View => self.view,
            Action::Delete => self.delete,
        }
    }

    pub fn merge(self, other: PermissionFlags) -> PermissionFlags {
        PermissionFlags {
            create: self.create || other.create,
            edit: self.edit || other.edit,
            view: self.view || other.view,
            delete: self.delete || other.delete,
        }
    }
}

/// Mapa módulo -> flags. Chaves de módulo desconhecidas são rejeitadas na desserialização.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<Module, PermissionFlags>);

impl PermissionSet {
    /// Todas as ações em todos os módulos.
    pub fn full() -> Self {
        Self(Module::ALL.iter().map(|m| (*m, PermissionFlags::ALL)).collect())
    }

    /// Garante uma entrada para cada módulo (ausentes ficam tudo `false`).
    pub fn normalized(mut self) -> Self {
        for module in Module::ALL {
            self.0.entry(module).or_default();
        }
        self
    }

    pub fn flags(&self, module: Module) -> PermissionFlags {
        self.0.get(&module).copied().unwrap_or_default()
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.flags(module).allows(action)
    }

    /// União (OR) módulo a módulo.
    pub fn merge(&mut self, other: &PermissionSet) {
        for (module, flags) in &other.0 {
            let entry = self.0.entry(*module).or_default();
            *entry = entry.merge(*flags);
        }
    }

    /// Une as permissões dos cargos referenciados em `role_ids`.
    /// Ids repetidos são tolerados e ids sem cargo correspondente são ignorados.
    pub fn resolve(role_ids: &[Uuid], roles: &[Role]) -> PermissionSet {
        roles
            .iter()
            .filter(|role| role_ids.contains(&role.id))
            .fold(PermissionSet::default(), |mut acc, role| {
                acc.merge(&role.permissions);
                acc
            })
            .normalized()
    }
}

/// Permissões efetivas de quem está chamando a API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissions {
    pub is_admin: bool,
    #[schema(value_type = Object, example = json!({"vouchers": {"create": true, "edit": false, "view": true, "delete": false}}))]
    pub permissions: PermissionSet,
}

impl EffectivePermissions {
    pub fn for_user(primary_role: UserRole, resolved: PermissionSet) -> Self {
        if primary_role == UserRole::Admin {
            // Admin ignora roleIds
            return Self { is_admin: true, permissions: PermissionSet::full() };
        }
        Self { is_admin: false, permissions: resolved.normalized() }
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.is_admin || self.permissions.allows(module, action)
    }

    pub fn allows_any(&self, required: &[(Module, Action)]) -> bool {
        required.iter().any(|(module, action)| self.allows(*module, *action))
    }
}

// ---
// Cargos
// ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Contador")]
    pub name: String,

    #[schema(example = "Lança e acompanha vouchers")]
    pub description: Option<String>,

    #[schema(value_type = Object)]
    pub permissions: Json<PermissionSet>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Contador")]
    pub name: String,

    pub description: Option<String>,

    #[schema(value_type = Option<Object>, example = json!({"vouchers": {"create": true, "view": true}}))]
    pub permissions: Option<PermissionSet>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub permissions: Option<PermissionSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(permissions: serde_json::Value) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: "r".into(),
            description: None,
            permissions: Json(serde_json::from_value(permissions).unwrap()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_is_the_union_of_referenced_roles() {
        let viewer = role(json!({ "vouchers": { "view": true } }));
        let editor = role(json!({ "vouchers": { "edit": true }, "vendors": { "create": true } }));
        let roles = vec![viewer.clone(), editor.clone()];

        let set = PermissionSet::resolve(&[viewer.id, editor.id], &roles);
        assert!(set.allows(Module::Vouchers, Action::View));
        assert!(set.allows(Module::Vouchers, Action::Edit));
        assert!(set.allows(Module::Vendors, Action::Create));
        assert!(!set.allows(Module::Vouchers, Action::Delete));
        assert!(!set.allows(Module::Reports, Action::View));
    }

    #[test]
    fn resolve_is_commutative_and_idempotent() {
        let a = role(json!({ "rooms": { "view": true } }));
        let b = role(json!({ "reports": { "view": true } }));
        let roles = vec![a.clone(), b.clone()];

        let ab = PermissionSet::resolve(&[a.id, b.id], &roles);
        let ba = PermissionSet::resolve(&[b.id, a.id], &roles);
        let aab = PermissionSet::resolve(&[a.id, a.id, b.id], &roles);
        assert_eq!(ab, ba);
        assert_eq!(ab, aab);
    }

    #[test]
    fn unknown_ids_and_empty_input_grant_nothing() {
        let a = role(json!({ "users": { "delete": true } }));
        let empty = PermissionSet::resolve(&[], &[a.clone()]);
        let unknown = PermissionSet::resolve(&[Uuid::new_v4()], &[a]);

        assert_eq!(empty, PermissionSet::default().normalized());
        assert_eq!(unknown, empty);
        for module in Module::ALL {
            assert_eq!(empty.flags(module), PermissionFlags::default());
        }
    }

    #[test]
    fn admin_bypasses_role_ids() {
        let effective = EffectivePermissions::for_user(UserRole::Admin, PermissionSet::default());
        assert!(Module::ALL.iter().all(|m| effective.allows(*m, Action::Delete)));

        let viewer = EffectivePermissions::for_user(UserRole::Viewer, PermissionSet::default());
        assert!(!viewer.allows(Module::Dashboard, Action::View));
    }

    #[test]
    fn allows_any_checks_alternatives() {
        let set: PermissionSet =
            serde_json::from_value(json!({ "roomActivities": { "view": true } })).unwrap();
        let effective = EffectivePermissions::for_user(UserRole::Accountant, set);

        assert!(effective.allows_any(&[
            (Module::RoomStages, Action::View),
            (Module::RoomActivities, Action::View),
        ]));
        assert!(!effective.allows_any(&[(Module::RoomStages, Action::Edit)]));
    }

    #[test]
    fn normalized_sets_list_every_module() {
        let set: PermissionSet = serde_json::from_value(json!({ "dashboard": { "view": true } })).unwrap();
        let value = serde_json::to_value(set.normalized()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert_eq!(keys.len(), Module::ALL.len());
        assert_eq!(value["roomStages"], json!({ "create": false, "edit": false, "view": false, "delete": false }));
        assert_eq!(value["dashboard"]["view"], json!(true));
    }

    #[test]
    fn unknown_module_keys_are_rejected() {
        let parsed = serde_json::from_value::<PermissionSet>(json!({ "payroll": { "view": true } }));
        assert!(parsed.is_err());
    }
}
