// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::seed_status,
        handlers::auth::seed,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::get_my_permissions,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Stages ---
        handlers::stages::list_stages,
        handlers::stages::stage_summary,
        handlers::stages::create_stage,
        handlers::stages::update_stage,
        handlers::stages::delete_stage,

        // --- Rooms ---
        handlers::rooms::list_rooms,
        handlers::rooms::create_room,
        handlers::rooms::update_room,
        handlers::rooms::delete_room,
        handlers::rooms::room_status,
        handlers::rooms::init_stage,
        handlers::rooms::move_stage,
        handlers::rooms::toggle_activity,

        // --- Vendors ---
        handlers::vendors::list_vendors,
        handlers::vendors::get_vendor,
        handlers::vendors::create_vendor,
        handlers::vendors::update_vendor,
        handlers::vendors::delete_vendor,

        // --- Materials ---
        handlers::materials::list_materials,
        handlers::materials::get_material,
        handlers::materials::create_material,
        handlers::materials::update_material,
        handlers::materials::delete_material,

        // --- Vouchers ---
        handlers::vouchers::list_vouchers,
        handlers::vouchers::get_voucher,
        handlers::vouchers::create_voucher,
        handlers::vouchers::update_voucher,
        handlers::vouchers::delete_voucher,

        // --- Reports ---
        handlers::reports::vendor_expenses,
        handlers::reports::material_summary,
        handlers::reports::expenses,
        handlers::reports::tax_payments,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::SeedUserPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,
            models::auth::SeedStatus,

            // --- RBAC ---
            models::rbac::Module,
            models::rbac::Action,
            models::rbac::PermissionFlags,
            models::rbac::EffectivePermissions,
            models::rbac::Role,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,

            // --- Stages & Rooms ---
            models::rooms::Activity,
            models::rooms::ActivityFlags,
            models::rooms::Stage,
            models::rooms::CreateStagePayload,
            models::rooms::UpdateStagePayload,
            models::rooms::StageSummary,
            models::rooms::GrowingRoom,
            models::rooms::CreateRoomPayload,
            models::rooms::UpdateRoomPayload,
            models::rooms::MoveStagePayload,
            models::rooms::ToggleActivityPayload,
            models::rooms::StageRef,
            models::rooms::RoomStatus,

            // --- Vendors & Materials ---
            models::vendors::VendorStatus,
            models::vendors::Vendor,
            models::vendors::CreateVendorPayload,
            models::vendors::UpdateVendorPayload,
            models::materials::Material,
            models::materials::CreateMaterialPayload,
            models::materials::UpdateMaterialPayload,

            // --- Vouchers ---
            models::vouchers::DiscountType,
            models::vouchers::PaymentStatus,
            models::vouchers::VoucherItem,
            models::vouchers::Voucher,
            models::vouchers::CreateVoucherPayload,
            models::vouchers::UpdateVoucherPayload,

            // --- Reports ---
            models::reports::VendorExpense,
            models::reports::MaterialSummary,
            models::reports::ExpenseTotals,
            models::reports::TaxTotals,
            models::reports::GroupedTotal,
            models::reports::TaxPaymentReport,
            models::reports::DashboardSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Primeiro acesso, login e permissões do usuário"),
        (name = "RBAC", description = "Cargos e permissões por módulo"),
        (name = "Users", description = "Gestão de usuários"),
        (name = "Stages", description = "Estágios de cultivo e orçamento de 60 dias"),
        (name = "Rooms", description = "Salas de cultivo, ciclo de estágios e atividades diárias"),
        (name = "Vendors", description = "Fornecedores"),
        (name = "Materials", description = "Materiais e vínculo com fornecedores"),
        (name = "Vouchers", description = "Notas de compra e totais"),
        (name = "Reports", description = "Relatórios de gastos"),
        (name = "Dashboard", description = "Indicadores gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
