// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo sobre o estado já criado.
fn app(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let public_auth_routes = Router::new()
        .route("/seed-status", get(handlers::auth::seed_status))
        .route("/seed", post(handlers::auth::seed))
        .route("/login", post(handlers::auth::login));

    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/permissions", get(handlers::auth::get_my_permissions));

    let role_routes = Router::new()
        .route("/", get(handlers::rbac::list_roles).post(handlers::rbac::create_role))
        .route("/{id}", put(handlers::rbac::update_role).delete(handlers::rbac::delete_role));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route("/{id}", put(handlers::users::update_user).delete(handlers::users::delete_user));

    let stage_routes = Router::new()
        .route("/", get(handlers::stages::list_stages).post(handlers::stages::create_stage))
        .route("/summary", get(handlers::stages::stage_summary))
        .route("/{id}", put(handlers::stages::update_stage).delete(handlers::stages::delete_stage));

    let room_routes = Router::new()
        .route("/", get(handlers::rooms::list_rooms).post(handlers::rooms::create_room))
        .route("/status", get(handlers::rooms::room_status))
        .route("/{id}", put(handlers::rooms::update_room).delete(handlers::rooms::delete_room))
        .route("/{id}/init-stage", post(handlers::rooms::init_stage))
        .route("/{id}/move-stage", post(handlers::rooms::move_stage))
        .route("/{id}/activities", post(handlers::rooms::toggle_activity));

    let vendor_routes = Router::new()
        .route("/", get(handlers::vendors::list_vendors).post(handlers::vendors::create_vendor))
        .route(
            "/{id}",
            get(handlers::vendors::get_vendor)
                .put(handlers::vendors::update_vendor)
                .delete(handlers::vendors::delete_vendor),
        );

    let material_routes = Router::new()
        .route("/", get(handlers::materials::list_materials).post(handlers::materials::create_material))
        .route(
            "/{id}",
            get(handlers::materials::get_material)
                .put(handlers::materials::update_material)
                .delete(handlers::materials::delete_material),
        );

    let voucher_routes = Router::new()
        .route("/", get(handlers::vouchers::list_vouchers).post(handlers::vouchers::create_voucher))
        .route(
            "/{id}",
            get(handlers::vouchers::get_voucher)
                .put(handlers::vouchers::update_voucher)
                .delete(handlers::vouchers::delete_voucher),
        );

    let report_routes = Router::new()
        .route("/vendor-expenses", get(handlers::reports::vendor_expenses))
        .route("/material-summary", get(handlers::reports::material_summary))
        .route("/expenses", get(handlers::reports::expenses))
        .route("/tax-payments", get(handlers::reports::tax_payments));

    let dashboard_routes = Router::new().route("/summary", get(handlers::dashboard::get_summary));

    // Tudo abaixo exige Bearer token; as permissões ficam nos extratores de cada handler
    let protected = Router::new()
        .nest("/auth", me_routes)
        .nest("/roles", role_routes)
        .nest("/users", user_routes)
        .nest("/stages", stage_routes)
        .nest("/rooms", room_routes)
        .nest("/vendors", vendor_routes)
        .nest("/materials", material_routes)
        .nest("/vouchers", voucher_routes)
        .nest("/reports", report_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", public_auth_routes)
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // As 8 salas fixas entram só com a tabela vazia
    app_state.room_service.ensure_seeded().await?;

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma destas rotas chega a abrir conexão
    fn test_app() -> Router {
        let config = AppConfig {
            database_url: "postgres://localhost/grow_ledger_test".into(),
            jwt_secret: "segredo-de-teste".into(),
            bind_addr: "127.0.0.1:0".into(),
            jwt_ttl_hours: 8,
            db_max_connections: 1,
        };
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        app(AppState::with_pool(pool, &config).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        let response = test_app()
            .oneshot(Request::get("/api/vouchers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_in_the_client_language() {
        let response = test_app()
            .oneshot(
                Request::get("/api/rooms/status")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let store = crate::common::i18n::I18nStore::load().unwrap();
        let expected = store.translate("pt", "auth.invalid_token", &[]);
        assert_eq!(body_json(response).await["error"], expected);
    }

    #[tokio::test]
    async fn openapi_document_lists_the_voucher_routes() {
        let response = test_app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/vouchers"].is_object());
        assert!(doc["components"]["securitySchemes"]["api_jwt"].is_object());
    }
}
