// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        MaterialRepository, RbacRepository, ReportRepository, RoomRepository, StageRepository, UserRepository,
        VendorRepository, VoucherRepository,
    },
    services::{
        auth::AuthService, material_service::MaterialService, rbac_service::RbacService,
        report_service::ReportService, room_service::RoomService, stage_service::StageService,
        user_service::UserService, vendor_service::VendorService, voucher_service::VoucherService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub jwt_ttl_hours: i64,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string()),
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 8)?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub user_service: UserService,
    pub stage_service: StageService,
    pub room_service: RoomService,
    pub vendor_service: VendorService,
    pub material_service: MaterialService,
    pub voucher_service: VoucherService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(db_pool, config)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn with_pool(db_pool: PgPool, config: &AppConfig) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let stage_repo = StageRepository::new(db_pool.clone());
        let room_repo = RoomRepository::new(db_pool.clone());
        let vendor_repo = VendorRepository::new(db_pool.clone());
        let material_repo = MaterialRepository::new(db_pool.clone());
        let voucher_repo = VoucherRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), user_repo.clone(), db_pool.clone());
        let user_service = UserService::new(user_repo, rbac_repo, db_pool.clone());
        let stage_service = StageService::new(stage_repo.clone(), room_repo.clone(), db_pool.clone());
        let room_service = RoomService::new(room_repo, stage_repo, db_pool.clone());
        let vendor_service = VendorService::new(vendor_repo.clone(), material_repo.clone(), db_pool.clone());
        let material_service = MaterialService::new(material_repo.clone(), vendor_repo.clone(), db_pool.clone());
        let voucher_service = VoucherService::new(voucher_repo, vendor_repo, material_repo, db_pool.clone());
        let report_service = ReportService::new(report_repo);

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            rbac_service,
            user_service,
            stage_service,
            room_service,
            vendor_service,
            material_service,
            voucher_service,
            report_service,
        })
    }
}
