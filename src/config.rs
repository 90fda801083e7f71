// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CompanyRepository, ConsultaRepository, FunnelRepository, LeadRepository, TaskRepository,
        UnitRepository, UserRepository,
    },
    services::{
        auth::AuthService, consulta_service::ConsultaService, funnel_service::FunnelService,
        lead_service::LeadService, task_service::TaskService, token_service::TokenService,
        unit_service::UnitService,
    },
};

/// Configuração lida do ambiente (.env é carregado antes).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_access_ttl_minutes: i64,
    pub jwt_refresh_ttl_days: i64,
    pub server_addr: String,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_access_ttl_minutes: parse_or("JWT_ACCESS_TTL_MINUTES", 60)?,
            jwt_refresh_ttl_days: parse_or("JWT_REFRESH_TTL_DAYS", 7)?,
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
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
            .parse::<T>()
            .with_context(|| format!("{} contém um valor inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub unit_service: UnitService,
    pub lead_service: LeadService,
    pub funnel_service: FunnelService,
    pub task_service: TaskService,
    pub consulta_service: ConsultaService,
    pub company_repo: CompanyRepository,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(config, db_pool))
    }

    /// Monta o grafo de dependências sobre uma pool já existente.
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let unit_repo = UnitRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let funnel_repo = FunnelRepository::new(db_pool.clone());
        let task_repo = TaskRepository::new(db_pool.clone());
        let consulta_repo = ConsultaRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());

        let token_service = TokenService::new(
            &config.jwt_secret,
            chrono::Duration::minutes(config.jwt_access_ttl_minutes),
            chrono::Duration::days(config.jwt_refresh_ttl_days),
        );

        let auth_service = AuthService::new(
            user_repo.clone(),
            company_repo.clone(),
            unit_repo.clone(),
            token_service,
            db_pool.clone(),
        );
        let unit_service = UnitService::new(unit_repo.clone(), user_repo.clone(), db_pool.clone());
        let funnel_service = FunnelService::new(funnel_repo.clone(), unit_repo.clone(), db_pool.clone());
        let lead_service = LeadService::new(
            lead_repo.clone(),
            unit_repo,
            funnel_repo,
            user_repo.clone(),
            db_pool.clone(),
        );
        let task_service = TaskService::new(task_repo, lead_repo.clone(), user_repo.clone());
        let consulta_service = ConsultaService::new(consulta_repo, lead_repo, user_repo, db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            unit_service,
            lead_service,
            funnel_service,
            task_service,
            consulta_service,
            company_repo,
        }
    }
}
