// src/config.rs

use anyhow::{anyhow, bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    common::uploads::ReceiptStorage,
    db::{
        BankOperationsRepository, CajaRepository, HrRepository, PharmacyRepository, RbacRepository,
        ServicePaymentsRepository, UserRepository,
    },
    services::{
        auth::AuthService, bank_operation_service::BankOperationService, hr_service::HrService,
        rbac_service::RbacService, service_payment_service::ServicePaymentService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 12;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuración leída del entorno (y de `.env` si existe).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub uploads_dir: PathBuf,
    pub db_max_connections: u32,
    pub jwt_expiration_hours: i64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} debe estar definida"))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            // Sin valor por defecto.
            jwt_secret: required("JWT_SECRET")?,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            uploads_dir: lookup("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR)),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            jwt_expiration_hours: positive(
                "JWT_EXPIRATION_HOURS",
                parse_or(&lookup, "JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS)?,
            )?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} tiene un valor inválido: '{raw}'")),
        None => Ok(default),
    }
}

fn positive(key: &str, value: i64) -> anyhow::Result<i64> {
    if value <= 0 {
        bail!("{key} debe ser mayor a cero");
    }
    Ok(value)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub max_upload_bytes: usize,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub bank_operation_service: BankOperationService,
    pub service_payment_service: ServicePaymentService,
    pub hr_service: HrService,
    pub pharmacy_repo: PharmacyRepository,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("No se pudo conectar a la base de datos")?;

        tracing::info!("✅ Conexión con la base de datos establecida");

        Ok(Self::from_pool(config, db_pool))
    }

    // --- Arma el grafo de dependencias ---
    pub fn from_pool(config: &Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let caja_repo = CajaRepository::new(db_pool.clone());
        let pharmacy_repo = PharmacyRepository::new(db_pool.clone());
        let storage = ReceiptStorage::new(config.uploads_dir.clone());

        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), config.jwt_expiration_hours);
        let rbac_service = RbacService::new(rbac_repo);
        let bank_operation_service = BankOperationService::new(
            db_pool.clone(),
            BankOperationsRepository::new(db_pool.clone()),
            caja_repo.clone(),
            pharmacy_repo.clone(),
            storage,
        );
        let service_payment_service = ServicePaymentService::new(
            db_pool.clone(),
            ServicePaymentsRepository::new(db_pool.clone()),
            caja_repo,
            pharmacy_repo.clone(),
        );
        let hr_service = HrService::new(HrRepository::new(db_pool.clone()));

        Self {
            db_pool,
            max_upload_bytes: config.max_upload_bytes,
            auth_service,
            rbac_service,
            bank_operation_service,
            service_payment_service,
            hr_service,
            pharmacy_repo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let config = Config::from_source(source(&[
            ("DATABASE_URL", "postgres://localhost/farmacia"),
            ("JWT_SECRET", "s3cr3t"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_expiration_hours, 12);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn missing_or_blank_jwt_secret_fails() {
        assert!(Config::from_source(source(&[("DATABASE_URL", "postgres://x")])).is_err());

        let err = Config::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_numbers_are_reported_with_the_key() {
        let err = Config::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "muchas"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn non_positive_token_lifetime_is_rejected() {
        assert!(Config::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION_HOURS", "0"),
        ]))
        .is_err());
    }
}
