use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://book-verse-frontend-gold.vercel.app,http://localhost:5173";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// `None` keeps the server up but makes every token operation fail.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bookverse".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bookverse-users".into()),
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.into()),
        );
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5000);

        Ok(Self {
            database_url,
            max_connections,
            jwt,
            upload_dir,
            allowed_origins,
            host,
            port,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
