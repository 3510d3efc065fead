use std::sync::Arc;

use crate::books::repo::{BookRepo, PgBookRepo};
use crate::config::AppConfig;
use crate::db;
use crate::storage::{LocalStorage, StorageClient};
use crate::users::repo::{PgUserRepo, UserRepo};

/// Process-wide context, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub books: Arc<dyn BookRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await;

        let storage = LocalStorage::new(&config.upload_dir).await?;
        tracing::info!(dir = %storage.root().display(), "upload store ready");

        if config.jwt.secret.is_none() {
            tracing::warn!("JWT_SECRET is not set; register and login will fail");
        }

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgBookRepo::new(pool)),
            Arc::new(storage),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        books: Arc<dyn BookRepo>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            config,
            users,
            books,
            storage,
        }
    }
}
