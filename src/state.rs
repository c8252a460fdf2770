//! Shared application state

use std::sync::Arc;

use crate::{config::Config, db, db::PostgresPatientStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: PostgresPatientStore,
}

impl AppState {
    /// Connect the pool, apply migrations, and build the shared state.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await?;

        Ok(Self {
            config: Arc::new(config),
            store: PostgresPatientStore::new(pool),
        })
    }
}
