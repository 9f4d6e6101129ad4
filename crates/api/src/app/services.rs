use std::sync::Arc;

use tracing::info;

use leadflow_infra::{
    AutomationDispatcher, EngineConfig, InMemoryLeadStore, LeadEngine, LeadStore,
    PostgresLeadStore, StoreError,
};

use crate::config::ServerConfig;

/// Shared handles injected into every handler via `Extension`.
pub struct AppServices {
    pub engine: Arc<LeadEngine<dyn LeadStore>>,
    pub automation: AutomationDispatcher<dyn LeadStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn LeadStore>, config: EngineConfig) -> Self {
        let engine = Arc::new(LeadEngine::new(store, config));
        Self {
            automation: AutomationDispatcher::new(Arc::clone(&engine)),
            engine,
        }
    }
}

/// Postgres when `DATABASE_URL` is set, otherwise a fresh in-memory store.
pub async fn open_store(config: &ServerConfig) -> Result<Arc<dyn LeadStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresLeadStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            info!(max_connections = config.max_connections, "using postgres store");
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-memory store");
            Ok(Arc::new(InMemoryLeadStore::new()))
        }
    }
}
