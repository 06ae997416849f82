use std::sync::Arc;

use once_cell::sync::OnceCell as SyncOnceCell;
use tokio::sync::{Mutex, OnceCell};
use tracing::info;

use crate::api::dto::ModelDetails;
use crate::config::ServiceConfig;
use crate::engine::{EngineError, LlmClient};
use ticketrag_store::embedder::EmbedError;
use ticketrag_store::{DEFAULT_EMBEDDING_DIMENSION, Embedder, TicketStore};

/// Shared state for all handlers.
///
/// The three model wrappers are lazy: nothing heavy loads at construction,
/// each initializes on first use (or during warmup). A failed initialization
/// is returned to the caller and retried on the next request.
pub struct AppState {
    // Only the embedder needs mutation
    embedder: OnceCell<Mutex<Embedder>>,
    store: OnceCell<TicketStore>,
    llm: SyncOnceCell<LlmClient>,

    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Arc<Self> {
        Arc::new(Self {
            embedder: OnceCell::new(),
            store: OnceCell::new(),
            llm: SyncOnceCell::new(),
            config,
        })
    }

    /// Embedding model, loaded on first use.
    /// Model load is blocking (possible download), so it runs off the runtime.
    pub async fn embedder(&self) -> Result<&Mutex<Embedder>, EngineError> {
        self.embedder
            .get_or_try_init(|| async {
                info!("Loading embedding model");
                let embedder = tokio::task::spawn_blocking(Embedder::new)
                    .await
                    .map_err(|e| {
                        EmbedError::Init(anyhow::anyhow!("embedder load task failed: {e}"))
                    })??;
                info!("Embedding model loaded");
                Ok(Mutex::new(embedder))
            })
            .await
    }

    /// Ticket store connection, opened on first use.
    pub async fn store(&self) -> Result<&TicketStore, EngineError> {
        self.store
            .get_or_try_init(|| async {
                info!("Opening ticket store at {}", self.config.db_path);
                let store =
                    TicketStore::new(&self.config.db_path, DEFAULT_EMBEDDING_DIMENSION).await?;
                Ok(store)
            })
            .await
    }

    /// LLM client, created on first use.
    pub fn llm(&self) -> Result<&LlmClient, EngineError> {
        self.llm.get_or_try_init(|| {
            info!("Creating LLM client for model {}", self.config.llm_model);
            LlmClient::from_env(&self.config.llm_model)
        })
    }

    /// Force all three wrappers to initialize.
    pub async fn warmup(&self) -> Result<(), EngineError> {
        info!("Warming up models...");
        self.embedder().await?;
        self.store().await?;
        self.llm()?;
        info!("All models warmed up");
        Ok(())
    }

    /// Report which wrappers are initialized, without initializing anything.
    pub fn readiness(&self) -> ModelDetails {
        ModelDetails {
            embedder_loaded: self.embedder.get().is_some(),
            store_loaded: self.store.get().is_some(),
            llm_loaded: self.llm.get().is_some(),
        }
    }
}
