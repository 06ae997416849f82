use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use super::dto::{self, *};
use super::error::ApiError;
use super::state::AppState;
use crate::config::{MAX_TOKENS_RANGE, TOP_K_RANGE};
use crate::engine::{context, generator, retriever};

/// POST /chat - Answer a helpdesk question grounded in retrieved tickets
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let started = Instant::now();

    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Query cannot be empty".into()));
    }

    let top_k = match req.top_k {
        Some(k) if !TOP_K_RANGE.contains(&k) => {
            return Err(ApiError::BadRequest(format!(
                "top_k must be between {} and {}",
                TOP_K_RANGE.start(),
                TOP_K_RANGE.end()
            )));
        }
        Some(k) => k,
        None => state.config.top_k_results,
    };

    let max_tokens = match req.max_tokens {
        Some(t) if !MAX_TOKENS_RANGE.contains(&t) => {
            return Err(ApiError::BadRequest(format!(
                "max_tokens must be between {} and {}",
                MAX_TOKENS_RANGE.start(),
                MAX_TOKENS_RANGE.end()
            )));
        }
        Some(t) => t,
        None => state.config.max_tokens,
    };

    let preview: String = query.chars().take(100).collect();
    tracing::info!(top_k, max_tokens, "processing query: {}", preview);

    // Embed query once (lock held only for the encode)
    let query_embedding = {
        let embedder = state.embedder().await?;
        let mut embedder = embedder.lock().await;
        embedder.embed_one(query)?
    };

    // Nearest-neighbor search over the ticket index
    let store = state.store().await?;
    let result = retriever::retrieve(&query_embedding, store, top_k).await?;

    // Policy-sensitive context extraction (password-related content)
    let context_snippet = context::extract_password_context(
        &result.tickets,
        &state.config.password_keywords,
        context::CONTEXT_MAX_CHARS,
    );

    // Prompt build + generation (slow path, no locks held)
    let user_prompt = context::build_user_prompt(query, &context_snippet);
    let llm = state.llm()?;
    let answer = generator::generate(llm, context::SYSTEM_PROMPT, &user_prompt, max_tokens).await?;

    let sources = dto::build_sources(&result);

    Ok(Json(ChatResponse {
        answer,
        query: query.to_string(),
        context_used: (!context_snippet.is_empty()).then_some(context_snippet),
        sources,
        processing_time_ms: started.elapsed().as_millis() as u64,
    }))
}

/// GET /health - Health check, reports lazy-load state without forcing loads
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let details = state.readiness();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models_loaded: details.all_loaded(),
        details,
    })
}

/// GET /tickets - Corpus statistics
pub async fn tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TicketsResponse>, ApiError> {
    let store = state.store().await?;
    let count = store.count_tickets().await?;
    let categories = store.list_categories().await?;

    Ok(Json(TicketsResponse { count, categories }))
}
