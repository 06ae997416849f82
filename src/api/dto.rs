use serde::{Deserialize, Serialize};

use crate::engine::retriever::RetrievalResult;
use ticketrag_store::ScoredTicket;

/// POST /chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Number of similar tickets to retrieve (defaults from config)
    pub top_k: Option<usize>,
    /// Generation budget (defaults from config)
    pub max_tokens: Option<u64>,
}

/// POST /chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub query: String,
    /// The password-context snippet inserted into the prompt, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_used: Option<String>,
    pub sources: Vec<SourceInfo>,
    pub processing_time_ms: u64,
}

/// Source reference in response — one retrieved ticket.
#[derive(Debug, Serialize, Clone)]
pub struct SourceInfo {
    pub subject: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Relevance score (0.0–1.0, higher = more relevant)
    pub score: f32,
    /// Relevance as integer percentage
    pub relevance_pct: u8,
}

impl SourceInfo {
    fn from_scored(s: &ScoredTicket) -> Self {
        Self {
            subject: s.ticket.subject.clone(),
            answer: s.ticket.answer.clone(),
            category: s.ticket.category.clone(),
            score: s.score,
            relevance_pct: (s.score * 100.0).round() as u8,
        }
    }
}

/// Build sorted source list from a retrieval result.
pub fn build_sources(result: &RetrievalResult) -> Vec<SourceInfo> {
    let mut sources: Vec<SourceInfo> = result.tickets.iter().map(SourceInfo::from_scored).collect();
    sources.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sources
}

/// Per-wrapper load state, reported without forcing initialization.
#[derive(Debug, Serialize)]
pub struct ModelDetails {
    pub embedder_loaded: bool,
    pub store_loaded: bool,
    pub llm_loaded: bool,
}

impl ModelDetails {
    pub fn all_loaded(&self) -> bool {
        self.embedder_loaded && self.store_loaded && self.llm_loaded
    }
}

/// GET /health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models_loaded: bool,
    pub details: ModelDetails,
}

/// GET /tickets response
#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub count: usize,
    pub categories: Vec<String>,
}
