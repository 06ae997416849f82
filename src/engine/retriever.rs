use ticketrag_store::{ScoredTicket, TicketStore};

use super::EngineError;

/// Retrieved context from vector search
#[derive(Debug)]
pub struct RetrievalResult {
    pub tickets: Vec<ScoredTicket>,
}

/// Search the ticket store for the nearest neighbors of a pre-computed
/// query embedding. Results come back ordered by similarity.
pub async fn retrieve(
    query_embedding: &[f32],
    store: &TicketStore,
    top_k: usize,
) -> Result<RetrievalResult, EngineError> {
    let tickets = store.search_tickets(query_embedding, top_k).await?;

    Ok(RetrievalResult { tickets })
}
