//! ticketrag-store: Shared vector storage and embedding for the support RAG service
//!
//! This crate provides LanceDB-backed vector storage and embedding utilities
//! shared between ticket-loader (writes) and support-rag-chat (reads).

pub mod embedder;
pub mod vector_store;

pub use embedder::{
    DEFAULT_EMBEDDING_DIMENSION, EmbedError, Embedder, format_ticket_for_embedding,
};
pub use vector_store::{ScoredTicket, StoreError, TicketStore};
