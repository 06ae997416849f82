use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate SHA256 hash of content.
/// Normalizes CRLF → LF before hashing for cross-OS consistency.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.replace("\r\n", "\n").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate new UUID v4
pub fn new_chunk_id() -> String {
    Uuid::new_v4().to_string()
}

/// Deterministic chunk ID from ticket id + content.
/// Same ticket with same content = same ID across reload runs.
pub fn deterministic_chunk_id(ticket_id: &str, content: &str) -> String {
    content_hash(&format!("ticket:{}:{}", ticket_id, content))
}

/// A resolved support ticket stored in the vector index.
/// `subject` + `answer` is what gets embedded and what grounds the LLM.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TicketChunk {
    pub ticket_id: String,
    pub subject: String,
    /// The resolution text agents sent for this ticket
    pub answer: String,
    pub category: Option<String>, // e.g., "access", "hardware"
    pub language: Option<String>, // ISO code of the ticket text, e.g., "en", "de"

    /// Deterministic ID: hash(ticket_id, content). Stable across reloads for unchanged tickets.
    pub chunk_id: String,
    /// SHA256 of subject + answer for change detection
    pub content_hash: String,
    /// Embedding model identifier, e.g., "ParaphraseMLMiniLML12V2_384"
    pub embedding_model_version: String,
}

impl TicketChunk {
    /// The canonical text a chunk is hashed and embedded from.
    pub fn content(&self) -> String {
        format!("{}\n{}", self.subject, self.answer)
    }
}
