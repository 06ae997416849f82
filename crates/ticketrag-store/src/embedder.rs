use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

/// Dimension of the default encoder. Readers that never load the model
/// (the chat service opening the store) still need to know it.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("failed to initialize embedding model: {0}")]
    Init(#[from] anyhow::Error),

    #[error("embedding generation failed: {0}")]
    Embed(String),
}

/// Wraps the fastembed model. Holds loaded model weights in memory.
pub struct Embedder {
    model: TextEmbedding,
    model_name: EmbeddingModel,
    dimension: usize,
}

impl Embedder {
    /// Initialize with the multilingual paraphrase MiniLM encoder (384 dimensions).
    /// Tickets arrive in mixed languages, so the encoder must be multilingual.
    pub fn new() -> Result<Self, EmbedError> {
        Self::with_model(EmbeddingModel::ParaphraseMLMiniLML12V2)
    }

    pub fn with_model(model_name: EmbeddingModel) -> Result<Self, EmbedError> {
        let dimension = embedding_dimension(&model_name);
        let model = TextEmbedding::try_new(
            InitOptions::new(model_name.clone()).with_show_download_progress(true),
        )?;

        Ok(Self {
            model,
            model_name,
            dimension,
        })
    }

    /// Embed a single text. Convenience wrapper around batch.
    pub fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_batch(&[text])
            .map(|mut v| v.pop().unwrap_or_default())
    }

    /// Embed multiple texts in one call (more efficient).
    pub fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbedError::Embed(e.to_string()))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Identifier recorded on every stored chunk so a reload with a different
    /// encoder is detectable.
    pub fn model_version(&self) -> String {
        format!("{:?}_{}", self.model_name, self.dimension)
    }
}

fn embedding_dimension(model: &EmbeddingModel) -> usize {
    match model {
        EmbeddingModel::ParaphraseMLMiniLML12V2 => 384,
        EmbeddingModel::MultilingualE5Small => 384,
        EmbeddingModel::AllMiniLML6V2 => 384,
        EmbeddingModel::AllMiniLML12V2 => 384,
        EmbeddingModel::BGESmallENV15 => 384,
        other => panic!("unsupported embedding model: {:?}", other),
    }
}

/// Formats a ticket for embedding.
/// Concatenates subject + answer so both the problem statement and the
/// resolution carry semantic signal. Must match what queries are compared against.
pub fn format_ticket_for_embedding(subject: &str, answer: &str) -> String {
    let subject = subject.trim();
    let answer = answer.trim();

    if answer.is_empty() {
        return subject.to_string();
    }

    format!("{}\n{}", subject, answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ticket_for_embedding() {
        let result = format_ticket_for_embedding(
            "Cannot connect to VPN",
            "Update the client and re-enter your one-time password.",
        );

        assert!(result.starts_with("Cannot connect to VPN"));
        assert!(result.contains("one-time password"));
    }

    #[test]
    fn test_format_ticket_without_answer() {
        let result = format_ticket_for_embedding("Monitor flickers  ", "");
        assert_eq!(result, "Monitor flickers");
    }

    #[test]
    fn test_format_ticket_trims_whitespace() {
        let result = format_ticket_for_embedding("  Subject ", " Answer \n");
        assert_eq!(result, "Subject\nAnswer");
    }

    // Integration tests - only run if model download is acceptable
    #[test]
    #[ignore = "downloads model, run with --ignored"]
    fn test_embedder_produces_correct_dimensions() {
        let mut embedder = Embedder::new().expect("failed to init embedder");
        let embedding = embedder.embed_one("test text").expect("failed to embed");

        assert_eq!(embedding.len(), 384);
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    #[ignore = "downloads model, run with --ignored"]
    fn test_embed_batch() {
        let mut embedder = Embedder::new().expect("failed to init embedder");
        let embeddings = embedder
            .embed_batch(&["first", "second", "third"])
            .expect("failed to embed");

        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }

    #[test]
    #[ignore = "downloads model, run with --ignored"]
    fn test_embed_empty_batch() {
        let mut embedder = Embedder::new().expect("failed to init embedder");
        let embeddings = embedder.embed_batch(&[]).expect("failed to embed");

        assert!(embeddings.is_empty());
    }
}
