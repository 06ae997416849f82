use arrow_array::{Array, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table, connect,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use thiserror::Error;

use ticketrag_types::TicketChunk;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("got {embeddings} embeddings for {chunks} chunks")]
    CountMismatch { chunks: usize, embeddings: usize },
}

const TICKET_TABLE: &str = "ticket_chunks";

/// A ticket returned from vector search, with its similarity score.
/// Score is in [0, 1]; higher means more relevant.
#[derive(Debug, Clone)]
pub struct ScoredTicket {
    pub ticket: TicketChunk,
    pub score: f32,
}

/// LanceDB-backed vector store for support-ticket chunks.
pub struct TicketStore {
    conn: Connection,
    dimension: usize,
}

impl TicketStore {
    /// Connect to LanceDB at the given path (creates if not exists).
    pub async fn new(db_path: &str, embedding_dimension: usize) -> Result<Self, StoreError> {
        // Ensure parent directory exists (important for Docker bind mounts)
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = connect(db_path).execute().await?;
        Ok(Self {
            conn,
            dimension: embedding_dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    // ========================================================================
    // Write operations (used by ticket-loader)
    // ========================================================================

    /// Insert ticket chunks with their embeddings. Creates the table if needed.
    pub async fn upsert_tickets(
        &self,
        chunks: &[TicketChunk],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        if chunks.len() != embeddings.len() {
            return Err(StoreError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let batch = ticket_chunks_to_batch(chunks, embeddings, self.dimension)?;
        let count = batch.num_rows();

        self.upsert_batch(TICKET_TABLE, batch).await?;
        Ok(count)
    }

    /// Drop the ticket table. Used by full reloads.
    pub async fn reset(&self) -> Result<(), StoreError> {
        match self.conn.drop_table(TICKET_TABLE, &[]).await {
            Ok(()) => Ok(()),
            Err(_) => Ok(()), // Table doesn't exist, nothing to drop
        }
    }

    // ========================================================================
    // Read operations (used by support-rag-chat)
    // ========================================================================

    /// Search ticket chunks by vector similarity.
    /// Cosine distance from LanceDB is mapped to score = max(1 - distance, 0).
    pub async fn search_tickets(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredTicket>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let table = self.get_table(TICKET_TABLE).await?;

        let results = table
            .vector_search(query_embedding.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await?;

        batches_to_scored_tickets(results).await
    }

    /// Number of ticket chunks stored. Zero if the table doesn't exist yet.
    pub async fn count_tickets(&self) -> Result<usize, StoreError> {
        let table = match self.conn.open_table(TICKET_TABLE).execute().await {
            Ok(t) => t,
            Err(_) => return Ok(0), // No data yet
        };

        Ok(table.count_rows(None).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let table = match self.conn.open_table(TICKET_TABLE).execute().await {
            Ok(t) => t,
            Err(_) => return Ok(Vec::new()), // No data yet
        };

        let batches: Vec<RecordBatch> = table
            .query()
            .select(lancedb::query::Select::columns(&["category"]))
            .execute()
            .await?
            .try_collect()
            .await?;

        // Extract unique non-null categories
        let mut categories: Vec<String> = batches
            .iter()
            .flat_map(|batch| {
                batch
                    .column_by_name("category")
                    .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                    .map(|arr| {
                        (0..arr.len())
                            .filter(|&i| !arr.is_null(i))
                            .map(|i| arr.value(i).to_string())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .collect();

        categories.sort();
        categories.dedup();

        Ok(categories)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn upsert_batch(&self, table_name: &str, batch: RecordBatch) -> Result<(), StoreError> {
        let schema = batch.schema();

        // Try to open existing table, create if not exists
        match self.conn.open_table(table_name).execute().await {
            Ok(table) => {
                let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
                table.add(batches).execute().await?;
            }
            Err(_) => {
                let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
                self.conn
                    .create_table(table_name, batches)
                    .execute()
                    .await?;
            }
        }

        Ok(())
    }

    async fn get_table(&self, name: &str) -> Result<Table, StoreError> {
        self.conn
            .open_table(name)
            .execute()
            .await
            .map_err(|_| StoreError::TableNotFound(name.to_string()))
    }
}

// ============================================================================
// Arrow conversion functions (pure, no side effects)
// ============================================================================

fn ticket_chunks_to_batch(
    chunks: &[TicketChunk],
    embeddings: Vec<Vec<f32>>,
    dim: usize,
) -> Result<RecordBatch, StoreError> {
    use arrow_array::builder::FixedSizeListBuilder;

    let ticket_ids: StringArray = chunks.iter().map(|c| Some(c.ticket_id.as_str())).collect();
    let subjects: StringArray = chunks.iter().map(|c| Some(c.subject.as_str())).collect();
    let answers: StringArray = chunks.iter().map(|c| Some(c.answer.as_str())).collect();
    let categories: StringArray = chunks.iter().map(|c| c.category.as_deref()).collect();
    let languages: StringArray = chunks.iter().map(|c| c.language.as_deref()).collect();
    let chunk_ids: StringArray = chunks.iter().map(|c| Some(c.chunk_id.as_str())).collect();
    let content_hashes: StringArray = chunks
        .iter()
        .map(|c| Some(c.content_hash.as_str()))
        .collect();
    let model_versions: StringArray = chunks
        .iter()
        .map(|c| Some(c.embedding_model_version.as_str()))
        .collect();

    // Build fixed-size vector column
    let mut vector_builder =
        FixedSizeListBuilder::new(arrow_array::builder::Float32Builder::new(), dim as i32);

    for emb in &embeddings {
        vector_builder.values().append_slice(emb);
        vector_builder.append(true);
    }

    let vectors = vector_builder.finish();

    let schema = Arc::new(arrow_schema::Schema::new(vec![
        arrow_schema::Field::new("ticket_id", arrow_schema::DataType::Utf8, false),
        arrow_schema::Field::new("subject", arrow_schema::DataType::Utf8, false),
        arrow_schema::Field::new("answer", arrow_schema::DataType::Utf8, false),
        arrow_schema::Field::new("category", arrow_schema::DataType::Utf8, true),
        arrow_schema::Field::new("language", arrow_schema::DataType::Utf8, true),
        arrow_schema::Field::new("chunk_id", arrow_schema::DataType::Utf8, false),
        arrow_schema::Field::new("content_hash", arrow_schema::DataType::Utf8, false),
        arrow_schema::Field::new(
            "embedding_model_version",
            arrow_schema::DataType::Utf8,
            false,
        ),
        arrow_schema::Field::new(
            "vector",
            arrow_schema::DataType::FixedSizeList(
                Arc::new(arrow_schema::Field::new(
                    "item",
                    arrow_schema::DataType::Float32,
                    true,
                )),
                dim as i32,
            ),
            false,
        ),
    ]));

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ticket_ids),
            Arc::new(subjects),
            Arc::new(answers),
            Arc::new(categories),
            Arc::new(languages),
            Arc::new(chunk_ids),
            Arc::new(content_hashes),
            Arc::new(model_versions),
            Arc::new(vectors),
        ],
    )?)
}

async fn batches_to_scored_tickets(
    stream: impl futures::Stream<Item = Result<RecordBatch, lancedb::Error>> + Unpin,
) -> Result<Vec<ScoredTicket>, StoreError> {
    stream
        .map_err(StoreError::from)
        .try_fold(Vec::new(), |mut acc, batch| async move {
            acc.extend(extract_scored_tickets_from_batch(&batch)?);
            Ok(acc)
        })
        .await
}

fn extract_scored_tickets_from_batch(batch: &RecordBatch) -> Result<Vec<ScoredTicket>, StoreError> {
    let col = |name: &str| -> Result<&StringArray, StoreError> {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| StoreError::SchemaMismatch(name.into()))
    };

    let ticket_ids = col("ticket_id")?;
    let subjects = col("subject")?;
    let answers = col("answer")?;
    let chunk_ids = col("chunk_id")?;
    let content_hashes = col("content_hash")?;
    let model_versions = col("embedding_model_version")?;

    // Optional columns
    let categories = batch
        .column_by_name("category")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let languages = batch
        .column_by_name("language")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>());

    // Added by LanceDB on vector queries
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let nullable_string = |arr: Option<&StringArray>, i: usize| -> Option<String> {
        arr.filter(|a| !a.is_null(i))
            .map(|a| a.value(i).to_string())
    };

    let tickets = (0..batch.num_rows())
        .map(|i| {
            let distance = distances
                .filter(|a| !a.is_null(i))
                .map(|a| a.value(i))
                .unwrap_or(1.0);

            ScoredTicket {
                ticket: TicketChunk {
                    ticket_id: ticket_ids.value(i).to_string(),
                    subject: subjects.value(i).to_string(),
                    answer: answers.value(i).to_string(),
                    category: nullable_string(categories, i),
                    language: nullable_string(languages, i),
                    chunk_id: chunk_ids.value(i).to_string(),
                    content_hash: content_hashes.value(i).to_string(),
                    embedding_model_version: model_versions.value(i).to_string(),
                },
                score: (1.0 - distance).max(0.0),
            }
        })
        .collect();

    Ok(tickets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket_chunk() -> TicketChunk {
        TicketChunk {
            ticket_id: "TICKET-1".into(),
            subject: "Forgot my password".into(),
            answer: "Reset it via the self-service portal.".into(),
            category: Some("access".into()),
            language: Some("en".into()),
            chunk_id: "test-uuid-1234".into(),
            content_hash: "abc123".into(),
            embedding_model_version: "ParaphraseMLMiniLML12V2_384".into(),
        }
    }

    fn fake_embedding(dim: usize) -> Vec<f32> {
        vec![0.1; dim]
    }

    #[test]
    fn test_ticket_chunks_to_batch() {
        let chunks = vec![sample_ticket_chunk()];
        let embeddings = vec![fake_embedding(384)];

        let batch = ticket_chunks_to_batch(&chunks, embeddings, 384).unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 9); // 8 fields + vector
    }

    #[test]
    fn test_batch_preserves_data() {
        let chunk = sample_ticket_chunk();
        let chunks = vec![chunk.clone()];
        let embeddings = vec![fake_embedding(384)];

        let batch = ticket_chunks_to_batch(&chunks, embeddings, 384).unwrap();

        let subjects = batch
            .column_by_name("subject")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();

        assert_eq!(subjects.value(0), chunk.subject);
    }

    #[test]
    fn test_batch_nullable_category() {
        let mut chunk = sample_ticket_chunk();
        chunk.category = None;
        let batch = ticket_chunks_to_batch(&[chunk], vec![fake_embedding(384)], 384).unwrap();

        let categories = batch
            .column_by_name("category")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();

        assert!(categories.is_null(0));
    }

    #[test]
    fn test_extract_scored_tickets_without_distance_column() {
        // A batch without _distance (e.g. plain scan) falls back to score 0
        let batch =
            ticket_chunks_to_batch(&[sample_ticket_chunk()], vec![fake_embedding(4)], 4).unwrap();

        let scored = extract_scored_tickets_from_batch(&batch).unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[0].ticket.subject, "Forgot my password");
    }

    #[tokio::test]
    #[ignore = "requires filesystem, run with --ignored"]
    async fn test_upsert_count_mismatch_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.lance");

        let store = TicketStore::new(db_path.to_str().unwrap(), 4).await.unwrap();
        let err = store
            .upsert_tickets(&[sample_ticket_chunk()], vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::CountMismatch {
                chunks: 1,
                embeddings: 0
            }
        ));
    }

    #[tokio::test]
    #[ignore = "requires filesystem, run with --ignored"]
    async fn test_search_missing_table_is_table_not_found() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("empty.lance");

        let store = TicketStore::new(db_path.to_str().unwrap(), 4).await.unwrap();
        let err = store.search_tickets(&fake_embedding(4), 3).await.unwrap_err();

        assert!(matches!(err, StoreError::TableNotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires filesystem, run with --ignored"]
    async fn test_count_on_empty_store_is_zero() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("empty.lance");

        let store = TicketStore::new(db_path.to_str().unwrap(), 4).await.unwrap();
        assert_eq!(store.count_tickets().await.unwrap(), 0);
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires filesystem, run with --ignored"]
    async fn test_ticket_store_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.lance");

        let store = TicketStore::new(db_path.to_str().unwrap(), 4).await.unwrap();

        let chunks = vec![sample_ticket_chunk()];
        let embeddings = vec![fake_embedding(4)];

        let count = store.upsert_tickets(&chunks, embeddings).await.unwrap();
        assert_eq!(count, 1);

        let results = store.search_tickets(&fake_embedding(4), 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ticket.ticket_id, "TICKET-1");

        assert_eq!(store.count_tickets().await.unwrap(), 1);
        assert_eq!(store.list_categories().await.unwrap(), vec!["access"]);
    }

    #[tokio::test]
    #[ignore = "requires filesystem, run with --ignored"]
    async fn test_reset_then_search_reports_no_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.lance");

        let store = TicketStore::new(db_path.to_str().unwrap(), 4).await.unwrap();
        store
            .upsert_tickets(&[sample_ticket_chunk()], vec![fake_embedding(4)])
            .await
            .unwrap();

        store.reset().await.unwrap();

        let err = store.search_tickets(&fake_embedding(4), 3).await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(_)));
    }
}
