//! ticket-loader CLI - Builds the support-ticket vector index
//!
//! Reads a JSONL export of resolved tickets, embeds each one, and upserts
//! the chunks into the LanceDB store the chat service searches.

use std::fs::File;
use std::io::BufReader;

use clap::{Parser, Subcommand};
use tracing::info;

use ticket_loader::parse_dataset;
use ticketrag_store::{
    DEFAULT_EMBEDDING_DIMENSION, Embedder, TicketStore, format_ticket_for_embedding,
};
use ticketrag_types::TicketChunk;

/// Batch size for embedding processing to reduce peak memory usage
const EMBEDDING_BATCH_SIZE: usize = 50;

#[derive(Parser)]
#[command(name = "ticket-loader")]
#[command(about = "Load support-ticket datasets into the RAG vector store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, embed, and store a ticket dataset
    Load {
        /// Path to the JSONL dataset (one ticket record per line)
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Path to the LanceDB database
        #[arg(short, long, default_value = "data/tickets.lance")]
        db_path: String,

        /// Drop the existing table before loading
        #[arg(long)]
        full: bool,
    },
    /// Show what is currently stored
    Status {
        /// Path to the LanceDB database
        #[arg(short, long, default_value = "data/tickets.lance")]
        db_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("lance::file_audit=warn".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            dataset,
            db_path,
            full,
        } => {
            info!("Loading dataset: {}", dataset);
            info!("Database path: {}", db_path);

            // Step 1: Initialize the embedder (parse needs its model version)
            let mut embedder = Embedder::new()?;
            let model_version = embedder.model_version();

            // Step 2: Parse the dataset (sync, no DB)
            let file = File::open(&dataset)?;
            let parsed = parse_dataset(BufReader::new(file), &model_version)?;
            info!(
                "Parsed {} tickets ({} blank, {} invalid skipped)",
                parsed.stats.parsed, parsed.stats.skipped_blank, parsed.stats.skipped_invalid
            );

            // Step 3: Embed and store in batches
            let store = TicketStore::new(&db_path, embedder.dimension()).await?;
            if full {
                info!("Full load requested, dropping existing table");
                store.reset().await?;
            }

            let total = embed_and_store(&parsed.chunks, &store, &mut embedder).await?;
            info!("Stored {} ticket chunks", total);
        }
        Commands::Status { db_path } => {
            let store = TicketStore::new(&db_path, DEFAULT_EMBEDDING_DIMENSION).await?;
            let count = store.count_tickets().await?;
            let categories = store.list_categories().await?;

            info!("Tickets stored: {}", count);
            if categories.is_empty() {
                info!("Categories: (none)");
            } else {
                info!("Categories: {}", categories.join(", "));
            }
        }
    }

    Ok(())
}

async fn embed_and_store(
    chunks: &[TicketChunk],
    store: &TicketStore,
    embedder: &mut Embedder,
) -> anyhow::Result<usize> {
    let mut total = 0;
    for batch in chunks.chunks(EMBEDDING_BATCH_SIZE) {
        let texts: Vec<String> = batch
            .iter()
            .map(|c| format_ticket_for_embedding(&c.subject, &c.answer))
            .collect();

        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let embeddings = embedder.embed_batch(&text_refs)?;

        total += store.upsert_tickets(batch, embeddings).await?;
        info!("  {}/{} embedded", total, chunks.len());
        // texts & embeddings dropped here, freeing memory before next batch
    }
    Ok(total)
}
