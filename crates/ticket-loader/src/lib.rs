//! ticket-loader: dataset parsing for the support RAG store
//!
//! The CLI in main.rs handles embedding and storage; everything here is
//! pure parsing so it stays testable without a model or database.

pub mod dataset;

pub use dataset::{DatasetParse, ParseStats, TicketRecord, parse_dataset};
