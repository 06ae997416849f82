use std::io::BufRead;

use serde::Deserialize;
use tracing::warn;

use ticketrag_types::{TicketChunk, content_hash, deterministic_chunk_id, new_chunk_id};

/// One line of the JSONL dataset.
/// Only `subject` and `answer` are required; export tools differ on the rest.
#[derive(Debug, Deserialize)]
pub struct TicketRecord {
    pub subject: String,
    pub answer: String,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ParseStats {
    pub parsed: usize,
    pub skipped_blank: usize,
    pub skipped_invalid: usize,
}

#[derive(Debug)]
pub struct DatasetParse {
    pub chunks: Vec<TicketChunk>,
    pub stats: ParseStats,
}

/// Parse a JSONL ticket dataset into chunks ready for embedding.
///
/// Malformed lines and records with neither subject nor answer are skipped
/// (counted in stats), not fatal: ticket exports are messy and one bad row
/// should not abort an hour-long load.
pub fn parse_dataset(
    reader: impl BufRead,
    model_version: &str,
) -> std::io::Result<DatasetParse> {
    let mut chunks = Vec::new();
    let mut stats = ParseStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: TicketRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping invalid record on line {}: {}", line_no + 1, e);
                stats.skipped_invalid += 1;
                continue;
            }
        };

        match record_to_chunk(record, line_no + 1, model_version) {
            Some(chunk) => {
                chunks.push(chunk);
                stats.parsed += 1;
            }
            None => stats.skipped_blank += 1,
        }
    }

    Ok(DatasetParse { chunks, stats })
}

fn record_to_chunk(record: TicketRecord, line_no: usize, model_version: &str) -> Option<TicketChunk> {
    let subject = record.subject.trim().to_string();
    let answer = record.answer.trim().to_string();
    if subject.is_empty() && answer.is_empty() {
        return None;
    }

    let content = format!("{}\n{}", subject, answer);

    // Records with a real ticket id get a stable chunk id across reloads;
    // anonymous rows get a fresh UUID.
    let (ticket_id, chunk_id) = match record.ticket_id {
        Some(id) if !id.trim().is_empty() => {
            let id = id.trim().to_string();
            let chunk_id = deterministic_chunk_id(&id, &content);
            (id, chunk_id)
        }
        _ => (format!("row-{}", line_no), new_chunk_id()),
    };

    Some(TicketChunk {
        ticket_id,
        subject,
        answer,
        category: normalize_optional(record.category),
        language: normalize_optional(record.language),
        chunk_id,
        content_hash: content_hash(&content),
        embedding_model_version: model_version.to_string(),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MODEL: &str = "ParaphraseMLMiniLML12V2_384";

    fn parse(input: &str) -> DatasetParse {
        parse_dataset(Cursor::new(input), MODEL).unwrap()
    }

    #[test]
    fn test_parse_single_record() {
        let result = parse(
            r#"{"ticket_id": "T-1", "subject": "VPN down", "answer": "Restart the client.", "category": "network", "language": "en"}"#,
        );

        assert_eq!(result.stats.parsed, 1);
        let chunk = &result.chunks[0];
        assert_eq!(chunk.ticket_id, "T-1");
        assert_eq!(chunk.subject, "VPN down");
        assert_eq!(chunk.category.as_deref(), Some("network"));
        assert_eq!(chunk.embedding_model_version, MODEL);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let result = parse("\n\n{\"subject\": \"a\", \"answer\": \"b\"}\n\n");
        assert_eq!(result.stats.parsed, 1);
        assert_eq!(result.stats.skipped_invalid, 0);
    }

    #[test]
    fn test_parse_counts_invalid_lines() {
        let result = parse("not json\n{\"subject\": \"a\", \"answer\": \"b\"}");
        assert_eq!(result.stats.parsed, 1);
        assert_eq!(result.stats.skipped_invalid, 1);
    }

    #[test]
    fn test_parse_skips_empty_records() {
        let result = parse(r#"{"subject": "  ", "answer": ""}"#);
        assert_eq!(result.stats.parsed, 0);
        assert_eq!(result.stats.skipped_blank, 1);
    }

    #[test]
    fn test_subject_only_record_is_kept() {
        let result = parse(r#"{"subject": "Printer offline", "answer": ""}"#);
        assert_eq!(result.stats.parsed, 1);
        assert_eq!(result.chunks[0].answer, "");
    }

    #[test]
    fn test_deterministic_ids_for_identified_tickets() {
        let input = r#"{"ticket_id": "T-9", "subject": "a", "answer": "b"}"#;
        let first = parse(input);
        let second = parse(input);

        assert_eq!(first.chunks[0].chunk_id, second.chunks[0].chunk_id);
    }

    #[test]
    fn test_anonymous_rows_get_row_ids() {
        let result = parse(r#"{"subject": "a", "answer": "b"}"#);
        assert_eq!(result.chunks[0].ticket_id, "row-1");
    }

    #[test]
    fn test_blank_category_normalized_to_none() {
        let result = parse(r#"{"subject": "a", "answer": "b", "category": "  "}"#);
        assert!(result.chunks[0].category.is_none());
    }

    #[test]
    fn test_content_hash_covers_subject_and_answer() {
        let a = parse(r#"{"ticket_id": "T", "subject": "s", "answer": "x"}"#);
        let b = parse(r#"{"ticket_id": "T", "subject": "s", "answer": "y"}"#);
        assert_ne!(a.chunks[0].content_hash, b.chunks[0].content_hash);
    }
}
