use ticketrag_store::ScoredTicket;

/// System prompt - instructs the LLM how to behave
pub const SYSTEM_PROMPT: &str = "You are an IT helpdesk assistant.\n\
Rules: Answer ONLY in English. Be concise. Use clear bullet points.\n\
If the provided context is irrelevant or empty, answer with standard best-practice steps.\n\
Do NOT mention purchases, receipts, or unrelated items.";

/// Longest context snippet inserted into the prompt, in characters.
pub const CONTEXT_MAX_CHARS: usize = 500;

/// Scan retrieved tickets for password/credential-related content and return
/// the first match as a context snippet. Candidates are checked in retrieval
/// order, so the most similar qualifying ticket wins.
///
/// Returns an empty string when nothing matches; the prompt states the
/// context may be empty, so the LLM falls back to best-practice steps.
pub fn extract_password_context(
    candidates: &[ScoredTicket],
    keywords: &[String],
    max_chars: usize,
) -> String {
    for candidate in candidates {
        let subject = &candidate.ticket.subject;
        let answer = &candidate.ticket.answer;

        if has_keyword(subject, keywords) || has_keyword(answer, keywords) {
            // Collapse whitespace so multi-line answers stay one snippet line
            let context = format!("{} — {}", clean_text(subject), clean_text(answer));
            return truncate_chars(&context, max_chars);
        }
    }

    String::new()
}

fn has_keyword(text: &str, keywords: &[String]) -> bool {
    if text.is_empty() {
        return false;
    }
    let text_lower = text.to_lowercase();
    keywords.iter().any(|keyword| text_lower.contains(keyword))
}

/// Build the user message sent to the LLM
pub fn build_user_prompt(question: &str, context_snippet: &str) -> String {
    format!(
        "Question: {question}\n\n\
         Context (may be empty or unrelated):\n```{context_snippet}```\n\n\
         Please provide a short, actionable answer with 3–5 bullet points."
    )
}

/// Truncate to at most `max_chars` characters, appending "..." when cut.
/// Counts chars, not bytes: ticket text is multilingual.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketrag_types::TicketChunk;

    fn ticket(subject: &str, answer: &str) -> ScoredTicket {
        ScoredTicket {
            ticket: TicketChunk {
                ticket_id: "TICKET-1".into(),
                subject: subject.into(),
                answer: answer.into(),
                category: None,
                language: None,
                chunk_id: "c1".into(),
                content_hash: "h1".into(),
                embedding_model_version: "v1".into(),
            },
            score: 0.8,
        }
    }

    fn keywords() -> Vec<String> {
        ["password", "passwort", "reset", "otp"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_extract_matches_subject() {
        let candidates = vec![ticket("Password expired", "Visit the portal.")];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert_eq!(context, "Password expired — Visit the portal.");
    }

    #[test]
    fn test_extract_matches_answer() {
        let candidates = vec![ticket("Locked out", "Use the OTP sent to your phone.")];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert!(context.contains("OTP sent"));
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let candidates = vec![ticket("PASSWORD reset request", "Done.")];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert!(!context.is_empty());
    }

    #[test]
    fn test_extract_prefers_first_match() {
        let candidates = vec![
            ticket("Printer jam", "Clear tray 2."),
            ticket("Password reset", "Self-service portal."),
            ticket("Another password issue", "Call IT."),
        ];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert!(context.starts_with("Password reset"));
    }

    #[test]
    fn test_extract_flattens_multiline_answers() {
        let candidates = vec![ticket("Password reset", "Step 1.\n\nStep 2.\tDone.")];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert_eq!(context, "Password reset — Step 1. Step 2. Done.");
    }

    #[test]
    fn test_extract_no_match_is_empty() {
        let candidates = vec![ticket("Printer jam", "Clear tray 2.")];
        let context = extract_password_context(&candidates, &keywords(), CONTEXT_MAX_CHARS);
        assert_eq!(context, "");
    }

    #[test]
    fn test_extract_empty_candidates() {
        let context = extract_password_context(&[], &keywords(), CONTEXT_MAX_CHARS);
        assert_eq!(context, "");
    }

    #[test]
    fn test_extract_truncates_long_context() {
        let long_answer = "reset ".repeat(200);
        let candidates = vec![ticket("Password help", &long_answer)];
        let context = extract_password_context(&candidates, &keywords(), 50);

        assert!(context.ends_with("..."));
        assert_eq!(context.chars().count(), 53); // 50 + "..."
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // "zurücksetzen" contains a multibyte char; byte slicing would panic
        let s = "Passwort zurücksetzen ".repeat(40);
        let truncated = truncate_chars(&s, 100);
        assert_eq!(truncated.chars().count(), 103);
    }

    #[test]
    fn test_truncate_short_string_untouched() {
        assert_eq!(truncate_chars("hello", 100), "hello");
    }

    #[test]
    fn test_build_user_prompt_structure() {
        let prompt = build_user_prompt("How do I reset my password?", "ctx");

        assert!(prompt.starts_with("Question: How do I reset my password?"));
        assert!(prompt.contains("```ctx```"));
        assert!(prompt.contains("3–5 bullet points"));
    }

    #[test]
    fn test_build_user_prompt_empty_context() {
        let prompt = build_user_prompt("Why is the VPN slow?", "");
        assert!(prompt.contains("``````"));
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\t b \n c  "), "a b c");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
    }
}
