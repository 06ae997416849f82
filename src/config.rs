//! Service configuration.
//!
//! Sensible defaults, overridable through `SUPPORT_RAG_*` environment
//! variables. Log verbosity is controlled separately through `RUST_LOG`.

use std::env;
use std::ops::RangeInclusive;
use tracing::warn;

/// Allowed range for per-request `top_k`.
pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=20;
/// Allowed range for per-request `max_tokens`.
pub const MAX_TOKENS_RANGE: RangeInclusive<u64> = 50..=500;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address
    pub host: String,
    pub port: u16,

    /// Path to the LanceDB database built by ticket-loader
    pub db_path: String,

    /// Model id passed to the LLM provider
    pub llm_model: String,

    /// Default number of tickets retrieved per query
    pub top_k_results: usize,
    /// Default generation budget per query
    pub max_tokens: u64,

    /// Skip startup warmup; models load on first request instead
    pub debug: bool,

    /// Keywords marking password/credential-related content (lowercase).
    /// Mixed-language on purpose: the ticket corpus is multilingual.
    pub password_keywords: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_path: "data/tickets.lance".to_string(),
            llm_model: "gemini-2.5-flash".to_string(),
            top_k_results: 4,
            max_tokens: 130,
            debug: false,
            password_keywords: [
                "password",
                "passwort",
                "login",
                "credential",
                "account",
                "reset",
                "zurücksetzen",
                "otp",
                "2fa",
                "mfa",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ServiceConfig {
    /// Load from environment variables, falling back to defaults.
    /// Out-of-range numeric values are clamped with a warning rather than
    /// rejected, so a bad deploy still comes up serving.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("SUPPORT_RAG_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("SUPPORT_RAG_PORT") {
            match port.parse() {
                Ok(p) => config.port = p,
                Err(_) => warn!("ignoring invalid SUPPORT_RAG_PORT: {}", port),
            }
        }

        if let Ok(path) = env::var("SUPPORT_RAG_DB_PATH") {
            config.db_path = path;
        }

        if let Ok(model) = env::var("SUPPORT_RAG_LLM_MODEL") {
            config.llm_model = model;
        }

        if let Ok(top_k) = env::var("SUPPORT_RAG_TOP_K") {
            match top_k.parse::<usize>() {
                Ok(k) => config.top_k_results = clamp_to_range(k, TOP_K_RANGE, "SUPPORT_RAG_TOP_K"),
                Err(_) => warn!("ignoring invalid SUPPORT_RAG_TOP_K: {}", top_k),
            }
        }

        if let Ok(max_tokens) = env::var("SUPPORT_RAG_MAX_TOKENS") {
            match max_tokens.parse::<u64>() {
                Ok(t) => {
                    config.max_tokens = clamp_to_range(t, MAX_TOKENS_RANGE, "SUPPORT_RAG_MAX_TOKENS")
                }
                Err(_) => warn!("ignoring invalid SUPPORT_RAG_MAX_TOKENS: {}", max_tokens),
            }
        }

        if let Ok(debug) = env::var("SUPPORT_RAG_DEBUG") {
            config.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(keywords) = env::var("SUPPORT_RAG_PASSWORD_KEYWORDS") {
            let parsed: Vec<String> = keywords
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.password_keywords = parsed;
            }
        }

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn clamp_to_range<T: PartialOrd + Copy + std::fmt::Display>(
    value: T,
    range: RangeInclusive<T>,
    name: &str,
) -> T {
    if range.contains(&value) {
        value
    } else if value < *range.start() {
        warn!("{} = {} below minimum, clamping to {}", name, value, range.start());
        *range.start()
    } else {
        warn!("{} = {} above maximum, clamping to {}", name, value, range.end());
        *range.end()
    }
}
