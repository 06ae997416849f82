use once_cell::sync::Lazy;
use regex::Regex;
use rig::client::ProviderClient;
use rig::providers::gemini;

use super::EngineError;

/// Wrapper around the LLM client
pub struct LlmClient {
    client: gemini::Client,
    model: String,
}

impl LlmClient {
    /// Create client from GEMINI_API_KEY env var
    pub fn from_env(model: impl Into<String>) -> Result<Self, EngineError> {
        let client = gemini::Client::from_env();
        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

/// Generate a response from the LLM.
/// Deterministic (temperature 0) so identical queries over identical context
/// produce stable answers.
pub async fn generate(
    client: &LlmClient,
    system_prompt: &str,
    user_prompt: &str,
    max_tokens: u64,
) -> Result<String, EngineError> {
    use rig::client::CompletionClient;
    use rig::completion::Prompt;

    let agent = client
        .client
        .agent(&client.model)
        .preamble(system_prompt)
        .temperature(0.0)
        .max_tokens(max_tokens)
        .build();

    let raw = agent
        .prompt(user_prompt)
        .await
        .map_err(|e| EngineError::Generation(e.to_string()))?;

    Ok(sanitize_output(&raw))
}

static TEMPLATE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\|.*?\|>").unwrap());
static EOS_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"</s>").unwrap());

/// Strip chat-template artifacts and non-printable bytes from model output.
/// The prompt demands English answers, so anything outside printable ASCII
/// (plus tab/newline) is an artifact, not content.
pub fn sanitize_output(text: &str) -> String {
    let ascii: String = text
        .chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r' | ' '..='~'))
        .collect();

    let without_templates = TEMPLATE_TOKEN.replace_all(&ascii, "");
    let without_eos = EOS_TOKEN.replace_all(&without_templates, "");

    without_eos.trim().to_string()
}
