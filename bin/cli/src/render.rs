//! Plain-text rendering of command results.

use courier_ai::{ProviderInfo, QueryOutcome};
use std::fmt::Write;

/// Installed Ollama models shown by `providers`.
pub const MODELS_SHOWN: usize = 5;

/// Characters of each answer shown by `test`.
pub const TEST_PREVIEW_CHARS: usize = 300;

/// Text printed for an `ask` outcome.
#[must_use]
pub fn outcome(outcome: &QueryOutcome) -> String {
    match &outcome.response {
        Some(response) if outcome.fell_back() => {
            format!("{response}\n\n[{}]", outcome.summary())
        }
        Some(response) => response.clone(),
        None => {
            let mut text = format!("No response: {}", outcome.summary());
            for error in &outcome.errors {
                let _ = write!(text, "\n  - {error}");
            }
            text
        }
    }
}

/// Table printed by `providers`.
#[must_use]
pub fn providers(infos: &[ProviderInfo], default_provider: &str, ollama_models: &[String]) -> String {
    let mut text = format!("Providers (default: {default_provider})");
    for info in infos {
        let marker = if info.name.eq_ignore_ascii_case(default_provider) {
            '*'
        } else {
            ' '
        };
        let status = if info.available { "available" } else { "unavailable" };
        let _ = write!(
            text,
            "\n {marker} {:<8} {:<20} {:<12} {:<6} model: {}",
            info.name,
            info.display_name,
            status,
            info.kind.as_str(),
            info.default_model
        );
        if info.name == "ollama" && !ollama_models.is_empty() {
            let shown: Vec<&str> = ollama_models
                .iter()
                .take(MODELS_SHOWN)
                .map(String::as_str)
                .collect();
            let _ = write!(text, "\n     installed: {}", shown.join(", "));
            if ollama_models.len() > MODELS_SHOWN {
                let _ = write!(text, " (+{} more)", ollama_models.len() - MODELS_SHOWN);
            }
        }
    }
    text
}

/// Summary printed by `fallback`.
#[must_use]
pub fn fallback(enabled: bool, configured: &[String], effective: &[String], preferred: &str) -> String {
    if !enabled {
        return format!("Fallback: disabled\nOnly the requested provider is tried (default: {preferred})");
    }
    let effective = if effective.is_empty() {
        "no providers available".to_string()
    } else {
        effective.join(" -> ")
    };
    format!(
        "Fallback: enabled\nConfigured order: {}\nEffective order from {preferred}: {effective}",
        configured.join(", ")
    )
}

/// Shortens `text` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
