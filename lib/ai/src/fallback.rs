//! Fallback orchestration.
//!
//! Given a prompt and a preferred provider, tries providers one at a time
//! in priority order until one produces text. Every attempt is recorded in
//! the returned `QueryOutcome`; failures never escape as errors.

use crate::backend::{Provider, QueryRequest};
use crate::classify::ErrorCategory;
use crate::config::FallbackConfig;
use crate::outcome::{OutcomeBuilder, QueryOutcome};
use crate::registry::ProviderRegistry;
use courier_core::QueryId;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Diagnostic recorded when no provider is usable.
pub const NO_PROVIDERS_ERROR: &str = "No AI providers available";

/// Computes the order in which providers are tried.
///
/// The preferred provider comes first if it is available, then the
/// configured order, then any available provider not yet placed. The result
/// is a permutation of `available`. Names are compared case-insensitively.
#[must_use]
pub fn fallback_order<A: AsRef<str>, C: AsRef<str>>(
    available: &[A],
    preferred: &str,
    configured: &[C],
) -> Vec<String> {
    let available: Vec<String> = available
        .iter()
        .map(|name| name.as_ref().trim().to_lowercase())
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(available.len());

    let mut place = |name: &str| {
        let name = name.trim().to_lowercase();
        if available.contains(&name) && !order.contains(&name) {
            order.push(name);
        }
    };

    place(preferred);
    for name in configured {
        place(name.as_ref());
    }
    for name in &available {
        place(name.as_str());
    }

    order
}

/// Runs queries against the registry with fallback.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: FallbackConfig,
}

impl FallbackOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, config: FallbackConfig) -> Self {
        Self { registry, config }
    }

    /// The registry queries are resolved against.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The fallback configuration.
    #[must_use]
    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Answers `request`, preferring the provider named `preferred`.
    #[instrument(skip(self, request), fields(query_id = tracing::field::Empty))]
    pub async fn query(&self, request: &QueryRequest, preferred: &str) -> QueryOutcome {
        let id = QueryId::new();
        tracing::Span::current().record("query_id", tracing::field::display(id));
        let builder = OutcomeBuilder::new(id, preferred.trim());

        if self.config.enabled {
            self.query_with_fallback(builder, request, preferred).await
        } else {
            self.query_preferred_only(builder, request, preferred).await
        }
    }

    async fn query_preferred_only(
        &self,
        mut builder: OutcomeBuilder,
        request: &QueryRequest,
        preferred: &str,
    ) -> QueryOutcome {
        let Some(provider) = self.registry.get_by_name(preferred).await else {
            warn!(provider = preferred, "preferred provider not available and fallback disabled");
            builder.push_error(format!("Provider {} not available", preferred.trim()));
            return builder.finish();
        };

        match attempt(&mut builder, provider.as_ref(), request, 1).await {
            Some(response) => builder.succeed(response),
            None => builder.finish(),
        }
    }

    async fn query_with_fallback(
        &self,
        mut builder: OutcomeBuilder,
        request: &QueryRequest,
        preferred: &str,
    ) -> QueryOutcome {
        let available = self.registry.list_available().await;
        if available.is_empty() {
            error!("no AI providers available");
            builder.push_error(NO_PROVIDERS_ERROR);
            return builder.finish();
        }

        let names: Vec<&str> = available.iter().map(|p| p.name()).collect();
        let configured = self.config.order();
        let order = fallback_order(names.as_slice(), preferred, configured.as_slice());

        let candidates = order.iter().filter_map(|name| {
            available
                .iter()
                .find(|p| p.name().eq_ignore_ascii_case(name))
        });

        for (index, provider) in candidates.enumerate() {
            if let Some(response) =
                attempt(&mut builder, provider.as_ref(), request, index + 1).await
            {
                return builder.succeed(response);
            }
        }

        error!("all available AI providers failed");
        builder.finish()
    }
}

/// Makes one attempt and records its result.
///
/// Returns the response text on success. The caller finishes the builder.
async fn attempt(
    builder: &mut OutcomeBuilder,
    provider: &dyn Provider,
    request: &QueryRequest,
    position: usize,
) -> Option<String> {
    let name = provider.name();
    let display_name = provider.display_name();
    let model = request.resolve_model(provider.default_model());
    builder.begin_attempt(name, model);

    if position == 1 {
        info!(provider = name, model, "trying {display_name}");
    } else {
        info!(provider = name, model, position, "fallback {}: trying {display_name}", position - 1);
    }

    match provider.query(request).await {
        Ok(response) if !response.trim().is_empty() => {
            if position == 1 {
                info!(provider = name, "success with {display_name}");
            } else {
                info!(provider = name, position, "fallback success with {display_name}");
            }
            Some(response)
        }
        Ok(_) => {
            warn!(provider = name, "{display_name}: empty response, trying next");
            builder.record_empty();
            None
        }
        Err(e) => {
            match builder.record_error(&e) {
                ErrorCategory::QuotaAuth => warn!(
                    provider = name,
                    error = %e,
                    "{display_name}: rate limit/quota error detected, trying next provider"
                ),
                ErrorCategory::Transport => warn!(
                    provider = name,
                    error = %e,
                    "{display_name}: connection error, trying next provider"
                ),
                ErrorCategory::Unclassified => {
                    warn!(provider = name, error = %e, "{display_name}: error")
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::outcome::{AttemptStatus, OutcomeStatus};
    use crate::registry::tests::FakeProvider;
    use proptest::prelude::*;

    const DEFAULT_ORDER: &str = "chatgpt,gemini,ollama";

    struct Harness {
        fakes: Vec<Arc<FakeProvider>>,
        orchestrator: FallbackOrchestrator,
    }

    impl Harness {
        fn new(fakes: Vec<FakeProvider>, config: FallbackConfig) -> Self {
            let fakes: Vec<Arc<FakeProvider>> = fakes.into_iter().map(Arc::new).collect();
            let providers = fakes
                .iter()
                .map(|f| Arc::clone(f) as Arc<dyn Provider>)
                .collect();
            let registry = ProviderRegistry::new(providers).expect("registry");
            Self {
                fakes,
                orchestrator: FallbackOrchestrator::new(Arc::new(registry), config),
            }
        }

        fn enabled(fakes: Vec<FakeProvider>) -> Self {
            Self::new(fakes, FallbackConfig::new(true, DEFAULT_ORDER))
        }

        fn disabled(fakes: Vec<FakeProvider>) -> Self {
            Self::new(fakes, FallbackConfig::new(false, DEFAULT_ORDER))
        }

        fn calls(&self, name: &str) -> usize {
            self.fakes
                .iter()
                .find(|f| f.name() == name)
                .map_or(0, |f| f.calls())
        }

        async fn ask(&self, preferred: &str) -> QueryOutcome {
            let request = QueryRequest::new("What is Rust?").expect("valid prompt");
            self.orchestrator.query(&request, preferred).await
        }
    }

    fn attempted(outcome: &QueryOutcome) -> Vec<&str> {
        outcome.attempts.iter().map(|a| a.provider.as_str()).collect()
    }

    fn assert_outcome_invariant(outcome: &QueryOutcome) {
        let successes = outcome
            .attempts
            .iter()
            .filter(|a| a.status == AttemptStatus::Success)
            .count();
        let last_is_success = outcome
            .attempts
            .last()
            .is_some_and(|a| a.status == AttemptStatus::Success);
        assert_eq!(outcome.response.is_some(), successes == 1 && last_is_success);
        assert!(successes <= 1);
        assert!(
            outcome
                .attempts
                .iter()
                .all(|a| a.status != AttemptStatus::Attempting)
        );
    }

    fn rate_limited() -> LlmError {
        LlmError::HttpStatus {
            status: 429,
            body: "429 rate limit".to_string(),
        }
    }

    #[test]
    fn order_puts_preferred_first() {
        let order = fallback_order(
            &["chatgpt", "gemini", "ollama"],
            "ollama",
            &["chatgpt", "gemini", "ollama"],
        );
        assert_eq!(order, vec!["ollama", "chatgpt", "gemini"]);
    }

    #[test]
    fn order_prefers_preferred_even_when_not_configured() {
        let order = fallback_order(&["chatgpt", "gemini", "ollama"], "ollama", &["gemini"]);
        assert_eq!(order, vec!["ollama", "gemini", "chatgpt"]);
    }

    #[test]
    fn order_skips_unavailable_and_unknown_names() {
        let order = fallback_order(&["ollama", "chatgpt"], "gemini", &["claude", "gemini", "ollama"]);
        assert_eq!(order, vec!["ollama", "chatgpt"]);
    }

    #[test]
    fn order_appends_unconfigured_in_registration_order() {
        let order = fallback_order(&["chatgpt", "mistral", "gemini"], "", &["gemini"]);
        assert_eq!(order, vec!["gemini", "chatgpt", "mistral"]);
    }

    #[test]
    fn order_ignores_case_and_whitespace() {
        let order = fallback_order(&["ChatGPT", "gemini"], " GEMINI ", &["chatgpt"]);
        assert_eq!(order, vec!["gemini", "chatgpt"]);
    }

    #[test]
    fn order_of_nothing_is_empty() {
        let empty: [&str; 0] = [];
        assert!(fallback_order(&empty, "chatgpt", &["chatgpt"]).is_empty());
    }

    proptest! {
        #[test]
        fn order_is_permutation_of_available(
            available in proptest::sample::subsequence(
                vec!["chatgpt", "gemini", "ollama", "claude", "mistral"], 0..=5
            ),
            configured in proptest::collection::vec(
                prop_oneof![
                    Just("chatgpt"), Just("gemini"), Just("ollama"),
                    Just("claude"), Just("unknown")
                ],
                0..8
            ),
            preferred in prop_oneof![
                Just("chatgpt"), Just("gemini"), Just("ollama"), Just("nobody")
            ],
        ) {
            let order = fallback_order(available.as_slice(), preferred, configured.as_slice());

            let mut sorted_order = order.clone();
            sorted_order.sort();
            let mut sorted_available: Vec<String> =
                available.iter().map(|s| s.to_string()).collect();
            sorted_available.sort();
            prop_assert_eq!(sorted_order, sorted_available);

            if available.contains(&preferred) {
                prop_assert_eq!(order.first().map(String::as_str), Some(preferred));
            }
        }
    }

    // Scenario: preferred provider is not available.
    #[tokio::test]
    async fn unavailable_preferred_follows_configured_order() {
        let h = Harness::enabled(vec![
            FakeProvider::new("ollama", true).replying(Ok("from ollama")),
            FakeProvider::new("gemini", false),
            FakeProvider::new("chatgpt", true).replying(Ok("from chatgpt")),
            FakeProvider::new("mistral", true),
        ]);
        let outcome = h.ask("gemini").await;

        assert_eq!(outcome.response.as_deref(), Some("from chatgpt"));
        assert_eq!(attempted(&outcome), vec!["chatgpt"]);
        assert_eq!(h.calls("gemini"), 0);
        assert!(outcome.fell_back());
        assert!(outcome.errors.is_empty());
        assert_outcome_invariant(&outcome);
    }

    // Scenario: rate limited preferred provider falls through to the next.
    #[tokio::test]
    async fn rate_limited_preferred_falls_back() {
        let h = Harness::enabled(vec![
            FakeProvider::new("chatgpt", true).replying(Err(rate_limited())),
            FakeProvider::new("gemini", true).replying(Ok("from gemini")),
            FakeProvider::new("ollama", true),
        ]);
        let outcome = h.ask("chatgpt").await;

        let first = &outcome.attempts[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.status, AttemptStatus::Error);
        assert_eq!(first.error_category, Some(ErrorCategory::QuotaAuth));
        assert!(first.error.as_deref().is_some_and(|e| e.contains("429")));

        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.attempts[1].status, AttemptStatus::Success);
        assert_eq!(outcome.provider_used.as_deref(), Some("gemini"));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("chatgpt: "));
        assert_eq!(h.calls("ollama"), 0);
        assert_outcome_invariant(&outcome);
    }

    // Scenario: the only provider returns nothing.
    #[tokio::test]
    async fn single_empty_response_is_failure() {
        let h = Harness::enabled(vec![FakeProvider::new("ollama", true).replying(Ok("   "))]);
        let outcome = h.ask("ollama").await;

        assert!(outcome.response.is_none());
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::EmptyResponse);
        assert_eq!(outcome.errors, vec!["ollama: Empty response"]);
        assert_eq!(outcome.status(), OutcomeStatus::AllFailed);
        assert_outcome_invariant(&outcome);
    }

    // Scenario: fallback disabled and the preferred provider answers.
    #[tokio::test]
    async fn disabled_fallback_success() {
        let h = Harness::disabled(vec![
            FakeProvider::new("chatgpt", true),
            FakeProvider::new("gemini", true).replying(Ok("from gemini")),
        ]);
        let outcome = h.ask("gemini").await;

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::Success);
        assert_eq!(outcome.attempts[0].model, "fake-model");
        assert_eq!(outcome.response.as_deref(), Some("from gemini"));
        assert_eq!(outcome.provider_used.as_deref(), Some("gemini"));
        assert!(!outcome.fell_back());
        assert_eq!(h.calls("chatgpt"), 0);
        assert_outcome_invariant(&outcome);
    }

    // Scenario: nothing is configured.
    #[tokio::test]
    async fn zero_providers() {
        let h = Harness::enabled(vec![
            FakeProvider::new("chatgpt", false),
            FakeProvider::new("gemini", false),
        ]);
        let outcome = h.ask("chatgpt").await;

        assert!(outcome.response.is_none());
        assert!(outcome.attempts.is_empty());
        assert_eq!(outcome.errors, vec![NO_PROVIDERS_ERROR]);
        assert_eq!(outcome.status(), OutcomeStatus::NoProviders);

        let empty = Harness::enabled(Vec::new());
        let outcome = empty.ask("chatgpt").await;
        assert_eq!(outcome.errors, vec![NO_PROVIDERS_ERROR]);
        assert!(outcome.attempts.is_empty());
    }

    #[tokio::test]
    async fn disabled_fallback_unavailable_preferred() {
        let h = Harness::disabled(vec![
            FakeProvider::new("chatgpt", false),
            FakeProvider::new("gemini", true),
        ]);
        let outcome = h.ask("chatgpt").await;

        assert!(outcome.response.is_none());
        assert!(outcome.attempts.is_empty());
        assert_eq!(outcome.errors, vec!["Provider chatgpt not available"]);
        assert_eq!(h.calls("gemini"), 0);
        assert_eq!(outcome.status(), OutcomeStatus::NoProviders);
    }

    #[tokio::test]
    async fn disabled_fallback_failure_stops() {
        let h = Harness::disabled(vec![
            FakeProvider::new("chatgpt", true).replying(Err(LlmError::Timeout)),
            FakeProvider::new("gemini", true),
        ]);
        let outcome = h.ask("chatgpt").await;

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::Error);
        assert_eq!(
            outcome.attempts[0].error_category,
            Some(ErrorCategory::Transport)
        );
        assert_eq!(outcome.errors, vec!["chatgpt: LLM request timeout"]);
        assert_eq!(h.calls("gemini"), 0);
        assert_outcome_invariant(&outcome);
    }

    #[tokio::test]
    async fn disabled_fallback_empty_response() {
        let h = Harness::disabled(vec![FakeProvider::new("chatgpt", true).replying(Ok(""))]);
        let outcome = h.ask("CHATGPT").await;

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].status, AttemptStatus::EmptyResponse);
        assert_eq!(outcome.errors, vec!["chatgpt: Empty response"]);
    }

    #[tokio::test]
    async fn exhaustion_tries_each_available_provider_once() {
        let h = Harness::enabled(vec![
            FakeProvider::new("chatgpt", true).replying(Err(LlmError::ConnectionFailed {
                reason: "refused".to_string(),
            })),
            FakeProvider::new("gemini", true).replying(Ok("")),
            FakeProvider::new("ollama", true).replying(Err(LlmError::ResponseParseFailed {
                reason: "bad json".to_string(),
            })),
            FakeProvider::new("offline", false),
        ]);
        let outcome = h.ask("ollama").await;

        assert_eq!(attempted(&outcome), vec!["ollama", "chatgpt", "gemini"]);
        let positions: Vec<_> = outcome.attempts.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        let statuses: Vec<_> = outcome.attempts.iter().map(|a| a.status).collect();
        assert_eq!(
            statuses,
            vec![
                AttemptStatus::Error,
                AttemptStatus::Error,
                AttemptStatus::EmptyResponse
            ]
        );
        assert_eq!(outcome.errors.len(), 3);
        for name in ["chatgpt", "gemini", "ollama"] {
            assert_eq!(h.calls(name), 1, "{name}");
        }
        assert_eq!(outcome.status(), OutcomeStatus::AllFailed);
        assert_outcome_invariant(&outcome);
    }

    #[tokio::test]
    async fn success_short_circuits_later_candidates() {
        let h = Harness::enabled(vec![
            FakeProvider::new("chatgpt", true).replying(Ok("  answer  ")),
            FakeProvider::new("gemini", true),
            FakeProvider::new("ollama", true),
        ]);
        let outcome = h.ask("chatgpt").await;

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.response.as_deref(), Some("  answer  "));
        assert_eq!(h.calls("gemini"), 0);
        assert_eq!(h.calls("ollama"), 0);
        assert_eq!(outcome.requested_provider, "chatgpt");
    }

    #[tokio::test]
    async fn explicit_model_is_recorded() {
        let h = Harness::enabled(vec![FakeProvider::new("chatgpt", true)]);
        let request = QueryRequest::new("hi")
            .expect("valid prompt")
            .with_model("gpt-4o");
        let outcome = h.orchestrator.query(&request, "chatgpt").await;
        assert_eq!(outcome.attempts[0].model, "gpt-4o");
    }

    #[tokio::test]
    async fn configured_order_drives_fallback_sequence() {
        let h = Harness::new(
            vec![
                FakeProvider::new("chatgpt", true).replying(Err(rate_limited())),
                FakeProvider::new("gemini", true).replying(Err(rate_limited())),
                FakeProvider::new("ollama", true).replying(Ok("local")),
            ],
            FallbackConfig::new(true, "ollama, gemini"),
        );
        let outcome = h.ask("chatgpt").await;

        assert_eq!(attempted(&outcome), vec!["chatgpt", "ollama"]);
        assert_eq!(outcome.provider_used.as_deref(), Some("ollama"));
        assert_eq!(h.calls("gemini"), 0);
    }
}
