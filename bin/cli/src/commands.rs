//! Subcommand handlers.

use crate::chat::ChatSession;
use crate::cli::{AskArgs, ChatArgs};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::render;
use courier_ai::{
    FallbackConfig, FallbackOrchestrator, Provider, ProviderRegistry, QueryOptions, QueryRequest,
    fallback_order,
};
use rootcause::prelude::ResultExt;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

/// Provider used when nothing else is configured or available.
pub const FALLBACK_DEFAULT_PROVIDER: &str = "chatgpt";

/// Questions sent by the `test` command.
pub const TEST_QUESTIONS: [&str; 3] = [
    "What is artificial intelligence?",
    "Explain machine learning in simple terms",
    "List 3 benefits of automation",
];

/// Picks the provider used when `--provider` is omitted.
///
/// The configured default wins if it is available, then the first available
/// provider, then [`FALLBACK_DEFAULT_PROVIDER`].
#[must_use]
pub fn resolve_default_provider(configured: &str, available: &[&str]) -> String {
    let configured = configured.trim();
    available
        .iter()
        .find(|name| name.eq_ignore_ascii_case(configured))
        .or_else(|| available.first())
        .map_or_else(|| FALLBACK_DEFAULT_PROVIDER.to_string(), |name| (*name).to_string())
}

/// Shared state for every subcommand.
#[derive(Debug)]
pub struct App {
    config: CliConfig,
    registry: Arc<ProviderRegistry>,
}

impl App {
    /// Creates the app with an already-built registry.
    #[must_use]
    pub fn new(config: CliConfig, registry: Arc<ProviderRegistry>) -> Self {
        Self { config, registry }
    }

    /// Builds the registry from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider cannot be constructed.
    pub fn from_config(config: CliConfig) -> courier_core::Result<Self, CliError> {
        let registry =
            ProviderRegistry::from_config(&config.providers()).context(CliError::Registry)?;
        Ok(Self::new(config, Arc::new(registry)))
    }

    async fn available_names(&self) -> Vec<String> {
        self.registry
            .list_available()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// The provider preferred when none is requested.
    pub async fn default_provider(&self) -> String {
        let available = self.available_names().await;
        let names: Vec<&str> = available.iter().map(String::as_str).collect();
        resolve_default_provider(&self.config.default_ai_provider, &names)
    }

    async fn preferred(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_lowercase(),
            None => self.default_provider().await,
        }
    }

    fn orchestrator(&self, fallback_enabled: bool) -> FallbackOrchestrator {
        let config = self.config.fallback();
        let config = FallbackConfig::new(config.enabled && fallback_enabled, config.order_raw());
        FallbackOrchestrator::new(Arc::clone(&self.registry), config)
    }

    /// `ask`: one orchestrated query.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is blank or the outcome cannot be
    /// serialized.
    pub async fn ask(&self, args: AskArgs) -> courier_core::Result<ExitCode, CliError> {
        let mut request = QueryRequest::new(args.prompt).context(CliError::InvalidArgument {
            details: "prompt".to_string(),
        })?;
        request = request.with_max_tokens(args.max_tokens.unwrap_or(self.config.max_tokens()));
        if let Some(model) = args.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = args.temperature {
            request = request.with_options(QueryOptions::new().with_temperature(temperature));
        }

        let preferred = self.preferred(args.provider.as_deref()).await;
        let outcome = self
            .orchestrator(!args.no_fallback)
            .query(&request, &preferred)
            .await;
        info!(query_id = %outcome.id, summary = %outcome.summary(), "query finished");

        if args.json {
            let json = serde_json::to_string_pretty(&outcome).context(CliError::Io)?;
            println!("{json}");
        } else if outcome.is_success() {
            println!("{}", render::outcome(&outcome));
        } else {
            eprintln!("{}", render::outcome(&outcome));
        }

        Ok(if outcome.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    /// `chat`: interactive loop on stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal I/O fails.
    pub async fn chat(&self, args: ChatArgs) -> courier_core::Result<ExitCode, CliError> {
        let session = ChatSession {
            preferred: self.preferred(args.provider.as_deref()).await,
            model: args.model.filter(|m| !m.trim().is_empty()),
            max_tokens: self.config.chat_max_tokens(),
        };
        let orchestrator = self.orchestrator(true);
        let stdin = BufReader::new(tokio::io::stdin());
        session
            .run(&orchestrator, stdin, &mut std::io::stdout())
            .await?;
        Ok(ExitCode::SUCCESS)
    }

    /// `providers`: availability table.
    pub async fn providers(&self) -> ExitCode {
        let infos = self.registry.infos().await;
        let ollama_available = infos.iter().any(|i| i.name == "ollama" && i.available);
        let models = if ollama_available {
            self.registry.local_models().await
        } else {
            Vec::new()
        };

        let default_provider = self.default_provider().await;
        println!("{}", render::providers(&infos, &default_provider, &models));
        ExitCode::SUCCESS
    }

    /// `fallback`: the configured and effective order.
    pub async fn fallback(&self) -> ExitCode {
        let config = self.config.fallback();
        let configured = config.order();
        let available = self.available_names().await;
        let names: Vec<&str> = available.iter().map(String::as_str).collect();
        let preferred = resolve_default_provider(&self.config.default_ai_provider, &names);
        let effective = fallback_order(names.as_slice(), &preferred, configured.as_slice());

        println!(
            "{}",
            render::fallback(config.enabled, &configured, &effective, &preferred)
        );
        ExitCode::SUCCESS
    }

    /// `test`: sample questions sent directly to each available provider.
    pub async fn test(&self) -> ExitCode {
        let providers = self.registry.list_available().await;
        if providers.is_empty() {
            println!("No AI providers configured");
            return ExitCode::FAILURE;
        }

        for provider in &providers {
            println!("\nTesting {}", provider.display_name());
            println!("{}", "-".repeat(40));
            for (i, question) in TEST_QUESTIONS.iter().enumerate() {
                println!("\nTest {}: {question}", i + 1);
                println!("{}", self.probe(provider.as_ref(), question).await);
            }
        }
        ExitCode::SUCCESS
    }

    async fn probe(&self, provider: &dyn Provider, question: &str) -> String {
        let request = match QueryRequest::new(question) {
            Ok(request) => request.with_max_tokens(self.config.chat_max_tokens()),
            Err(e) => return format!("Error: {e}"),
        };
        match provider.query(&request).await {
            Ok(response) if response.trim().is_empty() => {
                "Response: [No response received]".to_string()
            }
            Ok(response) => format!(
                "Response: {}",
                render::preview(&response, render::TEST_PREVIEW_CHARS)
            ),
            Err(e) => format!("Error: {e}"),
        }
    }
}
