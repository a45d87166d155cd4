//! Provider orchestration for courier.
//!
//! This crate decides which text-generation backend answers a prompt:
//!
//! - **Providers**: ChatGPT and Gemini (remote, key-based) and Ollama
//!   (local daemon) behind one `Provider` trait
//! - **Registry**: the configured providers, filtered by availability
//! - **Fallback orchestrator**: tries providers in priority order until one
//!   answers, recording every attempt
//! - **Classifier**: advisory categories for failed attempts
//!
//! Prompt assembly and presentation of the outcome are left to the caller.

pub mod backend;
pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod outcome;
pub mod providers;
pub mod registry;

pub use backend::{Provider, ProviderInfo, ProviderKind, QueryOptions, QueryRequest};
pub use classify::{ErrorCategory, classify};
pub use config::{FallbackConfig, KeyedProviderConfig, LocalProviderConfig, ProvidersConfig};
pub use error::{ConfigError, LlmError};
pub use fallback::{FallbackOrchestrator, fallback_order};
pub use outcome::{AttemptRecord, AttemptStatus, OutcomeBuilder, OutcomeStatus, QueryOutcome};
pub use providers::{ChatGptProvider, GeminiProvider, OllamaProvider};
pub use registry::ProviderRegistry;
