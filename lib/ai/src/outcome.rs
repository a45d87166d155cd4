//! Attempt log and query outcome.
//!
//! `OutcomeBuilder` collects attempt records for one orchestrated query and
//! produces the `QueryOutcome` handed back to the caller. A successful
//! attempt consumes the builder, so no record can follow a success.

use crate::classify::{ErrorCategory, classify};
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use courier_core::QueryId;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Status of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The provider call is in flight.
    Attempting,
    /// The provider returned non-empty text.
    Success,
    /// The call succeeded but produced no text.
    EmptyResponse,
    /// The call failed.
    Error,
}

/// Log entry for one provider invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Provider name.
    pub provider: String,
    /// Model the request resolved to.
    pub model: String,
    /// 1-based position in the fallback sequence.
    pub position: usize,
    /// Outcome of the attempt.
    pub status: AttemptStatus,
    /// Diagnostic message when the status is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Advisory category of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    /// Time spent in the provider call.
    pub latency_ms: u64,
}

/// How an orchestrated query ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// A provider produced a response.
    Succeeded {
        /// The provider that answered.
        provider: String,
        /// Whether it differs from the requested provider.
        fell_back: bool,
    },
    /// Providers were tried and none produced a response.
    AllFailed,
    /// No provider could be tried at all.
    NoProviders,
}

/// Aggregate result of one orchestrated query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Identifier of this query.
    pub id: QueryId,
    /// Provider the caller asked for.
    pub requested_provider: String,
    /// Final response text, present iff an attempt succeeded.
    pub response: Option<String>,
    /// Provider that produced the response.
    pub provider_used: Option<String>,
    /// Every attempt, in the order it was made.
    pub attempts: Vec<AttemptRecord>,
    /// Diagnostic strings collected along the way.
    pub errors: Vec<String>,
    /// When the query finished.
    pub completed_at: DateTime<Utc>,
}

impl QueryOutcome {
    /// Returns how the query ended.
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        match (&self.provider_used, self.attempts.is_empty()) {
            (Some(provider), _) => OutcomeStatus::Succeeded {
                provider: provider.clone(),
                fell_back: !provider.eq_ignore_ascii_case(&self.requested_provider),
            },
            (None, true) => OutcomeStatus::NoProviders,
            (None, false) => OutcomeStatus::AllFailed,
        }
    }

    /// Returns true if a response was produced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response.is_some()
    }

    /// Returns true if a provider other than the requested one answered.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        matches!(self.status(), OutcomeStatus::Succeeded { fell_back: true, .. })
    }

    /// One-line description for display.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.status() {
            OutcomeStatus::Succeeded {
                provider,
                fell_back: false,
            } => format!("answered by {provider}"),
            OutcomeStatus::Succeeded {
                provider,
                fell_back: true,
            } => format!(
                "answered by {provider} (fallback from {})",
                self.requested_provider
            ),
            OutcomeStatus::AllFailed => {
                format!("all {} attempted providers failed", self.attempts.len())
            }
            OutcomeStatus::NoProviders => "no provider could be tried".to_string(),
        }
    }
}

/// Builds a `QueryOutcome` one attempt at a time.
#[derive(Debug)]
pub struct OutcomeBuilder {
    id: QueryId,
    requested_provider: String,
    attempts: Vec<AttemptRecord>,
    errors: Vec<String>,
    started: Option<Instant>,
}

impl OutcomeBuilder {
    /// Starts an outcome for a query aimed at `requested_provider`.
    #[must_use]
    pub fn new(id: QueryId, requested_provider: impl Into<String>) -> Self {
        Self {
            id,
            requested_provider: requested_provider.into(),
            attempts: Vec::new(),
            errors: Vec::new(),
            started: None,
        }
    }

    /// The query identifier.
    #[must_use]
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Records a new attempt with status `Attempting` and returns its position.
    pub fn begin_attempt(&mut self, provider: impl Into<String>, model: impl Into<String>) -> usize {
        let position = self.attempts.len() + 1;
        self.attempts.push(AttemptRecord {
            provider: provider.into(),
            model: model.into(),
            position,
            status: AttemptStatus::Attempting,
            error: None,
            error_category: None,
            latency_ms: 0,
        });
        self.started = Some(Instant::now());
        position
    }

    /// Marks the current attempt as having returned no text.
    pub fn record_empty(&mut self) {
        if let Some(attempt) = self.settle(AttemptStatus::EmptyResponse) {
            let message = format!("{}: Empty response", attempt.provider);
            self.errors.push(message);
        }
    }

    /// Marks the current attempt as failed and returns the error category.
    pub fn record_error(&mut self, error: &LlmError) -> ErrorCategory {
        let message = error.to_string();
        let category = classify(&message);
        if let Some(attempt) = self.settle(AttemptStatus::Error) {
            attempt.error = Some(message.clone());
            attempt.error_category = Some(category);
            let line = format!("{}: {message}", attempt.provider);
            self.errors.push(line);
        }
        category
    }

    /// Adds a diagnostic that is not tied to an attempt.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Marks the current attempt successful and finishes the outcome.
    #[must_use]
    pub fn succeed(mut self, response: String) -> QueryOutcome {
        let provider = self
            .settle(AttemptStatus::Success)
            .map(|attempt| attempt.provider.clone());
        let mut outcome = self.finish();
        if provider.is_some() {
            outcome.response = Some(response);
            outcome.provider_used = provider;
        }
        outcome
    }

    /// Finishes the outcome without a response.
    #[must_use]
    pub fn finish(self) -> QueryOutcome {
        QueryOutcome {
            id: self.id,
            requested_provider: self.requested_provider,
            response: None,
            provider_used: None,
            attempts: self.attempts,
            errors: self.errors,
            completed_at: Utc::now(),
        }
    }

    /// Settles the in-flight attempt, if there is one.
    fn settle(&mut self, status: AttemptStatus) -> Option<&mut AttemptRecord> {
        let started = self.started.take();
        let attempt = self
            .attempts
            .last_mut()
            .filter(|attempt| attempt.status == AttemptStatus::Attempting)?;
        attempt.status = status;
        attempt.latency_ms = started
            .map(|t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Some(attempt)
    }
}
