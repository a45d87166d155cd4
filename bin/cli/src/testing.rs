//! Scripted provider shared by the command tests.

use async_trait::async_trait;
use courier_ai::{LlmError, Provider, ProviderKind, ProviderRegistry, QueryRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Provider that replays scripted replies and remembers prompts.
pub(crate) struct ScriptedProvider {
    name: String,
    available: bool,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn new(name: &str, available: bool) -> Self {
        Self {
            name: name.to_string(),
            available,
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(self, reply: Result<&str, LlmError>) -> Self {
        self.replies
            .lock()
            .expect("lock")
            .push_back(reply.map(str::to_string));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::KeyBased
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn query(&self, request: &QueryRequest) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("lock")
            .push(request.prompt().to_string());
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok("scripted reply".to_string()))
    }
}

pub(crate) fn registry_of(providers: Vec<Arc<ScriptedProvider>>) -> Arc<ProviderRegistry> {
    let providers = providers
        .into_iter()
        .map(|p| p as Arc<dyn Provider>)
        .collect();
    Arc::new(ProviderRegistry::new(providers).expect("registry"))
}
