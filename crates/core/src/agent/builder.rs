use std::sync::Arc;

use weather_agent_model::ModelProvider;

use super::{Agent, TranscriptFn, TranscriptSource};
use crate::model_client::{ModelClient, RetryConfig};
use crate::tool::{Tool, ToolSet};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) system_prompt: Option<String>,
    pub(crate) tools: ToolSet,
    pub(crate) max_steps: usize,
    pub(crate) retry: RetryConfig,
    pub(crate) on_transcript: Option<TranscriptFn>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            tools: ToolSet::default(),
            max_steps: 8,
            retry: RetryConfig::default(),
            on_transcript: None,
        }
    }

    /// Sets the system prompt sent at the start of every conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Limits the number of model requests per question. Zero is treated
    /// as one.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Sets how rate-limited requests are retried.
    #[inline]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Attaches a callback to be invoked for every piece of transcript.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str, TranscriptSource) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
