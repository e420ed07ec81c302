use weather_agent_core::{
    Agent, AgentBuilder, AgentError, AgentRun, RetryConfig, TranscriptSource,
};
use weather_agent_fetch::Transport;
use weather_agent_model::ModelProvider;

use crate::tools::WeatherTool;

/// The system prompt used when none is set.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a weather expert. If the \
    question is not about the weather, say: I don't know.";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    system_prompt: String,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets how rate-limited model requests are retried.
    #[inline]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.agent_builder = self.agent_builder.with_retry(retry);
        self
    }

    /// Attaches a callback to be invoked when a transcript is generated.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str, TranscriptSource) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_transcript(on_transcript);
        self
    }

    /// Builds a new session whose weather tools fetch through `transport`.
    pub fn build<T: Transport + Clone>(self, transport: T) -> Session {
        let agent = self
            .agent_builder
            .with_system_prompt(self.system_prompt)
            .with_tool(WeatherTool::current_temperature(transport.clone()))
            .with_tool(WeatherTool::today_maximal_temperature(transport))
            .build();

        Session { agent }
    }
}

/// A question-answering session with both weather tools registered.
///
/// The session holds a fully configured agent that you can use directly, and
/// it is basically a wrapper around [`Agent`].
pub struct Session {
    agent: Agent,
}

impl Session {
    /// Asks a question. Questions are answered independently.
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<AgentRun, AgentError> {
        self.agent.run(question).await
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}
