mod builder;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use tracing::Instrument;
use weather_agent_model::{ModelMessage, ModelProviderError};

use crate::conversation::Conversation;
use crate::model_client::ModelClient;
use crate::tool::ToolSet;
pub use crate::model_client::RetryConfig;
pub use builder::AgentBuilder;

/// Where a piece of transcript comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TranscriptSource {
    /// The question asked by the user.
    User,
    /// Text generated by the model.
    Assistant,
    /// Output of a tool call.
    Tool,
}

pub(crate) type TranscriptFn =
    Arc<dyn Fn(&str, TranscriptSource) + Send + Sync>;

/// The outcome of a successful [`Agent::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentRun {
    /// The final answer of the model.
    pub answer: String,
    /// Names of the tools invoked while answering, in call order.
    pub invoked_tools: Vec<String>,
    /// Number of model requests made.
    pub steps: usize,
}

impl AgentRun {
    /// Returns a one-line summary suitable for a report cell.
    ///
    /// A run that invoked tools is summarized as `function:<names>`, each
    /// name listed once in first-call order. Otherwise the answer is
    /// collapsed to a single line.
    pub fn summary(&self) -> String {
        if !self.invoked_tools.is_empty() {
            let mut names: Vec<&str> = vec![];
            for name in &self.invoked_tools {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            return format!("function:{}", names.join(","));
        }
        self.answer.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Error returned by [`Agent::run`].
#[derive(Debug)]
pub enum AgentError {
    /// The model provider failed, after retries if the failure was
    /// transient.
    Model(Box<dyn ModelProviderError>),
    /// The model kept requesting tools beyond the step limit.
    StepLimitExceeded(usize),
}

impl Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Model(err) => write!(f, "model error: {err}"),
            AgentError::StepLimitExceeded(steps) => {
                write!(f, "no answer within {steps} steps")
            }
        }
    }
}

impl StdError for AgentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AgentError::Model(err) => Some(&**err),
            AgentError::StepLimitExceeded(_) => None,
        }
    }
}

/// An agent that answers questions with a model and a set of tools.
///
/// Every call to [`Agent::run`] starts from a fresh conversation, so
/// questions don't share any history.
pub struct Agent {
    model_client: ModelClient,
    system_prompt: Option<String>,
    tools: ToolSet,
    max_steps: usize,
    on_transcript: Option<TranscriptFn>,
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            mut model_client,
            system_prompt,
            tools,
            max_steps,
            retry,
            on_transcript,
        } = builder;
        model_client.set_retry(retry);
        Self {
            model_client,
            system_prompt,
            tools,
            max_steps,
            on_transcript,
        }
    }

    /// Returns the tools offered to the model.
    #[inline]
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Answers a single question.
    pub async fn run<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<AgentRun, AgentError> {
        let input = input.into();
        self.run_inner(input).instrument(debug_span!("agent run")).await
    }

    async fn run_inner(&self, input: String) -> Result<AgentRun, AgentError> {
        let mut conversation =
            Conversation::with_system_prompt(self.system_prompt.as_deref());
        let item = conversation.push(ModelMessage::User(input));
        self.emit(item.transcript(), TranscriptSource::User);

        let definitions = self.tools.definitions();
        let mut invoked_tools = vec![];

        for step in 1..=self.max_steps {
            let request = conversation.to_request(definitions.clone());
            let resp = self
                .model_client
                .send_request(request)
                .await
                .map_err(AgentError::Model)?;
            debug!("step {step} finished: {:?}", resp.finish_reason);

            let item =
                conversation.push(ModelMessage::Assistant(resp.to_message()));
            if !item.transcript().is_empty() {
                self.emit(item.transcript(), TranscriptSource::Assistant);
            }

            if resp.tool_calls.is_empty() {
                return Ok(AgentRun {
                    answer: resp.content.unwrap_or_default(),
                    invoked_tools,
                    steps: step,
                });
            }

            invoked_tools
                .extend(resp.tool_calls.iter().map(|call| call.name.clone()));
            for result in self.tools.execute_all(resp.tool_calls).await {
                let item = conversation.push(ModelMessage::Tool(result));
                self.emit(item.transcript(), TranscriptSource::Tool);
            }
        }

        warn!("gave up after {} steps", self.max_steps);
        Err(AgentError::StepLimitExceeded(self.max_steps))
    }

    #[inline]
    fn emit(&self, transcript: &str, source: TranscriptSource) {
        if let Some(on_transcript) = &self.on_transcript {
            on_transcript(transcript, source);
        }
    }
}

impl Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("system_prompt", &self.system_prompt)
            .field("tools", &self.tools)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}
