//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use weather_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse,
};

pub use preset::*;

/// Every response is delivered asynchronously, after this delay.
const RESPONSE_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// number of assistant messages in the request, so the first request of a
/// conversation gets the first step, the request carrying the results of the
/// first step's tool calls gets the second one, and so on. If there are no
/// enough steps in the script, an error will be returned.
///
/// Clones share the same attempt counters, which makes the preset failures
/// observable across clones.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    attempts: Arc<Mutex<Vec<u64>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn respond(&self, req: &ModelRequest) -> Result<ModelResponse, Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::Assistant(_)))
            .count();
        let Some(preset) = self.script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };

        if let Some(failures) = preset.failures {
            let attempt = {
                let Ok(mut attempts) = self.attempts.lock() else {
                    return Err(Error {
                        message: "poisoned attempt counter",
                        kind: ErrorKind::Other,
                    });
                };
                if attempts.len() <= step_idx {
                    attempts.resize(step_idx + 1, 0);
                }
                attempts[step_idx] += 1;
                attempts[step_idx]
            };
            if failures == 0 || attempt <= failures {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
        }

        let finish_reason = if preset.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };
        Ok(ModelResponse {
            content: preset.content.clone(),
            tool_calls: preset.tool_calls.clone(),
            finish_reason,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        let result = self.respond(req);
        async move {
            sleep(RESPONSE_DELAY).await;
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weather_agent_model::{ModelTool, ToolCallResult};

    use super::*;

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_assistant_response_step(PresetResponse::with_tool_call(
            "tool:1",
            "current_temperature",
            json!({ "cities": ["Berlin"] }),
        ));
        provider.add_assistant_response_step(PresetResponse::with_text(
            "It is 21 degrees in Berlin.",
        ));

        let mut req = ModelRequest {
            messages: vec![ModelMessage::User(
                "What is the temperature today in Berlin?".to_owned(),
            )],
            tools: vec![ModelTool {
                name: "current_temperature".to_owned(),
                description: "Current temperature of cities".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "cities": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    }
                }),
            }],
        };
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.finish_reason, ModelFinishReason::ToolCalls);
        assert_eq!(resp.tool_calls[0].name, "current_temperature");

        req.messages.push(ModelMessage::Assistant(resp.to_message()));
        req.messages.push(ModelMessage::Tool(ToolCallResult {
            id: "tool:1".to_owned(),
            content: r#"[{"city":"Berlin","temperature":"21"}]"#.to_owned(),
        }));
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.finish_reason, ModelFinishReason::Stop);
        assert_eq!(resp.content.as_deref(), Some("It is 21 degrees in Berlin."));

        assert_eq!(provider.requests().len(), 2);

        // The script has been exhausted.
        req.messages.push(ModelMessage::Assistant(resp.to_message()));
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_preset_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_assistant_response_step(
            PresetResponse::with_text("finally").with_failures(2),
        );
        let req = ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        };

        let cloned = provider.clone();
        for _ in 0..2 {
            let err = cloned.send_request(&req).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        }
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("finally"));
    }
}
