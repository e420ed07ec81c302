use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use weather_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelTool,
    ToolCallRequest,
};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message, or calls the first tool when the user
/// mentions a city.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.clone()),
            _ => None,
        });
        let first_tool = req.tools.first().map(|tool| tool.name.clone());

        async move {
            sleep(Duration::from_millis(1)).await;
            let Some(text) = last_user else {
                return Err(FakeModelProviderError(ErrorKind::Other));
            };

            if let (Some(tool), true) = (first_tool, text.contains("Berlin")) {
                return Ok(ModelResponse {
                    content: None,
                    tool_calls: vec![ToolCallRequest {
                        id: "call:0".to_owned(),
                        name: tool,
                        arguments: json!({ "cities": ["Berlin"] }),
                    }],
                    finish_reason: ModelFinishReason::ToolCalls,
                });
            }

            Ok(ModelResponse {
                content: Some(format!("You said {text}")),
                tool_calls: vec![],
                finish_reason: ModelFinishReason::Stop,
            })
        }
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![ModelMessage::User("Good morning".to_string())],
            tools: vec![],
        };
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("You said Good morning"));
        assert_eq!(resp.finish_reason, ModelFinishReason::Stop);
        assert!(resp.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_tool_call() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a weather expert.".to_owned()),
                ModelMessage::User("How warm is Berlin?".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "current_temperature".to_owned(),
                description: "Current temperature of cities".to_owned(),
                parameters: json!({ "type": "object" }),
            }],
        };
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.finish_reason, ModelFinishReason::ToolCalls);

        let msg = resp.to_message();
        assert_eq!(msg.content, None);
        assert_eq!(msg.tool_calls[0].name, "current_temperature");
        assert_eq!(msg.tool_calls[0].arguments, json!({ "cities": ["Berlin"] }));
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![],
            tools: vec![],
        };
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_message_serialization() {
        let msg = ModelMessage::assistant_text("Hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "content": { "content": "Hi", "tool_calls": [] }
            })
        );
        let back: ModelMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
