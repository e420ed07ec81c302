use serde::{Deserialize, Serialize};
use serde_json::Value;
use weather_agent_model::ToolCallRequest;

/// The preset response for an assistant step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Text of the response, if any.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls requested by the response.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a text-only `PresetResponse`.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates a `PresetResponse` that calls a single tool.
    #[inline]
    pub fn with_tool_call<I, N>(id: I, name: N, arguments: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self::default().and_tool_call(id, name, arguments)
    }

    /// Adds another tool call to the response.
    #[inline]
    pub fn and_tool_call<I, N>(mut self, id: I, name: N, arguments: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        self.tool_calls.push(ToolCallRequest {
            id: id.into(),
            name: name.into(),
            arguments,
        });
        self
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_tool_call(
            "1",
            "current_temperature",
            json!({ "cities": ["LA", "NY"] }),
        )
        .with_failures(2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_minimal() {
        let preset: PresetResponse =
            serde_json::from_str(r#"{ "content": "I don't know." }"#).unwrap();
        assert_eq!(preset, PresetResponse::with_text("I don't know."));
    }
}
