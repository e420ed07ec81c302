//! Conversation-related types.

use weather_agent_model::{ModelMessage, ModelRequest, ModelTool};

/// Represents the messages exchanged while answering one question.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    /// Creates a conversation that starts with the given system prompt.
    #[inline]
    pub fn with_system_prompt(system_prompt: Option<&str>) -> Self {
        let mut conversation = Self::default();
        if let Some(prompt) = system_prompt {
            conversation.push(ModelMessage::System(prompt.to_owned()));
        }
        conversation
    }

    /// Appends a message and returns the item holding it.
    pub fn push(&mut self, msg: ModelMessage) -> &Item {
        let transcript = transcript_of(&msg);
        self.items.push(Item { msg, transcript });
        &self.items[self.items.len() - 1]
    }

    /// Returns the items of this conversation.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Builds a model request carrying every message so far.
    pub fn to_request(&self, tools: Vec<ModelTool>) -> ModelRequest {
        ModelRequest {
            messages: self.items.iter().map(|i| i.msg.clone()).collect(),
            tools,
        }
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
}

impl Item {
    /// Returns the message of this item.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }

    /// Returns the transcript of this item.
    ///
    /// The transcript is a string representation of the message item,
    /// which can be exported later. But transcript alone is not enough
    /// to reconstruct the message item.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

fn transcript_of(msg: &ModelMessage) -> String {
    match msg {
        ModelMessage::System(text) | ModelMessage::User(text) => text.clone(),
        ModelMessage::Assistant(msg) => {
            let calls: Vec<_> =
                msg.tool_calls.iter().map(|c| c.name.as_str()).collect();
            match (&msg.content, calls.is_empty()) {
                (Some(text), true) => text.clone(),
                (Some(text), false) => {
                    format!("{text} [calls: {}]", calls.join(", "))
                }
                (None, true) => String::new(),
                (None, false) => format!("[calls: {}]", calls.join(", ")),
            }
        }
        ModelMessage::Tool(result) => result.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weather_agent_model::{AssistantMessage, ToolCallRequest};

    use super::*;

    #[test]
    fn test_to_request() {
        let mut conversation =
            Conversation::with_system_prompt(Some("Be brief."));
        conversation.push(ModelMessage::User("Hot in LA?".to_owned()));
        conversation.push(ModelMessage::Assistant(AssistantMessage {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "1".to_owned(),
                name: "current_temperature".to_owned(),
                arguments: json!({ "cities": ["LA"] }),
            }],
        }));

        let transcripts: Vec<_> =
            conversation.items().iter().map(Item::transcript).collect();
        assert_eq!(
            transcripts,
            ["Be brief.", "Hot in LA?", "[calls: current_temperature]"]
        );

        let request = conversation.to_request(vec![]);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(
            request.messages[0],
            ModelMessage::System("Be brief.".to_owned())
        );
    }
}
