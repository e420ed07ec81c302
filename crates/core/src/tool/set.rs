use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::Instrument;
use weather_agent_model::{ModelTool, ToolCallRequest, ToolCallResult};

use crate::tool::{
    AnyTool, BoxedToolFuture, Error, Tool, ToolObject, ToolResult,
};

/// A set of tools that can be offered to the model, keyed by tool name.
///
/// Registering a tool with an existing name replaces the previous one.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn ToolObject>>,
}

impl ToolSet {
    /// Registers a tool.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        if self.tools.insert(name, Arc::new(AnyTool(tool))).is_some() {
            debug!("replaced an existing tool");
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the tool definitions, sorted by name.
    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Executes the requested calls concurrently.
    ///
    /// The results are in the same order as `requests`, and every request
    /// gets a result. A call to an unknown tool or with invalid arguments is
    /// answered with an error text, so that the model can correct itself.
    pub async fn execute_all(
        &self,
        requests: Vec<ToolCallRequest>,
    ) -> Vec<ToolCallResult> {
        let calls = requests.into_iter().map(|req| {
            let fut: BoxedToolFuture = match self.tools.get(&req.name) {
                Some(tool) => {
                    trace!(
                        "calling {} ({}): {}",
                        req.name, req.id, req.arguments
                    );
                    tool.execute(req.arguments)
                }
                None => {
                    warn!("tool not found: {}", req.name);
                    let err = Error::invalid_input()
                        .with_reason(format!("unknown tool `{}`", req.name));
                    Box::pin(std::future::ready(Err(err)))
                }
            };
            let id = req.id;
            let span = debug_span!("tool execute", tool = %req.name);
            async move {
                ToolCallResult {
                    content: result_text(fut.await),
                    id,
                }
            }
            .instrument(span)
        });
        join_all(calls).await
    }
}

impl Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}

fn result_text(result: ToolResult) -> String {
    match result {
        Ok(content) => content,
        Err(err) => {
            debug!("tool call failed: {err}");
            format!("error: {err}")
        }
    }
}
