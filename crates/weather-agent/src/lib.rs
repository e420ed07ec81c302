//! A weather agent that answers questions with live temperatures.
//!
//! The crate assembles the weather tools, an OpenAI-compatible model
//! provider and the agent loop. It includes a CLI demo for using in the
//! terminal, and you can also use it as a library: the tools can be invoked
//! directly, without going through a model.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod environment;
mod report;
mod session;
pub mod tools;

pub use environment::{
    API_KEY_VAR, BASE_URL_VAR, MODEL_VAR, ModelEnvironment, PROJECT_VAR,
};
pub use report::{ReportRow, render_table};
pub use session::{DEFAULT_SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`weather_agent_core`] crate.
pub mod core {
    pub use weather_agent_core::*;
}

/// Re-exports of [`weather_agent_fetch`] crate.
pub mod fetch {
    pub use weather_agent_fetch::*;
}
