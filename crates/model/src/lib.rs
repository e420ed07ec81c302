//! The protocol between the agent and the models it talks to.
//!
//! Types in this crate describe requests, messages, tool definitions and
//! complete responses, so that the agent loop and the tools never depend on
//! a specific model vendor. They don't define any behavior, instead they are
//! the constraints that model providers should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
