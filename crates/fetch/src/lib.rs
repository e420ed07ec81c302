//! Batch fetching of scalar fields from remote JSON resources.
//!
//! A [`BatchFetcher`] takes a list of identifiers, issues one GET request
//! per identifier against a [`UrlTemplate`], and extracts one field from
//! each JSON body with a [`FieldPath`]. One identifier failing never hides
//! or reorders the outcomes of its siblings.
//!
//! ```no_run
//! use weather_agent_fetch::{
//!     BatchFetcher, FieldPath, HttpTransport, RecordKeys, UrlTemplate,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = BatchFetcher::new(
//!     HttpTransport::new(),
//!     UrlTemplate::new("https://wttr.in/")?.with_query("format=j1"),
//!     FieldPath::parse("current_condition[0].temp_C")?,
//!     RecordKeys::new("city", "temperature"),
//! );
//! let records = fetcher.fetch_records(["Berlin", "NY"]).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod fetcher;
mod outcome;
mod path;
mod template;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use fetcher::{BatchFetcher, FailurePolicy, FetchRequest};
pub use outcome::{BatchError, FailureReason, FetchOutcome, Record, RecordKeys};
pub use path::{ExtractError, FieldPath, FieldPathError, Segment};
pub use template::{UrlTemplate, UrlTemplateError};
pub use transport::{
    HttpTransport, Transport, TransportError, TransportResponse,
};
