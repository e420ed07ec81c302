use std::num::NonZeroUsize;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use reqwest::Url;
use serde_json::Value;
use tracing::Instrument;

use crate::outcome::{BatchError, FailureReason, FetchOutcome, RecordKeys};
use crate::path::FieldPath;
use crate::template::UrlTemplate;
use crate::transport::Transport;

/// Decides which per-identifier failures a batch recovers from.
///
/// Non-200 statuses and identifiers without a URL are always recovered and
/// reported as a failed outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Every failure is reported as a failed outcome and the batch continues.
    #[default]
    Isolate,
    /// Malformed responses and transport errors abort the whole batch.
    ///
    /// Strict batches run one request at a time, whatever the concurrency
    /// limit is.
    Strict,
}

/// A request for one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// The requested identifier.
    pub identifier: String,
    /// The rendered URL.
    pub url: Url,
}

#[derive(Clone)]
struct Config {
    template: UrlTemplate,
    field_path: FieldPath,
    keys: RecordKeys,
    policy: FailurePolicy,
    max_in_flight: NonZeroUsize,
}

/// Fetches a named scalar field from a remote JSON resource for every
/// identifier in a batch.
///
/// Each call produces exactly one outcome per identifier, in input order.
/// Nothing is cached or deduplicated across or within calls.
pub struct BatchFetcher<T> {
    transport: Arc<T>,
    config: Arc<Config>,
}

impl<T> Clone for BatchFetcher<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Transport> BatchFetcher<T> {
    /// Creates a sequential, isolating fetcher.
    pub fn new(
        transport: T,
        template: UrlTemplate,
        field_path: FieldPath,
        keys: RecordKeys,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(Config {
                template,
                field_path,
                keys,
                policy: FailurePolicy::default(),
                max_in_flight: NonZeroUsize::MIN,
            }),
        }
    }

    /// Sets the failure policy.
    #[inline]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        Arc::make_mut(&mut self.config).policy = policy;
        self
    }

    /// Allows up to `max_in_flight` requests to run at the same time.
    ///
    /// Outcomes are still returned in input order. Ignored under
    /// [`FailurePolicy::Strict`].
    #[inline]
    pub fn with_max_in_flight(mut self, max_in_flight: NonZeroUsize) -> Self {
        Arc::make_mut(&mut self.config).max_in_flight = max_in_flight;
        self
    }

    /// Returns the keys used by [`Self::fetch_records`].
    #[inline]
    pub fn keys(&self) -> &RecordKeys {
        &self.config.keys
    }

    /// Returns the failure policy.
    #[inline]
    pub fn policy(&self) -> FailurePolicy {
        self.config.policy
    }

    /// Builds the request for `identifier`, or `None` if the identifier has
    /// no URL.
    #[inline]
    pub fn request_for(&self, identifier: &str) -> Option<FetchRequest> {
        let url = self.config.template.render(identifier)?;
        Some(FetchRequest {
            identifier: identifier.to_owned(),
            url,
        })
    }

    /// Fetches every identifier and returns the outcomes in input order.
    ///
    /// Under [`FailurePolicy::Strict`], the first malformed response or
    /// transport error aborts the batch and no further requests are issued.
    pub async fn fetch<I, S>(
        &self,
        identifiers: I,
    ) -> Result<Vec<FetchOutcome>, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identifiers: Vec<String> = identifiers
            .into_iter()
            .map(|id| id.as_ref().to_owned())
            .collect();
        let mut outcomes = Vec::with_capacity(identifiers.len());
        if identifiers.is_empty() {
            return Ok(outcomes);
        }

        // A strict batch must not issue requests past a fatal failure.
        let max_in_flight = match self.config.policy {
            FailurePolicy::Isolate => self.config.max_in_flight.get(),
            FailurePolicy::Strict => 1,
        };
        debug!(count = identifiers.len(), max_in_flight, "fetching batch");

        let mut pending = stream::iter(identifiers)
            .map(|identifier| self.fetch_one(identifier))
            .buffered(max_in_flight);

        while let Some(outcome) = pending.next().await {
            outcomes.push(self.apply_policy(outcome)?);
        }
        Ok(outcomes)
    }

    /// Same as [`Self::fetch`], but returns flat records as JSON values.
    pub async fn fetch_records<I, S>(
        &self,
        identifiers: I,
    ) -> Result<Vec<Value>, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let outcomes = self.fetch(identifiers).await?;
        let keys = &self.config.keys;
        Ok(outcomes
            .iter()
            .map(|outcome| outcome.record(keys).to_value())
            .collect())
    }

    async fn fetch_one(&self, identifier: String) -> FetchOutcome {
        let Some(FetchRequest { identifier, url }) =
            self.request_for(&identifier)
        else {
            warn!("`{identifier}` cannot be used in a URL path, skipping");
            return FetchOutcome::Failure {
                identifier,
                reason: FailureReason::InvalidIdentifier,
            };
        };
        let span = debug_span!("fetch", identifier = %identifier);
        let result = async {
            trace!("GET {url}");
            let resp = self
                .transport
                .get(url)
                .await
                .map_err(|err| FailureReason::Transport(err.to_string()))?;
            if resp.status != 200 {
                return Err(FailureReason::Status(resp.status));
            }
            self.config
                .field_path
                .extract_from_bytes(&resp.body)
                .map_err(FailureReason::Malformed)
        }
        .instrument(span)
        .await;

        match result {
            Ok(value) => FetchOutcome::Success { identifier, value },
            Err(reason) => {
                warn!("fetching `{identifier}` failed: {reason}");
                FetchOutcome::Failure { identifier, reason }
            }
        }
    }

    fn apply_policy(
        &self,
        outcome: FetchOutcome,
    ) -> Result<FetchOutcome, BatchError> {
        if self.config.policy == FailurePolicy::Isolate {
            return Ok(outcome);
        }
        match outcome {
            FetchOutcome::Failure {
                identifier,
                reason:
                    reason @ (FailureReason::Malformed(_)
                    | FailureReason::Transport(_)),
            } => Err(BatchError::new(identifier, reason)),
            outcome => Ok(outcome),
        }
    }
}
