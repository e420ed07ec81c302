use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracing::Instrument;
use weather_agent_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};

type SendRequestResult = Result<ModelResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, RetryConfig) -> BoxedSendRequestFuture + Send + Sync
>;

/// How model requests are retried when the provider is rate limited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay before the first retry. Later delays grow exponentially.
    pub initial_interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub max_elapsed_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_elapsed_time: Duration::from_secs(30),
        }
    }
}

/// A wrapper around a model provider that retries transient failures and
/// provides a type-erased interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    retry: RetryConfig,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let provider = Arc::new(provider);
        let handler_fn: HandlerFn = Arc::new(move |req, retry| {
            let provider = Arc::clone(&provider);
            Box::pin(
                async move {
                    trace!("got a request: {req:?}");
                    send_with_retry(&*provider, &req, retry).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            retry: RetryConfig::default(),
        }
    }

    #[inline]
    pub fn set_retry(&mut self, retry: RetryConfig) {
        self.retry = retry;
    }

    /// Sends a request and returns the complete response.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req, self.retry).await
    }
}

async fn send_with_retry<P: ModelProvider>(
    provider: &P,
    req: &ModelRequest,
    retry: RetryConfig,
) -> SendRequestResult {
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(retry.initial_interval)
        .with_max_elapsed_time(Some(retry.max_elapsed_time))
        .build();

    let operation = || {
        let fut = provider.send_request(req);
        async move {
            fut.await.map_err(|err| {
                let err: Box<dyn ModelProviderError> = Box::new(err);
                if err.kind() == ErrorKind::RateLimitExceeded {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        }
    };
    let notify = |err: Box<dyn ModelProviderError>, delay: Duration| {
        warn!("model request failed ({err}), retrying in {delay:?}");
    };

    let result =
        backoff::future::retry_notify(backoff, operation, notify).await;
    match &result {
        Ok(resp) => trace!("finished a request: {:?}", resp.finish_reason),
        Err(err) => error!("got an error: {err}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use weather_agent_model::ModelMessage;
    use weather_agent_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            initial_interval: Duration::from_millis(1),
            max_elapsed_time: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_assistant_response_step(PresetResponse::with_text("Hello!"));

        let model_client = ModelClient::new(model_provider);
        for _ in 0..3 {
            let resp = model_client.send_request(request()).await.unwrap();
            assert_eq!(resp.content.as_deref(), Some("Hello!"));
        }
    }

    #[tokio::test]
    async fn test_retry_rate_limited() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::with_text("Hello!").with_failures(2),
        );

        let mut model_client = ModelClient::new(model_provider.clone());
        model_client.set_retry(fast_retry());
        let resp = model_client.send_request(request()).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("Hello!"));
        assert_eq!(model_provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_give_up_when_always_rate_limited() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::with_text("never").with_failures(0),
        );

        let mut model_client = ModelClient::new(model_provider);
        model_client.set_retry(fast_retry());
        let err = model_client.send_request(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_no_retry_for_other_errors() {
        // An empty script fails with `ErrorKind::Other`.
        let model_provider = TestModelProvider::default();
        let mut model_client = ModelClient::new(model_provider.clone());
        model_client.set_retry(fast_retry());
        let err = model_client.send_request(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(model_provider.requests().len(), 1);
    }
}
