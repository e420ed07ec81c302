use std::fmt::{self, Display};

use bytes::Bytes;
use reqwest::{Client, Url};

/// A fully received response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Creates a response with the given status and body.
    #[inline]
    pub fn new<B: Into<Bytes>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A network-level failure, such as a DNS error, a refused connection or a
/// timeout imposed by the underlying client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// Something that can perform a GET request.
///
/// Implementations should be cheap to share, the fetcher calls `get` once
/// per identifier and never retries.
pub trait Transport: Send + Sync + 'static {
    /// Performs a GET request and returns the full response.
    ///
    /// The returned future must be independent of `self`.
    fn get(
        &self,
        url: Url,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>>
    + Send
    + 'static;
}

/// A [`Transport`] backed by [`reqwest`], with the client defaults for
/// timeouts and redirects.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport with a preconfigured client.
    #[inline]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        url: Url,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>>
    + Send
    + 'static {
        let resp_fut = self.client.get(url).send();
        async move {
            let resp = resp_fut
                .await
                .map_err(|err| TransportError::new(err.to_string()))?;
            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|err| TransportError::new(err.to_string()))?;
            Ok(TransportResponse { status, body })
        }
    }
}
