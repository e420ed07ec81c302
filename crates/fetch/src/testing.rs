//! An in-memory transport for testing purpose.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Url;

use crate::transport::{Transport, TransportError, TransportResponse};

#[derive(Clone)]
enum Preset {
    Response(TransportResponse, Option<Duration>),
    Error(TransportError),
}

/// A transport that answers from a fixed table of URLs.
///
/// URLs without a preset answer `404` with an empty body. Clones share the
/// same table and call log.
#[derive(Clone, Default)]
pub struct StaticTransport {
    presets: Arc<Mutex<HashMap<String, Preset>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl StaticTransport {
    /// Answers `url` with `status` and `body`.
    pub fn respond<B: Into<bytes::Bytes>>(
        &self,
        url: &str,
        status: u16,
        body: B,
    ) -> &Self {
        self.insert(
            url,
            Preset::Response(TransportResponse::new(status, body), None),
        )
    }

    /// Answers `url` after sleeping for `delay`.
    pub fn respond_after<B: Into<bytes::Bytes>>(
        &self,
        url: &str,
        delay: Duration,
        status: u16,
        body: B,
    ) -> &Self {
        self.insert(
            url,
            Preset::Response(TransportResponse::new(status, body), Some(delay)),
        )
    }

    /// Fails `url` with a transport error.
    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.insert(url, Preset::Error(TransportError::new(message)))
    }

    /// Returns the URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns the highest number of requests that were running at once.
    #[inline]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn insert(&self, url: &str, preset: Preset) -> &Self {
        if let Ok(mut presets) = self.presets.lock() {
            presets.insert(url.to_owned(), preset);
        }
        self
    }
}

impl Transport for StaticTransport {
    fn get(
        &self,
        url: Url,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>>
    + Send
    + 'static {
        let url = url.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.clone());
        }
        let preset = self
            .presets
            .lock()
            .ok()
            .and_then(|presets| presets.get(&url).cloned())
            .unwrap_or_else(|| {
                Preset::Response(TransportResponse::new(404, ""), None)
            });

        let in_flight = Arc::clone(&self.in_flight);
        let max_in_flight = Arc::clone(&self.max_in_flight);
        async move {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            let result = match preset {
                Preset::Response(resp, delay) => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(resp)
                }
                Preset::Error(err) => Err(err),
            };
            in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}
