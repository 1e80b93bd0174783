//! Paginated fetching over server-issued continuation URLs.
//!
//! A fetch moves through `FIRST_CALL -> {YIELDING <-> NEXT_CALL} -> DONE`:
//!
//! - the first call is built from the resource path and parameters,
//! - each non-empty page is handed out record by record,
//! - the next page is requested only when the previous page had data and a
//!   `paging.next` cursor, and only after its records were consumed,
//! - an empty first page yields a single empty [`Record`] sentinel,
//! - the fetch stops after `max_pages` non-empty pages no matter what the
//!   server says, since live time-series resources can page forever.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::error::{FetchError, ValidationError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::page::{decode_response, Page, Record};
use crate::request::{continuation_request, first_call_request, FetchRequest};
use crate::retry::RetryPolicy;

/// Issues Graph API calls and opens [`RecordStream`]s.
#[derive(Clone)]
pub struct PageFetcher {
    http_client: Arc<dyn HttpClient>,
    config: FetchConfig,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ValidationError> {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        config: FetchConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            http_client,
            retry: RetryPolicy::new(config.retry.clone()),
            config,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Starts a lazy fetch. No request is sent until the first `next()`.
    pub fn fetch(&self, request: FetchRequest) -> RecordStream<'_> {
        RecordStream {
            fetcher: self,
            phase: Phase::FirstCall(request),
            buffer: VecDeque::new(),
            pages_yielded: 0,
            calls_made: 0,
        }
    }

    /// Sends the first call once, without retries, and returns the raw page.
    ///
    /// Useful to check that a path and parameter set is accepted before
    /// starting a long fetch.
    pub async fn probe(&self, request: &FetchRequest) -> Result<Page, FetchError> {
        tracing::info!(path = request.path(), "probing first call");
        self.send(first_call_request(&self.config, request)).await
    }

    async fn first_call(
        &self,
        request: &FetchRequest,
        calls: &mut u32,
    ) -> Result<Page, FetchError> {
        let http = first_call_request(&self.config, request);
        tracing::debug!(url = %http.url, params = ?request.params().keys().collect::<Vec<_>>(), "first call");
        self.send_with_retry("first_call", http, calls).await
    }

    async fn next_call(&self, next_url: &str, calls: &mut u32) -> Result<Page, FetchError> {
        tracing::debug!(next = next_url, "paging next");
        let http = continuation_request(next_url, self.config.timeout_ms);
        self.send_with_retry("next_call", http, calls).await
    }

    async fn send_with_retry(
        &self,
        label: &str,
        http: HttpRequest,
        calls: &mut u32,
    ) -> Result<Page, FetchError> {
        self.retry
            .execute(label, FetchError::is_transient, || {
                *calls += 1;
                self.send(http.clone())
            })
            .await
    }

    async fn send(&self, http: HttpRequest) -> Result<Page, FetchError> {
        let response = self.http_client.execute(http).await.map_err(|error| {
            if error.retryable() {
                FetchError::http(None, error.message())
            } else {
                FetchError::InvalidRequest(error.message().to_owned())
            }
        })?;
        decode_response(&response)
    }
}

#[derive(Debug)]
enum Phase {
    FirstCall(FetchRequest),
    NextCall(String),
    Done,
}

/// Pull-based record stream for one fetch.
///
/// Records are returned in server order. After the stream returns `None` or
/// an error it stays exhausted.
pub struct RecordStream<'a> {
    fetcher: &'a PageFetcher,
    phase: Phase,
    buffer: VecDeque<Record>,
    pages_yielded: usize,
    calls_made: u32,
}

impl RecordStream<'_> {
    /// Returns the next record, fetching the next page when the current one
    /// is drained.
    pub async fn next(&mut self) -> Result<Option<Record>, FetchError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            let fetcher = self.fetcher;
            let result = match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return Ok(None),
                Phase::FirstCall(request) => fetcher
                    .first_call(&request, &mut self.calls_made)
                    .await
                    .map(|page| (page, true)),
                Phase::NextCall(url) => fetcher
                    .next_call(&url, &mut self.calls_made)
                    .await
                    .map(|page| (page, false)),
            };

            let (page, is_first) = result?;
            self.accept(page, is_first);
        }
    }

    fn accept(&mut self, page: Page, is_first: bool) {
        if page.data.is_empty() {
            if is_first {
                tracing::info!("first page carried no data, emitting empty sentinel record");
                self.buffer.push_back(Record::empty());
            }
            return;
        }

        self.buffer.extend(page.data);
        self.pages_yielded += 1;

        let ceiling = self.fetcher.config.max_pages;
        if self.pages_yielded >= ceiling {
            if page.next.is_some() {
                tracing::info!(ceiling, "page ceiling reached, remaining pages are not fetched");
            }
            return;
        }

        if let Some(next) = page.next {
            self.phase = Phase::NextCall(next);
        }
    }

    /// True once every record has been handed out and no call is pending.
    pub fn is_done(&self) -> bool {
        self.buffer.is_empty() && matches!(self.phase, Phase::Done)
    }

    /// Non-empty pages yielded so far.
    pub fn pages_yielded(&self) -> usize {
        self.pages_yielded
    }

    /// HTTP calls issued so far, retries included.
    pub fn calls_made(&self) -> u32 {
        self.calls_made
    }

    /// Drains the stream into memory.
    pub async fn collect_all(mut self) -> Result<Vec<Record>, FetchError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}
