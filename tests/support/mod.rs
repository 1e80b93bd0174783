//! Scripted transport shared by the behavior tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use adarchive_core::{
    FetchConfig, HttpClient, HttpError, HttpRequest, HttpResponse, RetryConfig,
};

/// Replays queued responses in order and records every request it sees.
/// Once the script runs out, every further call fails with a 599.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, body: &str) -> Self {
        self.respond(Ok(HttpResponse::ok_json(body)))
    }

    pub fn status(self, status: u16, body: &str) -> Self {
        self.respond(Ok(HttpResponse::with_status(status, body)))
    }

    pub fn transport_error(self, message: &str) -> Self {
        self.respond(Err(HttpError::new(message)))
    }

    pub fn respond(self, response: Result<HttpResponse, HttpError>) -> Self {
        self.script
            .lock()
            .expect("script should not be poisoned")
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self
            .script
            .lock()
            .expect("script should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::with_status(599, "script exhausted")));
        Box::pin(async move { response })
    }
}

/// Test configuration: fake base URL and retries without sleeping.
pub fn config(max_attempts: u32) -> FetchConfig {
    FetchConfig::default()
        .with_base_url("https://graph.example.test")
        .with_api_version("v21.0")
        .with_access_token("test-token")
        .with_retry(RetryConfig::fixed(Duration::ZERO, max_attempts))
}
