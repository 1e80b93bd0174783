//! Request construction for first and continuation calls.
//!
//! Large query strings are not safe to send as GET, so every call is a POST
//! carrying a `method=GET` override that the Graph API honours as a read.
//! The functions here are pure: they never touch the network.

use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use crate::config::FetchConfig;
use crate::error::ValidationError;
use crate::http_client::HttpRequest;

pub const METHOD_OVERRIDE_KEY: &str = "method";
pub const METHOD_OVERRIDE_VALUE: &str = "GET";

/// A resource path plus the query parameters of its first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    path: String,
    params: BTreeMap<String, String>,
}

impl FetchRequest {
    /// `path` is relative to the versioned API root, e.g. `ads_archive`.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ValidationError> {
        let path = path.as_ref().trim().trim_matches('/');
        if path.is_empty() {
            return Err(ValidationError::EmptyPath);
        }

        Ok(Self {
            path: path.to_owned(),
            params: BTreeMap::new(),
        })
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Adds a parameter encoded as a JSON array, e.g. `search_page_ids=[1,2]`.
    pub fn param_list<I, V>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let array = Value::Array(values.into_iter().map(Into::into).collect());
        self.param(name, array)
    }

    /// Lower date bound sent to the API as `since` (unix seconds).
    pub fn since(self, start: OffsetDateTime) -> Self {
        self.param("since", start.unix_timestamp())
    }

    /// Upper date bound sent to the API as `until` (unix seconds).
    pub fn until(self, end: OffsetDateTime) -> Self {
        self.param("until", end.unix_timestamp())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

/// Builds the first-page request: a POST to the versioned resource URL with
/// the parameters, the access token and the GET override in a form body.
pub fn first_call_request(config: &FetchConfig, request: &FetchRequest) -> HttpRequest {
    let base = config.base_url.trim_end_matches('/');
    let version = config.api_version.trim_matches('/');
    let url = if version.is_empty() {
        format!("{base}/{}", request.path())
    } else {
        format!("{base}/{version}/{}", request.path())
    };

    let mut fields = request.params().clone();
    if !config.access_token.is_empty() {
        fields.insert(String::from("access_token"), config.access_token.clone());
    }
    fields.insert(
        String::from(METHOD_OVERRIDE_KEY),
        String::from(METHOD_OVERRIDE_VALUE),
    );

    HttpRequest::post(url)
        .with_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .with_timeout_ms(config.timeout_ms)
}

/// Builds a continuation request against a server-issued `paging.next` URL.
pub fn continuation_request(next_url: &str, timeout_ms: u64) -> HttpRequest {
    HttpRequest::post(with_method_override(next_url)).with_timeout_ms(timeout_ms)
}

/// True when the URL already carries `method=GET` (case-insensitive).
pub fn has_method_override(url: &str) -> bool {
    url.to_ascii_lowercase().contains("method=get")
}

/// Appends `method=GET` to the query string unless it is already present.
pub fn with_method_override(url: &str) -> String {
    if has_method_override(url) {
        return url.to_owned();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut out = format!("{base}{separator}{METHOD_OVERRIDE_KEY}={METHOD_OVERRIDE_VALUE}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpMethod;
    use time::macros::datetime;

    fn config() -> FetchConfig {
        FetchConfig::default()
            .with_base_url("https://graph.example.test/")
            .with_api_version("v21.0")
            .with_access_token("tok")
            .with_timeout_ms(1_500)
    }

    #[test]
    fn first_call_is_post_with_override_and_token_in_body() {
        let request = FetchRequest::new("/ads_archive/")
            .expect("valid path")
            .param("ad_type", "POLITICAL_AND_ISSUE_ADS")
            .param("limit", 100);

        let http = first_call_request(&config(), &request);

        assert_eq!(http.method, HttpMethod::Post);
        assert_eq!(http.url, "https://graph.example.test/v21.0/ads_archive");
        assert_eq!(http.timeout_ms, 1_500);
        assert_eq!(
            http.body.as_deref(),
            Some("access_token=tok&ad_type=POLITICAL_AND_ISSUE_ADS&limit=100&method=GET")
        );
    }

    #[test]
    fn caller_method_param_is_forced_to_get() {
        let request = FetchRequest::new("ads_archive")
            .expect("valid path")
            .param("method", "DELETE");

        let http = first_call_request(&FetchConfig::default(), &request);
        assert_eq!(http.body.as_deref(), Some("method=GET"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(FetchRequest::new(" / "), Err(ValidationError::EmptyPath));
    }

    #[test]
    fn list_and_date_params_are_encoded() {
        let request = FetchRequest::new("ads_archive")
            .expect("valid path")
            .param_list("search_page_ids", [124_955_570_892_789_u64])
            .param_list("ad_reached_countries", ["US", "CA"])
            .since(datetime!(2024-01-01 00:00 UTC))
            .until(datetime!(2024-01-02 00:00 UTC));

        let params = request.params();
        assert_eq!(params["search_page_ids"], "[124955570892789]");
        assert_eq!(params["ad_reached_countries"], r#"["US","CA"]"#);
        assert_eq!(params["since"], "1704067200");
        assert_eq!(params["until"], "1704153600");
    }

    #[test]
    fn override_is_appended_once() {
        assert_eq!(
            with_method_override("https://g.test/v1/x?after=abc"),
            "https://g.test/v1/x?after=abc&method=GET"
        );
        assert_eq!(
            with_method_override("https://g.test/v1/x"),
            "https://g.test/v1/x?method=GET"
        );
        assert_eq!(
            with_method_override("https://g.test/v1/x?after=abc&Method=get"),
            "https://g.test/v1/x?after=abc&Method=get"
        );
        assert_eq!(
            with_method_override("https://g.test/v1/x?a=1#frag"),
            "https://g.test/v1/x?a=1&method=GET#frag"
        );
    }

    #[test]
    fn continuation_request_has_no_body() {
        let http = continuation_request("https://g.test/v1/x?after=abc", 900);
        assert_eq!(http.method, HttpMethod::Post);
        assert_eq!(http.url, "https://g.test/v1/x?after=abc&method=GET");
        assert_eq!(http.body, None);
        assert_eq!(http.timeout_ms, 900);
    }
}
