//! Graph API pages and records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::http_client::HttpResponse;

/// One object from a page's `data` array.
///
/// The empty record doubles as the "resource has no data" sentinel emitted
/// when the very first page is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Time-series sub-objects under `values`. Anything that is not an
    /// array of objects yields nothing.
    pub fn time_series(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.0
            .get("values")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A decoded response: records in server order plus an optional cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub data: Vec<Record>,
    pub next: Option<String>,
}

impl Page {
    /// Decodes a Graph API response.
    ///
    /// Missing or oddly shaped `data`/`paging` members degrade to "no data"
    /// and "no cursor"; only a body that is not JSON at all is an error.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        if let Some(error) = api_error(&value) {
            return Err(error);
        }
        Ok(Self::from_value(value))
    }

    fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };

        let next = object
            .get("paging")
            .and_then(|paging| paging.get("next"))
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(str::to_owned);

        let data = match object.remove("data") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(fields) => Some(Record(fields)),
                    other => {
                        tracing::warn!(item = %other, "skipping non-object entry in page data");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Self { data, next }
    }
}

/// Classifies a transport response into a page or a typed upstream error.
pub fn decode_response(response: &HttpResponse) -> Result<Page, FetchError> {
    if response.is_success() {
        return Page::from_json(&response.body);
    }

    let api = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|value| api_error(&value));

    Err(api.unwrap_or_else(|| {
        FetchError::http(
            Some(response.status),
            format!("upstream returned status {}", response.status),
        )
    }))
}

fn api_error(value: &Value) -> Option<FetchError> {
    let error = value.get("error")?;
    let payload: ApiErrorPayload = serde_json::from_value(error.clone()).unwrap_or_default();

    Some(FetchError::Api {
        code: payload.code.unwrap_or(-1),
        kind: payload.kind.unwrap_or_else(|| String::from("unknown")),
        message: payload
            .message
            .unwrap_or_else(|| error.to_string()),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorPayload {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<i64>,
}
