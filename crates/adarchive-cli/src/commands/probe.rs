//! Single first call, no retries.

use adarchive_core::PageFetcher;
use serde_json::{json, Value};

use crate::cli::RequestArgs;
use crate::error::CliError;

use super::build_request;

pub async fn run(args: &RequestArgs, fetcher: &PageFetcher) -> Result<Value, CliError> {
    let request = build_request(args)?;
    let page = fetcher.probe(&request).await?;

    Ok(json!({
        "path": request.path(),
        "records": page.data.len(),
        "has_next": page.next.is_some(),
        "next": page.next,
        "data": page.data,
    }))
}
