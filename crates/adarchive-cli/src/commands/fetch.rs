//! Drain a resource into a CSV file.

use adarchive_core::{export_csv, PageFetcher};
use serde_json::{json, Value};

use crate::cli::FetchArgs;
use crate::error::CliError;

use super::build_request;

pub async fn run(args: &FetchArgs, fetcher: &PageFetcher) -> Result<Value, CliError> {
    let mut request = build_request(&args.request)?;
    if !request.params().contains_key("fields") {
        request = request.param("fields", args.fields.join(","));
    }

    tracing::info!(
        path = request.path(),
        output = %args.output.display(),
        max_pages = fetcher.config().max_pages,
        "starting fetch"
    );
    let summary = export_csv(fetcher.fetch(request), &args.fields, &args.output).await?;

    Ok(json!({
        "path": args.request.path,
        "output": args.output.display().to_string(),
        "columns": args.fields,
        "summary": summary,
    }))
}
