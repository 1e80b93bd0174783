mod fetch;
mod probe;

use adarchive_core::{FetchConfig, FetchRequest, PageFetcher};
use serde_json::Value;

use crate::cli::{Cli, Command, RequestArgs};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Fetch(args) => {
            let config = base_config(cli)?
                .with_max_pages(args.max_pages)
                .with_retry(adarchive_core::RetryConfig::exponential(args.max_attempts));
            let fetcher = PageFetcher::new(config)?;
            fetch::run(args, &fetcher).await
        }
        Command::Probe(args) => {
            let fetcher = PageFetcher::new(base_config(cli)?)?;
            probe::run(args, &fetcher).await
        }
    }
}

/// Environment defaults overridden by global flags.
fn base_config(cli: &Cli) -> Result<FetchConfig, CliError> {
    let mut config = FetchConfig::from_env().with_timeout_ms(cli.timeout_ms);

    if let Some(token) = &cli.access_token {
        config = config.with_access_token(token);
    }
    if let Some(version) = &cli.api_version {
        config = config.with_api_version(version);
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }

    if config.access_token.is_empty() {
        return Err(CliError::MissingAccessToken);
    }
    Ok(config)
}

fn build_request(args: &RequestArgs) -> Result<FetchRequest, CliError> {
    let mut request = FetchRequest::new(&args.path)?;
    for (name, value) in &args.params {
        request = request.param(name, value);
    }
    if let Some(since) = args.since {
        request = request.since(since);
    }
    if let Some(until) = args.until {
        request = request.until(until);
    }
    Ok(request)
}
