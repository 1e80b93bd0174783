//! CLI argument definitions for adarchive.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Page through a Graph API resource and write a CSV file |
//! | `probe` | Send the first call once, without retries, and print the page |
//!
//! # Examples
//!
//! ```bash
//! # Export political ads reaching the US
//! adarchive fetch ads_archive \
//!     --param ad_reached_countries=US \
//!     --param ad_type=POLITICAL_AND_ISSUE_ADS \
//!     --fields page_id,page_name,spend,impressions \
//!     --output ads.csv
//!
//! # Check that a request is accepted before a long export
//! adarchive probe ads_archive --param ad_reached_countries=US --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Paginated Graph API export for advertising-transparency data.
#[derive(Debug, Parser)]
#[command(
    name = "adarchive",
    author,
    version,
    about = "Page through Graph API resources and export them as CSV"
)]
pub struct Cli {
    /// Graph API access token. Falls back to ADARCHIVE_ACCESS_TOKEN.
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Graph API version segment, e.g. v21.0. Falls back to ADARCHIVE_GRAPH_VERSION.
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// API root URL. Falls back to ADARCHIVE_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Pretty-print the JSON summary.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every page of a resource into a CSV file.
    Fetch(FetchArgs),
    /// Send only the first call and print the raw page.
    Probe(RequestArgs),
}

/// Resource path and first-page parameters.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Resource path relative to the versioned API root, e.g. ads_archive.
    pub path: String,

    /// Query parameter as NAME=VALUE. Repeatable.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Lower date bound (YYYY-MM-DD or RFC 3339), sent as `since`.
    #[arg(long, value_parser = parse_bound)]
    pub since: Option<OffsetDateTime>,

    /// Upper date bound (YYYY-MM-DD or RFC 3339), sent as `until`.
    #[arg(long, value_parser = parse_bound)]
    pub until: Option<OffsetDateTime>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Output columns, comma separated. Also sent as the `fields` parameter
    /// unless `--param fields=...` is given.
    #[arg(long, value_delimiter = ',', required = true)]
    pub fields: Vec<String>,

    /// Destination CSV file.
    #[arg(long, short)]
    pub output: PathBuf,

    /// Page ceiling for this fetch.
    #[arg(long, default_value_t = 50)]
    pub max_pages: usize,

    /// Calls per request before giving up.
    #[arg(long, default_value_t = 10)]
    pub max_attempts: u32,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

fn parse_bound(raw: &str) -> Result<OffsetDateTime, String> {
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| format!("expected YYYY-MM-DD or RFC 3339, got '{raw}'"))
}
