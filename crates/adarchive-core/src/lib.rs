//! # adarchive Core
//!
//! Paginated Graph API retrieval for advertising-transparency data, turned
//! into a flat CSV stream ready for warehouse bulk loads.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Fetcher settings, page ceiling and timeouts |
//! | [`date_range`] | Post-hoc audit of time-series `end_time` values |
//! | [`error`] | Core error types |
//! | [`export`] | Fully quoted CSV writer and stream export |
//! | [`fetcher`] | Paginated fetch state machine and record stream |
//! | [`http_client`] | HTTP client abstraction |
//! | [`page`] | Pages, records and response decoding |
//! | [`request`] | First-call and continuation request building |
//! | [`retry`] | Retry policy with exponential backoff |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adarchive_core::{export_csv, FetchConfig, FetchRequest, PageFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = PageFetcher::new(FetchConfig::from_env())?;
//!     let request = FetchRequest::new("ads_archive")?
//!         .param("ad_reached_countries", "US")
//!         .param("fields", "page_id,spend");
//!
//!     let summary = export_csv(
//!         fetcher.fetch(request),
//!         &["page_id", "spend"],
//!         std::path::Path::new("ads.csv"),
//!     )
//!     .await?;
//!     println!("{} rows", summary.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  PageFetcher    │────▶│ RetryPolicy      │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       ▼
//!          │              ┌──────────────────┐
//!          │              │ HttpClient       │
//!          │              │ (reqwest/fake)   │
//!          ▼              └──────────────────┘
//! ┌─────────────────┐
//! │ RecordStream    │──┬──▶ export (CSV)
//! └─────────────────┘  └──▶ date_range (audit)
//! ```

pub mod config;
pub mod date_range;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod http_client;
pub mod page;
pub mod request;
pub mod retry;

pub use config::FetchConfig;
pub use date_range::{check_boundary, check_end, check_start, parse_timestamp, Boundary};
pub use error::{ExportError, FetchError, ValidationError};
pub use export::{export_csv, write_stream, ExportSummary, TabularWriter};
pub use fetcher::{PageFetcher, RecordStream};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use page::{Page, Record};
pub use request::{
    continuation_request, first_call_request, has_method_override, with_method_override,
    FetchRequest,
};
pub use retry::{Backoff, RetryConfig, RetryPolicy};
