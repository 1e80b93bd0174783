//! Post-hoc audit of time-series timestamps.
//!
//! The fetcher never filters by date: `since`/`until` are only hints sent to
//! the API. These checks report whether every `values[].end_time` of a
//! fetched batch actually honours a requested boundary.

use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::ValidationError;
use crate::page::Record;

/// Graph API timestamps, e.g. `2019-05-01T07:00:00+0000`.
const GRAPH_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
);

/// Which side of the requested range a boundary represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Observed timestamps must be at or after the boundary.
    Start,
    /// Observed timestamps must be at or before the boundary.
    End,
}

impl Boundary {
    pub fn admits(self, boundary: OffsetDateTime, observed: OffsetDateTime) -> bool {
        match self {
            Self::Start => boundary <= observed,
            Self::End => boundary >= observed,
        }
    }
}

/// True when every nested `end_time` satisfies `side` against `boundary`.
///
/// Returns `Ok(true)` for an empty batch and stops at the first violation.
pub fn check_boundary<'a, I>(
    records: I,
    boundary: OffsetDateTime,
    side: Boundary,
) -> Result<bool, ValidationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    for record in records {
        for point in record.time_series() {
            let Some(end_time) = point.get("end_time") else {
                continue;
            };
            let raw = end_time
                .as_str()
                .ok_or_else(|| ValidationError::NonStringTimestamp {
                    value: end_time.to_string(),
                })?;

            if !side.admits(boundary, parse_timestamp(raw)?) {
                tracing::debug!(end_time = raw, ?side, "timestamp outside requested range");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Checks that no time-series point ends before `start`.
pub fn check_start<'a, I>(records: I, start: OffsetDateTime) -> Result<bool, ValidationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    check_boundary(records, start, Boundary::Start)
}

/// Checks that no time-series point ends after `end`.
pub fn check_end<'a, I>(records: I, end: OffsetDateTime) -> Result<bool, ValidationError>
where
    I: IntoIterator<Item = &'a Record>,
{
    check_boundary(records, end, Boundary::End)
}

/// Parses RFC 3339 or the Graph API `+0000` offset form.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, ValidationError> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(raw, GRAPH_TIMESTAMP))
        .map_err(|_| ValidationError::InvalidTimestamp {
            value: raw.to_owned(),
        })
}
