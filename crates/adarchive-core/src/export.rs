//! Fully quoted CSV output for warehouse bulk loads.
//!
//! Rows follow a caller-supplied column list: fields outside the list are
//! dropped and absent columns are written empty. Records are written as
//! they are pulled, so a fetch is never held in memory as a whole.

use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ExportError, ValidationError};
use crate::fetcher::RecordStream;
use crate::page::Record;

/// Outcome of draining a [`RecordStream`] into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Data rows, header excluded.
    pub rows_written: usize,
    pub pages_fetched: usize,
    pub calls_made: u32,
}

/// Writes records as CSV rows in a fixed column order.
pub struct TabularWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<String>,
    rows_written: usize,
}

impl<W: Write> TabularWriter<W> {
    /// Wraps `inner` and writes the header row.
    pub fn new<S: AsRef<str>>(inner: W, columns: &[S]) -> Result<Self, ExportError> {
        if columns.is_empty() {
            return Err(ValidationError::EmptyColumns.into());
        }

        let columns = columns
            .iter()
            .map(|column| column.as_ref().to_owned())
            .collect::<Vec<_>>();
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::CRLF)
            .from_writer(inner);
        writer.write_record(&columns)?;

        Ok(Self {
            writer,
            columns,
            rows_written: 0,
        })
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), ExportError> {
        let row = self
            .columns
            .iter()
            .map(|column| cell(record.get(column)));
        self.writer.write_record(row.map(|value| value.into_owned()))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes buffered rows and hands back the destination.
    pub fn finish(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|error| ExportError::Io(error.into_error()))
    }
}

/// Text of one cell: strings verbatim, null or missing as empty, nested
/// arrays and objects as compact JSON.
pub fn cell(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(text)) => Cow::Borrowed(text),
        Some(Value::Bool(flag)) => Cow::Owned(flag.to_string()),
        Some(Value::Number(number)) => Cow::Owned(number.to_string()),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => Cow::Owned(nested.to_string()),
    }
}

/// Drains `stream` into `inner`, header first.
pub async fn write_stream<W, S>(
    stream: &mut RecordStream<'_>,
    columns: &[S],
    inner: W,
) -> Result<ExportSummary, ExportError>
where
    W: Write,
    S: AsRef<str>,
{
    let mut writer = TabularWriter::new(inner, columns)?;
    while let Some(record) = stream.next().await? {
        writer.write_record(&record)?;
    }

    let rows_written = writer.rows_written();
    writer.finish()?;

    Ok(ExportSummary {
        rows_written,
        pages_fetched: stream.pages_yielded(),
        calls_made: stream.calls_made(),
    })
}

/// Drains `stream` into the file at `path`.
///
/// Rows go to a temporary file next to `path` that replaces it only after
/// the whole stream was written; on any failure the temporary file is
/// removed and `path` is left untouched.
pub async fn export_csv<S: AsRef<str>>(
    mut stream: RecordStream<'_>,
    columns: &[S],
    path: &Path,
) -> Result<ExportSummary, ExportError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = tempfile::NamedTempFile::new_in(directory)?;

    let summary = {
        let file: &mut File = staging.as_file_mut();
        write_stream(&mut stream, columns, file).await?
    };

    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|error| ExportError::Io(error.error))?;

    tracing::info!(
        path = %path.display(),
        rows = summary.rows_written,
        pages = summary.pages_fetched,
        calls = summary.calls_made,
        "csv export complete"
    );
    Ok(summary)
}
