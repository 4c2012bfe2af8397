//! Delimited source reader
//!
//! Streams [`Record`]s from a header-first, delimiter-separated UTF-8 file.
//! A leading byte-order mark is stripped before the header is parsed.

use crate::record::Record;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablesync_common::{Result, SyncError};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A tabular source file on disk
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in logs and summaries
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn csv_reader(&self) -> Result<csv::Reader<BufReader<File>>> {
        let file = File::open(&self.path)
            .map_err(|e| SyncError::source_not_found(self.path.display().to_string(), e))?;
        let mut buf = BufReader::new(file);
        if buf.fill_buf()?.starts_with(UTF8_BOM) {
            buf.consume(UTF8_BOM.len());
        }

        Ok(ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(buf))
    }

    /// Open the source and validate its header
    pub fn open(&self) -> Result<RecordReader> {
        let mut reader = self.csv_reader()?;
        let header = decode_header(reader.byte_headers().map_err(format_error)?)?;
        debug!(source = %self.name(), columns = header.len(), "Opened source");

        Ok(RecordReader {
            reader,
            header: header.into(),
            current: StringRecord::new(),
            rows_read: 0,
            done: false,
        })
    }

    /// Number of data rows, without decoding or normalizing them
    pub fn count_records(&self) -> Result<u64> {
        let mut reader = self.csv_reader()?;
        let mut record = ByteRecord::new();
        let mut count = 0u64;
        while reader.read_byte_record(&mut record).map_err(format_error)? {
            count += 1;
        }
        Ok(count)
    }
}

fn format_error(err: csv::Error) -> SyncError {
    if !err.is_io_error() {
        return SyncError::source_format(err.to_string());
    }
    match err.into_kind() {
        csv::ErrorKind::Io(io) => SyncError::Io(io),
        _ => SyncError::source_format("unreadable source"),
    }
}

fn decode_header(raw: &ByteRecord) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut header = Vec::with_capacity(raw.len());
    for (idx, field) in raw.iter().enumerate() {
        let name = std::str::from_utf8(field).map_err(|_| {
            SyncError::source_format(format!("header column {} is not valid UTF-8", idx + 1))
        })?;
        if !seen.insert(name) {
            return Err(SyncError::source_format(format!(
                "duplicate header column '{}'",
                name
            )));
        }
        header.push(name.to_string());
    }
    Ok(header)
}

/// Single-pass iterator over the data rows of an opened source
#[derive(Debug)]
pub struct RecordReader {
    reader: csv::Reader<BufReader<File>>,
    header: Arc<[String]>,
    current: StringRecord,
    rows_read: u64,
    done: bool,
}

impl RecordReader {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Fail with a format error when `column` is not in the header
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.header.iter().any(|name| name == column) {
            Ok(())
        } else {
            Err(SyncError::source_format(format!(
                "key column '{}' not found in header (columns: {})",
                column,
                self.header.join(", ")
            )))
        }
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.current) {
            Ok(true) => {
                self.rows_read += 1;
                let row = self.rows_read;
                let width = self.header.len();
                if self.current.len() > width {
                    warn!(
                        row,
                        extra = self.current.len() - width,
                        "Row has more values than the header, dropping the extra values"
                    );
                }
                let values = self
                    .current
                    .iter()
                    .take(width)
                    .map(str::to_string)
                    .collect();
                Some(Ok(Record::new(row, Arc::clone(&self.header), values)))
            },
            Ok(false) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(SyncError::source_format(format!(
                    "row {}: {}",
                    self.rows_read + 1,
                    e
                ))))
            },
        }
    }
}
