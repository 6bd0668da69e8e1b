//! Edge-list loading from CSV.
//!
//! # Format
//!
//! The input is a comma-separated file with a header row naming exactly the
//! columns `src`, `dst` and `length` (in any order):
//!
//! ```text
//! src,dst,length
//! 0,1,12.5
//! 1,2,3.0
//! ```
//!
//! `src`/`dst` are 32-bit signed node ids and `length` is a 32-bit float.
//! Records are returned in file order. Duplicates and self-loops are kept;
//! collapsing happens when the graph is built (see [`crate::graph::build`]).
//!
//! # Row cap
//!
//! At most `max_rows` data rows are read. Rows past the cap are never
//! parsed, so a malformed row after the cap does not fail the load.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ErrorCode;

/// Default number of data rows read from an input file.
pub const DEFAULT_MAX_ROWS: usize = 1_000_000;

/// Column names the header must contain, each exactly once.
pub const COLUMNS: [&str; 3] = ["src", "dst", "length"];

/// One row of the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub src: i32,
    pub dst: i32,
    pub length: f32,
}

impl EdgeRecord {
    #[must_use]
    pub const fn new(src: i32, dst: i32, length: f32) -> Self {
        Self { src, dst, length }
    }

    /// True when both endpoints are the same node.
    #[must_use]
    pub const fn is_self_loop(&self) -> bool {
        self.src == self.dst
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors returned while loading an edge list.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("input file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input path exists but could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The header row could not be read.
    #[error("failed to read header: {0}")]
    Header(#[source] csv::Error),

    /// The header does not name exactly `src`, `dst`, `length`.
    #[error("expected columns src,dst,length; found {found:?}")]
    Schema { found: Vec<String> },

    /// A data row could not be read or coerced to `(i32, i32, f32)`.
    #[error("row {row}: {source}")]
    Row {
        /// 1-based data row number (the header is row 0).
        row: u64,
        #[source]
        source: csv::Error,
    },

    /// A length parsed but is NaN or infinite.
    #[error("row {row}: length {value} is not finite")]
    NonFiniteLength { row: u64, value: f32 },
}

impl LoadError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::InputNotFound,
            Self::Open { .. } => ErrorCode::InputReadFailed,
            Self::Header(source) | Self::Row { source, .. } if is_io(source) => {
                ErrorCode::InputReadFailed
            }
            Self::Header(_) | Self::Schema { .. } => ErrorCode::SchemaMismatch,
            Self::Row { .. } => ErrorCode::RowParseFailed,
            Self::NonFiniteLength { .. } => ErrorCode::InvalidLength,
        }
    }
}

fn is_io(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(_))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load up to `max_rows` edge records from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file is missing or unreadable, the header
/// is wrong, or any row within the cap fails to parse.
#[instrument(skip_all, fields(path = %path.display(), max_rows))]
pub fn load_edges(path: &Path, max_rows: usize) -> Result<Vec<EdgeRecord>, LoadError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
                source,
            }
        } else {
            LoadError::Open {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let edges = read_edges(io::BufReader::new(file), max_rows)?;
    info!(rows = edges.len(), "loaded edge list");
    Ok(edges)
}

/// Read up to `max_rows` edge records from any CSV source.
///
/// # Errors
///
/// See [`load_edges`].
pub fn read_edges<R: Read>(reader: R, max_rows: usize) -> Result<Vec<EdgeRecord>, LoadError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    validate_header(csv.headers().map_err(LoadError::Header)?)?;

    let mut edges = Vec::with_capacity(max_rows.min(1 << 16));

    for (i, result) in csv.deserialize::<EdgeRecord>().take(max_rows).enumerate() {
        let row = i as u64 + 1;
        let record = result.map_err(|source| LoadError::Row { row, source })?;
        if !record.length.is_finite() {
            return Err(LoadError::NonFiniteLength {
                row,
                value: record.length,
            });
        }
        edges.push(record);
    }

    debug!(rows = edges.len(), cap = max_rows, "edge rows parsed");
    Ok(edges)
}

fn validate_header(header: &csv::StringRecord) -> Result<(), LoadError> {
    let found: Vec<String> = header.iter().map(str::to_string).collect();

    let mut sorted: Vec<&str> = found.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut expected = COLUMNS;
    expected.sort_unstable();

    if sorted == expected {
        Ok(())
    } else {
        Err(LoadError::Schema { found })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
