//! CSV parsing and row filtering.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tablechat_core::error::LoadError;
use tracing::{debug, info};

use crate::table;

/// Column holding the question side of a row.
pub const QUERY_COLUMN: &str = "User_query";
/// Column holding the answer side of a row.
pub const RESPONSE_COLUMN: &str = "Chatbot_response";

/// Cell values treated as missing, matching the usual spreadsheet/pandas NA
/// markers.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One question/answer pair. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeRow {
    pub user_query: String,
    pub chatbot_response: String,
}

/// The loaded table and its flattened text form.
///
/// Immutable after load; shared read-only across sessions.
#[derive(Debug, Clone)]
pub struct KnowledgeBlob {
    source: PathBuf,
    rows: Vec<KnowledgeRow>,
    text: String,
}

impl KnowledgeBlob {
    /// Build a blob from already-filtered rows.
    pub fn from_rows(source: impl Into<PathBuf>, rows: Vec<KnowledgeRow>) -> Self {
        let text = table::render(&rows);
        Self {
            source: source.into(),
            rows,
            text,
        }
    }

    /// The serialized table used as grounding context.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rows(&self) -> &[KnowledgeRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The file this blob was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Rough token estimate (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.text.chars().count() / 4
    }
}

/// Read and serialize the knowledge file at `path`.
pub fn load(path: &Path) -> Result<KnowledgeBlob, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::MalformedData {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    let blob = parse(file, path)?;
    info!(
        path = %path.display(),
        rows = blob.row_count(),
        estimated_tokens = blob.estimated_tokens(),
        "Knowledge table loaded"
    );
    Ok(blob)
}

/// Parse CSV data from any reader. `source` is only used for error messages
/// and provenance.
pub fn parse<R: Read>(reader: R, source: &Path) -> Result<KnowledgeBlob, LoadError> {
    let malformed = |reason: String| LoadError::MalformedData {
        path: source.to_path_buf(),
        reason,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: source.to_path_buf(),
                column: name.to_string(),
            })
    };
    let query_idx = column(QUERY_COLUMN)?;
    let response_idx = column(RESPONSE_COLUMN)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for record in csv_reader.records() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        // Short rows are padded with missing cells and dropped below; long
        // rows mean an unquoted delimiter inside a cell.
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(malformed(format!(
                "expected {} fields on line {line}, saw {}",
                headers.len(),
                record.len()
            )));
        }
        match (present(record.get(query_idx)), present(record.get(response_idx))) {
            (Some(query), Some(response)) => rows.push(KnowledgeRow {
                user_query: query.to_string(),
                chatbot_response: response.to_string(),
            }),
            _ => dropped += 1,
        }
    }

    debug!(kept = rows.len(), dropped, "Filtered knowledge rows");
    Ok(KnowledgeBlob::from_rows(source, rows))
}

fn present(cell: Option<&str>) -> Option<&str> {
    cell.filter(|value| !NA_VALUES.contains(value))
}
