//! Loading token sequences.
//!
//! Two on-disk formats are accepted:
//!
//! - **Text** (any extension other than `.json`): one sequence per line,
//!   tokens separated by commas and/or whitespace. Blank lines and lines
//!   starting with `#` are skipped.
//! - **JSON** (`.json`): an array of arrays of strings.
//!
//! [`demo_lines`] returns the built-in batch used when no input is given.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

/// Errors that can occur while loading input sequences.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input file is not a JSON array of string arrays.
    #[error("failed to parse {path} as JSON sequences: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The built-in batch: four lines crossing at a shared interchange `O`.
#[must_use]
pub fn demo_lines() -> Vec<Vec<String>> {
    const LINES: [[&str; 5]; 8] = [
        ["A1", "A2", "O", "A3", "A4"],
        ["A1", "A2", "O", "A3", "A4"],
        ["A1", "A2", "O", "A3", "A4"],
        ["B1", "B2", "O", "B3", "B4"],
        ["B1", "B2", "O", "B3", "B4"],
        ["C1", "C2", "O", "A1", "A2"],
        ["C1", "C2", "O", "C3", "C4"],
        ["D1", "D2", "O", "D3", "D4"],
    ];
    LINES
        .iter()
        .map(|line| line.iter().map(|t| (*t).to_string()).collect())
        .collect()
}

/// Parse the text format: one sequence per line.
#[must_use]
pub fn parse_text(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Parse the JSON format: `[["A", "B"], ["B", "C"]]`.
///
/// # Errors
///
/// Returns the `serde_json` error if `text` is not an array of string arrays.
pub fn parse_json(text: &str) -> Result<Vec<Vec<String>>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Load sequences from `path`, choosing the format by extension.
///
/// # Errors
///
/// Returns [`InputError::Read`] if the file cannot be read and
/// [`InputError::Json`] if a `.json` file is malformed.
#[instrument]
pub fn load_sequences(path: &Path) -> Result<Vec<Vec<String>>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let sequences = if is_json {
        parse_json(&text).map_err(|source| InputError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        parse_text(&text)
    };

    debug!(sequences = sequences.len(), json = is_json, "loaded input");
    Ok(sequences)
}
