//! Map parsing.
//!
//! Two encodings are accepted:
//!
//! - **Text**: one line per row, one character per cell. `o` is free, `x` is an
//!   obstacle. Every row must have the same width.
//! - **JSON**: explicit dimensions plus a list of blocked cells, either as
//!   `{"width", "height", "obstacles": [{x, y}]}` or in the tile form
//!   `{"cols", "rows", "tiles": [{x, y, walkable}]}`.
//!
//! [`parse`] is pure; it never touches the current map of a running server.

mod json;
mod text;

use std::path::Path;

use thiserror::Error;

use crate::models::Grid;

/// Largest grid (in cells) a map may declare.
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// Why an uploaded map was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map is empty")]
    Empty,

    #[error("map is not valid UTF-8")]
    InvalidUtf8,

    #[error("row {line} has {actual} cells, expected {expected}")]
    InconsistentRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unrecognized cell marker {marker:?} at line {line}, column {column}")]
    UnknownMarker {
        marker: char,
        line: usize,
        column: usize,
    },

    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("cell ({x}, {y}) lies outside the declared {width}x{height} grid")]
    CellOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid JSON map: {0}")]
    InvalidJson(String),

    #[error("unsupported map format {0:?}, expected .txt or .json")]
    UnsupportedFormat(String),
}

/// Encoding of an uploaded map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    Text,
    Json,
}

impl MapFormat {
    /// Pick the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, MapError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("json") => Ok(Self::Json),
            _ => Err(MapError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Guess the format from content: a leading `{` means JSON.
    pub fn detect(raw: &[u8]) -> Self {
        match raw.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Parse raw map bytes in the given format.
pub fn parse(raw: &[u8], format: MapFormat) -> Result<Grid, MapError> {
    let content = std::str::from_utf8(raw).map_err(|_| MapError::InvalidUtf8)?;
    if content.trim().is_empty() {
        return Err(MapError::Empty);
    }

    match format {
        MapFormat::Text => text::parse(content),
        MapFormat::Json => json::parse(content),
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), MapError> {
    let within_limit = width
        .checked_mul(height)
        .is_some_and(|cells| cells <= MAX_GRID_CELLS);
    if width == 0 || height == 0 || !within_limit {
        return Err(MapError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(MapFormat::from_file_name("room.txt"), Ok(MapFormat::Text));
        assert_eq!(MapFormat::from_file_name("ROOM.JSON"), Ok(MapFormat::Json));
        assert!(matches!(
            MapFormat::from_file_name("room.csv"),
            Err(MapError::UnsupportedFormat(_))
        ));
        assert!(MapFormat::from_file_name("room").is_err());
    }

    #[test]
    fn detect_sniffs_leading_brace() {
        assert_eq!(MapFormat::detect(b"  \n{\"width\": 1}"), MapFormat::Json);
        assert_eq!(MapFormat::detect(b"oox\nooo"), MapFormat::Text);
    }

    #[test]
    fn rejects_oversized_dimensions() {
        assert!(check_dimensions(1000, 1000).is_ok());
        assert_eq!(
            check_dimensions(1001, 1000),
            Err(MapError::InvalidDimensions {
                width: 1001,
                height: 1000
            })
        );
        assert!(check_dimensions(usize::MAX, 2).is_err());
    }
}
