use std::path::PathBuf;

use thiserror::Error;

use crate::piece::PieceKind;

/// Errors that can occur while reading or writing replay data.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode replay data: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("failed to encode replay data: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("record {index} is malformed: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: rmp_serde::decode::Error,
    },
    #[error("record {index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: InvalidReplay },
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

impl ReplayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Schema violations found in a single replay record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidReplay {
    #[error("invalid piece kind: {0}")]
    PieceKind(String),
    #[error("invalid spin kind: {0}")]
    SpinKind(String),
    #[error("board has {0} columns, expected 10")]
    BoardWidth(usize),
    #[error("board column {column} has {height} rows, at most 64 fit")]
    BoardHeight { column: usize, height: usize },
    #[error("queue holds {0} pieces, at most 18 fit")]
    QueueLength(usize),
    #[error("action cell ({x}, {y}) lies outside the board")]
    CellOutOfBounds { x: i8, y: i8 },
    #[error("bag lists {0} more than once")]
    DuplicateBagPiece(PieceKind),
}

/// Errors raised by the preprocessed feature cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode feature cache: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode feature cache: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("feature cache has format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
    #[error("cached sample {index} has {len} {part} features, expected {expected}")]
    SampleShape {
        index: usize,
        part: &'static str,
        len: usize,
        expected: usize,
    },
}
