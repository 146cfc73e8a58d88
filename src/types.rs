//! Strongly-typed identifiers shared across the store, queue, and pipeline.
//!
//! Every persisted entity is keyed by a newtype wrapping the SQLite rowid
//! (`i64`) instead of a bare integer, so a `SymbolId` can never be passed
//! where a `FileId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(ProjectId);
id_type!(SourceId);
id_type!(RunId);
id_type!(FileId);
id_type!(SymbolId);
id_type!(EmbeddingModelVersionId);

/// Byte/line range within a file, half-open on bytes, inclusive on lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn single_line(line: u32) -> Self {
        Self::new(line, 0, line, 0)
    }
}
