// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for field streams and splice edits.

use std::fmt;

use thiserror::Error;

/// Location inside an input stream, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Byte offset from the start of the stream.
    pub offset: usize,
    /// 1-based line number (always 1 for binary streams).
    pub line: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, byte {}", self.line, self.offset)
    }
}

/// Malformed or truncated field input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The stream ended before the value was complete.
    #[error("premature end of file at {pos}")]
    UnexpectedEof {
        /// Where the stream ran out.
        pos: Position,
    },
    /// A binary count was negative.
    #[error("invalid number of values in field: {count} at {pos}")]
    NegativeCount {
        /// The declared count.
        count: i32,
        /// Position of the count.
        pos: Position,
    },
    /// A binary count exceeded the sanity limit.
    #[error("{count} values in field (limit {limit}), file probably corrupt at {pos}")]
    CountTooLarge {
        /// The declared count.
        count: i32,
        /// The accepted maximum.
        limit: i32,
        /// Position of the count.
        pos: Position,
    },
    /// A token did not parse as the expected value.
    #[error("expected {expected} at {pos}, found {found:?}")]
    Syntax {
        /// What the reader was looking for.
        expected: &'static str,
        /// The offending text.
        found: String,
        /// Where the token started.
        pos: Position,
    },
}

impl ReadError {
    /// Position the error was detected at.
    pub fn position(&self) -> Position {
        match self {
            Self::UnexpectedEof { pos }
            | Self::NegativeCount { pos, .. }
            | Self::CountTooLarge { pos, .. }
            | Self::Syntax { pos, .. } => *pos,
        }
    }
}

/// Out-of-range splice on a [`crate::GrowableArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpliceError {
    /// `[start, end)` is not inside `[0, len)`.
    #[error("invalid indices [{start}, {end}) for delete on array of size {len}")]
    Delete {
        /// First index to remove.
        start: usize,
        /// One past the last index to remove.
        end: usize,
        /// Array length at the time of the call.
        len: usize,
    },
    /// `start` is past the end of the array.
    #[error("invalid insert position {start} (+{count}) for array of size {len}")]
    Insert {
        /// Requested insert position.
        start: usize,
        /// Number of slots requested.
        count: usize,
        /// Array length at the time of the call.
        len: usize,
    },
}

/// Failure of an edit that both parses and places a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The text did not parse as a value.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// The target slot could not be created.
    #[error(transparent)]
    Splice(#[from] SpliceError),
}
