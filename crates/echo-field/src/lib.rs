// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-value scene fields for Echo.
//!
//! This crate provides:
//! - [`GrowableArray`]: a length + capacity buffer with power-of-two
//!   grow/shrink and splice edits
//! - [`FieldValue`]: the per-element read/write contract for field types
//! - [`FieldInput`] / [`FieldOutput`]: ASCII and binary value streams
//! - [`MField`]: the array-valued node attribute built on top of all three
//!
//! # Wire formats
//!
//! ASCII arrays are written as `[ v0, v1, ... ]`, except that a field holding
//! exactly one value is written bare (`v0`). Binary arrays are an `int32`
//! count in the stream's byte order followed by the packed elements.
//!
//! # Design
//!
//! Element encoding is selected statically through [`FieldValue`]; callers
//! holding fields of mixed types dispatch once per array through
//! [`AnyField`], never once per element.

mod array;
mod codec;
mod error;
mod input;
mod mfield;
mod output;
mod value;

pub use array::GrowableArray;
pub use codec::{read_values, write_values, MAX_BINARY_VALUES};
pub use error::{FieldError, Position, ReadError, SpliceError};
pub use input::FieldInput;
pub use mfield::{AnyField, FieldSource, MField};
pub use output::FieldOutput;
pub use value::FieldValue;

/// Byte order of a binary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Network order; the native order of Inventor binary files.
    #[default]
    Big,
    /// Little-endian.
    Little,
}

/// Encoding of a field stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Ascii,
    /// Packed binary in the given byte order.
    Binary(ByteOrder),
}

impl Format {
    /// Returns `true` for binary streams.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Binary(_))
    }
}
