// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Element types that can live in a multi-value field.

use std::fmt::Debug;

use crate::{FieldInput, FieldOutput, ReadError};

/// Single-element codec for a field type.
///
/// Implementations handle exactly one value; array framing (counts,
/// brackets, separators, line breaks) belongs to [`crate::read_values`] and
/// [`crate::write_values`]. Both methods work for ASCII and binary streams
/// because the stream primitives switch on the stream format.
pub trait FieldValue: Clone + Default + PartialEq + Debug + Send + 'static {
    /// Name of the multi-value field type holding this element.
    const TYPE_NAME: &'static str;

    /// Values written per line before an ASCII line break.
    const VALUES_PER_LINE: usize = 1;

    /// Read one value.
    ///
    /// # Errors
    ///
    /// Premature end of stream or a malformed token.
    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError>;

    /// Write one value.
    fn write(&self, out: &mut FieldOutput);
}

impl FieldValue for f32 {
    const TYPE_NAME: &'static str = "MFFloat";
    const VALUES_PER_LINE: usize = 4;

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        input.read_f32()
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_f32(*self);
    }
}

impl FieldValue for i32 {
    const TYPE_NAME: &'static str = "MFInt32";
    const VALUES_PER_LINE: usize = 8;

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        input.read_i32()
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_i32(*self);
    }
}

impl FieldValue for u32 {
    const TYPE_NAME: &'static str = "MFUInt32";
    const VALUES_PER_LINE: usize = 8;

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        input.read_u32()
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_u32(*self);
    }
}

impl FieldValue for i16 {
    const TYPE_NAME: &'static str = "MFShort";
    const VALUES_PER_LINE: usize = 8;

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        input.read_i16()
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_i16(*self);
    }
}

/// Three-component vector, written `x y z` in ASCII.
impl FieldValue for [f32; 3] {
    const TYPE_NAME: &'static str = "MFVec3f";

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        Ok([input.read_f32()?, input.read_f32()?, input.read_f32()?])
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_f32(self[0]);
        if !out.is_binary() {
            out.write_str(" ");
        }
        out.write_f32(self[1]);
        if !out.is_binary() {
            out.write_str(" ");
        }
        out.write_f32(self[2]);
    }
}

impl FieldValue for String {
    const TYPE_NAME: &'static str = "MFString";

    fn read(input: &mut FieldInput<'_>) -> Result<Self, ReadError> {
        input.read_string()
    }

    fn write(&self, out: &mut FieldOutput) {
        out.write_string(self);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ByteOrder;

    #[test]
    fn vec3_ascii_is_space_separated() {
        let mut out = FieldOutput::ascii();
        [-1.0_f32, 0.5, 2.0].write(&mut out);
        assert_eq!(out.as_str().unwrap(), "-1 0.5 2");

        let text = out.as_str().unwrap().to_owned();
        let mut input = FieldInput::ascii(&text);
        assert_eq!(<[f32; 3]>::read(&mut input).unwrap(), [-1.0, 0.5, 2.0]);
    }

    #[test]
    fn vec3_binary_is_packed() {
        let mut out = FieldOutput::binary(ByteOrder::Big);
        [1.0_f32, 2.0, 3.0].write(&mut out);
        assert_eq!(out.as_bytes().len(), 12);
    }

    #[test]
    fn values_per_line_policy() {
        assert_eq!(i32::VALUES_PER_LINE, 8);
        assert_eq!(u32::VALUES_PER_LINE, 8);
        assert_eq!(i16::VALUES_PER_LINE, 8);
        assert_eq!(f32::VALUES_PER_LINE, 4);
        assert_eq!(<[f32; 3]>::VALUES_PER_LINE, 1);
        assert_eq!(String::TYPE_NAME, "MFString");
    }
}
