// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field output stream into an in-memory buffer.

use bytes::{BufMut, BytesMut};

use crate::{ByteOrder, Format};

/// Spaces written per indent level.
const INDENT_WIDTH: usize = 2;

/// Growable sink for ASCII or binary field data.
///
/// Primitive writers consult the stream [`Format`], mirroring
/// [`crate::FieldInput`]. Indentation only affects ASCII output.
#[derive(Debug, Clone, Default)]
pub struct FieldOutput {
    buf: BytesMut,
    format: Format,
    indent: usize,
}

impl FieldOutput {
    /// Write ASCII text.
    pub fn ascii() -> Self {
        Self::new(Format::Ascii)
    }

    /// Write packed binary in `order`.
    pub fn binary(order: ByteOrder) -> Self {
        Self::new(Format::Binary(order))
    }

    /// Write in the given format.
    pub fn new(format: Format) -> Self {
        Self {
            buf: BytesMut::new(),
            format,
            indent: 0,
        }
    }

    /// Stream encoding.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns `true` for binary streams.
    pub fn is_binary(&self) -> bool {
        self.format.is_binary()
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Written bytes as text; `None` if they are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.buf).ok()
    }

    /// Consume the stream and return the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Current indent level.
    pub fn indent_level(&self) -> usize {
        self.indent
    }

    /// Increase the indent level by one.
    pub fn increment_indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease the indent level by one, saturating at zero.
    pub fn decrement_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write the current indentation (ASCII only).
    pub fn write_indent(&mut self) {
        if !self.is_binary() {
            self.buf.put_bytes(b' ', self.indent * INDENT_WIDTH);
        }
    }

    /// Write raw text. Binary streams receive the bytes unframed.
    pub fn write_str(&mut self, s: &str) {
        self.buf.put_slice(s.as_bytes());
    }

    /// Write a 32-bit signed integer.
    pub fn write_i32(&mut self, v: i32) {
        match self.format {
            Format::Ascii => self.write_str(&v.to_string()),
            Format::Binary(ByteOrder::Big) => self.buf.put_i32(v),
            Format::Binary(ByteOrder::Little) => self.buf.put_i32_le(v),
        }
    }

    /// Write a 32-bit unsigned integer.
    pub fn write_u32(&mut self, v: u32) {
        match self.format {
            Format::Ascii => self.write_str(&v.to_string()),
            Format::Binary(ByteOrder::Big) => self.buf.put_u32(v),
            Format::Binary(ByteOrder::Little) => self.buf.put_u32_le(v),
        }
    }

    /// Write a 16-bit signed integer (widened to 32 bits in binary).
    pub fn write_i16(&mut self, v: i16) {
        self.write_i32(i32::from(v));
    }

    /// Write a 32-bit float. ASCII uses the shortest text that reads back
    /// to the same value, so `1.0` is written as `1`.
    pub fn write_f32(&mut self, v: f32) {
        match self.format {
            Format::Ascii => self.write_str(&v.to_string()),
            Format::Binary(ByteOrder::Big) => self.buf.put_f32(v),
            Format::Binary(ByteOrder::Little) => self.buf.put_f32_le(v),
        }
    }

    /// Write a string: quoted and escaped in ASCII, length-prefixed and
    /// padded to 4 bytes in binary.
    pub fn write_string(&mut self, s: &str) {
        if self.is_binary() {
            let len = s.len();
            self.write_i32(i32::try_from(len).unwrap_or(i32::MAX));
            self.buf.put_slice(s.as_bytes());
            self.buf.put_bytes(0, (4 - len % 4) % 4);
            return;
        }
        self.buf.put_u8(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                self.buf.put_u8(b'\\');
            }
            self.buf.put_u8(b);
        }
        self.buf.put_u8(b'"');
    }

    /// Write a bare word: verbatim in ASCII, framed like a string in binary.
    pub fn write_word(&mut self, s: &str) {
        if self.is_binary() {
            self.write_string(s);
        } else {
            self.write_str(s);
        }
    }
}
