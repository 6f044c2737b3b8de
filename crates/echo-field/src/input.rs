// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field input stream over an in-memory buffer.
//!
//! One reader serves both encodings: the primitive readers consult the
//! stream [`Format`] so element types implement a single `read`.

use bytes::Buf;

use crate::{ByteOrder, Format, Position, ReadError};

/// Cursor over ASCII or binary field data.
#[derive(Debug, Clone)]
pub struct FieldInput<'a> {
    data: &'a [u8],
    pos: usize,
    line: u32,
    format: Format,
}

impl<'a> FieldInput<'a> {
    /// Read ASCII text.
    pub fn ascii(text: &'a str) -> Self {
        Self::new(text.as_bytes(), Format::Ascii)
    }

    /// Read packed binary data in `order`.
    pub fn binary(data: &'a [u8], order: ByteOrder) -> Self {
        Self::new(data, Format::Binary(order))
    }

    /// Read `data` in the given format.
    pub fn new(data: &'a [u8], format: Format) -> Self {
        Self {
            data,
            pos: 0,
            line: 1,
            format,
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

    /// Current read position.
    pub fn position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
        }
    }

    /// Returns `true` once every byte has been consumed. ASCII streams skip
    /// trailing whitespace and comments first.
    pub fn is_eof(&mut self) -> bool {
        if !self.is_binary() {
            self.skip_whitespace();
        }
        self.pos >= self.data.len()
    }

    fn eof(&self) -> ReadError {
        ReadError::UnexpectedEof {
            pos: self.position(),
        }
    }

    // ── ASCII scanning ──────────────────────────────────────────────────

    /// Skip whitespace and `#` comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b'#' => {
                    while self.data.get(self.pos).is_some_and(|&c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Next non-whitespace byte without consuming it.
    pub fn peek_char(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.data.get(self.pos).copied()
    }

    /// Consume and return the next non-whitespace byte.
    ///
    /// # Errors
    ///
    /// [`ReadError::UnexpectedEof`] at end of stream.
    pub fn read_char(&mut self) -> Result<u8, ReadError> {
        let c = self.peek_char().ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(c)
    }

    fn token(&mut self, accept: impl Fn(u8) -> bool) -> Result<(&'a str, Position), ReadError> {
        self.skip_whitespace();
        let start = self.position();
        if self.pos >= self.data.len() {
            return Err(self.eof());
        }
        let data = self.data;
        while data.get(self.pos).is_some_and(|&b| accept(b)) {
            self.pos += 1;
        }
        // Accepted bytes are all ASCII, so the slice is valid UTF-8.
        let text = std::str::from_utf8(&data[start.offset..self.pos]).unwrap_or_default();
        Ok((text, start))
    }

    fn syntax(expected: &'static str, found: &str, pos: Position) -> ReadError {
        ReadError::Syntax {
            expected,
            found: found.to_owned(),
            pos,
        }
    }

    fn ascii_integer(&mut self, expected: &'static str) -> Result<(i64, Position), ReadError> {
        let (text, pos) = self.token(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'+')?;
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let magnitude = if let Some(hex) = body
            .strip_prefix("0x")
            .or_else(|| body.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16)
        } else {
            body.parse::<i64>()
        }
        .map_err(|_| Self::syntax(expected, text, pos))?;
        Ok((if negative { -magnitude } else { magnitude }, pos))
    }

    // ── Binary primitives ───────────────────────────────────────────────

    fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let data = self.data;
        let end = self.pos.checked_add(n).ok_or_else(|| self.eof())?;
        let bytes = data.get(self.pos..end).ok_or_else(|| self.eof())?;
        self.pos = end;
        Ok(bytes)
    }

    fn order(&self) -> ByteOrder {
        match self.format {
            Format::Binary(order) => order,
            Format::Ascii => ByteOrder::Big,
        }
    }

    // ── Typed readers ───────────────────────────────────────────────────

    /// Read a 32-bit signed integer.
    ///
    /// # Errors
    ///
    /// End of stream, or (ASCII) a token that is not an integer in range.
    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        if self.is_binary() {
            let mut buf = self.take(4)?;
            return Ok(match self.order() {
                ByteOrder::Big => buf.get_i32(),
                ByteOrder::Little => buf.get_i32_le(),
            });
        }
        let (v, pos) = self.ascii_integer("int32")?;
        i32::try_from(v).map_err(|_| Self::syntax("int32", &v.to_string(), pos))
    }

    /// Read a 32-bit unsigned integer.
    ///
    /// # Errors
    ///
    /// End of stream, or (ASCII) a token that is not an integer in range.
    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        if self.is_binary() {
            let mut buf = self.take(4)?;
            return Ok(match self.order() {
                ByteOrder::Big => buf.get_u32(),
                ByteOrder::Little => buf.get_u32_le(),
            });
        }
        let (v, pos) = self.ascii_integer("uint32")?;
        u32::try_from(v).map_err(|_| Self::syntax("uint32", &v.to_string(), pos))
    }

    /// Read a 16-bit signed integer. Binary streams store it widened to 32
    /// bits.
    ///
    /// # Errors
    ///
    /// End of stream, or a value that does not fit 16 bits.
    pub fn read_i16(&mut self) -> Result<i16, ReadError> {
        let pos = self.position();
        let v = self.read_i32()?;
        i16::try_from(v).map_err(|_| Self::syntax("short", &v.to_string(), pos))
    }

    /// Read a 32-bit float.
    ///
    /// # Errors
    ///
    /// End of stream, or (ASCII) a token that is not a number.
    /// `inf`, `-inf` and `nan` (any case) are accepted, matching what
    /// [`crate::FieldOutput::write_f32`] emits for non-finite values.
    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        if self.is_binary() {
            let mut buf = self.take(4)?;
            return Ok(match self.order() {
                ByteOrder::Big => buf.get_f32(),
                ByteOrder::Little => buf.get_f32_le(),
            });
        }
        let (text, pos) =
            self.token(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'+' | b'.'))?;
        text.parse::<f32>()
            .map_err(|_| Self::syntax("float", text, pos))
    }

    /// Read a string.
    ///
    /// ASCII accepts a double-quoted string with `\"` and `\\` escapes, or a
    /// bare word ending at whitespace, `,`, `]` or `}`. Binary strings are an
    /// `int32` byte length followed by the bytes, padded to 4 bytes.
    ///
    /// # Errors
    ///
    /// End of stream, an unterminated quote, or invalid UTF-8.
    pub fn read_string(&mut self) -> Result<String, ReadError> {
        if self.is_binary() {
            let pos = self.position();
            let len = self.read_i32()?;
            let len = usize::try_from(len)
                .map_err(|_| Self::syntax("string length", &len.to_string(), pos))?;
            let bytes = self.take(len)?;
            let padding = (4 - len % 4) % 4;
            self.take(padding)?;
            return String::from_utf8(bytes.to_vec())
                .map_err(|_| Self::syntax("utf-8 string", "<invalid utf-8>", pos));
        }

        if self.peek_char() != Some(b'"') {
            let (text, pos) = self.token(|b| {
                !b.is_ascii_whitespace() && !matches!(b, b',' | b']' | b'}' | b'[' | b'{')
            })?;
            if text.is_empty() {
                let found = self.data.get(pos.offset).map(|&b| char::from(b).to_string());
                return Err(Self::syntax("string", &found.unwrap_or_default(), pos));
            }
            return Ok(text.to_owned());
        }

        let start = self.position();
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            let b = *self.data.get(self.pos).ok_or_else(|| self.eof())?;
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    let escaped = *self.data.get(self.pos).ok_or_else(|| self.eof())?;
                    self.pos += 1;
                    bytes.push(escaped);
                }
                b'\n' => {
                    self.line += 1;
                    bytes.push(b);
                }
                _ => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| Self::syntax("utf-8 string", "<invalid utf-8>", start))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_counts_lines() {
        let mut input = FieldInput::ascii("# header\n\n  42");
        assert_eq!(input.read_i32().unwrap(), 42);
        assert_eq!(input.position().line, 3);
        assert!(input.is_eof());
    }

    #[test]
    fn reads_hex_and_signed_integers() {
        let mut input = FieldInput::ascii("0x1F -7 +3");
        assert_eq!(input.read_i32().unwrap(), 31);
        assert_eq!(input.read_i32().unwrap(), -7);
        assert_eq!(input.read_u32().unwrap(), 3);
    }

    #[test]
    fn rejects_out_of_range_short() {
        let mut input = FieldInput::ascii("40000");
        assert!(matches!(
            input.read_i16(),
            Err(ReadError::Syntax {
                expected: "short",
                ..
            })
        ));
    }

    #[test]
    fn float_token_stops_at_separator() {
        let mut input = FieldInput::ascii("1.5e2,");
        assert!((input.read_f32().unwrap() - 150.0).abs() < f32::EPSILON);
        assert_eq!(input.read_char().unwrap(), b',');
    }

    #[test]
    fn non_finite_float_tokens() {
        let mut input = FieldInput::ascii("inf, -inf NaN -INF 2");
        assert_eq!(input.read_f32().unwrap().to_bits(), f32::INFINITY.to_bits());
        assert_eq!(input.read_char().unwrap(), b',');
        assert_eq!(input.read_f32().unwrap().to_bits(), f32::NEG_INFINITY.to_bits());
        assert!(input.read_f32().unwrap().is_nan());
        assert_eq!(input.read_f32().unwrap().to_bits(), f32::NEG_INFINITY.to_bits());
        assert!((input.read_f32().unwrap() - 2.0).abs() < f32::EPSILON);
        assert!(FieldInput::ascii("infinite").read_f32().is_err());
    }

    #[test]
    fn quoted_strings_unescape() {
        let mut input = FieldInput::ascii(r#""say \"hi\"" bare]"#);
        assert_eq!(input.read_string().unwrap(), "say \"hi\"");
        assert_eq!(input.read_string().unwrap(), "bare");
        assert_eq!(input.read_char().unwrap(), b']');
    }

    #[test]
    fn unterminated_string_is_eof() {
        let mut input = FieldInput::ascii("\"open");
        assert!(matches!(
            input.read_string(),
            Err(ReadError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn binary_respects_byte_order() {
        let big = [0, 0, 1, 0];
        let little = [0, 1, 0, 0];
        assert_eq!(
            FieldInput::binary(&big, ByteOrder::Big).read_i32().unwrap(),
            256
        );
        assert_eq!(
            FieldInput::binary(&little, ByteOrder::Little)
                .read_i32()
                .unwrap(),
            256
        );
    }

    #[test]
    fn binary_string_skips_padding() {
        let data = [0, 0, 0, 2, b'h', b'i', 0, 0, 0, 0, 0, 9];
        let mut input = FieldInput::binary(&data, ByteOrder::Big);
        assert_eq!(input.read_string().unwrap(), "hi");
        assert_eq!(input.read_i32().unwrap(), 9);
    }

    #[test]
    fn truncated_binary_is_eof() {
        let mut input = FieldInput::binary(&[0, 0], ByteOrder::Big);
        assert_eq!(
            input.read_i32(),
            Err(ReadError::UnexpectedEof {
                pos: Position { offset: 0, line: 1 }
            })
        );
    }
}
