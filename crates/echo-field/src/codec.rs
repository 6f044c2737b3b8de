// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Array-level framing for field values.
//!
//! Element encoding is delegated to [`FieldValue`]; this module only owns
//! counts, brackets, separators and line breaks.

use tracing::trace;

use crate::{FieldInput, FieldOutput, FieldValue, GrowableArray, ReadError};

/// Largest binary element count accepted before a read is rejected as
/// corrupt.
pub const MAX_BINARY_VALUES: i32 = 32768;

/// Read a whole array from `input` into `array`.
///
/// Binary: an `int32` count followed by the elements. The count is checked
/// against `0..=MAX_BINARY_VALUES` before the array is touched.
///
/// ASCII: either `[ v0, v1, ... ]` (trailing comma allowed, may be empty)
/// or a single bare value. The bracketed form grows the array one element
/// at a time and fits it to the element count at the closing bracket.
///
/// # Errors
///
/// Any [`ReadError`] from the stream. Elements already decoded stay in
/// `array`; the caller decides whether to abandon the parse.
pub fn read_values<T: FieldValue>(
    array: &mut GrowableArray<T>,
    input: &mut FieldInput<'_>,
) -> Result<(), ReadError> {
    if input.is_binary() {
        let pos = input.position();
        let count = input.read_i32()?;
        if count < 0 {
            return Err(ReadError::NegativeCount { count, pos });
        }
        if count > MAX_BINARY_VALUES {
            return Err(ReadError::CountTooLarge {
                count,
                limit: MAX_BINARY_VALUES,
                pos,
            });
        }
        let count = usize::try_from(count).unwrap_or_default();
        array.resize(count);
        for slot in array.as_mut_slice() {
            *slot = T::read(input)?;
        }
        trace!(type_name = T::TYPE_NAME, count, "read binary values");
        return Ok(());
    }

    let eof = |input: &FieldInput<'_>| ReadError::UnexpectedEof {
        pos: input.position(),
    };

    if input.peek_char().ok_or_else(|| eof(input))? != b'[' {
        array.resize(1);
        if let Some(slot) = array.get_mut(0) {
            *slot = T::read(input)?;
        }
        return Ok(());
    }
    input.read_char()?;

    let mut index = 0;
    if input.peek_char().ok_or_else(|| eof(input))? == b']' {
        input.read_char()?;
    } else {
        loop {
            if index >= array.len() {
                array.resize(index + 1);
            }
            let value = T::read(input)?;
            if let Some(slot) = array.get_mut(index) {
                *slot = value;
            }
            index += 1;

            match input.peek_char().ok_or_else(|| eof(input))? {
                b',' => {
                    input.read_char()?;
                    if input.peek_char().ok_or_else(|| eof(input))? == b']' {
                        input.read_char()?;
                        break;
                    }
                }
                b']' => {
                    input.read_char()?;
                    break;
                }
                _ => {}
            }
        }
    }
    array.resize(index);
    trace!(type_name = T::TYPE_NAME, count = index, "read ascii values");
    Ok(())
}

/// Write `values` to `out`.
///
/// Binary: count then elements. ASCII: a single value is written bare;
/// anything else is bracketed, with `[ ]` for an empty array. Every
/// `T::VALUES_PER_LINE` values the separator becomes `,\n` followed by the
/// indentation (bumped once for the continuation lines) and two spaces of
/// alignment under the opening bracket.
pub fn write_values<T: FieldValue>(values: &[T], out: &mut FieldOutput) {
    if out.is_binary() {
        out.write_i32(i32::try_from(values.len()).unwrap_or(i32::MAX));
        for v in values {
            v.write(out);
        }
        return;
    }

    match values {
        [] => out.write_str("[ ]"),
        [only] => only.write(out),
        _ => {
            let per_line = T::VALUES_PER_LINE.max(1);
            let last = values.len() - 1;
            let mut indented = false;
            out.write_str("[ ");
            for (i, v) in values.iter().enumerate() {
                v.write(out);
                if i == last {
                    continue;
                }
                if (i + 1) % per_line == 0 {
                    out.write_str(",\n");
                    if !indented {
                        out.increment_indent();
                        indented = true;
                    }
                    out.write_indent();
                    out.write_str("  ");
                } else {
                    out.write_str(", ");
                }
            }
            out.write_str(" ]");
            if indented {
                out.decrement_indent();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ByteOrder;

    fn ascii<T: FieldValue>(values: &[T]) -> String {
        let mut out = FieldOutput::ascii();
        write_values(values, &mut out);
        out.as_str().unwrap().to_owned()
    }

    fn parse<T: FieldValue>(text: &str) -> Result<Vec<T>, ReadError> {
        let mut arr = GrowableArray::new();
        read_values(&mut arr, &mut FieldInput::ascii(text))?;
        Ok(arr.as_slice().to_vec())
    }

    #[test]
    fn writes_bracketed_list() {
        assert_eq!(ascii(&[1.0_f32, 2.0, 3.0]), "[ 1, 2, 3 ]");
        assert_eq!(
            ascii(&[[0.0_f32, 1.0, 0.0], [1.0, 0.0, 0.5]]),
            "[ 0 1 0,\n    1 0 0.5 ]"
        );
    }

    #[test]
    fn singleton_and_empty_forms() {
        assert_eq!(ascii(&[5_i32]), "5");
        assert_eq!(ascii::<i32>(&[]), "[ ]");
    }

    #[test]
    fn line_breaks_every_eight_integers() {
        let values: Vec<i32> = (0..10).collect();
        assert_eq!(
            ascii(&values),
            "[ 0, 1, 2, 3, 4, 5, 6, 7,\n    8, 9 ]"
        );
    }

    #[test]
    fn indent_restored_after_write() {
        let mut out = FieldOutput::ascii();
        write_values(&[[1.0_f32; 3], [2.0; 3]], &mut out);
        assert_eq!(out.indent_level(), 0);
    }

    #[test]
    fn reads_bracketed_list_with_trailing_comma() {
        assert_eq!(parse::<i32>("[ 1, 2, 3, ]").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse::<i32>("[1 2 3]").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse::<i32>("[ ]").unwrap(), Vec::<i32>::new());
        assert_eq!(parse::<i32>("  7").unwrap(), vec![7]);
    }

    #[test]
    fn read_fits_existing_array() {
        let mut arr = GrowableArray::new();
        arr.resize(10);
        read_values::<u32>(&mut arr, &mut FieldInput::ascii("[ 4, 5 ]")).unwrap();
        assert_eq!(arr.as_slice(), &[4, 5]);
        assert_eq!(arr.capacity(), 2);
    }

    #[test]
    fn unmatched_bracket_is_eof() {
        assert!(matches!(
            parse::<i32>("[ 1, 2"),
            Err(ReadError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            parse::<i32>(""),
            Err(ReadError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn malformed_element_is_syntax_error() {
        let err = parse::<i32>("[ 1, x ]").unwrap_err();
        assert!(matches!(err, ReadError::Syntax { expected: "int32", .. }));
        assert_eq!(err.position().offset, 5);
    }

    #[test]
    fn binary_count_bounds() {
        for bad in [-1_i32, 1_000_000] {
            let mut out = FieldOutput::binary(ByteOrder::Big);
            out.write_i32(bad);
            let bytes = out.into_bytes();
            let mut arr = GrowableArray::<f32>::new();
            let err = read_values(&mut arr, &mut FieldInput::binary(&bytes, ByteOrder::Big));
            assert!(matches!(
                err,
                Err(ReadError::NegativeCount { .. } | ReadError::CountTooLarge { .. })
            ));
            assert_eq!(arr.capacity(), 0);
        }
    }

    #[test]
    fn binary_round_trip() {
        let values = vec!["a".to_owned(), String::new(), "four".to_owned()];
        let mut out = FieldOutput::binary(ByteOrder::Little);
        write_values(&values, &mut out);
        let bytes = out.into_bytes();
        let mut arr = GrowableArray::<String>::new();
        read_values(&mut arr, &mut FieldInput::binary(&bytes, ByteOrder::Little)).unwrap();
        assert_eq!(arr.as_slice(), values.as_slice());
    }

    #[test]
    fn binary_truncated_elements() {
        let mut out = FieldOutput::binary(ByteOrder::Big);
        out.write_i32(3);
        out.write_f32(1.0);
        let bytes = out.into_bytes();
        let mut arr = GrowableArray::<f32>::new();
        assert!(matches!(
            read_values(&mut arr, &mut FieldInput::binary(&bytes, ByteOrder::Big)),
            Err(ReadError::UnexpectedEof { .. })
        ));
    }
}
