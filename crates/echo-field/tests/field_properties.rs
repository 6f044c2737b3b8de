// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! Property tests for array sizing, splices and the value codecs.

use echo_field::{
    ByteOrder, FieldInput, FieldOutput, FieldValue, GrowableArray, MField, ReadError,
};
use proptest::prelude::*;

fn ascii_round_trip<T: FieldValue>(values: &[T]) -> Result<Vec<T>, ReadError> {
    let mut field = MField::from_values(values.iter().cloned());
    let mut out = FieldOutput::ascii();
    field.write_value(&mut out);
    let text = out.as_str().unwrap_or_default().to_owned();

    let mut back = MField::<T>::new();
    back.read_value(&mut FieldInput::ascii(&text))?;
    Ok(back.values().to_vec())
}

fn binary_round_trip<T: FieldValue>(values: &[T], order: ByteOrder) -> Result<Vec<T>, ReadError> {
    let mut field = MField::from_values(values.iter().cloned());
    let mut out = FieldOutput::binary(order);
    field.write_value(&mut out);
    let bytes = out.into_bytes();

    let mut back = MField::<T>::new();
    let mut input = FieldInput::binary(&bytes, order);
    back.read_value(&mut input)?;
    assert!(input.is_eof());
    Ok(back.values().to_vec())
}

fn finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite())
}

/// Finite values plus both infinities, which the ASCII writer spells
/// `inf` and `-inf`.
fn non_nan_f32() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => finite_f32(),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
    ]
}

fn order() -> impl Strategy<Value = ByteOrder> {
    prop_oneof![Just(ByteOrder::Big), Just(ByteOrder::Little)]
}

proptest! {
    #[test]
    fn capacity_invariant_holds(lengths in prop::collection::vec(0usize..300, 1..40)) {
        let mut arr = GrowableArray::<u8>::new();
        for len in lengths {
            arr.resize(len);
            let cap = arr.capacity();
            prop_assert_eq!(arr.len(), len);
            prop_assert!(cap >= len);
            if cap == 0 {
                prop_assert_eq!(len, 0);
            } else {
                prop_assert!(cap.is_power_of_two());
                prop_assert!(cap / 2 < len);
            }
        }
    }

    #[test]
    fn splice_round_trip(
        values in prop::collection::vec(any::<i32>(), 0..64),
        start_seed in any::<usize>(),
        count in 1usize..20,
    ) {
        let start = start_seed % (values.len() + 1);
        let mut field = MField::from_values(values.iter().copied());
        field.insert_space(start, count).unwrap();
        prop_assert_eq!(field.num(), values.len() + count);
        prop_assert_eq!(&field.values()[..start], &values[..start]);
        prop_assert_eq!(&field.values()[start + count..], &values[start..]);
        field.delete_values(start, Some(count)).unwrap();
        prop_assert_eq!(field.values(), values.as_slice());
    }

    #[test]
    fn int_codecs_round_trip(values in prop::collection::vec(any::<i32>(), 0..100), order in order()) {
        prop_assert_eq!(ascii_round_trip(&values).unwrap(), values.clone());
        prop_assert_eq!(binary_round_trip(&values, order).unwrap(), values);
    }

    #[test]
    fn float_codecs_round_trip(values in prop::collection::vec(non_nan_f32(), 0..100), order in order()) {
        prop_assert_eq!(ascii_round_trip(&values).unwrap(), values.clone());
        prop_assert_eq!(binary_round_trip(&values, order).unwrap(), values);
    }

    #[test]
    fn vec3_codecs_round_trip(
        values in prop::collection::vec(prop::array::uniform3(non_nan_f32()), 0..40),
        order in order(),
    ) {
        prop_assert_eq!(ascii_round_trip(&values).unwrap(), values.clone());
        prop_assert_eq!(binary_round_trip(&values, order).unwrap(), values);
    }

    #[test]
    fn string_codecs_round_trip(values in prop::collection::vec("\\PC{0,12}", 0..20), order in order()) {
        prop_assert_eq!(ascii_round_trip(&values).unwrap(), values.clone());
        prop_assert_eq!(binary_round_trip(&values, order).unwrap(), values);
    }

    #[test]
    fn arbitrary_binary_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut field = MField::<String>::new();
        let _ = field.read_value(&mut FieldInput::binary(&bytes, ByteOrder::Big));
    }
}

#[test]
fn documented_ascii_example() {
    let mut field = MField::from_values([1.0_f32, 2.0, 3.0]);
    let mut out = FieldOutput::ascii();
    field.write_value(&mut out);
    assert_eq!(out.as_str(), Some("[ 1, 2, 3 ]"));
    assert_eq!(ascii_round_trip(&[1.0_f32, 2.0, 3.0]).unwrap(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn non_finite_floats_read_back() {
    let mut field = MField::from_values([f32::INFINITY, 1.0, f32::NEG_INFINITY, f32::NAN]);
    let mut out = FieldOutput::ascii();
    field.write_value(&mut out);
    assert_eq!(out.as_str(), Some("[ inf, 1, -inf, NaN ]"));

    let mut back = MField::<f32>::new();
    back.read_value(&mut FieldInput::ascii(out.as_str().unwrap_or_default()))
        .unwrap();
    let bits: Vec<u32> = back.values()[..3].iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, [f32::INFINITY.to_bits(), 1.0_f32.to_bits(), f32::NEG_INFINITY.to_bits()]);
    assert!(back.values()[3].is_nan());
}

#[test]
fn coordinate_block_layout() {
    let mut out = FieldOutput::ascii();
    out.increment_indent();
    let mut point = MField::from_values([[-1.0_f32, 1.0, 0.0], [-1.0, -1.0, 0.0], [1.0, -1.0, 0.0]]);
    point.write_value(&mut out);
    assert_eq!(
        out.as_str(),
        Some("[ -1 1 0,\n      -1 -1 0,\n      1 -1 0 ]")
    );
    assert_eq!(out.indent_level(), 1);
}
