// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Length + capacity buffer with power-of-two sizing.

use tracing::warn;

use crate::SpliceError;

/// Growable array of fixed-size elements.
///
/// The logical capacity is tracked separately from the backing `Vec` so the
/// sizing policy is exact and observable:
///
/// - `len() <= capacity()` at all times.
/// - Storage is allocated iff `capacity() > 0`.
/// - A non-zero capacity is a power of two, and after every reallocation
///   `capacity() / 2 < len()`.
///
/// Growing inside the current capacity never reallocates. Shrinking
/// reallocates as soon as the length drops below the previous length, but
/// the capacity only halves while `capacity / 2 >= len`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowableArray<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
        }
    }
}

impl<T> GrowableArray<T> {
    /// Create an empty array with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// View the live elements.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Mutable view of the live elements.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable element at `index`, if in range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// `base + extra`, or `None` when the sum overflows or its power-of-two
    /// capacity could not be allocated for `T`.
    pub fn checked_len(base: usize, extra: usize) -> Option<usize> {
        let max = isize::MAX.unsigned_abs() / std::mem::size_of::<T>().max(1);
        base.checked_add(extra)
            .filter(|n| n.checked_next_power_of_two().is_some_and(|cap| cap <= max))
    }
}

impl<T: Default> GrowableArray<T> {
    /// Set the length to `new_len`, applying the capacity policy.
    ///
    /// The first `min(len, new_len)` elements are preserved; new slots hold
    /// `T::default()`. Returns `true` when values were dropped, which is the
    /// caller's cue to fire its value-changed hook.
    pub fn resize(&mut self, new_len: usize) -> bool {
        let old_len = self.items.len();

        if new_len == 0 {
            self.items = Vec::new();
            self.capacity = 0;
        } else if new_len > self.capacity || new_len < old_len {
            let mut capacity = self.capacity.max(1);
            while capacity < new_len {
                capacity <<= 1;
            }
            while capacity / 2 >= new_len {
                capacity >>= 1;
            }
            self.reallocate(capacity, old_len.min(new_len));
        }

        self.items.resize_with(new_len, T::default);
        new_len < old_len
    }

    /// Open `count` default-valued slots at `start`, shifting
    /// `[start, len)` up by `count`.
    ///
    /// # Errors
    ///
    /// [`SpliceError::Insert`] if `start > len()` or the grown length is
    /// not representable; the array is unchanged.
    pub fn splice_insert(&mut self, start: usize, count: usize) -> Result<(), SpliceError> {
        if count == 0 {
            return Ok(());
        }
        let len = self.items.len();
        let new_len = Self::checked_len(len, count).filter(|_| start <= len);
        let Some(new_len) = new_len else {
            let err = SpliceError::Insert { start, count, len };
            warn!(%err, "splice_insert rejected");
            return Err(err);
        };
        self.resize(new_len);
        self.items[start..].rotate_right(count);
        Ok(())
    }

    /// Remove `[start, start + count)`, shifting the tail down.
    ///
    /// # Errors
    ///
    /// [`SpliceError::Delete`] if the range is not inside `[0, len())`; the
    /// array is unchanged.
    pub fn splice_delete(&mut self, start: usize, count: usize) -> Result<(), SpliceError> {
        if count == 0 {
            return Ok(());
        }
        let len = self.items.len();
        let end = start.saturating_add(count);
        if start >= len || end > len {
            let err = SpliceError::Delete { start, end, len };
            warn!(%err, "splice_delete rejected");
            return Err(err);
        }
        self.items[start..].rotate_left(count);
        self.resize(len - count);
        Ok(())
    }

    fn reallocate(&mut self, capacity: usize, keep: usize) {
        let mut next = Vec::with_capacity(capacity);
        next.extend(self.items.drain(..keep));
        self.items = next;
        self.capacity = capacity;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled(n: usize) -> GrowableArray<u32> {
        let mut arr = GrowableArray::new();
        arr.resize(n);
        for (i, v) in arr.as_mut_slice().iter_mut().enumerate() {
            *v = u32::try_from(i).unwrap();
        }
        arr
    }

    #[test]
    fn starts_without_storage() {
        let arr = GrowableArray::<f32>::new();
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.capacity(), 0);
    }

    #[test]
    fn grows_by_doubling() {
        let mut arr = GrowableArray::<u8>::new();
        let caps: Vec<usize> = (1..=9)
            .map(|n| {
                arr.resize(n);
                arr.capacity()
            })
            .collect();
        assert_eq!(caps, vec![1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn shrink_keeps_capacity_until_half_is_crossed() {
        let mut arr = filled(8);
        assert_eq!(arr.capacity(), 8);
        arr.resize(5);
        assert_eq!(arr.capacity(), 8);
        arr.resize(4);
        assert_eq!(arr.capacity(), 4);
        arr.resize(1);
        assert_eq!(arr.capacity(), 1);
        assert_eq!(arr.as_slice(), &[0]);
    }

    #[test]
    fn resize_to_zero_frees() {
        let mut arr = filled(6);
        assert!(arr.resize(0));
        assert_eq!(arr.capacity(), 0);
        assert!(arr.is_empty());
    }

    #[test]
    fn resize_reports_lost_values_only_on_shrink() {
        let mut arr = filled(3);
        assert!(!arr.resize(7));
        assert!(arr.resize(2));
        assert!(!arr.resize(2));
    }

    #[test]
    fn insert_shifts_tail_up() {
        let mut arr = filled(4);
        arr.splice_insert(1, 2).unwrap();
        assert_eq!(arr.as_slice(), &[0, 0, 0, 1, 2, 3]);
        assert_eq!(arr.capacity(), 8);
    }

    #[test]
    fn insert_at_end_appends() {
        let mut arr = filled(2);
        arr.splice_insert(2, 1).unwrap();
        assert_eq!(arr.as_slice(), &[0, 1, 0]);
    }

    #[test]
    fn delete_shifts_tail_down() {
        let mut arr = filled(6);
        arr.splice_delete(1, 3).unwrap();
        assert_eq!(arr.as_slice(), &[0, 4, 5]);
        assert_eq!(arr.capacity(), 4);
    }

    #[test]
    fn invalid_splices_are_noops() {
        let mut arr = filled(3);
        assert_eq!(
            arr.splice_insert(4, 1),
            Err(SpliceError::Insert {
                start: 4,
                count: 1,
                len: 3
            })
        );
        assert_eq!(
            arr.splice_delete(2, 2),
            Err(SpliceError::Delete {
                start: 2,
                end: 4,
                len: 3
            })
        );
        assert!(arr.splice_delete(3, 1).is_err());
        assert_eq!(arr.as_slice(), &[0, 1, 2]);
        assert_eq!(arr.capacity(), 4);
    }

    #[test]
    fn oversized_insert_is_rejected() {
        let mut arr = filled(3);
        assert_eq!(
            arr.splice_insert(0, usize::MAX),
            Err(SpliceError::Insert {
                start: 0,
                count: usize::MAX,
                len: 3
            })
        );
        assert!(arr.splice_insert(3, usize::MAX / 2).is_err());
        assert_eq!(arr.as_slice(), &[0, 1, 2]);
        assert_eq!(arr.capacity(), 4);
    }

    #[test]
    fn checked_len_bounds() {
        assert_eq!(GrowableArray::<u32>::checked_len(3, 5), Some(8));
        assert_eq!(GrowableArray::<u32>::checked_len(usize::MAX, 1), None);
        assert_eq!(GrowableArray::<u32>::checked_len(usize::MAX / 4, 1), None);
    }

    #[test]
    fn zero_count_splices_always_succeed() {
        let mut arr = filled(2);
        assert!(arr.splice_insert(9, 0).is_ok());
        assert!(arr.splice_delete(9, 0).is_ok());
        assert_eq!(arr.len(), 2);
    }
}
