// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-value field: the array-valued node attribute.

use std::any::Any;
use std::fmt;

use tracing::warn;

use crate::{
    read_values, write_values, FieldError, FieldInput, FieldOutput, FieldValue, GrowableArray,
    ReadError, SpliceError,
};

/// Upstream producer for a derived field.
///
/// A connected field pulls from its source before any externally visible
/// read, so the values it reports are always current.
pub trait FieldSource<T>: Send {
    /// Refresh `dest` if the upstream value changed. Returns `true` when
    /// `dest` was rewritten.
    fn pull(&mut self, dest: &mut GrowableArray<T>) -> bool;
}

type Notify = Box<dyn FnMut() + Send>;

/// Array-valued field of `T`.
///
/// Reads that the outside world can observe (`num`, `values`, `get`,
/// `get1_string`, `write_value`) take `&mut self` because they evaluate a
/// connected [`FieldSource`] first.
///
/// Every mutation that changes values fires the value-changed hook once:
/// shrinking [`set_num`](MField::set_num), splices, setters, bulk
/// [`edit`](MField::edit), and a successful [`read_value`](MField::read_value).
/// Growing with `set_num` alone does not, since no prior value changes.
pub struct MField<T: FieldValue> {
    values: GrowableArray<T>,
    source: Option<Box<dyn FieldSource<T>>>,
    notify: Option<Notify>,
    changes: u64,
}

impl<T: FieldValue> Default for MField<T> {
    fn default() -> Self {
        Self {
            values: GrowableArray::new(),
            source: None,
            notify: None,
            changes: 0,
        }
    }
}

impl<T: FieldValue> fmt::Debug for MField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MField")
            .field("type", &T::TYPE_NAME)
            .field("values", &self.values.as_slice())
            .field("connected", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: FieldValue> MField<T> {
    /// Create an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a field holding `values`.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let mut field = Self::new();
        for v in values {
            let n = field.values.len();
            field.values.resize(n + 1);
            if let Some(slot) = field.values.get_mut(n) {
                *slot = v;
            }
        }
        field
    }

    /// Install the value-changed hook, replacing any previous one.
    pub fn set_notify(&mut self, notify: impl FnMut() + Send + 'static) {
        self.notify = Some(Box::new(notify));
    }

    /// Number of value-changed notifications fired so far.
    pub fn change_count(&self) -> u64 {
        self.changes
    }

    /// Connect an upstream source. The field is evaluated on the next read.
    pub fn connect(&mut self, source: impl FieldSource<T> + 'static) {
        self.source = Some(Box::new(source));
    }

    /// Drop the upstream source, keeping the last evaluated values.
    pub fn disconnect(&mut self) {
        self.source = None;
    }

    /// Returns `true` if a source is connected.
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Pull from the connected source, if any.
    pub fn evaluate(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.pull(&mut self.values);
        }
    }

    fn value_changed(&mut self) {
        self.changes += 1;
        if let Some(notify) = self.notify.as_mut() {
            notify();
        }
    }

    /// Number of values.
    pub fn num(&mut self) -> usize {
        self.evaluate();
        self.values.len()
    }

    /// All values.
    pub fn values(&mut self) -> &[T] {
        self.evaluate();
        self.values.as_slice()
    }

    /// Value at `index`.
    pub fn get(&mut self, index: usize) -> Option<&T> {
        self.evaluate();
        self.values.get(index)
    }

    /// Allocated slots; never evaluates.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Truncate to, or extend to, `num` values. New slots hold
    /// `T::default()`.
    pub fn set_num(&mut self, num: usize) {
        if self.values.resize(num) {
            self.value_changed();
        }
    }

    /// Replace the contents with the single value `value`.
    pub fn set_value(&mut self, value: T) {
        self.values.resize(1);
        if let Some(slot) = self.values.get_mut(0) {
            *slot = value;
        }
        self.value_changed();
    }

    /// Set the value at `index`, growing the array first if needed.
    ///
    /// # Errors
    ///
    /// [`SpliceError::Insert`] if the array cannot grow to hold `index`;
    /// the field is unchanged.
    pub fn set1_value(&mut self, index: usize, value: T) -> Result<(), SpliceError> {
        self.grow_to(index, 1)?;
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
        self.value_changed();
        Ok(())
    }

    /// Copy `values` into the field starting at `start`, growing the array
    /// first if needed.
    ///
    /// # Errors
    ///
    /// [`SpliceError::Insert`] if the array cannot grow to hold
    /// `start + values.len()` values; the field is unchanged.
    pub fn set_values(&mut self, start: usize, values: &[T]) -> Result<(), SpliceError> {
        let end = self.grow_to(start, values.len())?;
        self.values.as_mut_slice()[start..end].clone_from_slice(values);
        self.value_changed();
        Ok(())
    }

    /// Make room for `count` values at `start`; returns the end index.
    fn grow_to(&mut self, start: usize, count: usize) -> Result<usize, SpliceError> {
        let len = self.values.len();
        let Some(end) = GrowableArray::<T>::checked_len(start, count) else {
            let err = SpliceError::Insert { start, count, len };
            warn!(field = T::TYPE_NAME, %err, "set rejected");
            return Err(err);
        };
        if end > len {
            self.values.resize(end);
        }
        Ok(end)
    }

    /// Edit the values in place, then notify once.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R {
        self.evaluate();
        let out = f(self.values.as_mut_slice());
        self.value_changed();
        out
    }

    /// Remove `count` values from `start`; `None` removes through the end.
    ///
    /// # Errors
    ///
    /// [`SpliceError`] if the range is invalid; the field is unchanged.
    pub fn delete_values(&mut self, start: usize, count: Option<usize>) -> Result<(), SpliceError> {
        self.evaluate();
        let len = self.values.len();
        let count = match count {
            Some(count) => count,
            None if start <= len => len - start,
            None => {
                let err = SpliceError::Delete {
                    start,
                    end: len,
                    len,
                };
                warn!(%err, "delete_values rejected");
                return Err(err);
            }
        };
        if count == 0 {
            return Ok(());
        }
        self.values.splice_delete(start, count)?;
        self.value_changed();
        Ok(())
    }

    /// Open `count` default-valued slots at `start`, shifting later values
    /// up.
    ///
    /// # Errors
    ///
    /// [`SpliceError`] if `start` is past the end; the field is unchanged.
    pub fn insert_space(&mut self, start: usize, count: usize) -> Result<(), SpliceError> {
        self.evaluate();
        if count == 0 {
            return Ok(());
        }
        self.values.splice_insert(start, count)?;
        self.value_changed();
        Ok(())
    }

    /// Parse one ASCII value from `text` into slot `index`.
    ///
    /// # Errors
    ///
    /// [`FieldError::Read`] if `text` is not a valid value,
    /// [`FieldError::Splice`] if slot `index` cannot be created; either way
    /// the field is unchanged.
    pub fn set1_from_str(&mut self, index: usize, text: &str) -> Result<(), FieldError> {
        let value = T::read(&mut FieldInput::ascii(text))?;
        self.set1_value(index, value)?;
        Ok(())
    }

    /// Format the value at `index` as ASCII.
    pub fn get1_string(&mut self, index: usize) -> Option<String> {
        let value = self.get(index)?;
        let mut out = FieldOutput::ascii();
        value.write(&mut out);
        out.as_str().map(str::to_owned)
    }

    /// Read all values from `input`.
    ///
    /// # Errors
    ///
    /// [`ReadError`] on malformed or truncated input. The failure is also
    /// logged with its stream position. Values decoded before the failure
    /// are kept, and the hook fires if they differ from what was there.
    pub fn read_value(&mut self, input: &mut FieldInput<'_>) -> Result<(), ReadError> {
        let before = self.values.as_slice().to_vec();
        match read_values(&mut self.values, input) {
            Ok(()) => {
                self.value_changed();
                Ok(())
            }
            Err(err) => {
                warn!(field = T::TYPE_NAME, %err, "field read failed");
                if self.values.as_slice() != before.as_slice() {
                    self.value_changed();
                }
                Err(err)
            }
        }
    }

    /// Write all values to `out`.
    pub fn write_value(&mut self, out: &mut FieldOutput) {
        self.evaluate();
        write_values(self.values.as_slice(), out);
    }
}

/// Type-erased view of an [`MField`], dispatched once per array.
pub trait AnyField: Send {
    /// Field type name, e.g. `MFVec3f`.
    fn type_name(&self) -> &'static str;

    /// Number of values (evaluates).
    fn num(&mut self) -> usize;

    /// Read all values from `input`.
    ///
    /// # Errors
    ///
    /// [`ReadError`] on malformed or truncated input.
    fn read_value(&mut self, input: &mut FieldInput<'_>) -> Result<(), ReadError>;

    /// Write all values to `out`.
    fn write_value(&mut self, out: &mut FieldOutput);

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: FieldValue> AnyField for MField<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn num(&mut self) -> usize {
        Self::num(self)
    }

    fn read_value(&mut self, input: &mut FieldInput<'_>) -> Result<(), ReadError> {
        Self::read_value(self, input)
    }

    fn write_value(&mut self, out: &mut FieldOutput) {
        Self::write_value(self, out);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
