use std::collections::HashMap;

use tracing::error;

use crate::cursor::RowSink;
use crate::error::SqlBindError;
use crate::types::RowValues;

use super::shape::{FieldSlot, Shape};
use super::{MismatchPolicy, NestedAllocation};

/// Column name to writable location, built fresh for each bound record.
pub(crate) struct FieldMap<'s, R> {
    slots: HashMap<&'s str, &'s FieldSlot<R>>,
}

impl<'s, R> FieldMap<'s, R> {
    /// Index the shape's fields and attach nested sub-records to `record`.
    ///
    /// Under [`NestedAllocation::Eager`] every nested field is replaced with a default
    /// sub-record; under [`NestedAllocation::WhenSelected`] only those with at least one
    /// column in `columns` are, and the rest keep their current value.
    pub(crate) fn build(
        shape: &'s Shape<R>,
        record: &mut R,
        columns: &[String],
        allocation: NestedAllocation,
    ) -> Self {
        for nested in shape.nested() {
            let allocate = match allocation {
                NestedAllocation::Eager => true,
                NestedAllocation::WhenSelected => {
                    nested.columns.iter().any(|column| columns.contains(column))
                }
            };
            if allocate {
                nested.attach(record);
            }
        }

        let slots = shape
            .fields()
            .iter()
            .map(|slot| (slot.column.as_str(), slot))
            .collect();
        Self { slots }
    }

    /// Map each column, in order, to its location.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBindError::SchemaMismatch`] for the first unknown column when `policy` is
    /// [`MismatchPolicy::Error`].
    ///
    /// # Panics
    ///
    /// Panics on the first unknown column when `policy` is [`MismatchPolicy::Panic`].
    pub(crate) fn resolve(
        &self,
        columns: &[String],
        policy: MismatchPolicy,
    ) -> Result<Vec<&'s FieldSlot<R>>, SqlBindError> {
        let mut resolved = Vec::with_capacity(columns.len());
        for column in columns {
            match self.slots.get(column.as_str()) {
                Some(slot) => resolved.push(*slot),
                None => {
                    error!(column = %column, "query column has no destination field");
                    match policy {
                        MismatchPolicy::Panic => panic!("No target for column {column}"),
                        MismatchPolicy::Error => {
                            return Err(SqlBindError::SchemaMismatch {
                                column: column.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(resolved)
    }
}

/// The ordered locations of one record, handed to [`Cursor::scan_into`](crate::cursor::Cursor::scan_into).
pub(crate) struct Locations<'a, 's, R> {
    record: &'a mut R,
    slots: Vec<&'s FieldSlot<R>>,
}

impl<'a, 's, R> Locations<'a, 's, R> {
    pub(crate) fn new(record: &'a mut R, slots: Vec<&'s FieldSlot<R>>) -> Self {
        Self { record, slots }
    }
}

impl<R> RowSink for Locations<'_, '_, R> {
    fn width(&self) -> usize {
        self.slots.len()
    }

    fn write(&mut self, position: usize, value: RowValues) -> Result<(), SqlBindError> {
        let slot = self
            .slots
            .get(position)
            .ok_or(SqlBindError::ColumnCountMismatch {
                expected: self.slots.len(),
                actual: position + 1,
            })?;
        slot.write(self.record, value)
    }
}
