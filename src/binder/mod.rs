//! Bind cursor rows onto records by column name.
//!
//! A record registers its fields once through [`Record::describe`]. For every row the binder
//! builds a field map from the registered shape, resolves each result column to a field, and
//! only then asks the cursor to scan the row. A column without a field is a schema mismatch and
//! is never skipped.

mod field_map;
mod macros;
pub mod scan;
pub mod shape;

use serde::Deserialize;
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::SqlBindError;

use field_map::{FieldMap, Locations};
pub use scan::FromRowValue;
pub use shape::{Record, Shape, ShapeBuilder};

/// What to do when a query returns a column the record has no field for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Abort with a panic. The mismatch is a bug in the query or the record.
    #[default]
    Panic,
    /// Return [`SqlBindError::SchemaMismatch`].
    Error,
}

/// When nested sub-records are allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedAllocation {
    /// Every nested field gets a fresh sub-record for every bound row, whether or not any of
    /// its columns were selected.
    #[default]
    Eager,
    /// A nested field is only replaced when at least one of its columns is selected.
    WhenSelected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    pub on_mismatch: MismatchPolicy,
    pub nested_allocation: NestedAllocation,
}

/// Binds rows with a fixed set of [`BindOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Binder {
    options: BindOptions,
}

impl Binder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: BindOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// Bind the first row of `cursor` into `dest`.
    ///
    /// With no rows, `dest` is left untouched and `Ok(())` is returned. Only the first row is
    /// consumed; the cursor stays open.
    ///
    /// # Errors
    ///
    /// Returns shape registration errors, [`SqlBindError::SchemaMismatch`] under
    /// [`MismatchPolicy::Error`], and any cursor or conversion error unchanged.
    ///
    /// # Panics
    ///
    /// Panics on an unknown column under [`MismatchPolicy::Panic`].
    pub fn bind_one<R, C>(&self, cursor: &mut C, dest: &mut R) -> Result<(), SqlBindError>
    where
        R: Record,
        C: Cursor + ?Sized,
    {
        let shape = Shape::<R>::of()?;
        if !cursor.advance()? {
            debug!("bind_one: empty result, destination unchanged");
            return Ok(());
        }
        self.bind_current(&shape, cursor, dest)
    }

    /// Bind every row of `cursor` into a new vector that replaces `dest`.
    ///
    /// Rows are all-or-nothing: if any row fails, `dest` keeps its previous contents and the
    /// rows bound so far are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`bind_one`](Self::bind_one), for any row.
    ///
    /// # Panics
    ///
    /// Panics on an unknown column under [`MismatchPolicy::Panic`].
    pub fn bind_all<R, C>(&self, cursor: &mut C, dest: &mut Vec<R>) -> Result<(), SqlBindError>
    where
        R: Record,
        C: Cursor + ?Sized,
    {
        let shape = Shape::<R>::of()?;
        let mut items = Vec::new();
        while cursor.advance()? {
            let mut item = R::default();
            self.bind_current(&shape, cursor, &mut item)?;
            items.push(item);
        }
        debug!(rows = items.len(), "bind_all: bound rows");
        *dest = items;
        Ok(())
    }

    fn bind_current<R, C>(
        &self,
        shape: &Shape<R>,
        cursor: &mut C,
        record: &mut R,
    ) -> Result<(), SqlBindError>
    where
        R: Record,
        C: Cursor + ?Sized,
    {
        let columns = cursor.column_names();
        let map = FieldMap::build(shape, record, columns, self.options.nested_allocation);
        let slots = map.resolve(columns, self.options.on_mismatch)?;
        let mut locations = Locations::new(record, slots);
        cursor.scan_into(&mut locations)
    }
}

/// [`Binder::bind_one`] with default options.
///
/// # Errors
///
/// See [`Binder::bind_one`].
pub fn bind_one<R, C>(cursor: &mut C, dest: &mut R) -> Result<(), SqlBindError>
where
    R: Record,
    C: Cursor + ?Sized,
{
    Binder::new().bind_one(cursor, dest)
}

/// [`Binder::bind_all`] with default options.
///
/// # Errors
///
/// See [`Binder::bind_all`].
pub fn bind_all<R, C>(cursor: &mut C, dest: &mut Vec<R>) -> Result<(), SqlBindError>
where
    R: Record,
    C: Cursor + ?Sized,
{
    Binder::new().bind_all(cursor, dest)
}
