use crate::error::SqlBindError;
use crate::types::RowValues;

use super::scan::FromRowValue;

type WriteFn<R> = Box<dyn Fn(&mut R, RowValues, &str) -> Result<(), SqlBindError> + Send + Sync>;
type AttachFn<R> = Box<dyn Fn(&mut R) + Send + Sync>;

/// A destination type that query rows can be bound onto.
///
/// `describe` registers every field with its column tag. Implement it by hand or with
/// [`impl_record!`](crate::impl_record):
/// ```rust
/// use sql_rowbind::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Address {
///     city: String,
///     zip: String,
/// }
///
/// impl Record for Address {
///     fn describe(shape: &mut ShapeBuilder<Self>) {
///         shape.scalar("city", |a| &mut a.city);
///         shape.scalar("zip", |a| &mut a.zip);
///     }
/// }
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     address: Option<Address>,
/// }
///
/// impl Record for User {
///     fn describe(shape: &mut ShapeBuilder<Self>) {
///         shape.scalar("id", |u| &mut u.id);
///         shape.scalar("name", |u| &mut u.name);
///         shape.nested("address", |u| &mut u.address);
///     }
/// }
///
/// let shape = Shape::<User>::of().unwrap();
/// let columns: Vec<&str> = shape.columns().collect();
/// assert_eq!(columns, ["id", "name", "address_city", "address_zip"]);
/// ```
pub trait Record: Default + 'static {
    fn describe(shape: &mut ShapeBuilder<Self>);
}

/// One writable location: a fully qualified column name and how to store a value there.
pub(crate) struct FieldSlot<R> {
    pub(crate) column: String,
    write: WriteFn<R>,
}

impl<R> FieldSlot<R> {
    pub(crate) fn write(&self, record: &mut R, value: RowValues) -> Result<(), SqlBindError> {
        (self.write)(record, value, &self.column)
    }
}

/// A nested sub-record field, kept so it can be allocated before its columns are written.
pub(crate) struct NestedSlot<R> {
    pub(crate) tag: String,
    pub(crate) columns: Vec<String>,
    attach: AttachFn<R>,
}

impl<R> NestedSlot<R> {
    /// Replace whatever the parent held with a fresh default sub-record.
    pub(crate) fn attach(&self, record: &mut R) {
        (self.attach)(record);
    }
}

/// Collects field registrations for a [`Record`].
pub struct ShapeBuilder<R> {
    fields: Vec<FieldSlot<R>>,
    nested: Vec<NestedSlot<R>>,
    problem: Option<SqlBindError>,
}

impl<R: 'static> ShapeBuilder<R> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            nested: Vec::new(),
            problem: None,
        }
    }

    /// Register a scalar field under `tag`. An empty tag leaves the field unbound.
    pub fn scalar<T>(&mut self, tag: &str, field: fn(&mut R) -> &mut T) -> &mut Self
    where
        T: FromRowValue + 'static,
    {
        if tag.is_empty() {
            return self;
        }
        self.push(FieldSlot {
            column: tag.to_string(),
            write: Box::new(move |record, value, column| {
                *field(record) = T::from_row_value(value, column)?;
                Ok(())
            }),
        });
        self
    }

    /// Register an optional sub-record whose columns are prefixed with `tag_`.
    ///
    /// The sub-record may only declare scalar fields.
    pub fn nested<N>(&mut self, tag: &str, field: fn(&mut R) -> &mut Option<N>) -> &mut Self
    where
        N: Record,
    {
        if tag.is_empty() {
            return self;
        }

        let mut inner = ShapeBuilder::<N>::new();
        N::describe(&mut inner);
        if let Some(problem) = inner.problem {
            self.fail(problem);
            return self;
        }
        if !inner.nested.is_empty() {
            self.fail(SqlBindError::UnsupportedNesting(tag.to_string()));
            return self;
        }

        let mut columns = Vec::with_capacity(inner.fields.len());
        for slot in inner.fields {
            let column = format!("{tag}_{}", slot.column);
            let inner_write = slot.write;
            columns.push(column.clone());
            self.push(FieldSlot {
                column,
                write: Box::new(move |record, value, column| {
                    let sub = field(record).get_or_insert_with(N::default);
                    inner_write(sub, value, column)
                }),
            });
        }

        self.nested.push(NestedSlot {
            tag: tag.to_string(),
            columns,
            attach: Box::new(move |record| *field(record) = Some(N::default())),
        });
        self
    }

    fn push(&mut self, slot: FieldSlot<R>) {
        if self.fields.iter().any(|existing| existing.column == slot.column) {
            self.fail(SqlBindError::DuplicateTag(slot.column));
            return;
        }
        self.fields.push(slot);
    }

    fn fail(&mut self, problem: SqlBindError) {
        // first problem wins
        if self.problem.is_none() {
            self.problem = Some(problem);
        }
    }
}

/// The registered field layout of a record type.
pub struct Shape<R> {
    fields: Vec<FieldSlot<R>>,
    nested: Vec<NestedSlot<R>>,
}

impl<R: Record> Shape<R> {
    /// Run `R::describe` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBindError::DuplicateTag`] when two fields resolve to the same column name,
    /// or [`SqlBindError::UnsupportedNesting`] when a nested record nests again.
    pub fn of() -> Result<Self, SqlBindError> {
        let mut builder = ShapeBuilder::new();
        R::describe(&mut builder);
        match builder.problem {
            Some(problem) => Err(problem),
            None => Ok(Self {
                fields: builder.fields,
                nested: builder.nested,
            }),
        }
    }
}

impl<R> Shape<R> {
    /// Fully qualified column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|slot| slot.column.as_str())
    }

    /// Tags of the nested sub-record fields.
    pub fn nested_tags(&self) -> impl Iterator<Item = &str> {
        self.nested.iter().map(|slot| slot.tag.as_str())
    }

    pub(crate) fn fields(&self) -> &[FieldSlot<R>] {
        &self.fields
    }

    pub(crate) fn nested(&self) -> &[NestedSlot<R>] {
        &self.nested
    }
}

impl<R> std::fmt::Debug for Shape<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("columns", &self.columns().collect::<Vec<_>>())
            .field("nested", &self.nested_tags().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Inner {
        a: i64,
        deeper: Option<Leaf>,
    }

    #[derive(Default)]
    struct Leaf {
        x: i64,
    }

    impl Record for Leaf {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.scalar("x", |l| &mut l.x);
        }
    }

    impl Record for Inner {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.scalar("a", |i| &mut i.a);
            shape.nested("deeper", |i| &mut i.deeper);
        }
    }

    #[derive(Default)]
    struct TwoLevels {
        inner: Option<Inner>,
    }

    impl Record for TwoLevels {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.nested("inner", |t| &mut t.inner);
        }
    }

    #[derive(Default)]
    struct Clash {
        first: i64,
        second: i64,
    }

    impl Record for Clash {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.scalar("id", |c| &mut c.first);
            shape.scalar("id", |c| &mut c.second);
        }
    }

    #[derive(Default)]
    struct PrefixClash {
        leaf_x: i64,
        leaf: Option<Leaf>,
    }

    impl Record for PrefixClash {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.scalar("leaf_x", |p| &mut p.leaf_x);
            shape.nested("leaf", |p| &mut p.leaf);
        }
    }

    #[derive(Default)]
    struct Skips {
        kept: i64,
        ignored: i64,
        no_tag: Option<Leaf>,
    }

    impl Record for Skips {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.scalar("kept", |s| &mut s.kept);
            shape.scalar("", |s| &mut s.ignored);
            shape.nested("", |s| &mut s.no_tag);
        }
    }

    #[test]
    fn duplicate_scalar_tags_are_rejected() {
        let err = Shape::<Clash>::of().unwrap_err();
        assert!(matches!(err, SqlBindError::DuplicateTag(ref c) if c == "id"), "{err:?}");
    }

    #[test]
    fn nested_composite_key_clashing_with_scalar_is_rejected() {
        let err = Shape::<PrefixClash>::of().unwrap_err();
        assert!(matches!(err, SqlBindError::DuplicateTag(ref c) if c == "leaf_x"), "{err:?}");
    }

    #[test]
    fn second_level_nesting_is_rejected() {
        let err = Shape::<TwoLevels>::of().unwrap_err();
        assert!(matches!(err, SqlBindError::UnsupportedNesting(ref t) if t == "inner"), "{err:?}");
    }

    #[test]
    fn empty_tags_are_ignored() {
        let shape = Shape::<Skips>::of().unwrap();
        assert_eq!(shape.columns().collect::<Vec<_>>(), ["kept"]);
        assert_eq!(shape.nested_tags().count(), 0);
    }
}
