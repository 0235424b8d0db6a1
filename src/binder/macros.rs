/// Implement [`Record`](crate::binder::Record) from a field-to-tag list.
///
/// Scalar fields come first; nested sub-record fields (`Option<N>` where `N: Record`) follow in
/// an optional `nested { .. }` block. An empty tag leaves the field unbound.
///
/// ```rust
/// use sql_rowbind::impl_record;
///
/// #[derive(Debug, Default)]
/// struct Address {
///     city: String,
///     zip: String,
/// }
/// impl_record!(Address { city: "city", zip: "zip" });
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     cached: String,
///     address: Option<Address>,
/// }
/// impl_record!(User { id: "id", name: "name", cached: "" } nested { address: "address" });
/// ```
#[macro_export]
macro_rules! impl_record {
    (
        $ty:ty { $($field:ident : $tag:literal),* $(,)? }
        $(nested { $($nested:ident : $ntag:literal),* $(,)? })?
    ) => {
        impl $crate::binder::Record for $ty {
            fn describe(shape: &mut $crate::binder::ShapeBuilder<Self>) {
                $( shape.scalar($tag, |record| &mut record.$field); )*
                $($( shape.nested($ntag, |record| &mut record.$nested); )*)?
            }
        }
    };
}
