pub(crate) mod prefix;

//------------ ModifyResult -------------------------------------------------

/// The outcome of a [`modify`](crate::Table::modify) call.
///
/// The variant tells which of the four outcomes the callback selected;
/// `Updated` and `Removed` carry the value that was replaced or removed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ModifyResult<V> {
    /// The prefix was not present and the callback supplied a value.
    Inserted,
    /// The prefix was present and the callback replaced its value.
    Updated(V),
    /// The prefix was present and the callback asked for removal.
    Removed(V),
    /// Nothing happened: the prefix was not present and the callback
    /// declined to supply a value.
    Unchanged,
}
