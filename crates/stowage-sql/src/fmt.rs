//! Writers for template text.
//!
//! Templates are written in a neutral form: identifiers between `[` and `]`,
//! positional parameters as `?` and expandable lists as `%s`. The
//! [`Dialect`](crate::Dialect) turns that into concrete SQL at render time.

macro_rules! fmt {
    ($f:expr, $( $fragments:expr )*) => {{
        $(
            $fragments.to_sql($f);
        )*
    }};
}

#[derive(Debug, Default)]
pub(crate) struct Formatter {
    pub(crate) dst: String,

    /// Tuple arity of each `%s` list, in order of appearance
    pub(crate) lists: Vec<usize>,
}

pub(crate) trait ToSql {
    fn to_sql(self, f: &mut Formatter);
}

impl ToSql for &str {
    fn to_sql(self, f: &mut Formatter) {
        f.dst.push_str(self);
    }
}

impl ToSql for &String {
    fn to_sql(self, f: &mut Formatter) {
        f.dst.push_str(self);
    }
}

/// A bare identifier: `[name]`
pub(crate) struct Ident<S>(pub(crate) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql(self, f: &mut Formatter) {
        f.dst.push('[');
        f.dst.push_str(self.0.as_ref());
        f.dst.push(']');
    }
}

/// A table-qualified column: `[table].[column]`
pub(crate) struct Column<'a>(pub(crate) &'a str, pub(crate) &'a str);

impl ToSql for Column<'_> {
    fn to_sql(self, f: &mut Formatter) {
        fmt!(f, Ident(self.0) "." Ident(self.1));
    }
}

/// A positional parameter
pub(crate) struct Param;

impl ToSql for Param {
    fn to_sql(self, f: &mut Formatter) {
        f.dst.push('?');
    }
}

/// A list of values, each a tuple of the given arity, expanded at render time
pub(crate) struct List(pub(crate) usize);

impl ToSql for List {
    fn to_sql(self, f: &mut Formatter) {
        f.dst.push_str("%s");
        f.lists.push(self.0);
    }
}

/// Comma delimited
pub(crate) struct Comma<L>(pub(crate) L);

impl<L> ToSql for Comma<L>
where
    L: IntoIterator,
    L::Item: ToSql,
{
    fn to_sql(self, f: &mut Formatter) {
        let mut s = "";
        for i in self.0 {
            fmt!(f, s i);
            s = ", ";
        }
    }
}

/// `AND` delimited
pub(crate) struct Conjunction<L>(pub(crate) L);

impl<L> ToSql for Conjunction<L>
where
    L: IntoIterator,
    L::Item: ToSql,
{
    fn to_sql(self, f: &mut Formatter) {
        let mut s = "";
        for i in self.0 {
            fmt!(f, s i);
            s = " AND ";
        }
    }
}

/// A single item as is, several items as a parenthesized row value
pub(crate) struct Tuple<L>(pub(crate) L);

impl<L> ToSql for Tuple<L>
where
    L: IntoIterator,
    L::Item: ToSql,
{
    fn to_sql(self, f: &mut Formatter) {
        let mut items: Vec<_> = self.0.into_iter().collect();

        if items.len() == 1 {
            if let Some(item) = items.pop() {
                item.to_sql(f);
            }
        } else {
            fmt!(f, "(" Comma(items) ")");
        }
    }
}

/// `lhs = rhs`
pub(crate) struct Assign<A, B>(pub(crate) A, pub(crate) B);

impl<A: ToSql, B: ToSql> ToSql for Assign<A, B> {
    fn to_sql(self, f: &mut Formatter) {
        fmt!(f, self.0 " = " self.1);
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(self, f: &mut Formatter) {
        if let Some(inner) = self {
            inner.to_sql(f);
        }
    }
}
