use super::Dialect;

use stowage_core::{bail, Result};

/// A parameterized SQL statement in dialect-neutral form.
///
/// Identifiers are written `[name]`, parameters `?`, and each `%s` stands for
/// a list of values whose tuple arity is recorded in [`lists`](Self::lists).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    sql: String,
    lists: Vec<usize>,
}

impl Template {
    pub(crate) fn new(sql: String, lists: Vec<usize>) -> Self {
        Self { sql, lists }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Tuple arity of each list marker, in order of appearance.
    pub fn lists(&self) -> &[usize] {
        &self.lists
    }

    /// Renders the template for `dialect`, expanding list `i` to `lens[i]`
    /// tuples.
    pub fn render(&self, dialect: Dialect, lens: &[usize]) -> Result<String> {
        if lens.len() != self.lists.len() {
            bail!(
                "template has {} list(s) but {} length(s) were supplied",
                self.lists.len(),
                lens.len()
            );
        }

        let mut dst = String::with_capacity(self.sql.len() + 16);
        let mut params = 0;
        let mut list = 0;
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                // String literals are copied as written; `''` escapes reopen
                // the literal on the next pass.
                '\'' => {
                    dst.push(c);

                    for c in chars.by_ref() {
                        dst.push(c);

                        if c == '\'' {
                            break;
                        }
                    }
                }
                '[' => dst.push(dialect.open_quote()),
                ']' => dst.push(dialect.close_quote()),
                '?' => {
                    params += 1;
                    dialect.placeholder(&mut dst, params);
                }
                '%' if chars.peek() == Some(&'s') => {
                    chars.next();

                    let (Some(&arity), Some(&len)) = (self.lists.get(list), lens.get(list)) else {
                        bail!("`{}` has more list markers than declared lists", self.sql);
                    };
                    list += 1;

                    if len == 0 {
                        bail!("cannot render an empty list into `{}`", self.sql);
                    }

                    for item in 0..len {
                        if item > 0 {
                            dst.push_str(", ");
                        }

                        if arity > 1 {
                            dst.push('(');
                        }

                        for component in 0..arity {
                            if component > 0 {
                                dst.push_str(", ");
                            }
                            params += 1;
                            dialect.placeholder(&mut dst, params);
                        }

                        if arity > 1 {
                            dst.push(')');
                        }
                    }
                }
                c => dst.push(c),
            }
        }

        Ok(dst)
    }

    /// Appends a caller-supplied `WHERE` clause. The clause may use `[name]`
    /// identifiers and `?` parameters outside of `'...'` literals.
    pub fn with_where(&self, clause: &str) -> Template {
        Template {
            sql: format!("{} WHERE {clause}", self.sql),
            lists: self.lists.clone(),
        }
    }

    /// Renders a template that has no lists.
    pub fn render_plain(&self, dialect: Dialect) -> Result<String> {
        self.render(dialect, &[])
    }
}
