use serde::{Deserialize, Serialize};

/// The SQL flavor templates are rendered for.
///
/// Dialects differ only in identifier quoting and placeholder style.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgresql,
    Mysql,
    Sqlserver,
}

impl Dialect {
    pub(crate) fn open_quote(self) -> char {
        match self {
            Dialect::Sqlite | Dialect::Postgresql => '"',
            Dialect::Mysql => '`',
            Dialect::Sqlserver => '[',
        }
    }

    pub(crate) fn close_quote(self) -> char {
        match self {
            Dialect::Sqlite | Dialect::Postgresql => '"',
            Dialect::Mysql => '`',
            Dialect::Sqlserver => ']',
        }
    }

    /// Writes the placeholder for the `n`th parameter (1-based).
    pub(crate) fn placeholder(self, dst: &mut String, n: usize) {
        match self {
            Dialect::Postgresql => {
                dst.push('$');
                dst.push_str(&n.to_string());
            }
            Dialect::Sqlite | Dialect::Mysql | Dialect::Sqlserver => dst.push('?'),
        }
    }
}
