use serde::{Deserialize, Serialize};
use stowage_sql::Dialect;

/// Settings that can live in an application's configuration file.
///
/// ```
/// # use stowage::{Config, Dialect};
/// let config: Config = serde_json::from_str(r#"{ "dialect": "postgresql" }"#).unwrap();
/// assert_eq!(config.dialect, Dialect::Postgresql);
/// assert_eq!(config.table_name_prefix, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dialect templates are rendered for
    pub dialect: Dialect,

    /// Prefix applied to every table name
    pub table_name_prefix: Option<String>,
}
