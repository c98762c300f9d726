use super::Engine;

use stowage_core::{
    driver::{
        operation::{ExecSql, QuerySql},
        Response,
    },
    err,
    stmt::{Value, ValueRecord},
    Error, Result, StatementKind,
};
use stowage_sql::Template;
use tracing::debug;

impl Engine<'_> {
    /// Runs a select and returns its rows.
    pub(super) async fn query(
        &mut self,
        table: &str,
        template: &Template,
        lens: &[usize],
        params: Vec<Value>,
    ) -> Result<Vec<ValueRecord>> {
        let kind = StatementKind::Select;
        let sql = template.render(self.dialect, lens)?;

        debug!(%kind, table, %sql, params = params.len(), "executing statement");

        self.connection
            .exec(QuerySql { sql, params }.into())
            .await
            .and_then(|response| response.rows.into_values())
            .map_err(|err| err.context(Error::statement_failed(kind, table)))
    }

    /// Runs a write and returns the number of affected rows.
    pub(super) async fn execute(
        &mut self,
        kind: StatementKind,
        table: &str,
        template: &Template,
        lens: &[usize],
        params: Vec<Value>,
    ) -> Result<u64> {
        let response = self
            .exec_sql(kind, table, template, lens, params, false)
            .await?;

        let count = response.rows.count();
        debug!(%kind, table, count, "statement affected rows");
        Ok(count)
    }

    /// Runs an insert whose key the store generates and returns that key.
    pub(super) async fn insert_returning_key(
        &mut self,
        table: &str,
        template: &Template,
        params: Vec<Value>,
    ) -> Result<Value> {
        let kind = StatementKind::Insert;
        let response = self
            .exec_sql(kind, table, template, &[], params, true)
            .await?;

        response.generated_key.ok_or_else(|| {
            err!("driver reported no generated key").context(Error::statement_failed(kind, table))
        })
    }

    async fn exec_sql(
        &mut self,
        kind: StatementKind,
        table: &str,
        template: &Template,
        lens: &[usize],
        params: Vec<Value>,
        returning_key: bool,
    ) -> Result<Response> {
        let sql = template.render(self.dialect, lens)?;

        debug!(%kind, table, %sql, params = params.len(), "executing statement");

        let op = ExecSql {
            sql,
            params,
            returning_key,
        };

        self.connection
            .exec(op.into())
            .await
            .map_err(|err| err.context(Error::statement_failed(kind, table)))
    }
}
