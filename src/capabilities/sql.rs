//! Natural-language to SQL.

use crate::capabilities::dispatch::Dispatcher;
use crate::capabilities::{Args, Invoke};
use crate::transport::Session;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Dialect sent when the caller does not name one.
pub const DEFAULT_SQL_TYPE: &str = "vanilla";

#[derive(Clone)]
pub struct Sql {
    dispatcher: Dispatcher,
}

impl Sql {
    pub const NAME: &'static str = "multi/sql";
    pub const PATH: &'static str = "/sql";

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Translate `query` against `sql_schema`; `sql_type` defaults to
    /// [`DEFAULT_SQL_TYPE`].
    pub fn call(&self, query: &str, sql_schema: &str, sql_type: Option<&str>) -> Result<Value> {
        self.dispatcher
            .post(Self::NAME, Self::PATH, &payload(query, sql_schema, sql_type))
    }

    pub async fn call_async(
        &self,
        query: &str,
        sql_schema: &str,
        sql_type: Option<&str>,
        session: Option<&Session>,
    ) -> Result<Value> {
        self.dispatcher
            .post_async(
                Self::NAME,
                Self::PATH,
                &payload(query, sql_schema, sql_type),
                session,
            )
            .await
    }
}

fn payload(query: &str, sql_schema: &str, sql_type: Option<&str>) -> Value {
    json!({
        "query": query,
        "sql_schema": sql_schema,
        "sql_type": sql_type.unwrap_or(DEFAULT_SQL_TYPE),
    })
}

#[async_trait]
impl Invoke for Sql {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn invoke(&self, args: &Value) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call(
            args.str("query")?,
            args.str("sql_schema")?,
            args.opt_str("sql_type")?,
        )
    }

    async fn invoke_async(&self, args: &Value, session: Option<&Session>) -> Result<Value> {
        let args = Args::new(Self::NAME, args)?;
        self.call_async(
            args.str("query")?,
            args.str("sql_schema")?,
            args.opt_str("sql_type")?,
            session,
        )
        .await
    }
}
