//! Relational store tools.
//!
//! Each tool holds the shared [`RelationalStore`] and maps onto exactly one
//! of its operations. Statements run as given; positional `$n` parameters are
//! bound by JSON kind (see [`SqlParam`]).

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use crate::backends::RelationalStore;
use crate::backends::store::SqlParam;
use crate::core::error::Result;
use crate::domains::tools::arguments::ArgumentBag;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolHandler, to_payload};
use crate::domains::tools::registry::{ToolDescriptor, ToolRegistryBuilder};
use crate::domains::tools::schema::{FieldKind, FieldSpec, ToolSchema};

fn params_field() -> FieldSpec {
    FieldSpec::new(
        "params",
        FieldKind::array_of(FieldKind::Scalar),
        "Positional parameters for $1, $2, ... Strings bind as text, integers as int8, \
         other numbers as float8; cast the placeholder in SQL for other column types ($1::date)",
    )
}

fn params(args: &ArgumentBag) -> std::result::Result<Vec<SqlParam>, ToolError> {
    Ok(SqlParam::from_json_list(args.list("params"))?)
}

pub struct PostgresQueryTool {
    store: Arc<dyn RelationalStore>,
}

impl PostgresQueryTool {
    pub const NAME: &'static str = "postgres_query";
    pub const DESCRIPTION: &'static str =
        "Run a SQL query against PostgreSQL and return the rows as JSON objects. \
         Parameters bind by JSON kind: pass numbers as numbers, or cast the placeholder ($1::int).";

    pub fn descriptor(store: Arc<dyn RelationalStore>) -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("query", FieldKind::String, "SQL query to execute").required())
            .field(params_field());
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Query",
            schema,
            Arc::new(Self { store }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for PostgresQueryTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let sql = args.require_str("query")?;
        let rows = self.store.query(sql, &params(args)?).await?;
        info!("Query returned {} row(s)", rows.len());
        to_payload(rows)
    }
}

pub struct PostgresExecuteTool {
    store: Arc<dyn RelationalStore>,
}

impl PostgresExecuteTool {
    pub const NAME: &'static str = "postgres_execute";
    pub const DESCRIPTION: &'static str =
        "Run a SQL command (INSERT, UPDATE, DELETE, DDL) against PostgreSQL and report the affected row count. \
         Parameters bind by JSON kind: pass numbers as numbers, or cast the placeholder ($1::int).";

    pub fn descriptor(store: Arc<dyn RelationalStore>) -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("command", FieldKind::String, "SQL command to execute").required())
            .field(params_field());
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Command",
            schema,
            Arc::new(Self { store }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for PostgresExecuteTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let sql = args.require_str("command")?;
        let affected = self.store.execute(sql, &params(args)?).await?;
        info!("Command affected {} row(s)", affected);
        Ok(json!({ "affected_rows": affected }))
    }
}

pub struct PostgresListTablesTool {
    store: Arc<dyn RelationalStore>,
}

impl PostgresListTablesTool {
    pub const NAME: &'static str = "postgres_list_tables";
    pub const DESCRIPTION: &'static str = "List the tables in the public schema.";

    pub fn descriptor(store: Arc<dyn RelationalStore>) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Table listing",
            ToolSchema::empty(),
            Arc::new(Self { store }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for PostgresListTablesTool {
    async fn call(&self, _args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        to_payload(self.store.list_tables().await?)
    }
}

pub struct PostgresGetSchemaTool {
    store: Arc<dyn RelationalStore>,
}

impl PostgresGetSchemaTool {
    pub const NAME: &'static str = "postgres_get_schema";
    pub const DESCRIPTION: &'static str =
        "Describe the columns of a table: name, type, nullability and default.";

    pub fn descriptor(store: Arc<dyn RelationalStore>) -> ToolDescriptor {
        let schema = ToolSchema::empty().field(
            FieldSpec::new("table_name", FieldKind::String, "Table to describe").required(),
        );
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Schema lookup",
            schema,
            Arc::new(Self { store }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for PostgresGetSchemaTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let table = args.require_str("table_name")?;
        to_payload(self.store.describe_table(table).await?)
    }
}

/// Register the relational store tools, in manifest order.
pub fn register(builder: &mut ToolRegistryBuilder, store: Arc<dyn RelationalStore>) -> Result<()> {
    builder
        .register(PostgresQueryTool::descriptor(store.clone()))?
        .register(PostgresExecuteTool::descriptor(store.clone()))?
        .register(PostgresListTablesTool::descriptor(store.clone()))?
        .register(PostgresGetSchemaTool::descriptor(store))?;
    Ok(())
}
