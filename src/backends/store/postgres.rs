//! PostgreSQL implementation of [`RelationalStore`].

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::postgres::types::{PgInterval, PgMoney};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Decimal;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::{Column, Decode, Postgres, Row as _, Type, TypeInfo, ValueRef};
use tracing::{debug, info, instrument, warn};

use super::{ColumnInfo, RelationalStore, Row, SqlParam};
use crate::backends::error::{BackendError, BackendResult};
use crate::core::config::DatabaseConfig;

const LIST_TABLES_SQL: &str = "\
    SELECT table_name::text \
    FROM information_schema.tables \
    WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
    ORDER BY table_name";

const DESCRIBE_TABLE_SQL: &str = "\
    SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
    FROM information_schema.columns \
    WHERE table_schema = 'public' AND table_name = $1 \
    ORDER BY ordinal_position";

/// SQLSTATE for "undefined_table".
const UNDEFINED_TABLE: &str = "42P01";

/// Relational store backed by a lazily connecting `sqlx` pool.
///
/// Each call checks a connection out of the pool for its own duration, so
/// concurrent dispatches never share a connection.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Build a store from configuration without touching the network.
    ///
    /// Connections are opened on first use, so the server starts even when
    /// the database is down; failing calls then surface as handler errors.
    pub fn connect_lazy(config: &DatabaseConfig) -> BackendResult<Self> {
        let options = match &config.url {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| BackendError::invalid_input(format!("Invalid DATABASE_URL: {}", e)))?,
            None => PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .database(&config.database)
                .username(&config.user)
                .password(&config.password),
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        info!(
            "PostgreSQL pool configured for {} (max {} connections)",
            config.target(),
            config.max_connections
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RelationalStore for PostgresStore {
    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn query(&self, sql: &str, params: &[SqlParam]) -> BackendResult<Vec<Row>> {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        debug!("Query returned {} row(s)", rows.len());

        Ok(rows.iter().map(row_to_json).collect())
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> BackendResult<u64> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool).await.map_err(map_sqlx_error)?;
        debug!("Command affected {} row(s)", result.rows_affected());

        Ok(result.rows_affected())
    }

    async fn list_tables(&self) -> BackendResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    #[instrument(skip(self))]
    async fn describe_table(&self, table: &str) -> BackendResult<Vec<ColumnInfo>> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(DESCRIBE_TABLE_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if rows.is_empty() {
            return Err(BackendError::not_found(format!(
                "Table '{}' does not exist in the public schema",
                table
            )));
        }

        Ok(rows
            .into_iter()
            .map(|(column, data_type, is_nullable, default)| ColumnInfo {
                column,
                data_type,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default,
            })
            .collect())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Translate a `sqlx` error into the adapter taxonomy.
fn map_sqlx_error(e: sqlx::Error) -> BackendError {
    match &e {
        sqlx::Error::RowNotFound => BackendError::not_found(e.to_string()),
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
            let message = if code.is_empty() {
                db.message().to_string()
            } else {
                format!("{} (SQLSTATE {})", db.message(), code)
            };
            if code == UNDEFINED_TABLE {
                BackendError::not_found(message)
            } else {
                BackendError::invalid_input(message)
            }
        }
        sqlx::Error::Configuration(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::TypeNotFound { .. } => BackendError::invalid_input(e.to_string()),
        _ => {
            warn!("Database unavailable: {}", e);
            BackendError::unavailable(e.to_string())
        }
    }
}

fn row_to_json(row: &PgRow) -> Row {
    let mut map = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(
            column.name().to_string(),
            decode_column(row, idx, column.type_info().name()),
        );
    }
    map
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<T, _>(idx).ok()
}

/// Decode one column into JSON, keyed on the Postgres type name.
///
/// Exact numerics, money, intervals and network addresses come back as
/// strings in Postgres' own notation. Types without a dedicated arm fall back
/// to their textual wire form when it is valid UTF-8 (enums, domains over
/// text). Anything else is reported as a placeholder string naming the type;
/// cast in SQL (`::text`) to get the value.
fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }

    let decoded = match type_name {
        "BOOL" => get::<bool>(row, idx).map(Value::from),
        "INT2" => get::<i16>(row, idx).map(Value::from),
        "INT4" => get::<i32>(row, idx).map(Value::from),
        "INT8" => get::<i64>(row, idx).map(Value::from),
        "FLOAT4" => get::<f32>(row, idx).map(|v| float_value(v as f64)),
        "FLOAT8" => get::<f64>(row, idx).map(float_value),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => get::<String>(row, idx).map(Value::from),
        "UUID" => get::<uuid::Uuid>(row, idx).map(|v| Value::from(v.to_string())),
        "NUMERIC" => get::<Decimal>(row, idx).map(|v| Value::from(v.to_string())),
        "MONEY" => get::<PgMoney>(row, idx).map(|v| Value::from(v.to_decimal(2).to_string())),
        "INTERVAL" => get::<PgInterval>(row, idx).map(|v| Value::from(format_interval(&v))),
        "INET" => get::<IpNetwork>(row, idx).map(|v| Value::from(format_inet(&v))),
        "CIDR" => get::<IpNetwork>(row, idx).map(|v| Value::from(v.to_string())),
        "JSON" | "JSONB" => get::<Value>(row, idx),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx).map(|v| Value::from(v.to_rfc3339())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx)
            .map(|v| Value::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => get::<NaiveDate>(row, idx).map(|v| Value::from(v.to_string())),
        "TIME" => get::<NaiveTime>(row, idx).map(|v| Value::from(v.to_string())),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" => get::<Vec<String>>(row, idx).map(Value::from),
        "INT4[]" => get::<Vec<i32>>(row, idx).map(Value::from),
        "INT8[]" => get::<Vec<i64>>(row, idx).map(Value::from),
        "BOOL[]" => get::<Vec<bool>>(row, idx).map(Value::from),
        "FLOAT8[]" => get::<Vec<f64>>(row, idx)
            .map(|vs| Value::Array(vs.into_iter().map(float_value).collect())),
        "NUMERIC[]" => get::<Vec<Decimal>>(row, idx)
            .map(|vs| Value::Array(vs.iter().map(|v| Value::from(v.to_string())).collect())),
        _ => None,
    };

    decoded.unwrap_or_else(|| match row.try_get_raw(idx).ok().and_then(|v| v.as_str().ok()) {
        Some(text) if !text.contains('\0') => Value::from(text),
        _ => Value::from(format!("<{}>", type_name)),
    })
}

/// Render an interval the way `psql` prints it (`1 year 2 mons 3 days 04:05:06.5`).
fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        let plural = if n.abs() == 1 { "" } else { "s" };
        format!("{} {}{}", n, name, plural)
    }

    let mut parts = Vec::new();
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            abs / 3_600_000_000,
            (abs / 60_000_000) % 60,
            (abs / 1_000_000) % 60
        );
        let fraction = abs % 1_000_000;
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// `inet` omits a full-length prefix, like Postgres does.
fn format_inet(network: &IpNetwork) -> String {
    let full = if network.is_ipv4() { 32 } else { 128 };
    if network.prefix() == full {
        network.ip().to_string()
    } else {
        network.to_string()
    }
}

fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout_secs: 1,
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_float_value_rejects_nan() {
        assert_eq!(float_value(f64::NAN), Value::Null);
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
    }

    #[test]
    fn test_format_interval() {
        let day = PgInterval { months: 0, days: 1, microseconds: 0 };
        assert_eq!(format_interval(&day), "1 day");

        let mixed = PgInterval {
            months: 14,
            days: 3,
            microseconds: 4 * 3_600_000_000 + 5 * 60_000_000 + 6_500_000,
        };
        assert_eq!(format_interval(&mixed), "1 year 2 mons 3 days 04:05:06.5");

        let zero = PgInterval { months: 0, days: 0, microseconds: 0 };
        assert_eq!(format_interval(&zero), "00:00:00");

        let negative = PgInterval { months: 0, days: 0, microseconds: -90_000_000 };
        assert_eq!(format_interval(&negative), "-00:01:30");
    }

    #[test]
    fn test_format_inet() {
        let host: IpNetwork = "127.0.0.1/32".parse().unwrap();
        assert_eq!(format_inet(&host), "127.0.0.1");
        let subnet: IpNetwork = "10.0.0.0/8".parse().unwrap();
        assert_eq!(format_inet(&subnet), "10.0.0.0/8");
        let v6: IpNetwork = "::1/128".parse().unwrap();
        assert_eq!(format_inet(&v6), "::1");
    }

    #[test]
    fn test_map_row_not_found() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[test]
    fn test_map_pool_timeout_is_unavailable() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BackendError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_map_column_not_found_is_invalid_input() {
        let err = map_sqlx_error(sqlx::Error::ColumnNotFound("missing".to_string()));
        assert!(matches!(err, BackendError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let config = DatabaseConfig {
            url: Some("not a url".to_string()),
            ..DatabaseConfig::default()
        };
        assert!(matches!(
            PostgresStore::connect_lazy(&config),
            Err(BackendError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_database_reports_unavailable() {
        let store = PostgresStore::connect_lazy(&unreachable_config()).unwrap();
        let result = store.query("SELECT 1", &[]).await;
        assert!(matches!(result, Err(BackendError::UpstreamUnavailable(_))));

        // The pool stays usable for the next call.
        let result = store.list_tables().await;
        assert!(matches!(result, Err(BackendError::UpstreamUnavailable(_))));
    }

    // Integration test (requires a running database, run with: cargo test -- --ignored)
    #[ignore]
    #[tokio::test]
    async fn test_query_roundtrip_against_local_database() {
        let store = PostgresStore::connect_lazy(&DatabaseConfig::from_env()).unwrap();
        let rows = store
            .query("SELECT 1::int4 AS one, 'x'::text AS label, NULL::text AS nothing", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["one", "label", "nothing"]);
        assert_eq!(rows[0]["one"], serde_json::json!(1));
        assert_eq!(rows[0]["nothing"], Value::Null);
    }

    #[ignore]
    #[tokio::test]
    async fn test_exact_and_network_types_against_local_database() {
        let store = PostgresStore::connect_lazy(&DatabaseConfig::from_env()).unwrap();
        let rows = store
            .query(
                "SELECT 12.34::numeric(10,2) AS price, sum(x::int8) AS total, \
                 '127.0.0.1'::inet AS ip, interval '1 day' AS iv \
                 FROM (VALUES (1), (2)) AS t(x)",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["price"], "12.34");
        assert_eq!(rows[0]["total"], "3");
        assert_eq!(rows[0]["ip"], "127.0.0.1");
        assert_eq!(rows[0]["iv"], "1 day");
    }

    #[ignore]
    #[tokio::test]
    async fn test_integer_placeholder_against_local_database() {
        let store = PostgresStore::connect_lazy(&DatabaseConfig::from_env()).unwrap();
        let rows = store
            .query(
                "SELECT x FROM (VALUES (1), (2)) AS t(x) WHERE x = $1",
                &[SqlParam::Int(2)],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["x"], serde_json::json!(2));

        let rows = store
            .query("SELECT $1 || '!' AS greeting", &[SqlParam::from("hi")])
            .await
            .unwrap();
        assert_eq!(rows[0]["greeting"], "hi!");
    }
}
