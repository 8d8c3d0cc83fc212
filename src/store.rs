// MySQL row store.
// Opens connections and serves limit/offset pages of a table as JSON rows.

use async_trait::async_trait;
use mysql_async::{Conn, Opts, OptsBuilder, Row as MySqlRow, consts::ColumnType, prelude::*};
use serde_json::{Map, Number, Value};

use crate::batch::{Page, Row, RowSource};
use crate::config::DbConfig;
use crate::error::Result;

/// Open a single connection with the given settings.
pub async fn connect(config: &DbConfig) -> Result<Conn> {
    log::info!(
        "connecting to MySQL at {}:{} (database {})",
        config.host,
        config.port,
        config.database
    );

    let opts_builder = OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass(Some(config.password.clone()))
        .db_name(Some(config.database.clone()));
    let opts: Opts = opts_builder.into();

    let conn = Conn::new(opts).await?;
    Ok(conn)
}

/// A table read page by page over one held connection.
///
/// The connection lives as long as the store and is released when the store
/// is dropped.
pub struct UserStore {
    conn: Conn,
    table: String,
}

impl UserStore {
    pub fn new(conn: Conn, table: &str) -> Self {
        Self {
            conn,
            table: table.to_string(),
        }
    }

    /// Connect and bind to the configured table.
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let conn = connect(config).await?;
        Ok(Self::new(conn, &config.table))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fetch `page_size` rows starting at `offset`.
    pub async fn paginate_users(&mut self, page_size: u64, offset: u64) -> Result<Page> {
        let sql = select_page_sql(&self.table);
        log::debug!("{sql} [{page_size}, {offset}]");

        let rows: Vec<MySqlRow> = self.conn.exec(sql, (page_size, offset)).await?;
        Ok(rows.into_iter().map(row_to_json).collect())
    }
}

#[async_trait]
impl RowSource for UserStore {
    async fn fetch_page(&mut self, limit: u64, offset: u64) -> Result<Page> {
        self.paginate_users(limit, offset).await
    }
}

fn select_page_sql(table: &str) -> String {
    format!(
        "SELECT * FROM {} LIMIT ? OFFSET ?",
        escape_identifier(table)
    )
}

fn escape_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn row_to_json(row: MySqlRow) -> Row {
    let mut object = Map::new();
    for (idx, column) in row.columns_ref().iter().enumerate() {
        let value: mysql_async::Value = row.get(idx).unwrap_or(mysql_async::Value::NULL);
        object.insert(
            column.name_str().to_string(),
            mysql_value_to_json(value, column.column_type()),
        );
    }
    object
}

/// Convert a driver value to JSON, using the column type to parse decimals.
fn mysql_value_to_json(value: mysql_async::Value, column_type: ColumnType) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            match column_type {
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    parse_number(&text).unwrap_or(Value::String(text))
                }
                _ => Value::String(text),
            }
        }
        mysql_async::Value::Int(i) => Value::from(i),
        mysql_async::Value::UInt(u) => Value::from(u),
        mysql_async::Value::Float(f) => float_to_json(f64::from(f)),
        mysql_async::Value::Double(d) => float_to_json(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            if column_type == ColumnType::MYSQL_TYPE_DATE {
                Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
            } else if micro == 0 {
                Value::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, min, sec
                ))
            } else {
                Value::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, min, sec, micro
                ))
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, _micros) => {
            let total_hours = days * 24 + u32::from(hours);
            Value::String(format!(
                "{}{:02}:{:02}:{:02}",
                if negative { "-" } else { "" },
                total_hours,
                mins,
                secs
            ))
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
