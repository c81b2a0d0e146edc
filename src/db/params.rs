//! Parameter binding utilities for database queries.
//!
//! Every caller-supplied value reaches the driver through these functions;
//! nothing is spliced into SQL text.

use crate::models::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};
use std::borrow::Cow;

/// Prepare statement text for binding: `%s` placeholders outside quoted
/// literals become `?`, and `%%` becomes `%`. Statements without parameters
/// are passed through untouched, as are statements already using `?`.
pub(crate) fn positional_sql<'a>(sql: &'a str, params: &[Value]) -> Cow<'a, str> {
    if params.is_empty() || !sql.contains('%') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if c == '%' {
            match (chars.peek(), quote) {
                (Some('%'), _) => {
                    chars.next();
                    out.push('%');
                }
                (Some('s'), None) => {
                    chars.next();
                    out.push('?');
                }
                _ => out.push('%'),
            }
            continue;
        }

        out.push(c);
        match quote {
            None if matches!(c, '\'' | '"' | '`') => quote = Some(c),
            Some(q) if c == '\\' && q != '`' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            Some(q) if c == q => {
                // a doubled quote stays inside the literal
                if chars.peek() == Some(&q) {
                    chars.next();
                    out.push(q);
                } else {
                    quote = None;
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}
