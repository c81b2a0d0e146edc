//! Schema introspection SQL.
//!
//! Both dialects project their catalog output onto the INFORMATION_SCHEMA
//! column names, so row decoding into [`crate::models::ColumnDescriptor`] is
//! shared.

use crate::models::DatabaseType;

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod mysql {
        /// `{schema}` is replaced by a quoted string literal.
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = {schema}
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
                CONVERT(DATA_TYPE USING utf8mb4) AS DATA_TYPE,
                CONVERT(COLUMN_TYPE USING utf8mb4) AS COLUMN_TYPE,
                CONVERT(IS_NULLABLE USING utf8mb4) AS IS_NULLABLE,
                CONVERT(COLUMN_KEY USING utf8mb4) AS COLUMN_KEY,
                CONVERT(COLUMN_DEFAULT USING utf8mb4) AS COLUMN_DEFAULT,
                CONVERT(EXTRA USING utf8mb4) AS EXTRA
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name AS TABLE_NAME FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                name AS COLUMN_NAME,
                lower(trim(CASE
                    WHEN instr(type, '(') > 0 THEN substr(type, 1, instr(type, '(') - 1)
                    ELSE type
                END)) AS DATA_TYPE,
                lower(type) AS COLUMN_TYPE,
                CASE WHEN "notnull" = 0 AND pk = 0 THEN 'YES' ELSE 'NO' END AS IS_NULLABLE,
                CASE WHEN pk > 0 THEN 'PRI' ELSE '' END AS COLUMN_KEY,
                dflt_value AS COLUMN_DEFAULT,
                '' AS EXTRA
            FROM pragma_table_info(?)
            ORDER BY cid
            "#;
    }
}

/// A statement plus whether it expects the configured database name bound
/// ahead of the table name.
pub struct DescribeQuery {
    pub sql: &'static str,
    pub binds_schema: bool,
}

/// SQL listing the tables of `database`.
///
/// The database name comes from trusted configuration and is embedded as a
/// string literal; it is the only value ever spliced into SQL text.
pub fn list_tables_sql(db_type: DatabaseType, database: &str) -> String {
    match db_type {
        DatabaseType::MySQL => {
            queries::mysql::LIST_TABLES.replace("{schema}", &quote_literal(database))
        }
        DatabaseType::SQLite => queries::sqlite::LIST_TABLES.to_string(),
    }
}

/// SQL describing one table's columns in ordinal order.
pub fn describe_table_sql(db_type: DatabaseType) -> DescribeQuery {
    match db_type {
        DatabaseType::MySQL => DescribeQuery {
            sql: queries::mysql::DESCRIBE_COLUMNS,
            binds_schema: true,
        },
        DatabaseType::SQLite => DescribeQuery {
            sql: queries::sqlite::DESCRIBE_COLUMNS,
            binds_schema: false,
        },
    }
}

/// SQL fetching the first `limit` rows of `table`.
pub fn sample_rows_sql(db_type: DatabaseType, table: &str, limit: u32) -> String {
    format!(
        "SELECT * FROM {} LIMIT {}",
        quote_identifier(db_type, table),
        limit
    )
}

/// Quote an identifier for the dialect, doubling embedded quote characters.
pub fn quote_identifier(db_type: DatabaseType, name: &str) -> String {
    let quote = db_type.identifier_quote();
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(quote);
    for ch in name.chars() {
        if ch == quote {
            quoted.push(quote);
        }
        quoted.push(ch);
    }
    quoted.push(quote);
    quoted
}

/// Quote a string literal: single quotes are doubled and backslashes escaped.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier(DatabaseType::MySQL, "users"), "`users`");
        assert_eq!(quote_identifier(DatabaseType::MySQL, "we`ird"), "`we``ird`");
        assert_eq!(
            quote_identifier(DatabaseType::SQLite, "a\"b"),
            "\"a\"\"b\""
        );
    }

    #[test]
    fn test_list_tables_sql_escapes_database() {
        let sql = list_tables_sql(DatabaseType::MySQL, "shop");
        assert!(sql.contains("TABLE_SCHEMA = 'shop'"));

        let sql = list_tables_sql(DatabaseType::MySQL, "o'neil\\");
        assert!(sql.contains("TABLE_SCHEMA = 'o''neil\\\\'"));
    }

    #[test]
    fn test_sample_rows_sql() {
        assert_eq!(
            sample_rows_sql(DatabaseType::MySQL, "orders", 5),
            "SELECT * FROM `orders` LIMIT 5"
        );
        assert_eq!(
            sample_rows_sql(DatabaseType::SQLite, "x\"; DROP TABLE y;--", 5),
            "SELECT * FROM \"x\"\"; DROP TABLE y;--\" LIMIT 5"
        );
    }

    #[test]
    fn test_describe_sql_binding() {
        assert!(describe_table_sql(DatabaseType::MySQL).binds_schema);
        assert!(!describe_table_sql(DatabaseType::SQLite).binds_schema);
        assert!(
            describe_table_sql(DatabaseType::MySQL)
                .sql
                .contains("ORDER BY ORDINAL_POSITION")
        );
    }
}
