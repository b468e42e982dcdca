//! PostgreSQL dialect.

use super::MigrationDialect;
use crate::operation::{AlterColumnChange, AlterColumnOp};
use crate::schema::DefaultValue;
use crate::types::ColumnType;

/// Keywords PostgreSQL reserves outright or allows only as function or type
/// names. None of them can name a column unquoted.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning",
    "right", "select", "session_user", "similar", "some", "symmetric", "system_user",
    "table", "tablesample", "then", "to", "trailing", "true", "union", "unique", "user",
    "using", "variadic", "verbose", "when", "where", "window", "with",
];

/// PostgreSQL dialect for migration SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn map_column_type(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Enum(name) => self.quote_identifier(name),
            other => other.postgres_name(),
        }
    }

    fn is_reserved_word(&self, name: &str) -> bool {
        RESERVED_KEYWORDS.contains(&name)
    }

    fn render_default(&self, default: &DefaultValue) -> String {
        if let Some(function) = default.function() {
            return function.to_sql().to_string();
        }
        match default {
            DefaultValue::Bool(b) => b.to_string(),
            DefaultValue::Integer(i) => i.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Text(s) => self.quote_literal(s),
        }
    }

    fn alter_column(&self, op: &AlterColumnOp) -> String {
        let table = self.quote_identifier(&op.table);
        let column = self.quote_identifier(&op.column);

        match &op.change {
            AlterColumnChange::SetType(column_type) => {
                let type_sql = self.map_column_type(column_type);
                format!(
                    "ALTER TABLE {table} ALTER COLUMN {column} TYPE {type_sql} USING {column}::{type_sql}"
                )
            }
            AlterColumnChange::SetNotNull => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} SET NOT NULL")
            }
            AlterColumnChange::DropNotNull => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} DROP NOT NULL")
            }
            AlterColumnChange::SetDefault(default) => format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DEFAULT {}",
                self.render_default(default)
            ),
            AlterColumnChange::DropDefault => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} DROP DEFAULT")
            }
        }
    }
}
