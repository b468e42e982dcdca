//! Dialect-specific SQL rendering.
//!
//! The compiler produces typed [`Statement`]s; a [`MigrationDialect`] turns
//! them into SQL text. Most statements share one spelling across databases
//! and are rendered by the provided methods; a dialect only has to supply
//! its type names, default rendering and `ALTER COLUMN` syntax.

mod postgres;

pub use postgres::PostgresDialect;

use crate::operation::{
    AddColumnOp, AddEnumValueOp, AddForeignKeyOp, AddUniqueConstraintOp, AlterColumnOp,
    ColumnDefinition, CreateEnumTypeOp, CreateIndexOp, CreateTableOp, DropColumnOp,
    DropConstraintOp, DropIndexOp, DropTypeOp, RenameColumnOp, RenameConstraintOp, RenameTypeOp,
    Statement,
};
use crate::schema::DefaultValue;
use crate::types::ColumnType;
use crate::validate::is_identifier;

/// Trait for dialect-specific SQL generation.
pub trait MigrationDialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the SQL spelling of a column type.
    fn map_column_type(&self, column_type: &ColumnType) -> String;

    /// Returns `true` if `name` is a reserved keyword that cannot appear
    /// bare as a column, table or type name.
    fn is_reserved_word(&self, name: &str) -> bool;

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> String;

    /// Generates SQL for ALTER COLUMN.
    fn alter_column(&self, op: &AlterColumnOp) -> String;

    /// Generates SQL for a statement, without the terminating semicolon.
    fn generate_sql(&self, statement: &Statement) -> String {
        match statement {
            Statement::Comment(text) => format!("-- {text}"),
            Statement::CreateEnumType(op) => self.create_enum_type(op),
            Statement::AddEnumValue(op) => self.add_enum_value(op),
            Statement::RenameType(op) => self.rename_type(op),
            Statement::DropType(op) => self.drop_type(op),
            Statement::CreateTable(op) => self.create_table(op),
            Statement::AddColumn(op) => self.add_column(op),
            Statement::DropColumn(op) => self.drop_column(op),
            Statement::RenameColumn(op) => self.rename_column(op),
            Statement::AlterColumn(op) => self.alter_column(op),
            Statement::AddForeignKey(op) => self.add_foreign_key(op),
            Statement::AddUniqueConstraint(op) => self.add_unique_constraint(op),
            Statement::RenameConstraint(op) => self.rename_constraint(op),
            Statement::DropConstraint(op) => self.drop_constraint(op),
            Statement::CreateIndex(op) => self.create_index(op),
            Statement::DropIndex(op) => self.drop_index(op),
        }
    }

    /// Renders statements as a script, one terminated statement per line.
    fn generate_script(&self, statements: &[Statement]) -> String {
        statements
            .iter()
            .map(|statement| match statement {
                Statement::Comment(_) => self.generate_sql(statement),
                _ => format!("{};", self.generate_sql(statement)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Generates SQL for CREATE TYPE ... AS ENUM.
    fn create_enum_type(&self, op: &CreateEnumTypeOp) -> String {
        let values: Vec<String> = op.values.iter().map(|v| self.quote_literal(v)).collect();
        format!(
            "CREATE TYPE {} AS ENUM ({})",
            self.quote_identifier(&op.name),
            values.join(", ")
        )
    }

    /// Generates SQL for ALTER TYPE ... ADD VALUE.
    fn add_enum_value(&self, op: &AddEnumValueOp) -> String {
        format!(
            "ALTER TYPE {} ADD VALUE IF NOT EXISTS {}",
            self.quote_identifier(&op.type_name),
            self.quote_literal(&op.value)
        )
    }

    /// Generates SQL for ALTER TYPE ... RENAME TO.
    fn rename_type(&self, op: &RenameTypeOp) -> String {
        format!(
            "ALTER TYPE {} RENAME TO {}",
            self.quote_identifier(&op.old_name),
            self.quote_identifier(&op.new_name)
        )
    }

    /// Generates SQL for DROP TYPE.
    fn drop_type(&self, op: &DropTypeOp) -> String {
        let mut sql = String::from("DROP TYPE ");
        if op.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.quote_identifier(&op.name));
        sql
    }

    /// Generates SQL for CREATE TABLE.
    fn create_table(&self, op: &CreateTableOp) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if op.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.quote_identifier(&op.name));
        sql.push_str(" (\n");
        let columns: Vec<String> = op
            .columns
            .iter()
            .map(|c| format!("  {}", self.column_definition(c)))
            .collect();
        sql.push_str(&columns.join(",\n"));
        sql.push_str("\n)");
        sql
    }

    /// Generates SQL for ADD COLUMN.
    fn add_column(&self, op: &AddColumnOp) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(&op.table),
            self.column_definition(&op.column)
        )
    }

    /// Generates SQL for DROP COLUMN.
    fn drop_column(&self, op: &DropColumnOp) -> String {
        let mut sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(&op.table),
            self.quote_identifier(&op.column)
        );
        if op.cascade {
            sql.push_str(" CASCADE");
        }
        sql
    }

    /// Generates SQL for RENAME COLUMN.
    fn rename_column(&self, op: &RenameColumnOp) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_identifier(&op.table),
            self.quote_identifier(&op.old_name),
            self.quote_identifier(&op.new_name)
        )
    }

    /// Generates SQL for ADD CONSTRAINT ... FOREIGN KEY.
    fn add_foreign_key(&self, op: &AddForeignKeyOp) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            self.quote_identifier(&op.table),
            self.quote_identifier(&op.name),
            self.quote_identifier(&op.column),
            self.quote_identifier(&op.references_table),
            self.quote_identifier(&op.references_column),
            op.on_delete.as_sql()
        )
    }

    /// Generates SQL for ADD CONSTRAINT ... UNIQUE.
    fn add_unique_constraint(&self, op: &AddUniqueConstraintOp) -> String {
        let columns: Vec<String> = op.columns.iter().map(|c| self.quote_identifier(c)).collect();
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.quote_identifier(&op.table),
            self.quote_identifier(&op.name),
            columns.join(", ")
        )
    }

    /// Generates SQL for RENAME CONSTRAINT.
    fn rename_constraint(&self, op: &RenameConstraintOp) -> String {
        format!(
            "ALTER TABLE {} RENAME CONSTRAINT {} TO {}",
            self.quote_identifier(&op.table),
            self.quote_identifier(&op.old_name),
            self.quote_identifier(&op.new_name)
        )
    }

    /// Generates SQL for DROP CONSTRAINT.
    fn drop_constraint(&self, op: &DropConstraintOp) -> String {
        let mut sql = format!(
            "ALTER TABLE {} DROP CONSTRAINT ",
            self.quote_identifier(&op.table)
        );
        if op.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.quote_identifier(&op.name));
        sql
    }

    /// Generates SQL for CREATE INDEX.
    fn create_index(&self, op: &CreateIndexOp) -> String {
        let mut sql = String::from("CREATE ");
        if op.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        sql.push_str(&self.quote_identifier(&op.name));
        sql.push_str(" ON ");
        sql.push_str(&self.quote_identifier(&op.table));
        let columns: Vec<String> = op.columns.iter().map(|c| self.quote_identifier(c)).collect();
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push(')');
        sql
    }

    /// Generates SQL for DROP INDEX.
    fn drop_index(&self, op: &DropIndexOp) -> String {
        let mut sql = String::from("DROP INDEX ");
        if op.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.quote_identifier(&op.name));
        sql
    }

    /// Generates SQL for a column definition.
    fn column_definition(&self, col: &ColumnDefinition) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&col.name),
            self.map_column_type(&col.column_type)
        );
        if col.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if col.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref constraint) = col.unique_constraint {
            sql.push_str(" CONSTRAINT ");
            sql.push_str(&self.quote_identifier(constraint));
            sql.push_str(" UNIQUE");
        }
        if let Some(ref default) = col.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        sql
    }

    /// Quotes an identifier unless it is a plain, non-reserved lowercase name.
    fn quote_identifier(&self, name: &str) -> String {
        if is_identifier(name) && !self.is_reserved_word(name) {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }

    /// Quotes a string literal, doubling embedded single quotes.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ForeignKeyAction;

    #[test]
    fn test_quote_identifier() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_identifier("title"), "title");
        assert_eq!(dialect.quote_identifier("order"), "\"order\"");
        assert_eq!(dialect.quote_identifier("desc"), "\"desc\"");
        assert_eq!(dialect.quote_identifier("current_user"), "\"current_user\"");
        assert_eq!(dialect.quote_identifier("Mixed"), "\"Mixed\"");
        assert_eq!(dialect.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_literal() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_literal("draft"), "'draft'");
        assert_eq!(dialect.quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_create_table_layout() {
        let dialect = PostgresDialect::new();
        let op = CreateTableOp {
            name: "posts".to_string(),
            columns: vec![
                ColumnDefinition::new("id", ColumnType::Serial).primary_key(),
                ColumnDefinition::new("title", ColumnType::Varchar(100))
                    .not_null()
                    .unique("posts_title_unique"),
            ],
            if_not_exists: true,
        };
        assert_eq!(
            dialect.generate_sql(&Statement::CreateTable(op)),
            "CREATE TABLE IF NOT EXISTS posts (\n  id SERIAL PRIMARY KEY,\n  title VARCHAR(100) NOT NULL CONSTRAINT posts_title_unique UNIQUE\n)"
        );
    }

    #[test]
    fn test_foreign_key_and_index() {
        let dialect = PostgresDialect::new();
        let fk = Statement::AddForeignKey(AddForeignKeyOp {
            table: "posts".to_string(),
            name: "fk_posts_author".to_string(),
            column: "author".to_string(),
            references_table: "authors".to_string(),
            references_column: "id".to_string(),
            on_delete: ForeignKeyAction::Cascade,
        });
        assert_eq!(
            dialect.generate_sql(&fk),
            "ALTER TABLE posts ADD CONSTRAINT fk_posts_author FOREIGN KEY (author) REFERENCES authors (id) ON DELETE CASCADE"
        );

        let index = Statement::create_index(
            "idx_posts_slug",
            "posts",
            vec!["slug".to_string(), "lang".to_string()],
            true,
        );
        assert_eq!(
            dialect.generate_sql(&index),
            "CREATE UNIQUE INDEX idx_posts_slug ON posts (slug, lang)"
        );
        assert_eq!(
            dialect.generate_sql(&Statement::drop_index_if_exists("idx_posts_slug")),
            "DROP INDEX IF EXISTS idx_posts_slug"
        );
    }

    #[test]
    fn test_enum_type_statements() {
        let dialect = PostgresDialect::new();
        let create =
            Statement::create_enum_type("status_enum", vec!["draft".into(), "it's".into()]);
        assert_eq!(
            dialect.generate_sql(&create),
            "CREATE TYPE status_enum AS ENUM ('draft', 'it''s')"
        );
        assert_eq!(
            dialect.generate_sql(&Statement::add_enum_value("status_enum", "archived")),
            "ALTER TYPE status_enum ADD VALUE IF NOT EXISTS 'archived'"
        );
        assert_eq!(
            dialect.generate_sql(&Statement::rename_type("state_enum", "status_enum")),
            "ALTER TYPE state_enum RENAME TO status_enum"
        );
        assert_eq!(
            dialect.generate_sql(&Statement::drop_type_if_exists("status_enum")),
            "DROP TYPE IF EXISTS status_enum"
        );
    }

    #[test]
    fn test_script_terminators() {
        let dialect = PostgresDialect::new();
        let script = dialect.generate_script(&[
            Statement::comment("posts"),
            Statement::drop_column_cascade("posts", "body"),
        ]);
        assert_eq!(script, "-- posts\nALTER TABLE posts DROP COLUMN body CASCADE;");
    }
}
