//! DDL compiler.
//!
//! Turns a [`CollectionDefinition`] into the statements that create its
//! table, and a [`SchemaDiff`] into the `ALTER` statements that migrate an
//! existing table. Statements come out in dependency order: types before the
//! columns that use them, columns before the constraints on them, and
//! constraints before indexes. Removals run in reverse.

use tracing::debug;

use crate::dialect::{MigrationDialect, PostgresDialect};
use crate::diff::{ChangedAttribute, ModifiedField, SchemaDiff};
use crate::operation::{
    AddForeignKeyOp, AlterColumnChange, ColumnDefinition, CreateTableOp, ForeignKeyAction,
    Statement,
};
use crate::schema::{
    CollectionDefinition, DefaultFunction, DefaultValue, FieldDefinition, FieldKind,
    IndexDefinition,
};
use crate::types::{ColumnType, column_type, enum_type_name};

/// Comment returned when a diff has nothing to apply.
pub const NO_CHANGES: &str = "No schema changes detected";

/// Name of the UNIQUE constraint on `table.column`.
#[must_use]
pub fn unique_constraint_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_unique")
}

/// Name of the foreign key constraint of a relation field.
///
/// An explicit `foreignKeyName` wins; otherwise `fk_<table>_<column>`.
#[must_use]
pub fn foreign_key_name(table: &str, field: &FieldDefinition) -> String {
    field
        .relation
        .as_ref()
        .and_then(|r| r.foreign_key_name.clone())
        .unwrap_or_else(|| format!("fk_{table}_{}", field.name))
}

// ================================================================
// CREATE TABLE
// ================================================================

/// Plans the statements creating the table of `definition`.
#[must_use]
pub fn create_table_statements(definition: &CollectionDefinition) -> Vec<Statement> {
    let table = definition.name.as_str();
    let mut statements: Vec<Statement> = definition
        .fields
        .iter()
        .filter_map(create_enum_type)
        .collect();

    let mut columns = Vec::with_capacity(definition.fields.len() + 3);
    columns.push(ColumnDefinition::new("id", ColumnType::Serial).primary_key());
    columns.extend(definition.fields.iter().map(|f| column_definition(table, f)));
    for name in ["created_at", "updated_at"] {
        columns.push(
            ColumnDefinition::new(name, ColumnType::TimestampTz)
                .default(Some(DefaultValue::from(DefaultFunction::Now))),
        );
    }
    statements.push(Statement::CreateTable(CreateTableOp {
        name: table.to_string(),
        columns,
        if_not_exists: true,
    }));

    statements.extend(
        definition
            .fields
            .iter()
            .filter_map(|f| add_foreign_key(table, f)),
    );
    statements.extend(definition.indexes.iter().map(|i| create_index(table, i)));

    debug!(
        table,
        statements = statements.len(),
        "planned create table"
    );
    statements
}

/// Compiles `definition` into a PostgreSQL `CREATE TABLE` script.
#[must_use]
pub fn compile_create_table(definition: &CollectionDefinition) -> String {
    PostgresDialect::new().generate_script(&create_table_statements(definition))
}

// ================================================================
// ALTER TABLE
// ================================================================

/// Plans the statements migrating `table` according to `diff`.
///
/// A diff without changes yields a single [`NO_CHANGES`] comment.
#[must_use]
pub fn alter_table_statements(table: &str, diff: &SchemaDiff) -> Vec<Statement> {
    if !diff.has_changes {
        return vec![Statement::comment(NO_CHANGES)];
    }

    let mut statements = Vec::new();

    // Renames first so every later statement can use final names.
    for renamed in &diff.renamed_fields {
        statements.push(Statement::rename_column(
            table,
            &renamed.old_name,
            &renamed.new_name,
        ));
        let old_field = diff
            .modified_fields
            .iter()
            .find(|m| m.old_field.name == renamed.old_name)
            .map_or_else(
                || {
                    let mut field = renamed.field.clone();
                    field.name.clone_from(&renamed.old_name);
                    field
                },
                |m| m.old_field.clone(),
            );
        rename_dependents(table, &old_field, &renamed.field, &mut statements);
    }

    for field in &diff.added_fields {
        statements.extend(create_enum_type(field));
        statements.push(Statement::add_column(table, column_definition(table, field)));
        statements.extend(add_foreign_key(table, field));
    }

    for field in &diff.removed_fields {
        statements.push(Statement::drop_column_cascade(table, &field.name));
        if field.kind == FieldKind::Enum {
            statements.push(Statement::drop_type_if_exists(enum_type_name(&field.name)));
        }
    }

    for modified in &diff.modified_fields {
        modify_column(table, modified, &mut statements);
    }

    for index in &diff.removed_indexes {
        statements.push(Statement::drop_index_if_exists(&index.name));
    }
    for modified in &diff.modified_indexes {
        statements.push(Statement::drop_index_if_exists(&modified.old_index.name));
        statements.push(create_index(table, &modified.new_index));
    }
    for index in &diff.added_indexes {
        statements.push(create_index(table, index));
    }

    debug!(table, statements = statements.len(), "planned alter table");
    statements
}

/// Compiles `diff` into a PostgreSQL `ALTER TABLE` script for `table`.
#[must_use]
pub fn compile_alter_table(table: &str, diff: &SchemaDiff) -> String {
    PostgresDialect::new().generate_script(&alter_table_statements(table, diff))
}

/// Renames the objects named after a column whose name changed.
fn rename_dependents(
    table: &str,
    old_field: &FieldDefinition,
    new_field: &FieldDefinition,
    statements: &mut Vec<Statement>,
) {
    if old_field.kind == FieldKind::Enum {
        let (from, to) = (
            enum_type_name(&old_field.name),
            enum_type_name(&new_field.name),
        );
        if from != to {
            statements.push(Statement::rename_type(from, to));
        }
    }
    if old_field.unique {
        statements.push(Statement::rename_constraint(
            table,
            unique_constraint_name(table, &old_field.name),
            unique_constraint_name(table, &new_field.name),
        ));
    }
    if old_field.kind == FieldKind::Relation {
        // The constraint keeps the old relation settings until a relation
        // change in the modification step replaces it.
        let mut moved = old_field.clone();
        moved.name.clone_from(&new_field.name);
        let (from, to) = (
            foreign_key_name(table, old_field),
            foreign_key_name(table, &moved),
        );
        if from != to {
            statements.push(Statement::rename_constraint(table, from, to));
        }
    }
}

fn modify_column(table: &str, modified: &ModifiedField, statements: &mut Vec<Statement>) {
    let new = &modified.new_field;
    let column = new.name.as_str();
    // State of the column after the rename step.
    let mut current = modified.old_field.clone();
    current.name.clone_from(&new.name);

    let relation_changed = modified.changed(ChangedAttribute::Relation);
    let drops_fk = current.kind == FieldKind::Relation
        && (relation_changed || new.kind != FieldKind::Relation);
    let adds_fk =
        new.kind == FieldKind::Relation && (relation_changed || current.kind != FieldKind::Relation);

    if drops_fk {
        statements.push(Statement::drop_constraint_if_exists(
            table,
            foreign_key_name(table, &current),
        ));
    }

    let current_type = column_type(&current);
    let new_type = column_type(new);
    if current_type == new_type {
        if new.kind == FieldKind::Enum && modified.changed(ChangedAttribute::EnumValues) {
            let existing = current.enum_values_or_empty();
            let type_name = enum_type_name(column);
            statements.extend(
                new.enum_values_or_empty()
                    .iter()
                    .filter(|v| !existing.contains(*v))
                    .map(|v| Statement::add_enum_value(&type_name, v)),
            );
        }
    } else {
        statements.extend(create_enum_type(new));
        statements.push(Statement::alter_column(
            table,
            column,
            AlterColumnChange::SetType(new_type),
        ));
        if let Some(old_enum) = current_type.enum_name() {
            statements.push(Statement::drop_type_if_exists(old_enum));
        }
    }

    if modified.changed(ChangedAttribute::Required) {
        let change = if new.required {
            AlterColumnChange::SetNotNull
        } else {
            AlterColumnChange::DropNotNull
        };
        statements.push(Statement::alter_column(table, column, change));
    }

    if modified.changed(ChangedAttribute::Unique) {
        let name = unique_constraint_name(table, column);
        statements.push(if new.unique {
            Statement::add_unique_constraint(table, name, column)
        } else {
            Statement::drop_constraint_if_exists(table, name)
        });
    }

    if modified.changed(ChangedAttribute::DefaultValue) {
        let change = new
            .default_value
            .clone()
            .map_or(AlterColumnChange::DropDefault, AlterColumnChange::SetDefault);
        statements.push(Statement::alter_column(table, column, change));
    }

    if adds_fk {
        statements.extend(add_foreign_key(table, new));
    }
}

fn column_definition(table: &str, field: &FieldDefinition) -> ColumnDefinition {
    let mut column =
        ColumnDefinition::new(&field.name, column_type(field)).default(field.default_value.clone());
    if field.required {
        column = column.not_null();
    }
    if field.unique {
        column = column.unique(unique_constraint_name(table, &field.name));
    }
    column
}

fn create_enum_type(field: &FieldDefinition) -> Option<Statement> {
    (field.kind == FieldKind::Enum).then(|| {
        Statement::create_enum_type(
            enum_type_name(&field.name),
            field.enum_values_or_empty().to_vec(),
        )
    })
}

fn add_foreign_key(table: &str, field: &FieldDefinition) -> Option<Statement> {
    if field.kind != FieldKind::Relation {
        return None;
    }
    let Some(relation) = field.relation.as_ref() else {
        debug!(table, field = %field.name, "relation field without target, no foreign key");
        return None;
    };
    Some(Statement::AddForeignKey(AddForeignKeyOp {
        table: table.to_string(),
        name: foreign_key_name(table, field),
        column: field.name.clone(),
        references_table: relation.target_collection.clone(),
        references_column: "id".to_string(),
        on_delete: if relation.cascade_delete {
            ForeignKeyAction::Cascade
        } else {
            ForeignKeyAction::Restrict
        },
    }))
}

fn create_index(table: &str, index: &IndexDefinition) -> Statement {
    Statement::create_index(&index.name, table, index.fields.clone(), index.unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_collections;
    use crate::schema::{RelationDefinition, boolean, enumeration, integer, relation, text};
    use crate::validate::validate;

    fn posts() -> CollectionDefinition {
        CollectionDefinition::new("posts")
            .field(text("title").required())
            .field(text("slug").max_length(120).unique())
    }

    fn position(sql: &str, needle: &str) -> usize {
        sql.find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not found in:\n{sql}"))
    }

    #[test]
    fn test_create_table_script() {
        let def = posts()
            .field(boolean("published").default_value(false))
            .field(enumeration("status", ["draft", "live"]).required())
            .field(relation("author", "authors"))
            .index(IndexDefinition::new("idx_posts_status", ["status"]));

        let sql = compile_create_table(&def);
        assert_eq!(
            sql,
            "CREATE TYPE status_enum AS ENUM ('draft', 'live');\n\
             CREATE TABLE IF NOT EXISTS posts (\n  \
             id SERIAL PRIMARY KEY,\n  \
             title VARCHAR(255) NOT NULL,\n  \
             slug VARCHAR(120) CONSTRAINT posts_slug_unique UNIQUE,\n  \
             published BOOLEAN DEFAULT false,\n  \
             status status_enum NOT NULL,\n  \
             author INTEGER,\n  \
             created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),\n  \
             updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()\n);\n\
             ALTER TABLE posts ADD CONSTRAINT fk_posts_author FOREIGN KEY (author) REFERENCES authors (id) ON DELETE RESTRICT;\n\
             CREATE INDEX idx_posts_status ON posts (status);"
        );
    }

    #[test]
    fn test_keyword_field_names_are_quoted() {
        let def = CollectionDefinition::new("events")
            .field(text("desc"))
            .field(FieldDefinition::new("end", FieldKind::DateTime))
            .field(integer("limit"))
            .index(IndexDefinition::new("idx_events_end", ["end"]));
        assert!(validate(&def).valid);

        let sql = compile_create_table(&def);
        assert!(sql.contains("  \"desc\" VARCHAR(255),\n"));
        assert!(sql.contains("  \"end\" TIMESTAMP WITH TIME ZONE,\n"));
        assert!(sql.contains("  \"limit\" INTEGER,\n"));
        assert!(sql.contains("CREATE INDEX idx_events_end ON events (\"end\");"));

        let new = def.clone().field(text("to"));
        let sql = compile_alter_table("events", &diff_collections(&def, &new));
        assert_eq!(sql, "ALTER TABLE events ADD COLUMN \"to\" VARCHAR(255);");
    }

    #[test]
    fn test_cascade_and_custom_fk_name() {
        let def = CollectionDefinition::new("comments").field(
            relation("post", "posts").relation(
                RelationDefinition::new("posts")
                    .cascade_delete()
                    .foreign_key_name("comments_post_fkey"),
            ),
        );

        let sql = compile_create_table(&def);
        assert!(sql.contains(
            "ADD CONSTRAINT comments_post_fkey FOREIGN KEY (post) REFERENCES posts (id) ON DELETE CASCADE;"
        ));
    }

    #[test]
    fn test_no_changes_comment() {
        let diff = diff_collections(&posts(), &posts());
        assert_eq!(compile_alter_table("posts", &diff), "-- No schema changes detected");
    }

    #[test]
    fn test_max_length_change() {
        let old = CollectionDefinition::new("posts").field(text("title").max_length(255));
        let new = CollectionDefinition::new("posts").field(text("title").max_length(50));
        let sql = compile_alter_table("posts", &diff_collections(&old, &new));
        assert_eq!(
            sql,
            "ALTER TABLE posts ALTER COLUMN title TYPE VARCHAR(50) USING title::VARCHAR(50);"
        );
    }

    #[test]
    fn test_rename_precedes_add_and_drop() {
        let old = CollectionDefinition::new("posts")
            .field(text("title"))
            .field(integer("views"));
        let new = CollectionDefinition::new("posts")
            .field(text("headline"))
            .field(boolean("featured"));
        let sql = compile_alter_table("posts", &diff_collections(&old, &new));

        let rename = position(&sql, "RENAME COLUMN title TO headline");
        assert!(rename < position(&sql, "ADD COLUMN featured"));
        assert!(rename < position(&sql, "DROP COLUMN views CASCADE"));
    }

    #[test]
    fn test_added_enum_and_relation_order() {
        let old = CollectionDefinition::new("posts").field(text("title"));
        let new = old
            .clone()
            .field(enumeration("status", ["draft"]))
            .field(relation("author", "authors"));
        let sql = compile_alter_table("posts", &diff_collections(&old, &new));

        assert!(position(&sql, "CREATE TYPE status_enum") < position(&sql, "ADD COLUMN status"));
        assert!(
            position(&sql, "ADD COLUMN author INTEGER")
                < position(&sql, "ADD CONSTRAINT fk_posts_author")
        );
    }

    #[test]
    fn test_removed_enum_drops_type_after_column() {
        let old = CollectionDefinition::new("posts")
            .field(text("title"))
            .field(enumeration("status", ["draft", "live"]));
        let new = CollectionDefinition::new("posts").field(text("title"));
        let sql = compile_alter_table("posts", &diff_collections(&old, &new));
        assert_eq!(
            sql,
            "ALTER TABLE posts DROP COLUMN status CASCADE;\nDROP TYPE IF EXISTS status_enum;"
        );
    }

    #[test]
    fn test_required_unique_default_changes() {
        let old = CollectionDefinition::new("posts").field(integer("views").unique());
        let new = CollectionDefinition::new("posts")
            .field(integer("views").required().default_value(0_i64));
        let statements = alter_table_statements("posts", &diff_collections(&old, &new));
        let sql = PostgresDialect::new().generate_script(&statements);
        assert_eq!(
            sql,
            "ALTER TABLE posts ALTER COLUMN views SET NOT NULL;\n\
             ALTER TABLE posts DROP CONSTRAINT IF EXISTS posts_views_unique;\n\
             ALTER TABLE posts ALTER COLUMN views SET DEFAULT 0;"
        );

        let back = compile_alter_table("posts", &diff_collections(&new, &old));
        assert!(back.contains("ALTER COLUMN views DROP NOT NULL;"));
        assert!(back.contains("ADD CONSTRAINT posts_views_unique UNIQUE (views);"));
        assert!(back.contains("ALTER COLUMN views DROP DEFAULT;"));
    }

    #[test]
    fn test_enum_values_added() {
        let old = CollectionDefinition::new("posts").field(enumeration("status", ["draft"]));
        let new =
            CollectionDefinition::new("posts").field(enumeration("status", ["draft", "live"]));
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&old, &new)),
            "ALTER TYPE status_enum ADD VALUE IF NOT EXISTS 'live';"
        );
    }

    #[test]
    fn test_switch_to_and_from_enum() {
        let old = CollectionDefinition::new("posts").field(text("status"));
        let new = CollectionDefinition::new("posts").field(enumeration("status", ["a", "b"]));
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&old, &new)),
            "CREATE TYPE status_enum AS ENUM ('a', 'b');\n\
             ALTER TABLE posts ALTER COLUMN status TYPE status_enum USING status::status_enum;"
        );
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&new, &old)),
            "ALTER TABLE posts ALTER COLUMN status TYPE VARCHAR(255) USING status::VARCHAR(255);\n\
             DROP TYPE IF EXISTS status_enum;"
        );
    }

    #[test]
    fn test_renamed_enum_renames_type() {
        let old = CollectionDefinition::new("posts").field(enumeration("state", ["a"]));
        let new = CollectionDefinition::new("posts").field(enumeration("status", ["a"]));
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&old, &new)),
            "ALTER TABLE posts RENAME COLUMN state TO status;\n\
             ALTER TYPE state_enum RENAME TO status_enum;"
        );
    }

    #[test]
    fn test_renamed_unique_field_renames_constraint() {
        let old = CollectionDefinition::new("posts").field(text("slug").unique());
        let new = CollectionDefinition::new("posts").field(text("handle").unique().max_length(80));
        let sql = compile_alter_table("posts", &diff_collections(&old, &new));
        assert_eq!(
            sql,
            "ALTER TABLE posts RENAME COLUMN slug TO handle;\n\
             ALTER TABLE posts RENAME CONSTRAINT posts_slug_unique TO posts_handle_unique;\n\
             ALTER TABLE posts ALTER COLUMN handle TYPE VARCHAR(80) USING handle::VARCHAR(80);"
        );
    }

    #[test]
    fn test_relation_target_change() {
        let old = CollectionDefinition::new("posts").field(relation("author", "users"));
        let new = CollectionDefinition::new("posts").field(relation("author", "authors"));
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&old, &new)),
            "ALTER TABLE posts DROP CONSTRAINT IF EXISTS fk_posts_author;\n\
             ALTER TABLE posts ADD CONSTRAINT fk_posts_author FOREIGN KEY (author) REFERENCES authors (id) ON DELETE RESTRICT;"
        );
    }

    #[test]
    fn test_index_changes_order() {
        let old = posts()
            .index(IndexDefinition::new("idx_gone", ["title"]))
            .index(IndexDefinition::new("idx_slug", ["slug"]));
        let new = posts()
            .index(IndexDefinition::new("idx_slug", ["slug", "title"]).unique())
            .index(IndexDefinition::new("idx_title", ["title"]));
        assert_eq!(
            compile_alter_table("posts", &diff_collections(&old, &new)),
            "DROP INDEX IF EXISTS idx_gone;\n\
             DROP INDEX IF EXISTS idx_slug;\n\
             CREATE UNIQUE INDEX idx_slug ON posts (slug, title);\n\
             CREATE INDEX idx_title ON posts (title);"
        );
    }
}
