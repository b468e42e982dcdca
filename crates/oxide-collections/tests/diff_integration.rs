//! End-to-end tests: definitions in, diff and SQL out.

mod common;

use common::{definition, position, posts_v1};
use oxide_collections::prelude::*;

// =============================================================================
// Diff properties
// =============================================================================

#[test]
fn diff_with_self_has_no_changes() {
    let posts = posts_v1();
    let diff = diff_collections(&posts, &posts);
    assert!(!diff.has_changes);
    assert!(diff.is_empty());
    assert!(diff.warnings.is_empty());
}

#[test]
fn field_order_is_not_identity() {
    let posts = posts_v1();
    let mut reordered = posts.clone();
    reordered.fields.reverse();

    let diff = diff_collections(&posts, &reordered);
    assert!(diff.added_fields.is_empty());
    assert!(diff.removed_fields.is_empty());
    assert!(diff.renamed_fields.is_empty());
    assert!(diff.modified_fields.is_empty());
    assert!(!diff.has_changes);
}

#[test]
fn index_column_order_is_significant() {
    let old = posts_v1().index(IndexDefinition::new("idx_pair", ["title", "views"]));
    let new = posts_v1().index(IndexDefinition::new("idx_pair", ["views", "title"]));

    let diff = diff_collections(&old, &new);
    assert_eq!(diff.modified_indexes.len(), 1);
    assert_eq!(diff.modified_indexes[0].new_index.name, "idx_pair");
}

#[test]
fn same_shape_swap_is_a_rename() {
    let old = CollectionDefinition::new("notes").field(text("a").required());
    let new = CollectionDefinition::new("notes").field(text("b").required());

    let diff = diff_collections(&old, &new);
    assert!(diff.added_fields.is_empty());
    assert!(diff.removed_fields.is_empty());
    assert_eq!(diff.renamed_fields.len(), 1);
    assert_eq!(diff.renamed_fields[0].old_name, "a");
    assert_eq!(diff.renamed_fields[0].new_name, "b");
}

#[test]
fn ambiguous_renames_match_in_declaration_order() {
    let old = CollectionDefinition::new("notes")
        .field(text("first"))
        .field(text("second"));
    let new = CollectionDefinition::new("notes")
        .field(text("alpha"))
        .field(text("beta"));

    for _ in 0..3 {
        let diff = diff_collections(&old, &new);
        let pairs: Vec<(&str, &str)> = diff
            .renamed_fields
            .iter()
            .map(|r| (r.old_name.as_str(), r.new_name.as_str()))
            .collect();
        assert_eq!(pairs, [("first", "alpha"), ("second", "beta")]);
    }
}

#[test]
fn required_field_without_default_warns_once() {
    let old = posts_v1();
    let new = posts_v1().field(text("subtitle").required());

    let diff = diff_collections(&old, &new);
    let warnings = diff.warnings_for("subtitle");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::BreakingChange);
    assert_eq!(warnings[0].severity, Severity::High);
}

#[test]
fn disabled_rename_detection_drops_and_adds() {
    let old = CollectionDefinition::new("notes").field(text("a").required());
    let new = CollectionDefinition::new("notes").field(text("b").required());

    let diff = SchemaDiffer::with_options(DiffOptions::new().without_rename_detection())
        .diff(&old, &new);
    assert!(diff.renamed_fields.is_empty());
    assert_eq!(diff.added_fields.len(), 1);
    assert_eq!(diff.removed_fields.len(), 1);
    assert_eq!(diff.data_loss_warnings().len(), 1);
}

// =============================================================================
// Compiled SQL
// =============================================================================

#[test]
fn max_length_shrink_end_to_end() {
    let old = definition(
        r#"{"name": "posts", "apiName": "posts", "displayName": "Posts",
            "fields": [{"name": "title", "type": "text", "maxLength": 255}]}"#,
    );
    let new = definition(
        r#"{"name": "posts", "apiName": "posts", "displayName": "Posts",
            "fields": [{"name": "title", "type": "text", "maxLength": 50}]}"#,
    );

    let diff = diff_collections(&old, &new);
    assert_eq!(diff.modified_fields.len(), 1);
    let modified = &diff.modified_fields[0];
    assert_eq!(modified.name(), "title");
    assert_eq!(
        modified.changed_attributes.iter().copied().collect::<Vec<_>>(),
        [ChangedAttribute::MaxLength]
    );

    let data_loss = diff.data_loss_warnings();
    assert_eq!(data_loss.len(), 1);
    assert_eq!(data_loss[0].severity, Severity::High);
    assert!(data_loss[0].message.contains("title"));

    let sql = compile_alter_table("posts", &diff);
    assert!(sql.contains("ALTER TABLE posts ALTER COLUMN title TYPE VARCHAR(50) USING title::VARCHAR(50);"));
}

#[test]
fn rename_precedes_add_and_drop() {
    let old = posts_v1();
    let new = definition(
        r#"{
            "name": "posts",
            "apiName": "posts",
            "displayName": "Posts",
            "fields": [
                { "name": "headline", "type": "text", "required": true, "maxLength": 255 },
                { "name": "body", "type": "richtext" },
                { "name": "status", "type": "enum", "enumValues": ["draft", "published"] },
                { "name": "featured", "type": "boolean", "defaultValue": false },
                {
                    "name": "author",
                    "type": "relation",
                    "required": true,
                    "relation": { "targetCollection": "authors" }
                }
            ],
            "indexes": [
                { "name": "idx_posts_status", "fields": ["status"] }
            ]
        }"#,
    );

    let diff = diff_collections(&old, &new);
    assert_eq!(diff.renamed_fields.len(), 1);
    assert_eq!(diff.added_fields[0].name, "featured");
    assert_eq!(diff.removed_fields[0].name, "views");

    let sql = compile_alter_table("posts", &diff);
    let rename = position(&sql, "RENAME COLUMN title TO headline");
    assert!(rename < position(&sql, "ADD COLUMN featured BOOLEAN DEFAULT false"));
    assert!(rename < position(&sql, "DROP COLUMN views CASCADE"));
}

#[test]
fn removing_enum_field_drops_its_type_afterwards() {
    let old = posts_v1();
    let mut new = posts_v1();
    new.fields.retain(|f| f.name != "status");
    new.indexes.clear();

    let sql = compile_alter_table("posts", &diff_collections(&old, &new));
    let drop_column = position(&sql, "ALTER TABLE posts DROP COLUMN status CASCADE;");
    let drop_type = position(&sql, "DROP TYPE IF EXISTS status_enum;");
    assert!(drop_column < drop_type);
}

#[test]
fn create_script_orders_types_table_keys_indexes() {
    let posts = posts_v1();
    assert!(validate(&posts).valid);

    let sql = compile_create_table(&posts);
    let create_type = position(&sql, "CREATE TYPE status_enum AS ENUM ('draft', 'published');");
    let create_table = position(&sql, "CREATE TABLE IF NOT EXISTS posts (");
    let foreign_key = position(
        &sql,
        "ALTER TABLE posts ADD CONSTRAINT fk_posts_author FOREIGN KEY (author) REFERENCES authors (id) ON DELETE RESTRICT;",
    );
    let index = position(&sql, "CREATE INDEX idx_posts_status ON posts (status);");
    assert!(create_type < create_table);
    assert!(create_table < foreign_key);
    assert!(foreign_key < index);

    assert!(sql.contains("  id SERIAL PRIMARY KEY,\n"));
    assert!(sql.contains("  views INTEGER DEFAULT 0,\n"));
    assert!(sql.contains("  updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()\n);"));
}

#[test]
fn alter_statements_follow_phase_order() {
    let old = posts_v1().index(IndexDefinition::new("idx_posts_views", ["views"]));
    let new = definition(
        r#"{
            "name": "posts",
            "apiName": "posts",
            "displayName": "Posts",
            "fields": [
                { "name": "headline", "type": "text", "required": true, "maxLength": 255 },
                { "name": "body", "type": "richtext" },
                { "name": "status", "type": "enum", "enumValues": ["draft", "published"] },
                { "name": "views", "type": "integer", "required": true, "defaultValue": 0 },
                {
                    "name": "author",
                    "type": "relation",
                    "required": true,
                    "relation": { "targetCollection": "authors" }
                },
                { "name": "summary", "type": "longtext" }
            ],
            "indexes": [
                { "name": "idx_posts_status", "fields": ["status", "views"] },
                { "name": "idx_posts_headline", "fields": ["headline"], "unique": true }
            ]
        }"#,
    );

    let statements = alter_table_statements("posts", &diff_collections(&old, &new));
    let phases: Vec<u8> = statements
        .iter()
        .map(|s| match s {
            Statement::RenameColumn(_) => 1,
            Statement::AddColumn(_) => 2,
            Statement::DropColumn(_) => 3,
            Statement::AlterColumn(_) => 4,
            Statement::DropIndex(_) => 5,
            Statement::CreateIndex(_) => 6,
            other => panic!("unexpected statement {other:?}"),
        })
        .collect();
    assert_eq!(phases, [1, 2, 4, 5, 5, 6, 6]);

    let sql = PostgresDialect::new().generate_script(&statements);
    assert_eq!(
        sql,
        "ALTER TABLE posts RENAME COLUMN title TO headline;\n\
         ALTER TABLE posts ADD COLUMN summary TEXT;\n\
         ALTER TABLE posts ALTER COLUMN views SET NOT NULL;\n\
         DROP INDEX IF EXISTS idx_posts_views;\n\
         DROP INDEX IF EXISTS idx_posts_status;\n\
         CREATE INDEX idx_posts_status ON posts (status, views);\n\
         CREATE UNIQUE INDEX idx_posts_headline ON posts (headline);"
    );
}

#[test]
fn diff_serializes_camel_case() {
    let old = posts_v1();
    let mut new = posts_v1();
    new.fields.retain(|f| f.name != "views");

    let json = serde_json::to_value(diff_collections(&old, &new)).unwrap();
    assert_eq!(json["hasChanges"], true);
    assert_eq!(json["removedFields"][0]["name"], "views");
    assert_eq!(json["warnings"][0]["kind"], "data_loss");
    assert_eq!(json["warnings"][0]["severity"], "high");
    assert_eq!(json["warnings"][0]["fieldName"], "views");
}
