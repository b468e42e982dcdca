#![allow(dead_code)]

use oxide_collections::prelude::*;

/// Parses a definition, panicking with the JSON on failure.
pub fn definition(json: &str) -> CollectionDefinition {
    CollectionDefinition::from_json_str(json)
        .unwrap_or_else(|e| panic!("Failed to parse definition: {e}\n{json}"))
}

/// Version 1 of a blog `posts` collection.
pub fn posts_v1() -> CollectionDefinition {
    definition(
        r#"{
            "name": "posts",
            "apiName": "posts",
            "displayName": "Posts",
            "fields": [
                { "name": "title", "type": "text", "required": true, "maxLength": 255 },
                { "name": "body", "type": "richtext" },
                { "name": "status", "type": "enum", "enumValues": ["draft", "published"] },
                { "name": "views", "type": "integer", "defaultValue": 0 },
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
    )
}

/// Returns the byte offset of `needle` in `sql`, panicking if absent.
pub fn position(sql: &str, needle: &str) -> usize {
    sql.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{sql}"))
}
