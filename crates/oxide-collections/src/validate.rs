//! Definition validation.
//!
//! Every definition must pass [`validate`] before it is diffed or compiled;
//! the differ and the compiler trust their input and do not re-check it.
//! Validation never stops at the first problem so a caller can show every
//! error at once.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, Result};
use crate::schema::{CollectionDefinition, FieldDefinition, FieldKind, IndexDefinition};

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+$").expect("static pattern"));

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static pattern"));

/// Words that may not be used as a collection name.
pub const RESERVED_WORDS: &[&str] = &[
    "all",
    "alter",
    "and",
    "as",
    "check",
    "column",
    "constraint",
    "create",
    "default",
    "delete",
    "distinct",
    "drop",
    "foreign",
    "from",
    "grant",
    "group",
    "having",
    "index",
    "insert",
    "join",
    "key",
    "limit",
    "not",
    "null",
    "offset",
    "or",
    "order",
    "primary",
    "references",
    "schema",
    "select",
    "table",
    "union",
    "unique",
    "update",
    "user",
    "where",
];

/// Columns the compiler always adds; fields may not reuse these names.
pub const RESERVED_COLUMNS: &[&str] = &["id", "created_at", "updated_at", "deleted_at"];

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path of the offending attribute (`name`, `fields.title`, `indexes.idx_a`, ...).
    pub field: String,
    /// Human readable message.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Every problem found, in rule order.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Converts the result into an error for `collection` if invalid.
    pub fn into_result(self, collection: &str) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(CollectionError::Validation {
                collection: collection.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// Validates a collection definition.
#[must_use]
pub fn validate(definition: &CollectionDefinition) -> ValidationResult {
    let mut errors = Vec::new();

    validate_names(definition, &mut errors);
    validate_fields(&definition.fields, &mut errors);
    validate_indexes(definition, &mut errors);

    tracing::trace!(
        collection = %definition.name,
        errors = errors.len(),
        "validated collection definition"
    );

    ValidationResult::from_errors(errors)
}

/// Returns `true` if `name` is a plain lowercase SQL identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

fn validate_names(definition: &CollectionDefinition, errors: &mut Vec<ValidationError>) {
    if !TABLE_NAME.is_match(&definition.name) {
        errors.push(ValidationError::new(
            "name",
            "Name may only contain lowercase letters and underscores",
        ));
    }
    if RESERVED_WORDS.contains(&definition.name.as_str()) {
        errors.push(ValidationError::new(
            "name",
            format!("'{}' is a reserved word", definition.name),
        ));
    }
    if !TABLE_NAME.is_match(&definition.api_name) {
        errors.push(ValidationError::new(
            "apiName",
            "API name may only contain lowercase letters and underscores",
        ));
    }
    if definition.display_name.trim().is_empty() {
        errors.push(ValidationError::new("displayName", "Display name is required"));
    }
}

fn validate_fields(fields: &[FieldDefinition], errors: &mut Vec<ValidationError>) {
    if fields.is_empty() {
        errors.push(ValidationError::new("fields", "At least one field is required"));
    }

    let mut seen = HashSet::new();
    for field in fields {
        let path = format!("fields.{}", field.name);

        if !seen.insert(field.name.as_str()) {
            errors.push(ValidationError::new(
                &path,
                format!("Duplicate field name '{}'", field.name),
            ));
        }
        if !IDENTIFIER.is_match(&field.name) {
            errors.push(ValidationError::new(
                &path,
                "Field name must start with a lowercase letter or underscore and contain only lowercase letters, digits and underscores",
            ));
        }
        if RESERVED_COLUMNS.contains(&field.name.as_str()) {
            errors.push(ValidationError::new(
                &path,
                format!("'{}' is a reserved column name", field.name),
            ));
        }

        validate_field_shape(field, &path, errors);
    }
}

fn validate_field_shape(field: &FieldDefinition, path: &str, errors: &mut Vec<ValidationError>) {
    match field.kind {
        FieldKind::Text => {
            if field.max_length == Some(0) {
                errors.push(ValidationError::new(path, "maxLength must be positive"));
            }
        }
        FieldKind::Enum => {
            let values = field.enum_values_or_empty();
            if values.is_empty() {
                errors.push(ValidationError::new(
                    path,
                    "Enum fields require at least one value",
                ));
            }
            let mut seen = HashSet::new();
            for value in values {
                if value.is_empty() {
                    errors.push(ValidationError::new(path, "Enum values may not be empty"));
                } else if !seen.insert(value.as_str()) {
                    errors.push(ValidationError::new(
                        path,
                        format!("Duplicate enum value '{value}'"),
                    ));
                }
            }
        }
        FieldKind::Relation => {
            let has_target = field
                .relation
                .as_ref()
                .is_some_and(|r| !r.target_collection.trim().is_empty());
            if !has_target {
                errors.push(ValidationError::new(
                    path,
                    "Relation fields require a target collection",
                ));
            }
        }
        FieldKind::Decimal => {
            if field.declared_scale().is_some_and(|s| s < 0) {
                errors.push(ValidationError::new(path, "Scale must not be negative"));
            }
            if field.precision.is_some_and(|p| p < 1) {
                errors.push(ValidationError::new(path, "Precision must be at least 1"));
            }
            let (precision, scale) = field.effective_precision_scale();
            if precision >= 1 && scale > precision {
                errors.push(ValidationError::new(
                    path,
                    "Scale must not exceed precision",
                ));
            }
        }
        _ => {}
    }
}

fn validate_indexes(definition: &CollectionDefinition, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for index in &definition.indexes {
        let path = format!("indexes.{}", index.name);

        if !seen.insert(index.name.as_str()) {
            errors.push(ValidationError::new(
                &path,
                format!("Duplicate index name '{}'", index.name),
            ));
        }
        if !IDENTIFIER.is_match(&index.name) {
            errors.push(ValidationError::new(&path, "Invalid index name"));
        }
        validate_index_fields(definition, index, &path, errors);
    }
}

fn validate_index_fields(
    definition: &CollectionDefinition,
    index: &IndexDefinition,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if index.fields.is_empty() {
        errors.push(ValidationError::new(
            path,
            "Index must cover at least one field",
        ));
    }
    for name in &index.fields {
        if definition.get_field(name).is_none() {
            errors.push(ValidationError::new(
                path,
                format!("Index references unknown field '{name}'"),
            ));
        }
    }
}
