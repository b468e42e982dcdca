//! Collection definition types.
//!
//! A [`CollectionDefinition`] is the declarative, versioned description of a
//! table: its typed fields and its indexes. Two snapshots of the same
//! collection are the only input the differ needs; the DDL compiler turns a
//! single snapshot (or a diff between two) into PostgreSQL statements.
//!
//! All types round-trip through JSON using camelCase keys, so definitions
//! stored by an API layer can be loaded as-is.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Length used for `text` fields that do not declare `maxLength`.
pub const DEFAULT_MAX_LENGTH: u32 = 255;

/// Precision used for `decimal` fields that do not declare one.
pub const DEFAULT_PRECISION: i32 = 10;

/// Scale used for `decimal` fields that do not declare one.
pub const DEFAULT_SCALE: i32 = 2;

/// The fixed catalog of field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Short text with a maximum length.
    Text,
    /// Unbounded plain text.
    LongText,
    /// Unbounded formatted text (HTML/markdown).
    RichText,
    /// 32-bit integer.
    Integer,
    /// Fixed-point number with precision and scale.
    Decimal,
    /// Calendar date.
    Date,
    /// Timestamp with time zone.
    DateTime,
    /// Boolean.
    Boolean,
    /// One of a closed list of string values.
    Enum,
    /// Arbitrary JSON document.
    Json,
    /// Reference to a row of another collection.
    Relation,
    /// Reference to an uploaded file (stored as its path/URL).
    Media,
}

impl FieldKind {
    /// Every kind in the catalog.
    pub const ALL: [Self; 12] = [
        Self::Text,
        Self::LongText,
        Self::RichText,
        Self::Integer,
        Self::Decimal,
        Self::Date,
        Self::DateTime,
        Self::Boolean,
        Self::Enum,
        Self::Json,
        Self::Relation,
        Self::Media,
    ];

    /// Returns the catalog name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "longtext",
            Self::RichText => "richtext",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Json => "json",
            Self::Relation => "relation",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL functions accepted as default values.
///
/// A string default matching one of these names (case-insensitively) is
/// emitted as a SQL call instead of a quoted literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultFunction {
    /// `NOW()`
    Now,
    /// `CURRENT_DATE`
    CurrentDate,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
    /// `CURRENT_TIME`
    CurrentTime,
}

impl DefaultFunction {
    /// Looks up a function by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Now,
            Self::CurrentDate,
            Self::CurrentTimestamp,
            Self::CurrentTime,
        ]
        .into_iter()
        .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Returns the name used in definitions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Now => "NOW",
            Self::CurrentDate => "CURRENT_DATE",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
            Self::CurrentTime => "CURRENT_TIME",
        }
    }

    /// Returns the SQL fragment for this function.
    #[must_use]
    pub const fn to_sql(self) -> &'static str {
        match self {
            Self::Now => "NOW()",
            Self::CurrentDate => "CURRENT_DATE",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
            Self::CurrentTime => "CURRENT_TIME",
        }
    }
}

/// Default value of a field.
///
/// Strings naming a [`DefaultFunction`] are treated as that function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal or default function name.
    Text(String),
}

impl DefaultValue {
    /// Returns the default function this value names, if any.
    #[must_use]
    pub fn function(&self) -> Option<DefaultFunction> {
        match self {
            Self::Text(s) => DefaultFunction::from_name(s),
            _ => None,
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DefaultFunction> for DefaultValue {
    fn from(value: DefaultFunction) -> Self {
        Self::Text(value.name().to_string())
    }
}

/// Relation settings of a `relation` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDefinition {
    /// Collection (table) the field points at.
    #[serde(default)]
    pub target_collection: String,
    /// Whether deleting the target row deletes referencing rows.
    #[serde(default)]
    pub cascade_delete: bool,
    /// Explicit foreign key constraint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_name: Option<String>,
}

impl RelationDefinition {
    /// Creates a relation to `target_collection` with `ON DELETE RESTRICT`.
    #[must_use]
    pub fn new(target_collection: impl Into<String>) -> Self {
        Self {
            target_collection: target_collection.into(),
            cascade_delete: false,
            foreign_key_name: None,
        }
    }

    /// Deletes referencing rows along with the target row.
    #[must_use]
    pub fn cascade_delete(mut self) -> Self {
        self.cascade_delete = true;
        self
    }

    /// Sets an explicit foreign key constraint name.
    #[must_use]
    pub fn foreign_key_name(mut self, name: impl Into<String>) -> Self {
        self.foreign_key_name = Some(name.into());
        self
    }
}

/// One column's logical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Column name.
    pub name: String,
    /// Field kind.
    #[serde(alias = "type")]
    pub kind: FieldKind,
    /// Whether the column is NOT NULL.
    #[serde(default)]
    pub required: bool,
    /// Whether the column carries a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    /// Application-level validation rules. Opaque to the engine; only
    /// compared for changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
    /// Maximum length (`text` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Total digits (`decimal` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
    /// Digits after the decimal point (`decimal` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    /// Legacy spelling of `scale`, honoured when `scale` is absent.
    #[serde(
        default,
        rename = "decimalPlaces",
        skip_serializing_if = "Option::is_none"
    )]
    pub decimal_places: Option<i32>,
    /// Allowed values (`enum` only), in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Relation settings (`relation` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationDefinition>,
}

impl FieldDefinition {
    /// Creates an optional, non-unique field with no extra settings.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            unique: false,
            default_value: None,
            validation: None,
            max_length: None,
            precision: None,
            scale: None,
            decimal_places: None,
            enum_values: None,
            relation: None,
        }
    }

    /// Marks the field as required (NOT NULL).
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the validation rules.
    #[must_use]
    pub fn validation(mut self, rules: serde_json::Value) -> Self {
        self.validation = Some(rules);
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets decimal precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the allowed enum values.
    #[must_use]
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the relation settings.
    #[must_use]
    pub fn relation(mut self, relation: RelationDefinition) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Declared scale, falling back to the legacy `decimalPlaces`.
    #[must_use]
    pub fn declared_scale(&self) -> Option<i32> {
        self.scale.or(self.decimal_places)
    }

    /// Effective maximum length of a text column.
    #[must_use]
    pub fn effective_max_length(&self) -> u32 {
        self.max_length.unwrap_or(DEFAULT_MAX_LENGTH)
    }

    /// Effective `(precision, scale)` of a decimal column.
    #[must_use]
    pub fn effective_precision_scale(&self) -> (i32, i32) {
        (
            self.precision.unwrap_or(DEFAULT_PRECISION),
            self.declared_scale().unwrap_or(DEFAULT_SCALE),
        )
    }

    /// Enum values, or an empty slice.
    #[must_use]
    pub fn enum_values_or_empty(&self) -> &[String] {
        self.enum_values.as_deref().unwrap_or_default()
    }
}

/// Creates a `text` field.
#[must_use]
pub fn text(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Text)
}

/// Creates an `integer` field.
#[must_use]
pub fn integer(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Integer)
}

/// Creates a `boolean` field.
#[must_use]
pub fn boolean(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Boolean)
}

/// Creates a `decimal` field with the given precision and scale.
#[must_use]
pub fn decimal(name: impl Into<String>, precision: i32, scale: i32) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Decimal).precision(precision, scale)
}

/// Creates an `enum` field.
#[must_use]
pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> FieldDefinition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FieldDefinition::new(name, FieldKind::Enum).enum_values(values)
}

/// Creates a `relation` field pointing at `target`.
#[must_use]
pub fn relation(name: impl Into<String>, target: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Relation).relation(RelationDefinition::new(target))
}

/// Definition of an index over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    /// Index name.
    pub name: String,
    /// Indexed field names; order is significant.
    pub fields: Vec<String>,
    /// Whether this is a unique index.
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    /// Creates a non-unique index.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A versioned schema snapshot of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// Physical table name.
    pub name: String,
    /// Name used by the API layer.
    pub api_name: String,
    /// Human readable name.
    pub display_name: String,
    /// Fields in column order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Declared indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionDefinition {
    /// Creates an empty collection whose API and display names equal `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            api_name: name.clone(),
            display_name: name.clone(),
            name,
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Sets the API name.
    #[must_use]
    pub fn api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = api_name.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends an index.
    #[must_use]
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Gets a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Parses a definition from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON definition file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
