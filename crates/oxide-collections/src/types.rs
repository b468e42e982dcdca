//! Mapping from field kinds to physical PostgreSQL column types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldDefinition, FieldKind};

/// Physical column type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// `VARCHAR(n)`.
    Varchar(u32),
    /// `TEXT`.
    Text,
    /// `INTEGER`.
    Integer,
    /// `NUMERIC(precision, scale)`.
    Numeric(i32, i32),
    /// `DATE`.
    Date,
    /// `TIMESTAMP WITH TIME ZONE`.
    TimestampTz,
    /// `BOOLEAN`.
    Boolean,
    /// `JSONB`.
    Jsonb,
    /// A named enum type created with `CREATE TYPE ... AS ENUM`.
    Enum(String),
    /// `SERIAL`, used for the implicit `id` column.
    Serial,
}

impl ColumnType {
    /// Returns the PostgreSQL spelling of this type.
    #[must_use]
    pub fn postgres_name(&self) -> String {
        match self {
            Self::Varchar(len) => format!("VARCHAR({len})"),
            Self::Text => "TEXT".to_string(),
            Self::Integer => "INTEGER".to_string(),
            Self::Numeric(p, s) => format!("NUMERIC({p}, {s})"),
            Self::Date => "DATE".to_string(),
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Jsonb => "JSONB".to_string(),
            Self::Enum(name) => name.clone(),
            Self::Serial => "SERIAL".to_string(),
        }
    }

    /// Returns the enum type name if this is an enum column.
    #[must_use]
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Self::Enum(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.postgres_name())
    }
}

/// Resolves the column type of a field.
#[must_use]
pub fn column_type(field: &FieldDefinition) -> ColumnType {
    match field.kind {
        FieldKind::Text => ColumnType::Varchar(field.effective_max_length()),
        FieldKind::LongText | FieldKind::RichText | FieldKind::Media => ColumnType::Text,
        FieldKind::Integer | FieldKind::Relation => ColumnType::Integer,
        FieldKind::Decimal => {
            let (precision, scale) = field.effective_precision_scale();
            ColumnType::Numeric(precision, scale)
        }
        FieldKind::Date => ColumnType::Date,
        FieldKind::DateTime => ColumnType::TimestampTz,
        FieldKind::Boolean => ColumnType::Boolean,
        FieldKind::Json => ColumnType::Jsonb,
        FieldKind::Enum => ColumnType::Enum(enum_type_name(&field.name)),
    }
}

/// Returns the physical type of a field as SQL text.
#[must_use]
pub fn physical_type(field: &FieldDefinition) -> String {
    column_type(field).postgres_name()
}

/// Name of the enum type backing the field `field_name`.
#[must_use]
pub fn enum_type_name(field_name: &str) -> String {
    format!("{}_enum", snake_case(field_name))
}

/// Converts `camelCase`, `PascalCase`, kebab and spaced names to `snake_case`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else if c == '-' || c.is_whitespace() {
            out.push('_');
            prev_lower_or_digit = false;
        } else {
            out.push(c);
            prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
