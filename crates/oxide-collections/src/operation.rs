//! DDL statements.
//!
//! The compiler plans a migration as an ordered list of typed
//! [`Statement`]s; a [`MigrationDialect`](crate::dialect::MigrationDialect)
//! renders them to SQL text at the very end. Keeping the plan typed lets the
//! ordering rules be checked without parsing SQL.

use serde::{Deserialize, Serialize};

use crate::schema::DefaultValue;
use crate::types::ColumnType;

/// Foreign key `ON DELETE` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// Refuse to delete referenced rows.
    #[default]
    Restrict,
    /// Delete referencing rows too.
    Cascade,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
        }
    }
}

/// A column as it appears in `CREATE TABLE` or `ADD COLUMN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Physical type.
    pub column_type: ColumnType,
    /// Whether this is the primary key.
    pub primary_key: bool,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
    /// Name of the column's UNIQUE constraint, if any.
    pub unique_constraint: Option<String>,
    /// Default value.
    pub default: Option<DefaultValue>,
}

impl ColumnDefinition {
    /// Creates a nullable column without constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
            unique_constraint: None,
            default: None,
        }
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Adds a named UNIQUE constraint.
    #[must_use]
    pub fn unique(mut self, constraint: impl Into<String>) -> Self {
        self.unique_constraint = Some(constraint.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: Option<DefaultValue>) -> Self {
        self.default = value;
        self
    }
}

/// A single DDL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// A SQL comment line.
    Comment(String),
    /// `CREATE TYPE ... AS ENUM`.
    CreateEnumType(CreateEnumTypeOp),
    /// `ALTER TYPE ... ADD VALUE`.
    AddEnumValue(AddEnumValueOp),
    /// `ALTER TYPE ... RENAME TO`.
    RenameType(RenameTypeOp),
    /// `DROP TYPE`.
    DropType(DropTypeOp),
    /// `CREATE TABLE`.
    CreateTable(CreateTableOp),
    /// `ALTER TABLE ... ADD COLUMN`.
    AddColumn(AddColumnOp),
    /// `ALTER TABLE ... DROP COLUMN`.
    DropColumn(DropColumnOp),
    /// `ALTER TABLE ... RENAME COLUMN`.
    RenameColumn(RenameColumnOp),
    /// `ALTER TABLE ... ALTER COLUMN`.
    AlterColumn(AlterColumnOp),
    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY`.
    AddForeignKey(AddForeignKeyOp),
    /// `ALTER TABLE ... ADD CONSTRAINT ... UNIQUE`.
    AddUniqueConstraint(AddUniqueConstraintOp),
    /// `ALTER TABLE ... RENAME CONSTRAINT`.
    RenameConstraint(RenameConstraintOp),
    /// `ALTER TABLE ... DROP CONSTRAINT`.
    DropConstraint(DropConstraintOp),
    /// `CREATE INDEX`.
    CreateIndex(CreateIndexOp),
    /// `DROP INDEX`.
    DropIndex(DropIndexOp),
}

impl Statement {
    /// Creates a comment.
    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Creates an enum type.
    #[must_use]
    pub fn create_enum_type(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::CreateEnumType(CreateEnumTypeOp {
            name: name.into(),
            values,
        })
    }

    /// Appends a value to an enum type.
    #[must_use]
    pub fn add_enum_value(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AddEnumValue(AddEnumValueOp {
            type_name: type_name.into(),
            value: value.into(),
        })
    }

    /// Renames a type.
    #[must_use]
    pub fn rename_type(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::RenameType(RenameTypeOp {
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// Drops a type if it exists.
    #[must_use]
    pub fn drop_type_if_exists(name: impl Into<String>) -> Self {
        Self::DropType(DropTypeOp {
            name: name.into(),
            if_exists: true,
        })
    }

    /// Adds a column.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnDefinition) -> Self {
        Self::AddColumn(AddColumnOp {
            table: table.into(),
            column,
        })
    }

    /// Drops a column together with dependent objects.
    #[must_use]
    pub fn drop_column_cascade(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn(DropColumnOp {
            table: table.into(),
            column: column.into(),
            cascade: true,
        })
    }

    /// Renames a column.
    #[must_use]
    pub fn rename_column(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameColumn(RenameColumnOp {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// Alters a column.
    #[must_use]
    pub fn alter_column(
        table: impl Into<String>,
        column: impl Into<String>,
        change: AlterColumnChange,
    ) -> Self {
        Self::AlterColumn(AlterColumnOp {
            table: table.into(),
            column: column.into(),
            change,
        })
    }

    /// Adds a single-column UNIQUE constraint.
    #[must_use]
    pub fn add_unique_constraint(
        table: impl Into<String>,
        name: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::AddUniqueConstraint(AddUniqueConstraintOp {
            table: table.into(),
            name: name.into(),
            columns: vec![column.into()],
        })
    }

    /// Renames a constraint.
    #[must_use]
    pub fn rename_constraint(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameConstraint(RenameConstraintOp {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// Drops a constraint if it exists.
    #[must_use]
    pub fn drop_constraint_if_exists(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DropConstraint(DropConstraintOp {
            table: table.into(),
            name: name.into(),
            if_exists: true,
        })
    }

    /// Creates an index.
    #[must_use]
    pub fn create_index(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
        unique: bool,
    ) -> Self {
        Self::CreateIndex(CreateIndexOp {
            name: name.into(),
            table: table.into(),
            columns,
            unique,
        })
    }

    /// Drops an index if it exists.
    #[must_use]
    pub fn drop_index_if_exists(name: impl Into<String>) -> Self {
        Self::DropIndex(DropIndexOp {
            name: name.into(),
            if_exists: true,
        })
    }
}

/// Create enum type operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEnumTypeOp {
    /// Type name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<String>,
}

/// Add enum value operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEnumValueOp {
    /// Enum type name.
    pub type_name: String,
    /// Value to append.
    pub value: String,
}

/// Rename type operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTypeOp {
    /// Current type name.
    pub old_name: String,
    /// New type name.
    pub new_name: String,
}

/// Drop type operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTypeOp {
    /// Type name.
    pub name: String,
    /// Whether to use IF EXISTS.
    pub if_exists: bool,
}

/// Create table operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableOp {
    /// Table name.
    pub name: String,
    /// Column definitions, in order.
    pub columns: Vec<ColumnDefinition>,
    /// Whether to use IF NOT EXISTS.
    pub if_not_exists: bool,
}

/// Add column operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnOp {
    /// Table name.
    pub table: String,
    /// Column definition.
    pub column: ColumnDefinition,
}

/// Drop column operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropColumnOp {
    /// Table name.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Whether to drop dependent objects (constraints, indexes).
    pub cascade: bool,
}

/// Rename column operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumnOp {
    /// Table name.
    pub table: String,
    /// Old column name.
    pub old_name: String,
    /// New column name.
    pub new_name: String,
}

/// Alter column operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumnOp {
    /// Table name.
    pub table: String,
    /// Column name.
    pub column: String,
    /// The change to apply.
    pub change: AlterColumnChange,
}

/// Change applied by an [`AlterColumnOp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterColumnChange {
    /// Change the type, casting existing values.
    SetType(ColumnType),
    /// Add NOT NULL.
    SetNotNull,
    /// Remove NOT NULL.
    DropNotNull,
    /// Set the default value.
    SetDefault(DefaultValue),
    /// Remove the default value.
    DropDefault,
}

/// Add foreign key operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddForeignKeyOp {
    /// Referencing table.
    pub table: String,
    /// Constraint name.
    pub name: String,
    /// Referencing column.
    pub column: String,
    /// Referenced table.
    pub references_table: String,
    /// Referenced column.
    pub references_column: String,
    /// ON DELETE action.
    pub on_delete: ForeignKeyAction,
}

/// Add unique constraint operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUniqueConstraintOp {
    /// Table name.
    pub table: String,
    /// Constraint name.
    pub name: String,
    /// Constrained columns.
    pub columns: Vec<String>,
}

/// Rename constraint operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConstraintOp {
    /// Table name.
    pub table: String,
    /// Current constraint name.
    pub old_name: String,
    /// New constraint name.
    pub new_name: String,
}

/// Drop constraint operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropConstraintOp {
    /// Table name.
    pub table: String,
    /// Constraint name.
    pub name: String,
    /// Whether to use IF EXISTS.
    pub if_exists: bool,
}

/// Create index operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexOp {
    /// Index name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    pub unique: bool,
}

/// Drop index operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropIndexOp {
    /// Index name.
    pub name: String,
    /// Whether to use IF EXISTS.
    pub if_exists: bool,
}
