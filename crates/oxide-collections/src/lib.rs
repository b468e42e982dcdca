//! Declarative collection schemas for PostgreSQL.
//!
//! `oxide-collections` manages tables described as *collections*: a name,
//! typed fields and indexes. Given an old and a new version of a collection
//! it computes the structural delta, grades every change by risk, and emits
//! the ordered DDL that migrates the physical table.
//!
//! # Architecture
//!
//! - **Schema** - The definition model (`CollectionDefinition`, `FieldDefinition`, ...)
//! - **Validate** - Structural and naming rules a definition must pass
//! - **Types** - Field kind to PostgreSQL column type mapping
//! - **Diff** - Field/index delta with rename detection and risk warnings
//! - **Compiler** - Ordered `CREATE`/`ALTER` statements
//! - **Dialect** - SQL rendering of the planned statements
//! - **Plan** - Validate, diff and compile in one step
//!
//! # Example
//!
//! ```rust
//! use oxide_collections::prelude::*;
//!
//! let old = CollectionDefinition::new("posts").field(text("title").max_length(255));
//! let new = CollectionDefinition::new("posts").field(text("title").max_length(50));
//!
//! let diff = diff_collections(&old, &new);
//! assert_eq!(diff.data_loss_warnings().len(), 1);
//!
//! let sql = compile_alter_table("posts", &diff);
//! assert_eq!(
//!     sql,
//!     "ALTER TABLE posts ALTER COLUMN title TYPE VARCHAR(50) USING title::VARCHAR(50);"
//! );
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Check a definition file
//! oxide-collections validate posts.json
//!
//! # Show the classified diff between two versions
//! oxide-collections --format json diff old/posts.json new/posts.json
//!
//! # Print the CREATE script of a new collection
//! oxide-collections create-sql posts.json
//!
//! # Print the ALTER script, refusing data loss unless allowed
//! oxide-collections alter-sql old/posts.json new/posts.json --allow-data-loss
//! ```

pub mod compiler;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod operation;
pub mod plan;
pub mod schema;
pub mod types;
pub mod validate;
pub mod warning;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::{
        alter_table_statements, compile_alter_table, compile_create_table,
        create_table_statements,
    };
    pub use crate::dialect::{MigrationDialect, PostgresDialect};
    pub use crate::diff::{
        ChangedAttribute, DiffOptions, ModifiedField, ModifiedIndex, RenamedField, SchemaDiff,
        SchemaDiffer, diff_collections,
    };
    pub use crate::error::{CollectionError, Result};
    pub use crate::operation::Statement;
    pub use crate::plan::{MigrationPlan, MigrationPlanner, plan_migration};
    pub use crate::schema::{
        CollectionDefinition, DefaultFunction, DefaultValue, FieldDefinition, FieldKind,
        IndexDefinition, RelationDefinition, boolean, decimal, enumeration, integer, relation,
        text,
    };
    pub use crate::types::{ColumnType, physical_type};
    pub use crate::validate::{ValidationError, ValidationResult, validate};
    pub use crate::warning::{Severity, Warning, WarningKind};
}
