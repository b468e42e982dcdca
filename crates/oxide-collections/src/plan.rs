//! Migration planning.
//!
//! Glues the pieces together: validate the definitions, diff them and
//! compile the result, producing a [`MigrationPlan`] that can be previewed
//! before anything touches a database.

use serde::Serialize;
use tracing::{debug, info};

use crate::compiler::{alter_table_statements, create_table_statements};
use crate::dialect::{MigrationDialect, PostgresDialect};
use crate::diff::{DiffOptions, SchemaDiff, SchemaDiffer};
use crate::error::{CollectionError, Result};
use crate::operation::Statement;
use crate::schema::CollectionDefinition;
use crate::validate::validate;
use crate::warning::Warning;

/// A previewable migration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    /// Table the statements apply to.
    pub table: String,
    /// The diff, absent when the collection is new.
    pub diff: Option<SchemaDiff>,
    /// Planned statements, in execution order.
    pub statements: Vec<Statement>,
    /// Rendered SQL script.
    pub sql: String,
}

impl MigrationPlan {
    /// Returns `true` if the plan creates the table from scratch.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.diff.is_none()
    }

    /// Returns `true` if the plan has nothing to apply.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.diff.as_ref().is_some_and(|d| !d.has_changes)
    }

    /// Returns the diff warnings (none for a new table).
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        self.diff
            .as_ref()
            .map(|d| d.warnings.as_slice())
            .unwrap_or_default()
    }

    /// Fails with [`CollectionError::DataLossRefused`] if any warning is
    /// `data_loss`.
    pub fn ensure_no_data_loss(&self) -> Result<()> {
        let warnings: Vec<Warning> = self
            .warnings()
            .iter()
            .filter(|w| w.is_data_loss())
            .cloned()
            .collect();
        if warnings.is_empty() {
            Ok(())
        } else {
            Err(CollectionError::DataLossRefused { warnings })
        }
    }
}

/// Plans migrations between collection definitions.
#[derive(Debug, Default)]
pub struct MigrationPlanner {
    options: DiffOptions,
    table: Option<String>,
}

impl MigrationPlanner {
    /// Creates a planner with default diff options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the diff options.
    #[must_use]
    pub const fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// Targets `table` instead of the new definition's name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Plans the migration from `old` (or nothing) to `new`.
    ///
    /// Both definitions are validated first; diffing and compiling assume
    /// valid input.
    pub fn plan(
        &self,
        old: Option<&CollectionDefinition>,
        new: &CollectionDefinition,
    ) -> Result<MigrationPlan> {
        if let Some(old) = old {
            validate(old).into_result(&old.name)?;
        }
        validate(new).into_result(&new.name)?;

        let table = self.table.clone().unwrap_or_else(|| new.name.clone());
        let (diff, statements) = match old {
            None => (None, create_table_statements(new)),
            Some(old) => {
                let diff = SchemaDiffer::with_options(self.options).diff(old, new);
                let statements = alter_table_statements(&table, &diff);
                (Some(diff), statements)
            }
        };

        let dialect = PostgresDialect::new();
        let sql = dialect.generate_script(&statements);
        if diff.is_none() {
            info!(table = %table, dialect = dialect.name(), "planned new collection");
        } else {
            debug!(
                table = %table,
                dialect = dialect.name(),
                statements = statements.len(),
                "planned collection change"
            );
        }

        Ok(MigrationPlan {
            table,
            diff,
            statements,
            sql,
        })
    }
}

/// Plans the migration from `old` (or nothing) to `new` with default options.
pub fn plan_migration(
    old: Option<&CollectionDefinition>,
    new: &CollectionDefinition,
) -> Result<MigrationPlan> {
    MigrationPlanner::new().plan(old, new)
}
