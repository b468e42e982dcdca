//! Schema differ.
//!
//! Compares an old and a new [`CollectionDefinition`] and classifies every
//! difference: added, removed, renamed and modified fields, and added,
//! removed and modified indexes. Each classified change is then graded into
//! [`Warning`]s so a caller can preview the risk before running any SQL.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{CollectionDefinition, FieldDefinition, FieldKind, IndexDefinition};
use crate::warning::{Severity, Warning, WarningKind};

/// Options for the differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Whether to pair removed and added fields of the same shape as renames.
    pub detect_renames: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffOptions {
    /// Creates default options (rename detection on).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            detect_renames: true,
        }
    }

    /// Disables rename detection; every rename becomes a drop plus an add.
    #[must_use]
    pub const fn without_rename_detection(mut self) -> Self {
        self.detect_renames = false;
        self
    }
}

/// A field attribute that differs between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangedAttribute {
    /// The field kind.
    Type,
    /// `required`.
    Required,
    /// `unique`.
    Unique,
    /// `defaultValue`.
    DefaultValue,
    /// `validation` rules.
    Validation,
    /// `maxLength`.
    MaxLength,
    /// `precision`.
    Precision,
    /// `scale` (or its legacy `decimalPlaces` spelling).
    Scale,
    /// `enumValues`.
    EnumValues,
    /// `relation` settings.
    Relation,
}

impl ChangedAttribute {
    /// Returns the definition key of this attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Required => "required",
            Self::Unique => "unique",
            Self::DefaultValue => "defaultValue",
            Self::Validation => "validation",
            Self::MaxLength => "maxLength",
            Self::Precision => "precision",
            Self::Scale => "scale",
            Self::EnumValues => "enumValues",
            Self::Relation => "relation",
        }
    }
}

/// A field detected as renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedField {
    /// Name in the old definition.
    pub old_name: String,
    /// Name in the new definition.
    pub new_name: String,
    /// The field as declared in the new definition.
    pub field: FieldDefinition,
}

/// A field whose attributes changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedField {
    /// The field as declared in the old definition.
    pub old_field: FieldDefinition,
    /// The field as declared in the new definition.
    pub new_field: FieldDefinition,
    /// Exactly the attributes that differ.
    pub changed_attributes: BTreeSet<ChangedAttribute>,
}

impl ModifiedField {
    /// Current (new) column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.new_field.name
    }

    /// Returns `true` if `attribute` changed.
    #[must_use]
    pub fn changed(&self, attribute: ChangedAttribute) -> bool {
        self.changed_attributes.contains(&attribute)
    }
}

/// An index whose definition changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedIndex {
    /// The index as declared in the old definition.
    pub old_index: IndexDefinition,
    /// The index as declared in the new definition.
    pub new_index: IndexDefinition,
}

/// Result of comparing two collection definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    /// Fields only present in the new definition.
    pub added_fields: Vec<FieldDefinition>,
    /// Fields only present in the old definition.
    pub removed_fields: Vec<FieldDefinition>,
    /// Removed/added pairs classified as renames.
    pub renamed_fields: Vec<RenamedField>,
    /// Fields present in both versions with different attributes.
    pub modified_fields: Vec<ModifiedField>,
    /// Indexes only present in the new definition.
    pub added_indexes: Vec<IndexDefinition>,
    /// Indexes only present in the old definition.
    pub removed_indexes: Vec<IndexDefinition>,
    /// Indexes whose fields or uniqueness changed.
    pub modified_indexes: Vec<ModifiedIndex>,
    /// Risk annotations, in derivation order.
    pub warnings: Vec<Warning>,
    /// `true` iff any change bucket is non-empty.
    pub has_changes: bool,
}

impl SchemaDiff {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_changes
    }

    /// Returns the `data_loss` warnings.
    #[must_use]
    pub fn data_loss_warnings(&self) -> Vec<&Warning> {
        self.warnings.iter().filter(|w| w.is_data_loss()).collect()
    }

    /// Returns the warnings about `field_name`.
    #[must_use]
    pub fn warnings_for(&self, field_name: &str) -> Vec<&Warning> {
        self.warnings
            .iter()
            .filter(|w| w.field_name.as_deref() == Some(field_name))
            .collect()
    }
}

/// Compares collection definitions.
#[derive(Debug, Default)]
pub struct SchemaDiffer {
    options: DiffOptions,
}

impl SchemaDiffer {
    /// Creates a differ with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a differ with custom options.
    #[must_use]
    pub const fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compares `old` to `new`.
    #[must_use]
    pub fn diff(&self, old: &CollectionDefinition, new: &CollectionDefinition) -> SchemaDiff {
        let old_fields: HashMap<&str, &FieldDefinition> =
            old.fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let new_fields: HashMap<&str, &FieldDefinition> =
            new.fields.iter().map(|f| (f.name.as_str(), f)).collect();

        let mut added: Vec<&FieldDefinition> = new
            .fields
            .iter()
            .filter(|f| !old_fields.contains_key(f.name.as_str()))
            .collect();
        let mut removed: Vec<&FieldDefinition> = old
            .fields
            .iter()
            .filter(|f| !new_fields.contains_key(f.name.as_str()))
            .collect();

        let mut modified: Vec<ModifiedField> = new
            .fields
            .iter()
            .filter_map(|new_field| {
                let old_field = old_fields.get(new_field.name.as_str())?;
                modification(old_field, new_field)
            })
            .collect();

        let mut renamed = Vec::new();
        if self.options.detect_renames {
            let mut unmatched = Vec::new();
            for old_field in removed {
                let Some(pos) = added.iter().position(|a| same_shape(old_field, a)) else {
                    unmatched.push(old_field);
                    continue;
                };
                let new_field = added.remove(pos);
                debug!(
                    collection = %new.name,
                    from = %old_field.name,
                    to = %new_field.name,
                    "detected field rename"
                );
                renamed.push(RenamedField {
                    old_name: old_field.name.clone(),
                    new_name: new_field.name.clone(),
                    field: new_field.clone(),
                });
                // Attributes outside the rename key may still differ.
                modified.extend(modification(old_field, new_field));
            }
            removed = unmatched;
        }

        let (added_indexes, removed_indexes, modified_indexes) = diff_indexes(old, new);

        let mut diff = SchemaDiff {
            added_fields: added.into_iter().cloned().collect(),
            removed_fields: removed.into_iter().cloned().collect(),
            renamed_fields: renamed,
            modified_fields: modified,
            added_indexes,
            removed_indexes,
            modified_indexes,
            warnings: Vec::new(),
            has_changes: false,
        };
        diff.has_changes = !(diff.added_fields.is_empty()
            && diff.removed_fields.is_empty()
            && diff.renamed_fields.is_empty()
            && diff.modified_fields.is_empty()
            && diff.added_indexes.is_empty()
            && diff.removed_indexes.is_empty()
            && diff.modified_indexes.is_empty());
        diff.warnings = derive_warnings(&diff);

        debug!(
            collection = %new.name,
            added = diff.added_fields.len(),
            removed = diff.removed_fields.len(),
            renamed = diff.renamed_fields.len(),
            modified = diff.modified_fields.len(),
            warnings = diff.warnings.len(),
            "diffed collection"
        );

        diff
    }
}

/// Compares `old` to `new` with default options.
#[must_use]
pub fn diff_collections(old: &CollectionDefinition, new: &CollectionDefinition) -> SchemaDiff {
    SchemaDiffer::new().diff(old, new)
}

/// Lists the attributes that differ between two versions of a field.
#[must_use]
pub fn changed_attributes(
    old: &FieldDefinition,
    new: &FieldDefinition,
) -> BTreeSet<ChangedAttribute> {
    let mut changed = BTreeSet::new();

    if old.kind != new.kind {
        changed.insert(ChangedAttribute::Type);
    }
    if old.required != new.required {
        changed.insert(ChangedAttribute::Required);
    }
    if old.unique != new.unique {
        changed.insert(ChangedAttribute::Unique);
    }
    if old.default_value != new.default_value {
        changed.insert(ChangedAttribute::DefaultValue);
    }
    if old.validation != new.validation {
        changed.insert(ChangedAttribute::Validation);
    }
    if old.max_length != new.max_length {
        changed.insert(ChangedAttribute::MaxLength);
    }
    if old.precision != new.precision {
        changed.insert(ChangedAttribute::Precision);
    }
    if old.declared_scale() != new.declared_scale() {
        changed.insert(ChangedAttribute::Scale);
    }
    if old.enum_values != new.enum_values {
        changed.insert(ChangedAttribute::EnumValues);
    }
    if old.relation != new.relation {
        changed.insert(ChangedAttribute::Relation);
    }

    changed
}

fn modification(old: &FieldDefinition, new: &FieldDefinition) -> Option<ModifiedField> {
    let changed_attributes = changed_attributes(old, new);
    if changed_attributes.is_empty() {
        None
    } else {
        Some(ModifiedField {
            old_field: old.clone(),
            new_field: new.clone(),
            changed_attributes,
        })
    }
}

/// Checks whether a removed and an added field look like the same field
/// under another name.
fn same_shape(a: &FieldDefinition, b: &FieldDefinition) -> bool {
    if a.kind != b.kind
        || a.required != b.required
        || a.unique != b.unique
        || a.default_value != b.default_value
    {
        return false;
    }
    match a.kind {
        FieldKind::Enum => a.enum_values_or_empty() == b.enum_values_or_empty(),
        FieldKind::Decimal => a.effective_precision_scale() == b.effective_precision_scale(),
        _ => true,
    }
}

fn diff_indexes(
    from: &CollectionDefinition,
    to: &CollectionDefinition,
) -> (Vec<IndexDefinition>, Vec<IndexDefinition>, Vec<ModifiedIndex>) {
    let added = to
        .indexes
        .iter()
        .filter(|i| from.get_index(&i.name).is_none())
        .cloned()
        .collect();
    let removed = from
        .indexes
        .iter()
        .filter(|i| to.get_index(&i.name).is_none())
        .cloned()
        .collect();
    let modified = to
        .indexes
        .iter()
        .filter_map(|new_index| {
            let old_index = from.get_index(&new_index.name)?;
            (old_index.fields != new_index.fields || old_index.unique != new_index.unique).then(
                || ModifiedIndex {
                    old_index: old_index.clone(),
                    new_index: new_index.clone(),
                },
            )
        })
        .collect();

    (added, removed, modified)
}

// ================================================================
// Warnings
// ================================================================

fn derive_warnings(diff: &SchemaDiff) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for field in &diff.added_fields {
        if field.required && field.default_value.is_none() {
            warnings.push(Warning::breaking(
                Severity::High,
                format!(
                    "Field '{}' is required but has no default value; existing rows cannot satisfy NOT NULL",
                    field.name
                ),
                &field.name,
            ));
        }
    }

    for modified in &diff.modified_fields {
        modified_field_warnings(modified, &mut warnings);
    }

    for renamed in &diff.renamed_fields {
        warnings.push(Warning::info(
            format!(
                "Field '{}' appears to have been renamed to '{}'",
                renamed.old_name, renamed.new_name
            ),
            &renamed.new_name,
        ));
    }

    for field in &diff.removed_fields {
        warnings.push(Warning::data_loss(
            format!("Field '{}' will be removed and its data lost", field.name),
            &field.name,
        ));
    }

    for index in &diff.added_indexes {
        warnings.push(Warning::on_index(
            WarningKind::Performance,
            Severity::Low,
            format!("Index '{}' will be built on existing rows", index.name),
        ));
    }
    for index in &diff.removed_indexes {
        warnings.push(Warning::on_index(
            WarningKind::Performance,
            Severity::Medium,
            format!(
                "Index '{}' will be removed; queries relying on it may slow down",
                index.name
            ),
        ));
    }
    for modified in &diff.modified_indexes {
        let name = &modified.new_index.name;
        warnings.push(Warning::on_index(
            WarningKind::BreakingChange,
            Severity::Medium,
            format!("Index '{name}' will be dropped and recreated"),
        ));
    }

    warnings
}

fn modified_field_warnings(modified: &ModifiedField, warnings: &mut Vec<Warning>) {
    let old = &modified.old_field;
    let new = &modified.new_field;
    let name = modified.name();

    if modified.changed(ChangedAttribute::Type) {
        warnings.push(Warning::breaking(
            Severity::High,
            format!(
                "Field '{name}' changes type from {} to {}; existing values may fail to convert",
                old.kind, new.kind
            ),
            name,
        ));
    }

    if modified.changed(ChangedAttribute::MaxLength)
        && old.kind == FieldKind::Text
        && new.kind == FieldKind::Text
        && new.effective_max_length() < old.effective_max_length()
    {
        warnings.push(Warning::data_loss(
            format!(
                "Max length of field '{name}' decreases from {} to {}; longer values will not fit",
                old.effective_max_length(),
                new.effective_max_length()
            ),
            name,
        ));
    }

    if modified.changed(ChangedAttribute::Required) && new.required {
        warnings.push(Warning::breaking(
            Severity::High,
            format!("Field '{name}' becomes required; rows with NULL values will fail"),
            name,
        ));
    }

    if modified.changed(ChangedAttribute::Unique) && new.unique {
        warnings.push(Warning::breaking(
            Severity::Medium,
            format!("Field '{name}' becomes unique; duplicate values will fail"),
            name,
        ));
    }

    if (modified.changed(ChangedAttribute::Precision) || modified.changed(ChangedAttribute::Scale))
        && old.kind == FieldKind::Decimal
        && new.kind == FieldKind::Decimal
        && old.effective_precision_scale() != new.effective_precision_scale()
    {
        let (op, os) = old.effective_precision_scale();
        let (np, ns) = new.effective_precision_scale();
        warnings.push(Warning::breaking(
            Severity::Medium,
            format!(
                "Field '{name}' changes precision/scale from ({op}, {os}) to ({np}, {ns}); values may be rounded or overflow"
            ),
            name,
        ));
    }

    if modified.changed(ChangedAttribute::EnumValues)
        && old.kind == FieldKind::Enum
        && new.kind == FieldKind::Enum
    {
        let kept = new.enum_values_or_empty();
        let dropped: Vec<&str> = old
            .enum_values_or_empty()
            .iter()
            .filter(|v| !kept.contains(*v))
            .map(String::as_str)
            .collect();
        if !dropped.is_empty() {
            warnings.push(Warning::breaking(
                Severity::High,
                format!(
                    "Enum values removed from field '{name}': {}; rows holding them will be invalid",
                    dropped.join(", ")
                ),
                name,
            ));
        }
    }

    if modified.changed(ChangedAttribute::DefaultValue) {
        warnings.push(Warning::info(
            format!("Default value of field '{name}' changes"),
            name,
        ));
    }
}
