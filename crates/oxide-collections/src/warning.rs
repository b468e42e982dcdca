//! Risk classification attached to schema diffs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of risk a change carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Existing data will be destroyed or truncated.
    DataLoss,
    /// The change may fail on existing data or break API consumers.
    BreakingChange,
    /// Query performance characteristics change.
    Performance,
    /// Informational only.
    Info,
}

impl WarningKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DataLoss => "data_loss",
            Self::BreakingChange => "breaking_change",
            Self::Performance => "performance",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How severe a warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl Severity {
    /// Returns the wire name of this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risk annotation on a diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    /// Kind of risk.
    pub kind: WarningKind,
    /// Severity.
    pub severity: Severity,
    /// Human readable description.
    pub message: String,
    /// Field the warning is about. Index warnings leave it empty and name
    /// the index in the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl Warning {
    /// Creates a warning about `field_name`.
    #[must_use]
    pub fn new(
        kind: WarningKind,
        severity: Severity,
        message: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            field_name: Some(field_name.into()),
        }
    }

    /// Creates a warning about an index rather than a field.
    #[must_use]
    pub fn on_index(kind: WarningKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            field_name: None,
        }
    }

    /// A `data_loss`/`high` warning.
    #[must_use]
    pub fn data_loss(message: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::new(WarningKind::DataLoss, Severity::High, message, field_name)
    }

    /// A `breaking_change` warning.
    #[must_use]
    pub fn breaking(
        severity: Severity,
        message: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self::new(WarningKind::BreakingChange, severity, message, field_name)
    }

    /// A `performance` warning.
    #[must_use]
    pub fn performance(
        severity: Severity,
        message: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self::new(WarningKind::Performance, severity, message, field_name)
    }

    /// An `info`/`low` warning.
    #[must_use]
    pub fn info(message: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::new(WarningKind::Info, Severity::Low, message, field_name)
    }

    /// Returns `true` for `data_loss` warnings.
    #[must_use]
    pub fn is_data_loss(&self) -> bool {
        self.kind == WarningKind::DataLoss
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.kind, self.severity, self.message)
    }
}
