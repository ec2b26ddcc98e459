//! Diagnostics domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity class a provenance snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsKind {
    Account,
    Portfolio,
    /// The position list of one portfolio
    PortfolioPositions,
}

impl DiagnosticsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticsKind::Account => "account",
            DiagnosticsKind::Portfolio => "portfolio",
            DiagnosticsKind::PortfolioPositions => "portfolio_positions",
        }
    }
}

impl std::fmt::Display for DiagnosticsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four provenance fields tracked per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsField {
    CoverageRatio,
    Provenance,
    MetricRunUuid,
    GeneratedAt,
}

impl DiagnosticsField {
    pub const ALL: [DiagnosticsField; 4] = [
        DiagnosticsField::CoverageRatio,
        DiagnosticsField::Provenance,
        DiagnosticsField::MetricRunUuid,
        DiagnosticsField::GeneratedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticsField::CoverageRatio => "coverage_ratio",
            DiagnosticsField::Provenance => "provenance",
            DiagnosticsField::MetricRunUuid => "metric_run_uuid",
            DiagnosticsField::GeneratedAt => "generated_at",
        }
    }
}

/// Last known provenance of one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub coverage_ratio: Option<Decimal>,
    pub provenance: Option<String>,
    pub metric_run_uuid: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl DiagnosticsSnapshot {
    /// Builds a snapshot, or `None` when every field is empty.
    pub fn from_parts(
        coverage_ratio: Option<Decimal>,
        provenance: Option<String>,
        metric_run_uuid: Option<String>,
        generated_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let snapshot = Self {
            coverage_ratio,
            provenance,
            metric_run_uuid,
            generated_at,
        };
        (!snapshot.is_empty()).then_some(snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.coverage_ratio.is_none()
            && self.provenance.is_none()
            && self.metric_run_uuid.is_none()
            && self.generated_at.is_none()
    }

    /// JSON view of one field, `null` when unset.
    pub fn field_value(&self, field: DiagnosticsField) -> Value {
        match field {
            DiagnosticsField::CoverageRatio => self
                .coverage_ratio
                .map_or(Value::Null, |ratio| Value::String(ratio.normalize().to_string())),
            DiagnosticsField::Provenance => self
                .provenance
                .clone()
                .map_or(Value::Null, Value::String),
            DiagnosticsField::MetricRunUuid => self
                .metric_run_uuid
                .clone()
                .map_or(Value::Null, Value::String),
            DiagnosticsField::GeneratedAt => self
                .generated_at
                .map_or(Value::Null, |ts| Value::String(ts.to_rfc3339())),
        }
    }
}

/// Before/after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub previous: Value,
    pub current: Value,
}

/// A provenance change for one entity, as broadcast to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsChange {
    pub kind: DiagnosticsKind,
    pub uuid: String,
    /// Message type that carried the change
    pub source: String,
    pub changed: BTreeMap<DiagnosticsField, FieldChange>,
    /// Snapshot after the change; `None` when the entry was cleared
    pub snapshot: Option<DiagnosticsSnapshot>,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticsChange {
    pub fn is_cleared(&self) -> bool {
        self.snapshot.is_none()
    }
}
