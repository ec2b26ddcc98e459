//! Diagnostics module.
//!
//! Tracks a small provenance field-set (coverage ratio, provenance marker,
//! metric run id, generation time) per entity and reports only transitions,
//! so a backend metrics run silently stalling becomes visible without
//! re-rendering on every message.

mod diagnostics_differ;
mod diagnostics_model;

pub use diagnostics_differ::DiagnosticsDiffer;
pub use diagnostics_model::{
    DiagnosticsChange, DiagnosticsField, DiagnosticsKind, DiagnosticsSnapshot, FieldChange,
};
