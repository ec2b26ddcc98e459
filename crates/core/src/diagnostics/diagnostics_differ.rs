use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use log::debug;

use super::diagnostics_model::{
    DiagnosticsChange, DiagnosticsField, DiagnosticsKind, DiagnosticsSnapshot, FieldChange,
};

/// Tracks the last provenance snapshot per `(kind, uuid)` and reports drift.
#[derive(Debug, Default)]
pub struct DiagnosticsDiffer {
    snapshots: HashMap<(DiagnosticsKind, String), DiagnosticsSnapshot>,
}

impl DiagnosticsDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `next` against the recorded snapshot.
    ///
    /// - `next` absent, entry tracked: emits a cleared change and forgets the entry
    /// - `next` present, at least one field differs: emits the changed fields
    ///   and records `next`
    /// - otherwise: no-op
    pub fn diff(
        &mut self,
        kind: DiagnosticsKind,
        uuid: &str,
        source: &str,
        next: Option<DiagnosticsSnapshot>,
        now: DateTime<Utc>,
    ) -> Option<DiagnosticsChange> {
        let key = (kind, uuid.to_string());

        let next = match next.filter(|snapshot| !snapshot.is_empty()) {
            Some(snapshot) => snapshot,
            None => {
                let previous = self.snapshots.remove(&key)?;
                debug!("Diagnostics for {} {} cleared", kind, uuid);
                let changed = changed_fields(&previous, &DiagnosticsSnapshot::default());
                return Some(DiagnosticsChange {
                    kind,
                    uuid: uuid.to_string(),
                    source: source.to_string(),
                    changed,
                    snapshot: None,
                    timestamp: now,
                });
            }
        };

        let previous = self.snapshots.get(&key).cloned().unwrap_or_default();
        let changed = changed_fields(&previous, &next);
        if changed.is_empty() {
            return None;
        }

        debug!(
            "Diagnostics for {} {} changed: {:?}",
            kind,
            uuid,
            changed.keys().map(DiagnosticsField::as_str).collect::<Vec<_>>()
        );
        self.snapshots.insert(key, next.clone());
        Some(DiagnosticsChange {
            kind,
            uuid: uuid.to_string(),
            source: source.to_string(),
            changed,
            snapshot: Some(next),
            timestamp: now,
        })
    }

    pub fn snapshot(&self, kind: DiagnosticsKind, uuid: &str) -> Option<&DiagnosticsSnapshot> {
        self.snapshots.get(&(kind, uuid.to_string()))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn changed_fields(
    previous: &DiagnosticsSnapshot,
    current: &DiagnosticsSnapshot,
) -> BTreeMap<DiagnosticsField, FieldChange> {
    DiagnosticsField::ALL
        .iter()
        .filter_map(|field| {
            let before = previous.field_value(*field);
            let after = current.field_value(*field);
            (before != after).then(|| {
                (
                    *field,
                    FieldChange {
                        previous: before,
                        current: after,
                    },
                )
            })
        })
        .collect()
}
