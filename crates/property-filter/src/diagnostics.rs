//! Non-fatal diagnostics for configuration defects.
//!
//! Configuration mistakes (a property without a label, hidden operations on a
//! grouped query) never fail a render. They are reported once per distinct
//! message through `tracing` and kept for inspection.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

/// Kind of configuration defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// A property has no `property_label`.
    MissingPropertyLabel,
    /// A property has no `group_values_label`.
    MissingGroupValuesLabel,
    /// A property declares no operators.
    MissingOperators,
    /// Two properties share a key.
    DuplicateProperty,
    /// A property definition override names a key with no property.
    UnknownPropertyDefinition,
    /// `hide_operations` is set while the query contains groups.
    HideOperationsWithGroups,
    /// A group-only edit was requested with token groups disabled.
    GroupsDisabled,
}

impl DiagnosticCode {
    /// Returns the stable code string.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::MissingPropertyLabel => "missing-property-label",
            DiagnosticCode::MissingGroupValuesLabel => "missing-group-values-label",
            DiagnosticCode::MissingOperators => "missing-operators",
            DiagnosticCode::DuplicateProperty => "duplicate-property",
            DiagnosticCode::UnknownPropertyDefinition => "unknown-property-definition",
            DiagnosticCode::HideOperationsWithGroups => "hide-operations-with-groups",
            DiagnosticCode::GroupsDisabled => "groups-disabled",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The defect kind.
    pub code: DiagnosticCode,
    /// Human readable description.
    pub message: String,
}

#[derive(Debug, Default)]
struct DiagnosticsInner {
    seen: HashSet<(DiagnosticCode, String)>,
    entries: Vec<Diagnostic>,
}

/// De-duplicating diagnostic sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    inner: Mutex<DiagnosticsInner>,
}

impl Diagnostics {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a defect unless the same message was already reported.
    ///
    /// Returns true if this call emitted the diagnostic.
    pub fn warn_once(&self, code: DiagnosticCode, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.seen.insert((code, message.clone())) {
            return false;
        }
        tracing::warn!(code = code.as_str(), "{message}");
        inner.entries.push(Diagnostic { code, message });
        true
    }

    /// Returns every diagnostic emitted so far, in emission order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.clone()
    }

    /// Returns true if any diagnostic with `code` was emitted.
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.iter().any(|d| d.code == code)
    }

    /// Number of distinct diagnostics emitted.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.len()
    }

    /// Returns true if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates_identical_messages() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.warn_once(DiagnosticCode::MissingPropertyLabel, "a"));
        assert!(!diagnostics.warn_once(DiagnosticCode::MissingPropertyLabel, "a"));
        assert!(diagnostics.warn_once(DiagnosticCode::MissingPropertyLabel, "b"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_same_message_different_code_is_distinct() {
        let diagnostics = Diagnostics::new();
        diagnostics.warn_once(DiagnosticCode::MissingPropertyLabel, "x");
        diagnostics.warn_once(DiagnosticCode::MissingGroupValuesLabel, "x");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.contains(DiagnosticCode::MissingGroupValuesLabel));
        assert!(!diagnostics.contains(DiagnosticCode::DuplicateProperty));
    }

    #[test]
    fn test_code_strings() {
        assert_eq!(
            DiagnosticCode::HideOperationsWithGroups.to_string(),
            "hide-operations-with-groups"
        );
    }
}
