use crate::TypeRequirementViolation;

/// Violation diagnostics, gated by the configured logging toggle.
///
/// Each violation becomes one structured `WARN` event with target
/// `sink_guard::violation`. When logging is disabled nothing is emitted.
///
/// Lifecycle and fallback events are not violations and are always sent at
/// `DEBUG`; subscribers filter them as usual.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DiagnosticLog {
    enabled: bool,
}

impl DiagnosticLog {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Reports a violation, noting whether the call was blocked.
    pub(crate) fn violation(&self, violation: &TypeRequirementViolation, enforced: bool) {
        if !self.enabled {
            return;
        }
        tracing::warn!(
            target: "sink_guard::violation",
            member = %violation.member(),
            receiver = %violation.receiver(),
            required_kind = %violation.required_kind(),
            enforced,
            "{}",
            violation.message()
        );
    }
}
