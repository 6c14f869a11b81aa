use std::fmt;

/// Returned by a [`PolicyRule`] that refuses its input.
///
/// The reason is meant for diagnostics and should not echo the rejected
/// input back.
///
/// # Examples
///
/// ```
/// use sink_guard::RuleRejection;
///
/// let rejection = RuleRejection::new("contains <script>");
/// assert_eq!(rejection.reason(), "contains <script>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRejection {
    reason: String,
}

impl RuleRejection {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the rejection reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for RuleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected: {}", self.reason)
    }
}

impl std::error::Error for RuleRejection {}

/// Converts untrusted input into the content of a trusted value.
///
/// A policy holds at most one rule per [`TrustedKind`](crate::TrustedKind).
/// The rule sees the raw input string and returns the content the trusted
/// value will carry, or refuses.
///
/// # Invariants
///
/// Implementations MUST:
/// - Return only content that is safe for the kind the rule is registered for
/// - Not call back into an intercepted sink (the enforcer does not guard
///   against that reentrancy)
///
/// Closures of the right shape are rules:
///
/// ```
/// use sink_guard::{PolicyRule, RuleRejection};
///
/// let strip = |input: &str| -> Result<String, RuleRejection> {
///     Ok(input.replace('<', "&lt;"))
/// };
/// assert_eq!(strip.apply("<b>").unwrap(), "&lt;b>");
/// ```
pub trait PolicyRule {
    /// Applies the rule to `input`.
    ///
    /// # Errors
    ///
    /// Returns `RuleRejection` if the input must not become trusted.
    fn apply(&self, input: &str) -> Result<String, RuleRejection>;
}

impl<F> PolicyRule for F
where
    F: Fn(&str) -> Result<String, RuleRejection>,
{
    fn apply(&self, input: &str) -> Result<String, RuleRejection> {
        self(input)
    }
}

/// A rule that accepts input unchanged.
///
/// **WARNING:** this blesses any input. It exists for report-only rollouts
/// and tests, where the aim is to observe sinks rather than to protect them.
///
/// # Examples
///
/// ```
/// use sink_guard::{PassThrough, PolicyRule};
///
/// assert_eq!(PassThrough.apply("<img onerror=x>").unwrap(), "<img onerror=x>");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PassThrough;

impl PolicyRule for PassThrough {
    fn apply(&self, input: &str) -> Result<String, RuleRejection> {
        Ok(input.to_string())
    }
}

/// A rule that refuses every input.
///
/// # Examples
///
/// ```
/// use sink_guard::{PolicyRule, RejectAll};
///
/// assert!(RejectAll.apply("anything").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RejectAll;

impl PolicyRule for RejectAll {
    fn apply(&self, _input: &str) -> Result<String, RuleRejection> {
        Err(RuleRejection::new("rejected by policy"))
    }
}
