//! The policy provider seam.
//!
//! The enforcer never builds trusted values itself. It consumes a
//! [`PolicyProvider`]: something that can create a trusted value of a kind
//! under a named policy, recognise trusted values, and track which policy
//! names may be created. [`PolicyFactory`](crate::PolicyFactory) is the
//! in-crate implementation.

use std::collections::BTreeSet;

use crate::{TrustedKind, TrustedValue, Value};

/// Errors raised by a policy provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The policy name is not in the allowed set.
    #[error("policy \"{0}\" is not allowed")]
    NotAllowed(String),

    /// A policy with this name was already created.
    #[error("policy \"{0}\" already exists")]
    Duplicate(String),

    /// No policy with this name was created.
    #[error("policy \"{0}\" does not exist")]
    UnknownPolicy(String),

    /// The policy has no rule for the requested kind.
    #[error("policy \"{policy}\" cannot create {kind}")]
    MissingRule {
        /// Policy name.
        policy: String,
        /// Requested kind.
        kind: TrustedKind,
    },

    /// The policy's rule refused the input.
    #[error("policy \"{policy}\" refused to create {kind}: {reason}")]
    Rejected {
        /// Policy name.
        policy: String,
        /// Requested kind.
        kind: TrustedKind,
        /// Reason given by the rule.
        reason: String,
    },
}

/// The set of policy names that may be created.
///
/// # Examples
///
/// ```
/// use sink_guard::AllowedPolicyNames;
///
/// let only = AllowedPolicyNames::only(["app", "default"]);
/// assert!(only.permits("app"));
/// assert!(!only.permits("other"));
/// assert!(AllowedPolicyNames::All.permits("anything"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedPolicyNames {
    /// Every name is allowed.
    #[default]
    All,
    /// Only the listed names are allowed.
    Only(BTreeSet<String>),
}

impl AllowedPolicyNames {
    /// Allows exactly the given names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Allows no names at all.
    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    /// Returns `true` if a policy named `name` may be created.
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }
}

/// The capability set the enforcer consumes from a policy provider.
///
/// Only [`create`](Self::create), [`is_kind`](Self::is_kind),
/// [`set_allowed_policy_names`](Self::set_allowed_policy_names) and
/// [`policy_names`](Self::policy_names) need implementing; the per-kind
/// helpers delegate to them.
///
/// Methods take `&self`: providers are shared between the enforcer and the
/// wrappers it installs, and keep any mutable state behind interior
/// mutability.
pub trait PolicyProvider {
    /// Creates a trusted value of `kind` from `input` using policy `policy`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if the policy does not exist, has no rule for
    /// `kind`, or its rule refuses the input.
    fn create(&self, kind: TrustedKind, policy: &str, input: &str)
        -> Result<TrustedValue, PolicyError>;

    /// Returns `true` if `value` is a trusted value of exactly `kind`.
    fn is_kind(&self, kind: TrustedKind, value: &Value) -> bool;

    /// Replaces the set of policy names that may be created.
    fn set_allowed_policy_names(&self, names: AllowedPolicyNames);

    /// Returns the names of every policy created so far.
    fn policy_names(&self) -> Vec<String>;

    /// Creates a [`TrustedKind::Html`] value.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    fn create_html(&self, policy: &str, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Html, policy, input)
    }

    /// Creates a [`TrustedKind::Url`] value.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    fn create_url(&self, policy: &str, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Url, policy, input)
    }

    /// Creates a [`TrustedKind::ScriptUrl`] value.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    fn create_script_url(&self, policy: &str, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::ScriptUrl, policy, input)
    }

    /// Creates a [`TrustedKind::Script`] value.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    fn create_script(&self, policy: &str, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Script, policy, input)
    }

    /// Returns `true` for trusted HTML.
    fn is_html(&self, value: &Value) -> bool {
        self.is_kind(TrustedKind::Html, value)
    }

    /// Returns `true` for a trusted URL.
    fn is_url(&self, value: &Value) -> bool {
        self.is_kind(TrustedKind::Url, value)
    }

    /// Returns `true` for a trusted script URL.
    fn is_script_url(&self, value: &Value) -> bool {
        self.is_kind(TrustedKind::ScriptUrl, value)
    }

    /// Returns `true` for trusted script.
    fn is_script(&self, value: &Value) -> bool {
        self.is_kind(TrustedKind::Script, value)
    }
}
