use crate::{SurfaceKind, TrustedKind};

/// Errors raised while wrapping or restoring a member.
///
/// All of these indicate an integration or lifecycle mistake rather than
/// something calling code is expected to recover from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterceptError {
    /// The member is absent or is not callable.
    #[error("{surface}.{member} is not a function")]
    NotAFunction {
        /// Surface the member was looked up on.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member has no setter to wrap.
    #[error("{surface}.{member} has no setter")]
    MissingSetter {
        /// Surface the accessor was looked up on.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member is already intercepted.
    #[error("{surface}.{member} is already intercepted")]
    DoubleInstallation {
        /// Surface of the interception record.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member is not intercepted, so there is nothing to restore.
    #[error("{surface}.{member} is not intercepted")]
    NotInstalled {
        /// Surface of the missing interception record.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// A surface supplied as an ancestor is not one.
    #[error("{ancestor} is not an ancestor of {surface}")]
    InvalidHierarchy {
        /// Surface being wrapped.
        surface: SurfaceKind,
        /// The claimed ancestor.
        ancestor: SurfaceKind,
    },

    /// A host redefinition primitive failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// A sink received a value it does not accept.
///
/// This is the routine outcome of code attempting an unsafe assignment while
/// enforcement is enabled, and the one error callers are expected to catch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TypeRequirementViolation {
    member: String,
    receiver: String,
    required_kind: TrustedKind,
    message: String,
}

impl TypeRequirementViolation {
    /// Builds the violation and its diagnostic message.
    pub(crate) fn new(member: &str, receiver: impl Into<String>, required_kind: TrustedKind) -> Self {
        let receiver = receiver.into();
        let message = format!(
            "Failed to set {} on {}: This property requires {}.",
            member, receiver, required_kind
        );
        Self {
            member: member.to_string(),
            receiver,
            required_kind,
            message,
        }
    }

    /// Returns the sink member name.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Returns a description of the receiving object.
    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    /// Returns the kind the sink requires.
    pub fn required_kind(&self) -> TrustedKind {
        self.required_kind
    }

    /// Returns the diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised by an intercepted or host call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The sink rejected its value.
    #[error(transparent)]
    TypeRequirement(#[from] TypeRequirementViolation),

    /// The host operation itself failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl CallError {
    /// Returns the violation if this call was rejected by enforcement.
    pub fn as_violation(&self) -> Option<&TypeRequirementViolation> {
        match self {
            CallError::TypeRequirement(v) => Some(v),
            CallError::Host(_) => None,
        }
    }
}

/// Errors raised by a host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// No member with this name exists on the surface or its ancestors.
    #[error("{surface} has no member {member}")]
    UnknownMember {
        /// Surface the lookup started from.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member exists but cannot be called.
    #[error("{surface}.{member} is not callable")]
    NotCallable {
        /// Surface the lookup started from.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member cannot be assigned.
    #[error("{surface}.{member} cannot be assigned")]
    NoSetter {
        /// Surface the lookup started from.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// The member cannot be read.
    #[error("{surface}.{member} cannot be read")]
    NoGetter {
        /// Surface the lookup started from.
        surface: SurfaceKind,
        /// Member name.
        member: String,
    },

    /// A native operation failed.
    #[error("host operation failed: {0}")]
    Native(String),
}
