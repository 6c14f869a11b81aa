use std::fmt;
use std::rc::Rc;

use crate::TrustedKind;

/// A value produced by a policy and accepted by sinks of its kind.
///
/// `TrustedValue` is the only thing a sink accepts without consulting the
/// fallback policy. It records which kind it is, which policy produced it,
/// and the resulting content.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<String>` conversion. Values
/// are created by [`Policy`](crate::Policy) handles, which hold the rules
/// for their named policy, so holding a policy is what authorizes producing
/// trusted content.
///
/// ```compile_fail
/// use sink_guard::{TrustedKind, TrustedValue};
///
/// // No public constructor:
/// let forged = TrustedValue::new_unchecked(TrustedKind::Html, "p", "<b>x</b>");
/// ```
///
/// # Examples
///
/// ```
/// use sink_guard::{PolicyFactory, PolicyRules, RuleRejection, TrustedKind};
///
/// let upper = |s: &str| -> Result<String, RuleRejection> { Ok(s.to_uppercase()) };
/// let factory = PolicyFactory::new();
/// let policy = factory
///     .create_policy("app", PolicyRules::new().with_html(upper))
///     .unwrap();
///
/// let html = policy.create_html("<b>hi</b>").unwrap();
/// assert_eq!(html.kind(), TrustedKind::Html);
/// assert_eq!(html.policy_name(), "app");
/// assert_eq!(html.as_str(), "<B>HI</B>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedValue {
    kind: TrustedKind,
    policy: String,
    content: String,
}

impl TrustedValue {
    /// Wraps `content` as a trusted value without running any rule.
    ///
    /// Only policy code inside this crate may call this, after the policy's
    /// rule for `kind` has produced `content`.
    pub(crate) fn new_unchecked(
        kind: TrustedKind,
        policy: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            policy: policy.into(),
            content: content.into(),
        }
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> TrustedKind {
        self.kind
    }

    /// Returns the name of the policy that produced this value.
    pub fn policy_name(&self) -> &str {
        &self.policy
    }

    /// Returns the trusted content.
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Consumes the value and returns the trusted content.
    pub fn into_inner(self) -> String {
        self.content
    }
}

impl AsRef<str> for TrustedValue {
    fn as_ref(&self) -> &str {
        &self.content
    }
}

/// Trusted values stringify to their content, as host sinks expect.
impl fmt::Display for TrustedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// A host callable passed as a value, such as an event listener.
///
/// Two callbacks are equal only if they are the same callable.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Value>);

impl Callback {
    /// Wraps a closure as a callable value.
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callable.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A value flowing through an intercepted call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value; also stands in for a missing argument.
    #[default]
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A plain, untrusted string.
    String(String),
    /// A policy-produced trusted value.
    Trusted(TrustedValue),
    /// A callable.
    Callable(Callback),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for [`Value::Callable`].
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Callable(_))
    }

    /// Returns the string content for plain strings and trusted values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Trusted(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Returns the trusted value, if this is one.
    pub fn as_trusted(&self) -> Option<&TrustedValue> {
        match self {
            Value::Trusted(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the string a policy receives when asked to convert this value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sink_guard::Value;
    ///
    /// assert_eq!(Value::Null.to_input_string(), "null");
    /// assert_eq!(Value::Number(2.0).to_input_string(), "2");
    /// assert_eq!(Value::from("x").to_input_string(), "x");
    /// ```
    pub fn to_input_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Trusted(t) => t.as_str().to_string(),
            Value::Callable(_) => "function".to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<TrustedValue> for Value {
    fn from(t: TrustedValue) -> Self {
        Value::Trusted(t)
    }
}

impl From<Callback> for Value {
    fn from(c: Callback) -> Self {
        Value::Callable(c)
    }
}
