use std::fmt;

/// The classification of a trusted value.
///
/// Every sink requires exactly one kind, and a value satisfies a sink only
/// when it is a [`TrustedValue`](crate::TrustedValue) of that exact kind.
/// Kinds do not imply one another: a `ScriptUrl` value does not satisfy a
/// sink that requires `Url`.
///
/// # Examples
///
/// ```
/// use sink_guard::TrustedKind;
///
/// assert_eq!(TrustedKind::ScriptUrl.to_string(), "TrustedScriptURL");
/// assert_eq!(TrustedKind::ALL.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrustedKind {
    /// Markup accepted by HTML parsing sinks.
    Html,
    /// A navigable URL.
    Url,
    /// A URL whose target is loaded and executed as script.
    ScriptUrl,
    /// Script source text.
    Script,
}

impl TrustedKind {
    /// Every kind, in declaration order.
    pub const ALL: [TrustedKind; 4] = [Self::Html, Self::Url, Self::ScriptUrl, Self::Script];

    /// Returns the host-facing type name of values of this kind.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Html => "TrustedHTML",
            Self::Url => "TrustedURL",
            Self::ScriptUrl => "TrustedScriptURL",
            Self::Script => "TrustedScript",
        }
    }
}

impl fmt::Display for TrustedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
