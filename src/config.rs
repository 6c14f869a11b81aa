//! Resolved enforcement configuration.
//!
//! The enforcer consumes an [`EnforcementConfig`] and never looks anywhere
//! else for settings. Configs are built with a consuming builder, or read
//! from a Content-Security-Policy string with
//! [`EnforcementConfig::from_csp`].

use std::collections::BTreeSet;

use crate::AllowedPolicyNames;

/// Name of the fallback policy selected by [`EnforcementConfig::from_csp`].
pub const DEFAULT_POLICY_NAME: &str = "default";

/// Errors raised while reading a configuration source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A `trusted-types` entry is not a valid policy name.
    #[error("invalid policy name {0:?} in trusted-types directive")]
    InvalidPolicyName(String),

    /// `require-trusted-types-for` named something other than `'script'`.
    #[error("unsupported require-trusted-types-for value {0:?}")]
    UnsupportedRequirement(String),
}

/// How the enforcer treats sinks, immutable for an install/uninstall cycle.
///
/// # Examples
///
/// ```
/// use sink_guard::{AllowedPolicyNames, EnforcementConfig};
///
/// let config = EnforcementConfig::new()
///     .with_enforcement(false)
///     .with_fallback_policy("default")
///     .with_allowed_policy_names(["default", "app"]);
///
/// assert!(!config.is_enforcement_enabled());
/// assert!(config.is_logging_enabled());
/// assert_eq!(config.fallback_policy_name(), Some("default"));
/// assert!(config.allowed_policy_names().permits("app"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementConfig {
    enforcement: bool,
    logging: bool,
    fallback_policy: Option<String>,
    allowed_policy_names: AllowedPolicyNames,
}

impl EnforcementConfig {
    /// Creates a config that enforces and logs, with no fallback policy and
    /// every policy name allowed.
    pub fn new() -> Self {
        Self {
            enforcement: true,
            logging: true,
            fallback_policy: None,
            allowed_policy_names: AllowedPolicyNames::All,
        }
    }

    /// Sets whether violations abort the call.
    pub fn with_enforcement(mut self, enabled: bool) -> Self {
        self.enforcement = enabled;
        self
    }

    /// Sets whether violations are logged.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Sets the policy used to convert non-compliant values.
    pub fn with_fallback_policy(mut self, name: impl Into<String>) -> Self {
        self.fallback_policy = Some(name.into());
        self
    }

    /// Restricts policy creation to the given names.
    pub fn with_allowed_policy_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_policy_names = AllowedPolicyNames::only(names);
        self
    }

    /// Allows every policy name.
    pub fn allowing_all_policies(mut self) -> Self {
        self.allowed_policy_names = AllowedPolicyNames::All;
        self
    }

    /// Returns `true` if violations abort the call.
    pub fn is_enforcement_enabled(&self) -> bool {
        self.enforcement
    }

    /// Returns `true` if violations are logged.
    pub fn is_logging_enabled(&self) -> bool {
        self.logging
    }

    /// Returns the fallback policy name, if any.
    pub fn fallback_policy_name(&self) -> Option<&str> {
        self.fallback_policy.as_deref()
    }

    /// Returns the policy names that may be created while installed.
    pub fn allowed_policy_names(&self) -> &AllowedPolicyNames {
        &self.allowed_policy_names
    }

    /// Reads a config from a Content-Security-Policy string.
    ///
    /// - `require-trusted-types-for 'script'` enables enforcement; without
    ///   it the config only reports.
    /// - `trusted-types` lists the allowed policy names. `*` allows every
    ///   name, `'none'` (or an empty list) allows none, and
    ///   `'allow-duplicates'` is accepted and ignored. Without the directive
    ///   every name is allowed.
    ///
    /// Logging is enabled and the fallback policy is
    /// [`DEFAULT_POLICY_NAME`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed policy names or an unsupported
    /// `require-trusted-types-for` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sink_guard::EnforcementConfig;
    ///
    /// let config = EnforcementConfig::from_csp(
    ///     "script-src 'self'; trusted-types app default; require-trusted-types-for 'script'",
    /// )
    /// .unwrap();
    ///
    /// assert!(config.is_enforcement_enabled());
    /// assert!(config.allowed_policy_names().permits("app"));
    /// assert!(!config.allowed_policy_names().permits("other"));
    /// assert_eq!(config.fallback_policy_name(), Some("default"));
    /// ```
    pub fn from_csp(policy: &str) -> Result<Self, ConfigError> {
        let mut enforcement = false;
        let mut allowed = AllowedPolicyNames::All;

        for directive in policy.split(';') {
            let mut tokens = directive.split_ascii_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };

            if name.eq_ignore_ascii_case("require-trusted-types-for") {
                for token in tokens {
                    if token != "'script'" {
                        return Err(ConfigError::UnsupportedRequirement(token.to_string()));
                    }
                    enforcement = true;
                }
            } else if name.eq_ignore_ascii_case("trusted-types") {
                allowed = parse_trusted_types(tokens)?;
            }
        }

        Ok(Self {
            enforcement,
            logging: true,
            fallback_policy: Some(DEFAULT_POLICY_NAME.to_string()),
            allowed_policy_names: allowed,
        })
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_trusted_types<'a>(
    tokens: impl Iterator<Item = &'a str>,
) -> Result<AllowedPolicyNames, ConfigError> {
    let mut names = BTreeSet::new();

    for token in tokens {
        match token {
            "*" => return Ok(AllowedPolicyNames::All),
            "'none'" | "'allow-duplicates'" => {}
            name if is_valid_policy_name(name) => {
                names.insert(name.to_string());
            }
            other => return Err(ConfigError::InvalidPolicyName(other.to_string())),
        }
    }

    Ok(AllowedPolicyNames::Only(names))
}

fn is_valid_policy_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-#=_/@.%".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enforces_and_logs() {
        let config = EnforcementConfig::new();

        assert!(config.is_enforcement_enabled());
        assert!(config.is_logging_enabled());
        assert_eq!(config.fallback_policy_name(), None);
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::All);
        assert_eq!(config, EnforcementConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = EnforcementConfig::new()
            .with_logging(false)
            .with_allowed_policy_names(["a"])
            .allowing_all_policies();

        assert!(!config.is_logging_enabled());
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::All);
    }

    #[test]
    fn csp_without_requirement_only_reports() {
        let config = EnforcementConfig::from_csp("trusted-types app").unwrap();

        assert!(!config.is_enforcement_enabled());
        assert!(config.is_logging_enabled());
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::only(["app"]));
    }

    #[test]
    fn csp_without_trusted_types_allows_all() {
        let config = EnforcementConfig::from_csp("require-trusted-types-for 'script'").unwrap();

        assert!(config.is_enforcement_enabled());
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::All);
    }

    #[test]
    fn csp_wildcard_and_keywords() {
        let config = EnforcementConfig::from_csp("trusted-types a 'allow-duplicates' *").unwrap();
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::All);

        let config = EnforcementConfig::from_csp("trusted-types 'none'").unwrap();
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::none());

        let config = EnforcementConfig::from_csp("trusted-types").unwrap();
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::none());
    }

    #[test]
    fn csp_ignores_empty_and_unrelated_directives() {
        let config =
            EnforcementConfig::from_csp(";; default-src 'none' ; TRUSTED-TYPES x/y@z ;").unwrap();
        assert_eq!(config.allowed_policy_names(), &AllowedPolicyNames::only(["x/y@z"]));
    }

    #[test]
    fn csp_rejects_bad_input() {
        assert_eq!(
            EnforcementConfig::from_csp("trusted-types bad!name").unwrap_err(),
            ConfigError::InvalidPolicyName("bad!name".to_string())
        );
        assert_eq!(
            EnforcementConfig::from_csp("require-trusted-types-for 'style'").unwrap_err(),
            ConfigError::UnsupportedRequirement("'style'".to_string())
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every listed valid name is allowed, and nothing else
            #[test]
            fn proptest_csp_lists_exact_names(
                names in prop::collection::btree_set("[a-z0-9-]{1,12}", 1..6),
                other in "[A-Z]{3,8}",
            ) {
                let joined = names.iter().cloned().collect::<Vec<_>>().join(" ");
                let config = EnforcementConfig::from_csp(&format!("trusted-types {}", joined)).unwrap();

                for name in &names {
                    prop_assert!(config.allowed_policy_names().permits(name));
                }
                prop_assert!(!config.allowed_policy_names().permits(&other));
            }
        }
    }
}
