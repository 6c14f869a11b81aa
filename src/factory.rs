use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::policy::{AllowedPolicyNames, PolicyError, PolicyProvider};
use crate::rule::PolicyRule;
use crate::{TrustedKind, TrustedValue, Value};

/// The rules of one policy, at most one per [`TrustedKind`].
///
/// # Examples
///
/// ```
/// use sink_guard::{PassThrough, PolicyRules, RejectAll, TrustedKind};
///
/// let rules = PolicyRules::new()
///     .with_script_url(PassThrough)
///     .with_html(RejectAll);
///
/// assert!(rules.supports(TrustedKind::ScriptUrl));
/// assert!(!rules.supports(TrustedKind::Script));
/// ```
#[derive(Default, Clone)]
pub struct PolicyRules {
    rules: HashMap<TrustedKind, Rc<dyn PolicyRule>>,
}

impl PolicyRules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule for `kind`, replacing any previous rule.
    pub fn with_rule(mut self, kind: TrustedKind, rule: impl PolicyRule + 'static) -> Self {
        self.rules.insert(kind, Rc::new(rule));
        self
    }

    /// Sets the rule for [`TrustedKind::Html`].
    pub fn with_html(self, rule: impl PolicyRule + 'static) -> Self {
        self.with_rule(TrustedKind::Html, rule)
    }

    /// Sets the rule for [`TrustedKind::Url`].
    pub fn with_url(self, rule: impl PolicyRule + 'static) -> Self {
        self.with_rule(TrustedKind::Url, rule)
    }

    /// Sets the rule for [`TrustedKind::ScriptUrl`].
    pub fn with_script_url(self, rule: impl PolicyRule + 'static) -> Self {
        self.with_rule(TrustedKind::ScriptUrl, rule)
    }

    /// Sets the rule for [`TrustedKind::Script`].
    pub fn with_script(self, rule: impl PolicyRule + 'static) -> Self {
        self.with_rule(TrustedKind::Script, rule)
    }

    /// Returns `true` if a rule exists for `kind`.
    pub fn supports(&self, kind: TrustedKind) -> bool {
        self.rules.contains_key(&kind)
    }

    fn rule(&self, kind: TrustedKind) -> Option<Rc<dyn PolicyRule>> {
        self.rules.get(&kind).cloned()
    }
}

impl fmt::Debug for PolicyRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.rules.keys().collect();
        kinds.sort();
        f.debug_struct("PolicyRules").field("kinds", &kinds).finish()
    }
}

/// A created policy: the capability to produce trusted values.
///
/// Handles are cheap to clone and share their rules.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    rules: Rc<PolicyRules>,
}

impl Policy {
    /// Returns the policy name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a trusted value of `kind` from `input`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::MissingRule` if the policy has no rule for
    /// `kind`, or `PolicyError::Rejected` if the rule refuses the input.
    pub fn create(&self, kind: TrustedKind, input: &str) -> Result<TrustedValue, PolicyError> {
        let rule = self.rules.rule(kind).ok_or_else(|| PolicyError::MissingRule {
            policy: self.name.clone(),
            kind,
        })?;

        let content = rule.apply(input).map_err(|rejection| PolicyError::Rejected {
            policy: self.name.clone(),
            kind,
            reason: rejection.reason().to_string(),
        })?;

        Ok(TrustedValue::new_unchecked(kind, self.name.clone(), content))
    }

    /// Creates trusted HTML.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_html(&self, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Html, input)
    }

    /// Creates a trusted URL.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_url(&self, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Url, input)
    }

    /// Creates a trusted script URL.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_script_url(&self, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::ScriptUrl, input)
    }

    /// Creates trusted script.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn create_script(&self, input: &str) -> Result<TrustedValue, PolicyError> {
        self.create(TrustedKind::Script, input)
    }
}

/// Registry of named policies; the default [`PolicyProvider`].
///
/// A factory is scoped to whoever owns it. Share it with an
/// [`Enforcer`](crate::Enforcer) through an `Rc` rather than a global, so
/// separate enforcers never see each other's policies or allowed names.
///
/// # Examples
///
/// ```
/// use sink_guard::{AllowedPolicyNames, PassThrough, PolicyError, PolicyFactory, PolicyProvider, PolicyRules};
///
/// let factory = PolicyFactory::new();
/// factory.set_allowed_policy_names(AllowedPolicyNames::only(["app"]));
///
/// let app = factory.create_policy("app", PolicyRules::new().with_url(PassThrough));
/// assert!(app.is_ok());
///
/// let rogue = factory.create_policy("rogue", PolicyRules::new());
/// assert_eq!(rogue.unwrap_err(), PolicyError::NotAllowed("rogue".to_string()));
///
/// assert_eq!(factory.policy_names(), vec!["app".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct PolicyFactory {
    policies: RefCell<BTreeMap<String, Policy>>,
    allowed: RefCell<AllowedPolicyNames>,
}

impl PolicyFactory {
    /// Creates an empty factory that allows every policy name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotAllowed` if `name` is not currently allowed,
    /// or `PolicyError::Duplicate` if a policy named `name` already exists.
    pub fn create_policy(
        &self,
        name: impl Into<String>,
        rules: PolicyRules,
    ) -> Result<Policy, PolicyError> {
        let name = name.into();

        if !self.allowed.borrow().permits(&name) {
            tracing::debug!(target: "sink_guard::policy", policy = %name, "policy name not allowed");
            return Err(PolicyError::NotAllowed(name));
        }

        let mut policies = self.policies.borrow_mut();
        if policies.contains_key(&name) {
            return Err(PolicyError::Duplicate(name));
        }

        let policy = Policy {
            name: name.clone(),
            rules: Rc::new(rules),
        };
        policies.insert(name, policy.clone());
        Ok(policy)
    }

    /// Returns the policy named `name`, if it was created.
    pub fn policy(&self, name: &str) -> Option<Policy> {
        self.policies.borrow().get(name).cloned()
    }

    /// Returns the currently allowed policy names.
    pub fn allowed_policy_names(&self) -> AllowedPolicyNames {
        self.allowed.borrow().clone()
    }
}

impl PolicyProvider for PolicyFactory {
    fn create(
        &self,
        kind: TrustedKind,
        policy: &str,
        input: &str,
    ) -> Result<TrustedValue, PolicyError> {
        // The borrow ends here, so a rule may reach the factory again.
        let policy = self
            .policy(policy)
            .ok_or_else(|| PolicyError::UnknownPolicy(policy.to_string()))?;
        policy.create(kind, input)
    }

    fn is_kind(&self, kind: TrustedKind, value: &Value) -> bool {
        value.as_trusted().is_some_and(|t| t.kind() == kind)
    }

    fn set_allowed_policy_names(&self, names: AllowedPolicyNames) {
        *self.allowed.borrow_mut() = names;
    }

    fn policy_names(&self) -> Vec<String> {
        self.policies.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{PassThrough, RejectAll, RuleRejection};

    fn no_scripts(input: &str) -> Result<String, RuleRejection> {
        if input.contains("<script") {
            Err(RuleRejection::new("script tag"))
        } else {
            Ok(input.to_string())
        }
    }

    #[test]
    fn create_policy_registers_name() {
        let factory = PolicyFactory::new();
        factory
            .create_policy("app", PolicyRules::new())
            .expect("allowed");

        assert_eq!(factory.policy_names(), vec!["app"]);
        assert!(factory.policy("app").is_some());
        assert!(factory.policy("other").is_none());
    }

    #[test]
    fn duplicate_policy_rejected() {
        let factory = PolicyFactory::new();
        factory.create_policy("app", PolicyRules::new()).unwrap();

        let err = factory.create_policy("app", PolicyRules::new()).unwrap_err();
        assert_eq!(err, PolicyError::Duplicate("app".to_string()));
        assert_eq!(factory.policy_names().len(), 1);
    }

    #[test]
    fn allowed_names_gate_creation() {
        let factory = PolicyFactory::new();
        factory.set_allowed_policy_names(AllowedPolicyNames::only(["default"]));

        assert!(factory.create_policy("default", PolicyRules::new()).is_ok());
        assert_eq!(
            factory.create_policy("app", PolicyRules::new()).unwrap_err(),
            PolicyError::NotAllowed("app".to_string())
        );
        assert_eq!(
            factory.allowed_policy_names(),
            AllowedPolicyNames::only(["default"])
        );
    }

    #[test]
    fn restricting_names_keeps_existing_policies() {
        let factory = PolicyFactory::new();
        factory.create_policy("early", PolicyRules::new()).unwrap();
        factory.set_allowed_policy_names(AllowedPolicyNames::none());

        assert_eq!(factory.policy_names(), vec!["early"]);
    }

    #[test]
    fn create_by_name_runs_rule() {
        let factory = PolicyFactory::new();
        factory
            .create_policy("app", PolicyRules::new().with_html(no_scripts))
            .unwrap();

        let html = factory.create_html("app", "<b>ok</b>").unwrap();
        assert_eq!(html.as_str(), "<b>ok</b>");
        assert_eq!(html.kind(), TrustedKind::Html);
        assert_eq!(html.policy_name(), "app");

        let err = factory.create_html("app", "<script>x</script>").unwrap_err();
        assert_eq!(
            err,
            PolicyError::Rejected {
                policy: "app".to_string(),
                kind: TrustedKind::Html,
                reason: "script tag".to_string(),
            }
        );
    }

    #[test]
    fn missing_rule_and_unknown_policy() {
        let factory = PolicyFactory::new();
        factory
            .create_policy("app", PolicyRules::new().with_url(PassThrough))
            .unwrap();

        assert_eq!(
            factory.create_script("app", "1").unwrap_err(),
            PolicyError::MissingRule {
                policy: "app".to_string(),
                kind: TrustedKind::Script,
            }
        );
        assert_eq!(
            factory.create_url("nope", "/").unwrap_err(),
            PolicyError::UnknownPolicy("nope".to_string())
        );
    }

    #[test]
    fn reject_all_rule_surfaces_as_rejected() {
        let factory = PolicyFactory::new();
        let policy = factory
            .create_policy("strict", PolicyRules::new().with_script_url(RejectAll))
            .unwrap();

        assert!(matches!(
            policy.create_script_url("https://cdn.test/a.js"),
            Err(PolicyError::Rejected { .. })
        ));
    }

    #[test]
    fn predicates_match_exact_kind() {
        let factory = PolicyFactory::new();
        let policy = factory
            .create_policy(
                "app",
                PolicyRules::new()
                    .with_url(PassThrough)
                    .with_script_url(PassThrough),
            )
            .unwrap();

        let url = Value::from(policy.create_url("/a").unwrap());
        let script_url = Value::from(policy.create_script_url("/a.js").unwrap());

        assert!(factory.is_url(&url));
        assert!(!factory.is_script_url(&url));
        assert!(factory.is_script_url(&script_url));
        assert!(!factory.is_url(&script_url));
        assert!(!factory.is_html(&Value::from("/a")));
        assert!(!factory.is_script(&Value::Null));
    }

    #[test]
    fn rules_debug_lists_kinds() {
        let rules = PolicyRules::new()
            .with_script(PassThrough)
            .with_html(PassThrough);
        assert_eq!(
            format!("{:?}", rules),
            "PolicyRules { kinds: [Html, Script] }"
        );
    }
}
