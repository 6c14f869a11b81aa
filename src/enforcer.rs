use std::rc::Rc;

use crate::catalog::SinkDescriptor;
use crate::decision::{
    self, CallContext, SET_ATTRIBUTE_NS_VALUE_POSITION, SET_ATTRIBUTE_VALUE_POSITION,
};
use crate::host::{Host, Member};
use crate::interceptor::{FunctionBody, Interceptor, SetterBody};
use crate::policy::{AllowedPolicyNames, PolicyProvider};
use crate::{
    CallError, EnforcementConfig, InterceptError, ObjectRef, SinkCatalog, SurfaceKind, Value,
};

/// Attribute-setting functions on the element surface, with the position of
/// their value argument.
const ATTRIBUTE_SINKS: [(&str, usize); 2] = [
    ("setAttribute", SET_ATTRIBUTE_VALUE_POSITION),
    ("setAttributeNS", SET_ATTRIBUTE_NS_VALUE_POSITION),
];

/// Installs and removes sink enforcement on a host.
///
/// An `Enforcer` owns one interception table. [`install`](Self::install)
/// wraps every sink of its [`SinkCatalog`] so that each call is checked
/// against the required [`TrustedKind`](crate::TrustedKind);
/// [`uninstall`](Self::uninstall) puts the original members back.
///
/// The host and the policy provider are injected and shared with the
/// caller, so the same registry keeps dispatching ordinary calls while
/// enforcement is active.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use sink_guard::{
///     EnforcementConfig, Enforcer, PassThrough, PolicyFactory, PolicyRules, SetterFn,
///     SinkCatalog, SurfaceKind, SurfaceRegistry, TrustedKind, Value,
/// };
///
/// let host = Rc::new(SurfaceRegistry::new());
/// let setter: SetterFn = Rc::new(|_, _| Ok(()));
/// host.define_accessor(SurfaceKind::Element, "innerHTML", None, Some(setter));
/// host.define_function(SurfaceKind::Element, "setAttribute", |_, _| Ok(Value::Undefined));
/// host.define_function(SurfaceKind::Element, "setAttributeNS", |_, _| Ok(Value::Undefined));
///
/// let factory = Rc::new(PolicyFactory::new());
/// let catalog = SinkCatalog::new().with_property(SurfaceKind::Element, "innerHTML", TrustedKind::Html);
/// let mut enforcer =
///     Enforcer::with_catalog(EnforcementConfig::new(), host.clone(), factory.clone(), catalog);
/// enforcer.install()?;
///
/// let div = host.create_object(SurfaceKind::HtmlDivElement);
/// assert!(host.set(&div, "innerHTML", Value::from("<img src=x onerror=alert(1)>")).is_err());
///
/// let policy = factory.create_policy("app", PolicyRules::new().with_html(PassThrough))?;
/// host.set(&div, "innerHTML", policy.create_html("<b>hello</b>")?.into())?;
///
/// enforcer.uninstall()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Enforcer<H, P> {
    config: Rc<EnforcementConfig>,
    host: Rc<H>,
    provider: Rc<P>,
    catalog: Rc<SinkCatalog>,
    interceptor: Interceptor<H>,
}

impl<H, P> Enforcer<H, P>
where
    H: Host,
    P: PolicyProvider + 'static,
{
    /// Creates an enforcer for the [standard catalog](SinkCatalog::standard).
    ///
    /// Every `on*` accessor the host defines on [`SurfaceKind::BASE`] is
    /// added as an inline event handler sink, so handlers the standard
    /// catalog does not know about are guarded too.
    pub fn new(config: EnforcementConfig, host: Rc<H>, provider: Rc<P>) -> Self {
        let mut catalog = SinkCatalog::standard();
        let handlers: Vec<String> = host
            .own_member_names(SurfaceKind::BASE)
            .into_iter()
            .filter(|name| {
                matches!(
                    host.own_member(SurfaceKind::BASE, name),
                    Some(Member::Accessor(_))
                )
            })
            .collect();
        catalog.derive_event_handlers(handlers);

        Self::with_catalog(config, host, provider, catalog)
    }

    /// Creates an enforcer for a custom catalog.
    pub fn with_catalog(
        config: EnforcementConfig,
        host: Rc<H>,
        provider: Rc<P>,
        catalog: SinkCatalog,
    ) -> Self {
        Self {
            config: Rc::new(config),
            interceptor: Interceptor::new(Rc::clone(&host)),
            host,
            provider,
            catalog: Rc::new(catalog),
        }
    }

    /// Wraps every sink.
    ///
    /// The configured allowed policy names are pushed to the provider
    /// first. Sinks are then wrapped in this order: the standalone
    /// functions, `setAttribute` and `setAttributeNS` on the element
    /// surface, and the property setters by surface then member name.
    ///
    /// # Errors
    ///
    /// Stops at the first member that cannot be wrapped. Members wrapped
    /// before the failure stay wrapped until [`uninstall`](Self::uninstall);
    /// installing twice fails with [`InterceptError::DoubleInstallation`]
    /// on the first standalone sink and leaves the first installation as
    /// it was.
    pub fn install(&mut self) -> Result<(), InterceptError> {
        self.provider
            .set_allowed_policy_names(self.config.allowed_policy_names().clone());

        let catalog = Rc::clone(&self.catalog);
        for sink in catalog.standalone_sinks() {
            self.wrap_standalone(sink)?;
        }
        for (member, value_position) in ATTRIBUTE_SINKS {
            self.wrap_attribute(member, value_position)?;
        }
        for sink in catalog.property_sinks() {
            self.wrap_property(&sink)?;
        }

        tracing::debug!(
            target: "sink_guard::enforcer",
            wrapped = self.interceptor.len(),
            enforcement = self.config.is_enforcement_enabled(),
            "sink enforcement installed"
        );
        Ok(())
    }

    /// Restores every sink and allows all policy names again.
    ///
    /// Every restore is attempted even if some fail, so a partial
    /// installation is fully undone.
    ///
    /// # Errors
    ///
    /// Returns the first [`InterceptError::NotInstalled`] met, e.g. when
    /// called without a preceding [`install`](Self::install).
    pub fn uninstall(&mut self) -> Result<(), InterceptError> {
        let catalog = Rc::clone(&self.catalog);
        let mut outcome = Ok(());

        for sink in catalog.standalone_sinks() {
            keep_first(
                &mut outcome,
                self.interceptor.restore_function(sink.surface, &sink.member),
            );
        }
        for (member, _) in ATTRIBUTE_SINKS {
            keep_first(
                &mut outcome,
                self.interceptor.restore_function(SurfaceKind::Element, member),
            );
        }
        for sink in catalog.property_sinks() {
            keep_first(
                &mut outcome,
                self.interceptor.restore_setter(sink.surface, &sink.member),
            );
        }

        self.provider.set_allowed_policy_names(AllowedPolicyNames::All);

        tracing::debug!(
            target: "sink_guard::enforcer",
            remaining = self.interceptor.len(),
            "sink enforcement uninstalled"
        );
        outcome
    }

    #[cfg(test)]
    pub(crate) fn is_intercepted(&self, surface: SurfaceKind, member: &str) -> bool {
        self.interceptor.is_intercepted(surface, member)
    }

    fn wrap_standalone(&mut self, sink: &SinkDescriptor) -> Result<(), InterceptError> {
        let provider = Rc::clone(&self.provider);
        let config = Rc::clone(&self.config);
        let member = sink.member.clone();
        let required_kind = sink.required_kind;
        let argument_position = sink.argument_position;

        let body: FunctionBody = Rc::new(move |original, receiver, arguments| {
            decision::decide(
                &*provider,
                &config,
                CallContext {
                    receiver,
                    member: &member,
                    required_kind,
                    original: &**original,
                    argument_position,
                    arguments,
                },
            )
        });
        self.interceptor
            .wrap_function(sink.surface, &sink.member, body)
    }

    fn wrap_attribute(&mut self, member: &str, value_position: usize) -> Result<(), InterceptError> {
        let provider = Rc::clone(&self.provider);
        let config = Rc::clone(&self.config);
        let catalog = Rc::clone(&self.catalog);
        let sink = member.to_string();

        let body: FunctionBody = Rc::new(move |original, receiver, arguments| {
            decision::decide_attribute(
                &*provider,
                &config,
                &catalog,
                &sink,
                receiver,
                &**original,
                value_position,
                arguments,
            )
        });
        self.interceptor
            .wrap_function(SurfaceKind::Element, member, body)
    }

    fn wrap_property(&mut self, sink: &SinkDescriptor) -> Result<(), InterceptError> {
        let provider = Rc::clone(&self.provider);
        let config = Rc::clone(&self.config);
        let member = sink.member.clone();
        let required_kind = sink.required_kind;

        let body: SetterBody = Rc::new(move |original, receiver, value| {
            let forward = |receiver: &ObjectRef, arguments: Vec<Value>| -> Result<Value, CallError> {
                let value = arguments.into_iter().next().unwrap_or_default();
                original(receiver, value).map(|()| Value::Undefined)
            };
            decision::decide(
                &*provider,
                &config,
                CallContext {
                    receiver,
                    member: &member,
                    required_kind,
                    original: &forward,
                    argument_position: 0,
                    arguments: vec![value],
                },
            )
            .map(|_| ())
        });

        let inherited = self.accessor_owner(sink.surface, &sink.member);
        self.interceptor
            .wrap_setter(sink.surface, &sink.member, inherited, body)
    }

    /// Finds the ancestor that defines the accessor for `member`, if
    /// `surface` has none of its own.
    fn accessor_owner(&self, surface: SurfaceKind, member: &str) -> Option<SurfaceKind> {
        let has_accessor = |surface: SurfaceKind| {
            matches!(
                self.host.own_member(surface, member),
                Some(Member::Accessor(_))
            )
        };

        if has_accessor(surface) {
            return None;
        }
        surface.ancestors().skip(1).find(|ancestor| has_accessor(*ancestor))
    }
}

fn keep_first(outcome: &mut Result<(), InterceptError>, result: Result<(), InterceptError>) {
    if outcome.is_ok() {
        *outcome = result;
    }
}
