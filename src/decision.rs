//! The per-call enforcement decision.
//!
//! Every intercepted call ends up in [`decide`], which applies these rules
//! in order and stops at the first that matches:
//!
//! 1. A value of the required kind passes through unchanged.
//! 2. `null` or a callable assigned to an inline event handler passes
//!    through unchanged.
//! 3. If the fallback policy is configured and has been created, its
//!    conversion of the value is substituted, provided the result is of the
//!    required kind.
//! 4. Otherwise the call is a violation: it is logged if logging is on and
//!    rejected if enforcement is on. With enforcement off the call returns
//!    `Undefined` without reaching the original operation.

use crate::catalog::{self, SinkCatalog};
use crate::config::EnforcementConfig;
use crate::logging::DiagnosticLog;
use crate::policy::PolicyProvider;
use crate::{CallError, ObjectRef, TrustedKind, TypeRequirementViolation, Value};

/// Position of the value argument of `setAttribute(name, value)`.
pub(crate) const SET_ATTRIBUTE_VALUE_POSITION: usize = 1;

/// Position of the value argument of `setAttributeNS(namespace, name, value)`.
pub(crate) const SET_ATTRIBUTE_NS_VALUE_POSITION: usize = 2;

/// The operation an intercepted call would have reached.
pub(crate) type Original<'a> = &'a dyn Fn(&ObjectRef, Vec<Value>) -> Result<Value, CallError>;

/// Everything known about one intercepted call.
pub(crate) struct CallContext<'a> {
    pub(crate) receiver: &'a ObjectRef,
    pub(crate) member: &'a str,
    pub(crate) required_kind: TrustedKind,
    pub(crate) original: Original<'a>,
    pub(crate) argument_position: usize,
    pub(crate) arguments: Vec<Value>,
}

/// Decides an intercepted call, invoking the original operation if allowed.
pub(crate) fn decide<P>(
    provider: &P,
    config: &EnforcementConfig,
    ctx: CallContext<'_>,
) -> Result<Value, CallError>
where
    P: PolicyProvider + ?Sized,
{
    let CallContext {
        receiver,
        member,
        required_kind,
        original,
        argument_position,
        mut arguments,
    } = ctx;

    let value = arguments
        .get(argument_position)
        .cloned()
        .unwrap_or_default();

    if provider.is_kind(required_kind, &value) {
        return original(receiver, arguments);
    }

    if required_kind == TrustedKind::Script
        && catalog::is_event_handler(member)
        && (value.is_null() || value.is_callable())
    {
        return original(receiver, arguments);
    }

    if let Some(substitute) = fallback(provider, config, required_kind, &value) {
        tracing::debug!(
            target: "sink_guard::decision",
            member,
            receiver = %receiver,
            required_kind = %required_kind,
            "fallback policy substituted value"
        );
        if argument_position < arguments.len() {
            arguments[argument_position] = substitute;
        } else {
            arguments.resize(argument_position, Value::Undefined);
            arguments.push(substitute);
        }
        return original(receiver, arguments);
    }

    let violation = TypeRequirementViolation::new(member, receiver.to_string(), required_kind);
    let enforced = config.is_enforcement_enabled();
    DiagnosticLog::new(config.is_logging_enabled()).violation(&violation, enforced);

    if enforced {
        Err(violation.into())
    } else {
        Ok(Value::Undefined)
    }
}

/// Decides a `setAttribute`-style call whose kind depends on the attribute.
///
/// The attribute name is read from the argument just before the value. An
/// attribute with no contract, or a call without a string name, reaches the
/// original operation unchanged. Otherwise the call is decided as a call
/// to `sink` itself: attribute values are never handlers, so the event
/// handler exception does not apply.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decide_attribute<P>(
    provider: &P,
    config: &EnforcementConfig,
    catalog: &SinkCatalog,
    sink: &str,
    receiver: &ObjectRef,
    original: Original<'_>,
    value_position: usize,
    arguments: Vec<Value>,
) -> Result<Value, CallError>
where
    P: PolicyProvider + ?Sized,
{
    let resolved = value_position
        .checked_sub(1)
        .and_then(|name_position| arguments.get(name_position))
        .and_then(Value::as_str)
        .and_then(|name| {
            catalog
                .resolve_attribute(receiver.surface(), name)
                .map(|kind| (name.to_string(), kind))
        });

    let Some((attribute, required_kind)) = resolved else {
        return original(receiver, arguments);
    };

    tracing::trace!(
        target: "sink_guard::decision",
        sink,
        attribute = %attribute,
        required_kind = %required_kind,
        "attribute has a contract"
    );

    decide(
        provider,
        config,
        CallContext {
            receiver,
            member: sink,
            required_kind,
            original,
            argument_position: value_position,
            arguments,
        },
    )
}

fn fallback<P>(
    provider: &P,
    config: &EnforcementConfig,
    kind: TrustedKind,
    value: &Value,
) -> Option<Value>
where
    P: PolicyProvider + ?Sized,
{
    let name = config.fallback_policy_name()?;
    if !provider.policy_names().iter().any(|n| n == name) {
        return None;
    }

    let created = provider.create(kind, name, &value.to_input_string()).ok()?;
    let created = Value::Trusted(created);
    provider.is_kind(kind, &created).then_some(created)
}
