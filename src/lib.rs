//! Runtime enforcement of trusted values at injection-prone sinks.
//!
//! Markup, URL and script sinks (`innerHTML`, `script.src`, `document.write`,
//! inline event handlers, ...) only accept values that a named policy has
//! vouched for. This crate wraps those sinks on an injected host and checks
//! every call:
//!
//! - **Trusted values**: [`TrustedValue`]s can only be created by a
//!   [`Policy`], and carry the [`TrustedKind`] they were created for
//! - **Sink catalog**: [`SinkCatalog`] says which member of which surface
//!   requires which kind
//! - **Enforcer**: [`Enforcer`] installs reversible wrappers through the
//!   [`Host`] capability and decides each call: pass, convert through a
//!   fallback policy, or reject
//!
//! # Core Types
//!
//! - [`Enforcer`]: installs and uninstalls enforcement
//! - [`EnforcementConfig`]: enforcement and logging toggles, fallback policy
//!   and allowed policy names
//! - [`PolicyFactory`]: the in-crate [`PolicyProvider`]
//! - [`SurfaceRegistry`]: an in-memory [`Host`]
//! - [`Value`]: what flows into a sink
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use sink_guard::{
//!     EnforcementConfig, Enforcer, PolicyFactory, PolicyRules, RuleRejection, SetterFn,
//!     SinkCatalog, SurfaceKind, SurfaceRegistry, TrustedKind, Value,
//! };
//!
//! let host = Rc::new(SurfaceRegistry::new());
//! let setter: SetterFn = Rc::new(|_, _| Ok(()));
//! host.define_accessor(SurfaceKind::HtmlScriptElement, "src", None, Some(setter));
//! host.define_function(SurfaceKind::Element, "setAttribute", |_, _| Ok(Value::Undefined));
//! host.define_function(SurfaceKind::Element, "setAttributeNS", |_, _| Ok(Value::Undefined));
//!
//! // A fallback policy that only vouches for same-origin scripts.
//! let factory = Rc::new(PolicyFactory::new());
//! let same_origin = |url: &str| -> Result<String, RuleRejection> {
//!     if url.starts_with('/') {
//!         Ok(url.to_string())
//!     } else {
//!         Err(RuleRejection::new("cross-origin script"))
//!     }
//! };
//! factory.create_policy("default", PolicyRules::new().with_script_url(same_origin))?;
//!
//! let config = EnforcementConfig::new().with_fallback_policy("default");
//! let catalog =
//!     SinkCatalog::new().with_property(SurfaceKind::HtmlScriptElement, "src", TrustedKind::ScriptUrl);
//! let mut enforcer = Enforcer::with_catalog(config, host.clone(), factory, catalog);
//! enforcer.install()?;
//!
//! let script = host.create_object(SurfaceKind::HtmlScriptElement);
//! host.set(&script, "src", Value::from("/app.js"))?;
//! assert!(host.set(&script, "src", Value::from("https://evil.example/x.js")).is_err());
//!
//! enforcer.uninstall()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod decision;
mod enforcer;
mod error;
mod factory;
mod host;
mod interceptor;
mod kind;
mod logging;
mod policy;
mod registry;
mod rule;
mod surface;
mod value;

#[cfg(test)]
mod test_utils;

pub use catalog::{is_event_handler, MemberKind, SinkCatalog, SinkDescriptor, EVENT_HANDLER_PREFIX};
pub use config::{ConfigError, EnforcementConfig, DEFAULT_POLICY_NAME};
pub use enforcer::Enforcer;
pub use error::{CallError, HostError, InterceptError, TypeRequirementViolation};
pub use factory::{Policy, PolicyFactory, PolicyRules};
pub use host::{Accessor, GetterFn, Host, Member, NativeFn, SetterFn};
pub use kind::TrustedKind;
pub use policy::{AllowedPolicyNames, PolicyError, PolicyProvider};
pub use registry::SurfaceRegistry;
pub use rule::{PassThrough, PolicyRule, RejectAll, RuleRejection};
pub use surface::{Ancestors, ObjectRef, SurfaceKind};
pub use value::{Callback, TrustedValue, Value};
