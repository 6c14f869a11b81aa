//! Shared helpers for unit tests.

use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::factory::{Policy, PolicyFactory, PolicyRules};
use crate::host::{GetterFn, SetterFn};
use crate::rule::{PassThrough, RuleRejection};
use crate::{SurfaceKind, SurfaceRegistry, TrustedKind, Value};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a fmt subscriber installed and returns what it wrote.
pub(crate) fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().expect("log buffer poisoned").clone();
    String::from_utf8(bytes).expect("log output is utf-8")
}

/// A factory holding a `"default"` policy that trusts everything except
/// input containing `"evil"`.
pub(crate) fn factory_with_default() -> (Rc<PolicyFactory>, Policy) {
    fn unless_evil(input: &str) -> Result<String, RuleRejection> {
        if input.contains("evil") {
            Err(RuleRejection::new("evil input"))
        } else {
            Ok(format!("sanitized:{}", input))
        }
    }

    let factory = Rc::new(PolicyFactory::new());
    let mut rules = PolicyRules::new();
    for kind in TrustedKind::ALL {
        rules = rules.with_rule(kind, unless_evil);
    }
    let policy = factory
        .create_policy("default", rules)
        .expect("default policy allowed");
    (factory, policy)
}

/// A factory holding an `"app"` policy that trusts every kind verbatim.
pub(crate) fn factory_with_app() -> (Rc<PolicyFactory>, Policy) {
    let factory = Rc::new(PolicyFactory::new());
    let mut rules = PolicyRules::new();
    for kind in TrustedKind::ALL {
        rules = rules.with_rule(kind, PassThrough);
    }
    let policy = factory.create_policy("app", rules).expect("app policy allowed");
    (factory, policy)
}

/// Defines a stored accessor `name` on `surface`; returns the backing slot.
pub(crate) fn define_slot(
    registry: &SurfaceRegistry,
    surface: SurfaceKind,
    name: &str,
) -> Rc<std::cell::RefCell<Vec<Value>>> {
    let slot = Rc::new(std::cell::RefCell::new(Vec::new()));
    let read = slot.clone();
    let write = slot.clone();
    let getter: GetterFn = Rc::new(move |_| Ok(read.borrow().last().cloned().unwrap_or_default()));
    let setter: SetterFn = Rc::new(move |_, value| {
        write.borrow_mut().push(value);
        Ok(())
    });
    registry.define_accessor(surface, name, Some(getter), Some(setter));
    slot
}

/// Strategy: arbitrary untrusted, non-callable values.
pub(crate) fn arb_untrusted_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6f64..1.0e6).prop_map(Value::Number),
        ".{0,40}".prop_map(Value::String),
    ]
}
