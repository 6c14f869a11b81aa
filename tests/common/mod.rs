//! A fake DOM for integration tests.
//!
//! Every member the standard catalog names is defined on a
//! [`SurfaceRegistry`], plus the attribute setters. Each member records
//! the calls that reach it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use sink_guard::{
    GetterFn, Host, Member, PassThrough, Policy, PolicyFactory, PolicyRules, SetterFn,
    SinkCatalog, SurfaceKind, SurfaceRegistry, TrustedKind, Value,
};

/// One call that reached an original member.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub target: String,
    pub args: Vec<Value>,
}

pub struct Dom {
    pub host: Rc<SurfaceRegistry>,
    pub calls: Rc<RefCell<Vec<Recorded>>>,
}

/// Surface that owns the accessor for a catalog property.
///
/// Script-element `textContent` and `innerText` are inherited, as in a
/// browser.
pub fn accessor_surface(surface: SurfaceKind, member: &str) -> SurfaceKind {
    match (surface, member) {
        (SurfaceKind::HtmlScriptElement, "textContent") => SurfaceKind::Node,
        (SurfaceKind::HtmlScriptElement, "innerText") => SurfaceKind::HtmlElement,
        _ => surface,
    }
}

impl Dom {
    pub fn new() -> Self {
        let host = Rc::new(SurfaceRegistry::new());
        let calls = Rc::new(RefCell::new(Vec::new()));
        let dom = Dom { host, calls };

        let catalog = SinkCatalog::standard();
        for sink in catalog.standalone_sinks() {
            dom.function(sink.surface, &sink.member);
        }
        dom.function(SurfaceKind::Element, "setAttribute");
        dom.function(SurfaceKind::Element, "setAttributeNS");
        for sink in catalog.property_sinks() {
            let owner = accessor_surface(sink.surface, &sink.member);
            if dom.host.own_member(owner, &sink.member).is_none() {
                dom.property(owner, &sink.member);
            }
        }
        dom
    }

    /// Defines a function that records its arguments and returns
    /// `"<Surface>.<member>"`.
    pub fn function(&self, surface: SurfaceKind, member: &str) {
        let calls = self.calls.clone();
        let target = format!("{}.{}", surface, member);
        self.host.define_function(surface, member, move |_, args| {
            calls.borrow_mut().push(Recorded {
                target: target.clone(),
                args,
            });
            Ok(Value::from(target.as_str()))
        });
    }

    /// Defines a stored property that records every assignment.
    pub fn property(&self, surface: SurfaceKind, member: &str) {
        let slot = Rc::new(RefCell::new(Value::Undefined));
        let read = slot.clone();
        let calls = self.calls.clone();
        let target = format!("{}.{}", surface, member);

        let getter: GetterFn = Rc::new(move |_| Ok(read.borrow().clone()));
        let setter: SetterFn = Rc::new(move |_, value| {
            calls.borrow_mut().push(Recorded {
                target: target.clone(),
                args: vec![value.clone()],
            });
            *slot.borrow_mut() = value;
            Ok(())
        });
        self.host
            .define_accessor(surface, member, Some(getter), Some(setter));
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.borrow().clone()
    }

    pub fn last_call(&self) -> Option<Recorded> {
        self.calls.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Resolves every standard sink the way a property lookup would.
    pub fn resolved_sinks(&self) -> Vec<(SurfaceKind, String, Member)> {
        let catalog = SinkCatalog::standard();
        let mut keys: Vec<(SurfaceKind, String)> = catalog
            .standalone_sinks()
            .iter()
            .map(|sink| (sink.surface, sink.member.clone()))
            .collect();
        keys.push((SurfaceKind::Element, "setAttribute".to_string()));
        keys.push((SurfaceKind::Element, "setAttributeNS".to_string()));
        keys.extend(
            catalog
                .property_sinks()
                .map(|sink| (sink.surface, sink.member)),
        );

        keys.into_iter()
            .filter_map(|(surface, member)| {
                let (_, resolved) = self.host.lookup(surface, &member)?;
                Some((surface, member, resolved))
            })
            .collect()
    }
}

/// Returns `true` if both members are made of the same implementations.
pub fn same_member(a: &Member, b: &Member) -> bool {
    fn same<T: ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    match (a, b) {
        (Member::Function(a), Member::Function(b)) => Rc::ptr_eq(a, b),
        (Member::Accessor(a), Member::Accessor(b)) => {
            same(&a.getter, &b.getter) && same(&a.setter, &b.setter)
        }
        (Member::Data(a), Member::Data(b)) => a == b,
        _ => false,
    }
}

/// A factory with an `"app"` policy that trusts every kind verbatim.
pub fn app_factory() -> (Rc<PolicyFactory>, Policy) {
    let factory = Rc::new(PolicyFactory::new());
    let mut rules = PolicyRules::new();
    for kind in TrustedKind::ALL {
        rules = rules.with_rule(kind, PassThrough);
    }
    let policy = factory
        .create_policy("app", rules)
        .expect("app policy allowed");
    (factory, policy)
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a fmt subscriber and returns the captured output.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().expect("log buffer").clone();
    (result, String::from_utf8(bytes).expect("utf-8 log output"))
}
