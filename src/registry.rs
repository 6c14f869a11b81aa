use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::host::{Accessor, GetterFn, Host, Member, NativeFn, SetterFn};
use crate::{CallError, HostError, ObjectRef, SurfaceKind, Value};

/// An in-memory [`Host`]: an explicit table of surface members.
///
/// The registry is injected into an [`Enforcer`](crate::Enforcer) instead of
/// patching ambient globals, and dispatches calls through whatever member
/// is currently installed, so wrapped sinks are exercised by ordinary
/// [`call`](Self::call) and [`set`](Self::set) invocations.
///
/// Lookups follow the surface hierarchy, as property lookup on a prototype
/// chain would: the first surface in [`SurfaceKind::ancestors`] that defines
/// the member wins.
///
/// # Examples
///
/// ```
/// use sink_guard::{SurfaceKind, SurfaceRegistry, Value};
///
/// let registry = SurfaceRegistry::new();
/// registry.define_function(SurfaceKind::Element, "getAttribute", |_, _| Ok(Value::Null));
///
/// let div = registry.create_object(SurfaceKind::HtmlDivElement);
/// let result = registry.call(&div, "getAttribute", vec![Value::from("id")]).unwrap();
/// assert_eq!(result, Value::Null);
/// ```
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    members: RefCell<HashMap<(SurfaceKind, String), Member>>,
    next_object_id: Cell<u64>,
}

impl SurfaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a callable member and returns the installed function.
    pub fn define_function<F>(&self, surface: SurfaceKind, name: &str, function: F) -> NativeFn
    where
        F: Fn(&ObjectRef, Vec<Value>) -> Result<Value, CallError> + 'static,
    {
        let function: NativeFn = Rc::new(function);
        self.put(surface, name, Member::Function(function.clone()));
        function
    }

    /// Defines an accessor member.
    pub fn define_accessor(
        &self,
        surface: SurfaceKind,
        name: &str,
        getter: Option<GetterFn>,
        setter: Option<SetterFn>,
    ) {
        self.put(surface, name, Member::Accessor(Accessor { getter, setter }));
    }

    /// Defines a plain data member.
    pub fn define_data(&self, surface: SurfaceKind, name: &str, value: Value) {
        self.put(surface, name, Member::Data(value));
    }

    /// Mints a handle for a new object of type `surface`.
    pub fn create_object(&self, surface: SurfaceKind) -> ObjectRef {
        let id = self.next_object_id.get();
        self.next_object_id.set(id + 1);
        ObjectRef::new(surface, id)
    }

    /// Resolves `name` starting at `surface` and walking up its ancestors.
    ///
    /// Returns the surface that defines the member along with the member.
    pub fn lookup(&self, surface: SurfaceKind, name: &str) -> Option<(SurfaceKind, Member)> {
        surface
            .ancestors()
            .find_map(|kind| self.own_member(kind, name).map(|member| (kind, member)))
    }

    /// Calls method `name` on `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownMember` or `HostError::NotCallable` if the
    /// member cannot be called, and otherwise whatever the member returns.
    pub fn call(
        &self,
        receiver: &ObjectRef,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        match self.lookup(receiver.surface(), name) {
            Some((_, Member::Function(function))) => function(receiver, args),
            Some(_) => Err(HostError::NotCallable {
                surface: receiver.surface(),
                member: name.to_string(),
            }
            .into()),
            None => Err(self.unknown(receiver, name).into()),
        }
    }

    /// Assigns property `name` on `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NoSetter` if the property cannot be assigned, and
    /// otherwise whatever the setter returns.
    pub fn set(&self, receiver: &ObjectRef, name: &str, value: Value) -> Result<(), CallError> {
        match self.lookup(receiver.surface(), name) {
            Some((_, Member::Accessor(Accessor { setter: Some(setter), .. }))) => {
                setter(receiver, value)
            }
            Some(_) => Err(HostError::NoSetter {
                surface: receiver.surface(),
                member: name.to_string(),
            }
            .into()),
            None => Err(self.unknown(receiver, name).into()),
        }
    }

    /// Reads property `name` on `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NoGetter` if the property cannot be read, and
    /// otherwise whatever the getter returns.
    pub fn get(&self, receiver: &ObjectRef, name: &str) -> Result<Value, CallError> {
        match self.lookup(receiver.surface(), name) {
            Some((_, Member::Accessor(Accessor { getter: Some(getter), .. }))) => getter(receiver),
            Some((_, Member::Data(value))) => Ok(value),
            Some(_) => Err(HostError::NoGetter {
                surface: receiver.surface(),
                member: name.to_string(),
            }
            .into()),
            None => Err(self.unknown(receiver, name).into()),
        }
    }

    fn put(&self, surface: SurfaceKind, name: &str, member: Member) {
        self.members
            .borrow_mut()
            .insert((surface, name.to_string()), member);
    }

    fn unknown(&self, receiver: &ObjectRef, name: &str) -> HostError {
        HostError::UnknownMember {
            surface: receiver.surface(),
            member: name.to_string(),
        }
    }
}

impl Host for SurfaceRegistry {
    fn own_member(&self, surface: SurfaceKind, name: &str) -> Option<Member> {
        self.members
            .borrow()
            .get(&(surface, name.to_string()))
            .cloned()
    }

    fn own_member_names(&self, surface: SurfaceKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .borrow()
            .keys()
            .filter(|(kind, _)| *kind == surface)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn install_function(
        &self,
        surface: SurfaceKind,
        name: &str,
        function: NativeFn,
    ) -> Result<(), HostError> {
        self.put(surface, name, Member::Function(function));
        Ok(())
    }

    fn install_setter(
        &self,
        surface: SurfaceKind,
        name: &str,
        setter: SetterFn,
    ) -> Result<(), HostError> {
        let getter = match self.own_member(surface, name) {
            Some(Member::Accessor(accessor)) => accessor.getter,
            _ => None,
        };
        self.put(
            surface,
            name,
            Member::Accessor(Accessor {
                getter,
                setter: Some(setter),
            }),
        );
        Ok(())
    }

    fn install_setter_and_getter(
        &self,
        surface: SurfaceKind,
        name: &str,
        setter: SetterFn,
        getter: Option<GetterFn>,
    ) -> Result<(), HostError> {
        self.put(
            surface,
            name,
            Member::Accessor(Accessor {
                getter,
                setter: Some(setter),
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> (Rc<RefCell<Option<Value>>>, GetterFn, SetterFn) {
        let slot = Rc::new(RefCell::new(None));
        let read = slot.clone();
        let write = slot.clone();
        let getter: GetterFn = Rc::new(move |_| Ok(read.borrow().clone().unwrap_or_default()));
        let setter: SetterFn = Rc::new(move |_, v| {
            *write.borrow_mut() = Some(v);
            Ok(())
        });
        (slot, getter, setter)
    }

    #[test]
    fn object_ids_are_unique() {
        let registry = SurfaceRegistry::new();
        let a = registry.create_object(SurfaceKind::HtmlDivElement);
        let b = registry.create_object(SurfaceKind::HtmlDivElement);

        assert_ne!(a, b);
        assert_eq!(a.surface(), SurfaceKind::HtmlDivElement);
    }

    #[test]
    fn lookup_walks_ancestors() {
        let registry = SurfaceRegistry::new();
        registry.define_function(SurfaceKind::Node, "appendChild", |_, _| Ok(Value::Null));

        let (owner, member) = registry
            .lookup(SurfaceKind::HtmlScriptElement, "appendChild")
            .expect("inherited from Node");
        assert_eq!(owner, SurfaceKind::Node);
        assert!(matches!(member, Member::Function(_)));

        assert!(registry
            .own_member(SurfaceKind::HtmlScriptElement, "appendChild")
            .is_none());
    }

    #[test]
    fn own_member_names_ignore_ancestors() {
        let registry = SurfaceRegistry::new();
        registry.define_data(SurfaceKind::HtmlElement, "title", Value::Null);
        registry.define_accessor(SurfaceKind::HtmlElement, "onclick", None, None);
        registry.define_data(SurfaceKind::Element, "id", Value::Null);

        assert_eq!(
            registry.own_member_names(SurfaceKind::HtmlElement),
            vec!["onclick".to_string(), "title".to_string()]
        );
        assert!(registry.own_member_names(SurfaceKind::HtmlDivElement).is_empty());
    }

    #[test]
    fn nearest_definition_wins() {
        let registry = SurfaceRegistry::new();
        registry.define_data(SurfaceKind::Element, "tagName", Value::from("ELEMENT"));
        registry.define_data(SurfaceKind::HtmlElement, "tagName", Value::from("HTML"));

        let div = registry.create_object(SurfaceKind::HtmlDivElement);
        assert_eq!(registry.get(&div, "tagName").unwrap(), Value::from("HTML"));
    }

    #[test]
    fn call_set_get_dispatch() {
        let registry = SurfaceRegistry::new();
        let (slot, getter, setter) = stored();
        registry.define_accessor(SurfaceKind::Element, "id", Some(getter), Some(setter));
        registry.define_function(SurfaceKind::Element, "count", |_, args| {
            Ok(Value::Number(args.len() as f64))
        });

        let el = registry.create_object(SurfaceKind::Element);
        registry.set(&el, "id", Value::from("main")).unwrap();

        assert_eq!(*slot.borrow(), Some(Value::from("main")));
        assert_eq!(registry.get(&el, "id").unwrap(), Value::from("main"));
        assert_eq!(
            registry.call(&el, "count", vec![Value::Null]).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn dispatch_errors() {
        let registry = SurfaceRegistry::new();
        registry.define_data(SurfaceKind::Element, "nodeType", Value::Number(1.0));
        let el = registry.create_object(SurfaceKind::Element);

        assert_eq!(
            registry.call(&el, "nodeType", vec![]).unwrap_err(),
            CallError::Host(HostError::NotCallable {
                surface: SurfaceKind::Element,
                member: "nodeType".to_string(),
            })
        );
        assert_eq!(
            registry.set(&el, "nodeType", Value::Null).unwrap_err(),
            CallError::Host(HostError::NoSetter {
                surface: SurfaceKind::Element,
                member: "nodeType".to_string(),
            })
        );
        assert_eq!(
            registry.get(&el, "missing").unwrap_err(),
            CallError::Host(HostError::UnknownMember {
                surface: SurfaceKind::Element,
                member: "missing".to_string(),
            })
        );
    }

    #[test]
    fn install_setter_keeps_own_getter() {
        let registry = SurfaceRegistry::new();
        let (_, getter, setter) = stored();
        registry.define_accessor(SurfaceKind::Element, "id", Some(getter.clone()), Some(setter));

        let replacement: SetterFn = Rc::new(|_, _| Ok(()));
        registry
            .install_setter(SurfaceKind::Element, "id", replacement.clone())
            .unwrap();

        match registry.own_member(SurfaceKind::Element, "id") {
            Some(Member::Accessor(a)) => {
                assert!(Rc::ptr_eq(a.getter.as_ref().unwrap(), &getter));
                assert!(Rc::ptr_eq(a.setter.as_ref().unwrap(), &replacement));
            }
            other => panic!("expected accessor, got {:?}", other),
        }
    }

    #[test]
    fn install_setter_on_subtype_loses_inherited_getter() {
        let registry = SurfaceRegistry::new();
        let (_, getter, setter) = stored();
        registry.define_accessor(SurfaceKind::Node, "textContent", Some(getter), Some(setter));

        registry
            .install_setter(SurfaceKind::HtmlScriptElement, "textContent", Rc::new(|_, _| Ok(())))
            .unwrap();

        let script = registry.create_object(SurfaceKind::HtmlScriptElement);
        assert!(matches!(
            registry.get(&script, "textContent"),
            Err(CallError::Host(HostError::NoGetter { .. }))
        ));
    }

    #[test]
    fn install_function_replaces_member() {
        let registry = SurfaceRegistry::new();
        registry.define_function(SurfaceKind::Document, "write", |_, _| Ok(Value::Null));

        let replacement: NativeFn = Rc::new(|_, _| Ok(Value::Bool(true)));
        registry
            .install_function(SurfaceKind::Document, "write", replacement)
            .unwrap();

        let doc = registry.create_object(SurfaceKind::Document);
        assert_eq!(registry.call(&doc, "write", vec![]).unwrap(), Value::Bool(true));
    }
}
