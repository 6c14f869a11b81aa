//! Reversible replacement of surface members.
//!
//! The [`Interceptor`] swaps a function or setter on a surface for a wrapper
//! and remembers the original in an interception record. A member is
//! intercepted exactly when a record exists for its key, and restoring puts
//! back the very same implementation (same `Rc`) that was read at wrap time.
//!
//! Keys are `(surface, member)`. Two surfaces that resolve a member to the
//! same inherited implementation still get separate records.

use std::collections::HashMap;
use std::rc::Rc;

use crate::host::{GetterFn, Host, Member, NativeFn, SetterFn};
use crate::{CallError, InterceptError, ObjectRef, SurfaceKind, Value};

/// Wrapper body for functions: receives the original, the receiver and the
/// arguments.
pub(crate) type FunctionBody =
    Rc<dyn Fn(&NativeFn, &ObjectRef, Vec<Value>) -> Result<Value, CallError>>;

/// Wrapper body for setters: receives the original setter, the receiver and
/// the assigned value.
pub(crate) type SetterBody = Rc<dyn Fn(&SetterFn, &ObjectRef, Value) -> Result<(), CallError>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    surface: SurfaceKind,
    member: String,
}

impl RecordKey {
    fn new(surface: SurfaceKind, member: &str) -> Self {
        Self {
            surface,
            member: member.to_string(),
        }
    }
}

enum Original {
    Function(NativeFn),
    Setter {
        setter: SetterFn,
        getter: Option<GetterFn>,
        inherited_from: Option<SurfaceKind>,
    },
}

/// Owns the interception records of one enforcer.
pub(crate) struct Interceptor<H> {
    host: Rc<H>,
    records: HashMap<RecordKey, Original>,
}

impl<H: Host> Interceptor<H> {
    pub(crate) fn new(host: Rc<H>) -> Self {
        Self {
            host,
            records: HashMap::new(),
        }
    }

    /// Returns `true` if `member` on `surface` is currently wrapped.
    #[cfg(test)]
    pub(crate) fn is_intercepted(&self, surface: SurfaceKind, member: &str) -> bool {
        self.records.contains_key(&RecordKey::new(surface, member))
    }

    /// Number of wrapped members.
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Wraps the function `member` defined directly on `surface`.
    pub(crate) fn wrap_function(
        &mut self,
        surface: SurfaceKind,
        member: &str,
        body: FunctionBody,
    ) -> Result<(), InterceptError> {
        let original = match self.host.own_member(surface, member) {
            Some(Member::Function(function)) => function,
            _ => {
                return Err(InterceptError::NotAFunction {
                    surface,
                    member: member.to_string(),
                })
            }
        };

        let key = RecordKey::new(surface, member);
        if self.records.contains_key(&key) {
            return Err(InterceptError::DoubleInstallation {
                surface,
                member: member.to_string(),
            });
        }

        let inner = original.clone();
        let wrapper: NativeFn = Rc::new(move |receiver, args| body(&inner, receiver, args));
        self.host.install_function(surface, member, wrapper)?;
        self.records.insert(key, Original::Function(original));
        Ok(())
    }

    /// Wraps the setter of `member` on `surface`.
    ///
    /// With `inherited_from`, the accessor is read from that ancestor and
    /// the wrapper is installed on `surface` together with the ancestor's
    /// getter, so reads keep working on the subtype.
    pub(crate) fn wrap_setter(
        &mut self,
        surface: SurfaceKind,
        member: &str,
        inherited_from: Option<SurfaceKind>,
        body: SetterBody,
    ) -> Result<(), InterceptError> {
        if let Some(ancestor) = inherited_from {
            if !ancestor.is_ancestor_of(surface) {
                return Err(InterceptError::InvalidHierarchy { surface, ancestor });
            }
        }

        let source = inherited_from.unwrap_or(surface);
        let (setter, getter) = match self.host.own_member(source, member) {
            Some(Member::Accessor(accessor)) => match accessor.setter {
                Some(setter) => (setter, accessor.getter),
                None => return Err(missing_setter(source, member)),
            },
            _ => return Err(missing_setter(source, member)),
        };

        let key = RecordKey::new(surface, member);
        if self.records.contains_key(&key) {
            return Err(InterceptError::DoubleInstallation {
                surface,
                member: member.to_string(),
            });
        }

        let inner = setter.clone();
        let wrapper: SetterFn = Rc::new(move |receiver, value| body(&inner, receiver, value));
        if inherited_from.is_some() {
            self.host
                .install_setter_and_getter(surface, member, wrapper, getter.clone())?;
        } else {
            self.host.install_setter(surface, member, wrapper)?;
        }

        self.records.insert(
            key,
            Original::Setter {
                setter,
                getter,
                inherited_from,
            },
        );
        Ok(())
    }

    /// Puts back the original function of `member` on `surface`.
    pub(crate) fn restore_function(
        &mut self,
        surface: SurfaceKind,
        member: &str,
    ) -> Result<(), InterceptError> {
        let key = RecordKey::new(surface, member);
        let function = match self.records.get(&key) {
            Some(Original::Function(function)) => function.clone(),
            _ => return Err(not_installed(surface, member)),
        };

        self.host.install_function(surface, member, function)?;
        self.records.remove(&key);
        Ok(())
    }

    /// Puts back the original setter of `member` on `surface`, and the
    /// original getter if the accessor was inherited.
    pub(crate) fn restore_setter(
        &mut self,
        surface: SurfaceKind,
        member: &str,
    ) -> Result<(), InterceptError> {
        let key = RecordKey::new(surface, member);
        let (setter, getter, inherited) = match self.records.get(&key) {
            Some(Original::Setter {
                setter,
                getter,
                inherited_from,
            }) => (setter.clone(), getter.clone(), inherited_from.is_some()),
            _ => return Err(not_installed(surface, member)),
        };

        if inherited {
            self.host
                .install_setter_and_getter(surface, member, setter, getter)?;
        } else {
            self.host.install_setter(surface, member, setter)?;
        }
        self.records.remove(&key);
        Ok(())
    }
}

fn missing_setter(surface: SurfaceKind, member: &str) -> InterceptError {
    InterceptError::MissingSetter {
        surface,
        member: member.to_string(),
    }
}

fn not_installed(surface: SurfaceKind, member: &str) -> InterceptError {
    InterceptError::NotInstalled {
        surface,
        member: member.to_string(),
    }
}
