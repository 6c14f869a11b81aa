//! The host capability the enforcer installs wrappers through.
//!
//! A host owns the members of every surface. The enforcer only ever reads
//! a surface's own member and redefines it through the three install
//! primitives; errors from those primitives propagate unchanged.

use std::fmt;
use std::rc::Rc;

use crate::{CallError, HostError, ObjectRef, SurfaceKind, Value};

/// A callable member: receives the receiver and the argument list.
pub type NativeFn = Rc<dyn Fn(&ObjectRef, Vec<Value>) -> Result<Value, CallError>>;

/// The write half of an accessor.
pub type SetterFn = Rc<dyn Fn(&ObjectRef, Value) -> Result<(), CallError>>;

/// The read half of an accessor.
pub type GetterFn = Rc<dyn Fn(&ObjectRef) -> Result<Value, CallError>>;

/// An accessor member, either half of which may be absent.
#[derive(Clone, Default)]
pub struct Accessor {
    /// Reads the property.
    pub getter: Option<GetterFn>,
    /// Writes the property.
    pub setter: Option<SetterFn>,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// A member defined directly on a surface.
#[derive(Clone)]
pub enum Member {
    /// A callable.
    Function(NativeFn),
    /// A getter/setter pair.
    Accessor(Accessor),
    /// A plain, non-callable value.
    Data(Value),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Function(_) => f.write_str("Function"),
            Member::Accessor(a) => a.fmt(f),
            Member::Data(v) => f.debug_tuple("Data").field(v).finish(),
        }
    }
}

/// Host primitives for reading and redefining surface members.
///
/// Implementations keep member tables behind interior mutability and must
/// not hold a borrow of them while a member runs: intercepted calls may
/// reenter the host.
pub trait Host {
    /// Returns the member defined directly on `surface`, ignoring ancestors.
    fn own_member(&self, surface: SurfaceKind, name: &str) -> Option<Member>;

    /// Returns the names of every member defined directly on `surface`.
    fn own_member_names(&self, surface: SurfaceKind) -> Vec<String>;

    /// Defines `name` on `surface` as a callable.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host refuses the redefinition.
    fn install_function(
        &self,
        surface: SurfaceKind,
        name: &str,
        function: NativeFn,
    ) -> Result<(), HostError>;

    /// Replaces the setter of `name` on `surface`, keeping an own getter if
    /// one exists.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host refuses the redefinition.
    fn install_setter(
        &self,
        surface: SurfaceKind,
        name: &str,
        setter: SetterFn,
    ) -> Result<(), HostError>;

    /// Defines `name` on `surface` as an accessor with exactly this pair.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host refuses the redefinition.
    fn install_setter_and_getter(
        &self,
        surface: SurfaceKind,
        name: &str,
        setter: SetterFn,
        getter: Option<GetterFn>,
    ) -> Result<(), HostError>;
}
