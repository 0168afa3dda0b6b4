//! Accessor families: one overload set, ready to be called from the guest.
//!
//! An [`AccessorFamily`] ties together the cache, the resolver and the
//! conversion engine for a single member name, and hands the chosen
//! descriptor to the [`FastAccessor`] that actually touches the host.

use std::sync::Arc;

use tracing::debug;

use crate::callsite::{ArgumentList, TypeTag};
use crate::convert::ConversionEngine;
use crate::dispatch::{CallSiteCache, CallSiteSignature, Dispatch, OverloadResolver, ResolutionError};
use crate::error::{AccessError, DispatchError, DispatchResult, HostFailure, InvocationError};
use crate::member::{Capabilities, MemberDescriptor, OverloadSet};
use crate::types::{ClassRef, HostType};
use crate::value::Value;

/// Indexed access to host members.
///
/// Implemented outside this crate by whatever can read fields and run
/// methods of the host object model given a descriptor's index.
pub trait FastAccessor: Send + Sync {
    fn invoke(
        &self,
        member: &MemberDescriptor,
        instance: Option<&Value>,
        args: Vec<Value>,
    ) -> Result<Value, HostFailure>;

    fn read(&self, member: &MemberDescriptor, instance: Option<&Value>) -> Result<Value, HostFailure>;

    fn write(
        &self,
        member: &MemberDescriptor,
        instance: Option<&Value>,
        value: Value,
    ) -> Result<(), HostFailure>;
}

/// What a guest call is made on.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// The type itself; static members and constructors.
    Static(ClassRef),
    /// An instance of the type.
    Instance(Value),
}

impl CallTarget {
    pub fn dispatch(&self) -> Dispatch {
        match self {
            CallTarget::Static(_) => Dispatch::Static,
            CallTarget::Instance(_) => Dispatch::Instance,
        }
    }

    /// The instance handed to the host; absent for static calls.
    pub fn instance(&self) -> Option<&Value> {
        match self {
            CallTarget::Static(_) => None,
            CallTarget::Instance(value) => Some(value),
        }
    }
}

/// One overload set with everything needed to call it.
#[derive(Clone)]
pub struct AccessorFamily {
    set: OverloadSet,
    cache: Arc<CallSiteCache>,
    resolver: Arc<OverloadResolver>,
    engine: ConversionEngine,
    accessor: Arc<dyn FastAccessor>,
}

impl AccessorFamily {
    pub fn new(
        set: OverloadSet,
        cache: Arc<CallSiteCache>,
        resolver: Arc<OverloadResolver>,
        accessor: Arc<dyn FastAccessor>,
    ) -> Self {
        Self {
            set,
            cache,
            resolver,
            engine: ConversionEngine::new(),
            accessor,
        }
    }

    pub fn overloads(&self) -> &OverloadSet {
        &self.set
    }

    /// Pick the member for a call shape, going through the cache.
    pub fn resolve(
        &self,
        dispatch: Dispatch,
        tags: &[TypeTag],
    ) -> Result<Arc<MemberDescriptor>, ResolutionError> {
        let signature = CallSiteSignature::new(self.set.owner(), self.set.shared_name(), dispatch, tags);
        self.cache
            .lookup_or_resolve(&signature, || self.resolver.resolve(&self.set, dispatch, tags))
    }

    /// Resolve, coerce the arguments, invoke, and coerce the result back.
    pub fn invoke(&self, target: &CallTarget, args: &ArgumentList) -> DispatchResult<Value> {
        self.check_target(target)?;
        if !self.set.iter().any(|m| m.can_invoke()) {
            return Err(AccessError::NotInvocable {
                owner: self.set.owner().name().to_string(),
                member: self.set.name().to_string(),
            }
            .into());
        }

        let member = self.resolve(target.dispatch(), args.tags())?;
        debug!(member = %member, "invoking");

        let coerced = self.coerce_arguments(&member, args)?;
        let result = self
            .accessor
            .invoke(&member, target.instance(), coerced)
            .map_err(|cause| self.invocation_error(cause))?;

        Ok(self.coerce_result(&member, result))
    }

    /// Read a field or property.
    pub fn read(&self, target: &CallTarget) -> DispatchResult<Value> {
        self.check_target(target)?;
        let member = self.accessible(target.dispatch())?;
        if !member.can_read() {
            return Err(AccessError::WriteOnly {
                owner: self.set.owner().name().to_string(),
                member: self.set.name().to_string(),
                what: member.what(),
            }
            .into());
        }

        let value = self
            .accessor
            .read(member, target.instance())
            .map_err(|cause| self.invocation_error(cause))?;
        Ok(self.coerce_result(member, value))
    }

    /// Write a field or property, coercing the value to its declared type.
    pub fn write(&self, target: &CallTarget, value: &Value) -> DispatchResult<()> {
        self.check_target(target)?;
        let member = self.accessible(target.dispatch())?;
        if !member.can_write() {
            return Err(AccessError::ReadOnly {
                owner: self.set.owner().name().to_string(),
                member: self.set.name().to_string(),
                what: member.what(),
            }
            .into());
        }

        let coerced = self.coerce(member, 0, value, member.value_type())?;
        self.accessor
            .write(member, target.instance(), coerced)
            .map_err(|cause| self.invocation_error(cause))
    }

    /// A static marker must name the type this family belongs to.
    fn check_target(&self, target: &CallTarget) -> Result<(), AccessError> {
        match target {
            CallTarget::Static(class) if class != self.set.owner() => Err(AccessError::ForeignTarget {
                owner: self.set.owner().name().to_string(),
                member: self.set.name().to_string(),
                target: class.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// The field or property of this family matching the dispatch kind.
    fn accessible(&self, dispatch: Dispatch) -> DispatchResult<&MemberDescriptor> {
        self.set
            .iter()
            .find(|m| m.kind().is_accessible() && m.is_static() == dispatch.is_static())
            .map(|m| m.as_ref())
            .ok_or_else(|| {
                AccessError::NotAccessible {
                    owner: self.set.owner().name().to_string(),
                    member: self.set.name().to_string(),
                }
                .into()
            })
    }

    /// Coerce call arguments into the member's parameter types. A variadic
    /// tail is packed into one array of the element type.
    fn coerce_arguments(&self, member: &MemberDescriptor, args: &ArgumentList) -> DispatchResult<Vec<Value>> {
        let values = args.values();
        let fixed = member.fixed_count();
        if values.len() < fixed || (!member.is_variadic() && values.len() != fixed) {
            return Err(DispatchError::Arity {
                owner: self.set.owner().name().to_string(),
                member: self.set.name().to_string(),
                expected: member.param_count(),
                found: values.len(),
            });
        }

        let mut coerced = Vec::with_capacity(member.param_count());
        for (index, (value, param)) in values.iter().zip(member.param_types()).take(fixed).enumerate() {
            coerced.push(self.coerce(member, index, value, param)?);
        }

        if member.is_variadic() {
            let element = member.param_type_at(fixed).cloned().unwrap_or(HostType::Object);
            let tail = values[fixed..]
                .iter()
                .enumerate()
                .map(|(offset, value)| self.coerce(member, fixed + offset, value, &element))
                .collect::<DispatchResult<Vec<_>>>()?;
            coerced.push(Value::array(element, tail));
        }

        Ok(coerced)
    }

    fn coerce(&self, member: &MemberDescriptor, index: usize, value: &Value, to: &HostType) -> DispatchResult<Value> {
        self.engine.convert(value, to).map_err(|source| DispatchError::Argument {
            owner: member.declaring().name().to_string(),
            member: member.name().to_string(),
            index,
            source,
        })
    }

    fn coerce_result(&self, member: &MemberDescriptor, value: Value) -> Value {
        if member.is_raw_return() {
            value
        } else {
            self.engine.to_guest(value)
        }
    }

    fn invocation_error(&self, cause: HostFailure) -> DispatchError {
        InvocationError::new(self.set.owner().name(), self.set.name(), cause).into()
    }
}
