//! The entry point for guest calls.
//!
//! A [`Dispatcher`] owns the member tables of every registered host type and
//! the state shared by all of their accessor families: one call-site cache,
//! one resolver and one fast accessor.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::accessor::{AccessorFamily, CallTarget, FastAccessor};
use crate::callsite::{ArgumentList, GuestStack};
use crate::config::Config;
use crate::convert::ConversionEngine;
use crate::dispatch::{CallSiteCache, OverloadResolver};
use crate::error::{DispatchError, DispatchResult};
use crate::member::MemberTable;
use crate::types::ClassRef;
use crate::value::Value;

pub struct Dispatcher {
    tables: FxHashMap<ClassRef, MemberTable>,
    cache: Arc<CallSiteCache>,
    resolver: Arc<OverloadResolver>,
    engine: ConversionEngine,
    accessor: Arc<dyn FastAccessor>,
}

impl Dispatcher {
    pub fn new(accessor: Arc<dyn FastAccessor>, config: &Config) -> Self {
        Self {
            tables: FxHashMap::default(),
            cache: Arc::new(CallSiteCache::with_config(&config.cache)),
            resolver: Arc::new(OverloadResolver::new()),
            engine: ConversionEngine::new(),
            accessor,
        }
    }

    /// Use a custom resolver, e.g. one with a different distance oracle.
    pub fn with_resolver(mut self, resolver: OverloadResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Register the members of a host type. A table registered again for
    /// the same type replaces the old one and drops every cached decision.
    pub fn register(&mut self, table: MemberTable) {
        info!(owner = %table.owner(), members = table.len(), "registering host type");
        if self.tables.insert(table.owner().clone(), table).is_some() {
            self.cache.clear();
        }
    }

    pub fn table(&self, owner: &ClassRef) -> Option<&MemberTable> {
        self.tables.get(owner)
    }

    pub fn cache(&self) -> &CallSiteCache {
        &self.cache
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    /// The accessor family for `owner.member`.
    pub fn family(&self, owner: &ClassRef, member: &str) -> DispatchResult<AccessorFamily> {
        let set = self
            .tables
            .get(owner)
            .and_then(|table| table.get(member))
            .ok_or_else(|| DispatchError::UnknownMember {
                owner: owner.name().to_string(),
                member: member.to_string(),
            })?;
        Ok(AccessorFamily::new(
            set.clone(),
            self.cache.clone(),
            self.resolver.clone(),
            self.accessor.clone(),
        ))
    }

    /// Resolve `owner.member` for the argument shape, then invoke it.
    pub fn resolve_and_invoke(
        &self,
        owner: &ClassRef,
        member: &str,
        target: &CallTarget,
        args: &ArgumentList,
    ) -> DispatchResult<Value> {
        self.family(owner, member)?.invoke(target, args)
    }

    pub fn read(&self, owner: &ClassRef, member: &str, target: &CallTarget) -> DispatchResult<Value> {
        self.family(owner, member)?.read(target)
    }

    pub fn write(
        &self,
        owner: &ClassRef,
        member: &str,
        target: &CallTarget,
        value: &Value,
    ) -> DispatchResult<()> {
        self.family(owner, member)?.write(target, value)
    }

    /// Call with the top `argc` stack values as arguments.
    ///
    /// The arguments are popped whether or not the call succeeds; the result
    /// is pushed only on success.
    pub fn call_from_stack<S: GuestStack + ?Sized>(
        &self,
        stack: &mut S,
        owner: &ClassRef,
        member: &str,
        target: &CallTarget,
        argc: usize,
    ) -> DispatchResult<()> {
        let available = stack.len();
        if available < argc {
            return Err(DispatchError::StackUnderflow {
                needed: argc,
                available,
            });
        }

        let args = ArgumentList::from_stack(stack, available - argc, argc);
        stack.pop(argc);
        debug!(owner = %owner, member, argc, "dispatching from stack");

        let result = self.resolve_and_invoke(owner, member, target, &args)?;
        stack.push(result);
        Ok(())
    }
}
