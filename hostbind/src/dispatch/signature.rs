//! Call-site signatures.

use std::fmt;
use std::sync::Arc;

use crate::callsite::{render_tags, TypeTag};
use crate::types::ClassRef;

/// Whether a call targets the type itself or an instance of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    Static,
    Instance,
}

impl Dispatch {
    pub fn is_static(self) -> bool {
        self == Dispatch::Static
    }
}

/// The shape of one call: owner, member name, dispatch kind and the ordered
/// argument tags. Immutable; equality and hashing are structural.
///
/// The dispatch kind is part of the key so a static call and an instance
/// call with the same tags never share a cached decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSiteSignature {
    owner: ClassRef,
    member: Arc<str>,
    dispatch: Dispatch,
    tags: Arc<[TypeTag]>,
}

impl CallSiteSignature {
    pub fn new(
        owner: &ClassRef,
        member: impl Into<Arc<str>>,
        dispatch: Dispatch,
        tags: impl Into<Arc<[TypeTag]>>,
    ) -> Self {
        Self {
            owner: owner.clone(),
            member: member.into(),
            dispatch,
            tags: tags.into(),
        }
    }

    pub fn owner(&self) -> &ClassRef {
        &self.owner
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }
}

impl fmt::Display for CallSiteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dispatch.is_static() {
            f.write_str("static ")?;
        }
        write!(f, "{}.{}{}", self.owner, self.member, render_tags(&self.tags))
    }
}
