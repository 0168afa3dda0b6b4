//! Member descriptors and overload sets.
//!
//! A [`MemberDescriptor`] is the immutable, uniform view over one field,
//! property, method, constructor or proxy constructor of a host class. The
//! discovery step builds them once; everything downstream shares them through
//! `Arc` and never mutates them.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::{ClassRef, HostType};

/// The closed set of member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field { writable: bool },
    Property { readable: bool, writable: bool },
    Method,
    Constructor,
    /// Builds a wrapper instance around an opaque native handle.
    ProxyConstructor,
}

/// What a member lets the caller do with it.
pub trait Capabilities {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn can_invoke(&self) -> bool;
}

impl Capabilities for MemberKind {
    fn can_read(&self) -> bool {
        match self {
            MemberKind::Field { .. } => true,
            MemberKind::Property { readable, .. } => *readable,
            _ => false,
        }
    }

    fn can_write(&self) -> bool {
        match self {
            MemberKind::Field { writable } | MemberKind::Property { writable, .. } => *writable,
            _ => false,
        }
    }

    fn can_invoke(&self) -> bool {
        matches!(
            self,
            MemberKind::Method | MemberKind::Constructor | MemberKind::ProxyConstructor
        )
    }
}

impl MemberKind {
    /// Diagnostic name of the kind.
    pub fn what(&self) -> &'static str {
        match self {
            MemberKind::Field { .. } => "field",
            MemberKind::Property { .. } => "property",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::ProxyConstructor => "proxy constructor",
        }
    }

    /// Whether the kind is read or written rather than invoked.
    pub fn is_accessible(&self) -> bool {
        !self.can_invoke()
    }
}

/// Immutable metadata for one member of a host class.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    declaring: ClassRef,
    name: Arc<str>,
    kind: MemberKind,
    is_static: bool,
    /// Declared parameter slots. For variadic members the last slot holds
    /// the element type of the trailing group.
    params: Vec<HostType>,
    variadic: bool,
    /// Return type for invocables, value type for fields and properties.
    return_type: HostType,
    raw_return: bool,
    /// Index used by the fast accessor.
    index: usize,
}

impl MemberDescriptor {
    fn build(
        declaring: &ClassRef,
        name: impl Into<Arc<str>>,
        kind: MemberKind,
        params: Vec<HostType>,
        return_type: HostType,
    ) -> Self {
        Self {
            declaring: declaring.clone(),
            name: name.into(),
            kind,
            is_static: matches!(kind, MemberKind::Constructor | MemberKind::ProxyConstructor),
            params,
            variadic: false,
            return_type,
            raw_return: false,
            index: 0,
        }
    }

    pub fn method(
        declaring: &ClassRef,
        name: impl Into<Arc<str>>,
        params: Vec<HostType>,
        return_type: HostType,
    ) -> Self {
        Self::build(declaring, name, MemberKind::Method, params, return_type)
    }

    /// Constructors are named `new` and return the declaring class.
    pub fn constructor(declaring: &ClassRef, params: Vec<HostType>) -> Self {
        Self::build(
            declaring,
            "new",
            MemberKind::Constructor,
            params,
            HostType::class(declaring),
        )
    }

    /// A constructor taking a single opaque handle.
    pub fn proxy_constructor(declaring: &ClassRef) -> Self {
        Self::build(
            declaring,
            "new",
            MemberKind::ProxyConstructor,
            vec![HostType::Handle],
            HostType::class(declaring),
        )
    }

    pub fn field(declaring: &ClassRef, name: impl Into<Arc<str>>, ty: HostType, writable: bool) -> Self {
        Self::build(declaring, name, MemberKind::Field { writable }, Vec::new(), ty)
    }

    pub fn property(
        declaring: &ClassRef,
        name: impl Into<Arc<str>>,
        ty: HostType,
        readable: bool,
        writable: bool,
    ) -> Self {
        Self::build(
            declaring,
            name,
            MemberKind::Property { readable, writable },
            Vec::new(),
            ty,
        )
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark the last declared parameter as the element type of a trailing
    /// variable-length group. Ignored for members without parameters.
    pub fn variadic(mut self) -> Self {
        self.variadic = !self.params.is_empty();
        self
    }

    /// Return results to the guest untouched.
    pub fn raw_return(mut self) -> Self {
        self.raw_return = true;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn declaring(&self) -> &ClassRef {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn what(&self) -> &'static str {
        self.kind.what()
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn param_types(&self) -> &[HostType] {
        &self.params
    }

    /// Number of declared slots, not the number of call arguments.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Number of parameters before the variadic group.
    pub fn fixed_count(&self) -> usize {
        if self.variadic {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    /// The declared type an argument at `position` is compared against.
    /// Positions past the last slot of a variadic member map to its element type.
    pub fn param_type_at(&self, position: usize) -> Option<&HostType> {
        if self.variadic && position >= self.fixed_count() {
            self.params.last()
        } else {
            self.params.get(position)
        }
    }

    /// Whether a call with `argc` arguments fits the declared arity.
    pub fn accepts_arity(&self, argc: usize) -> bool {
        if self.variadic {
            self.fixed_count() <= argc
        } else {
            self.params.len() == argc
        }
    }

    pub fn return_type(&self) -> &HostType {
        &self.return_type
    }

    /// The value type of a field or property.
    pub fn value_type(&self) -> &HostType {
        &self.return_type
    }

    pub fn is_raw_return(&self) -> bool {
        self.raw_return
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Capabilities for MemberDescriptor {
    fn can_read(&self) -> bool {
        self.kind.can_read()
    }

    fn can_write(&self) -> bool {
        self.kind.can_write()
    }

    fn can_invoke(&self) -> bool {
        self.kind.can_invoke()
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static && self.kind == MemberKind::Method {
            f.write_str("static ")?;
        }
        write!(f, "{}.{}", self.declaring, self.name)?;
        if !self.kind.can_invoke() {
            return write!(f, ": {}", self.return_type);
        }
        f.write_str("(")?;
        for (i, ty) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
            if self.variadic && i + 1 == self.params.len() {
                f.write_str("...")?;
            }
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// All members of one declaring type sharing a name.
#[derive(Debug, Clone)]
pub struct OverloadSet {
    owner: ClassRef,
    name: Arc<str>,
    members: Arc<[Arc<MemberDescriptor>]>,
}

impl OverloadSet {
    pub fn new(owner: &ClassRef, name: impl Into<Arc<str>>, members: Vec<Arc<MemberDescriptor>>) -> Self {
        Self {
            owner: owner.clone(),
            name: name.into(),
            members: members.into(),
        }
    }

    pub fn owner(&self) -> &ClassRef {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    pub fn members(&self) -> &[Arc<MemberDescriptor>] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MemberDescriptor>> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The overload sets of one declaring type, in discovery order.
#[derive(Debug, Clone)]
pub struct MemberTable {
    owner: ClassRef,
    sets: IndexMap<Arc<str>, OverloadSet>,
}

impl MemberTable {
    /// Group descriptors by name. Descriptors declared by other classes are
    /// kept; the table's owner is the type calls are dispatched on.
    pub fn new<I>(owner: &ClassRef, descriptors: I) -> Self
    where
        I: IntoIterator<Item = MemberDescriptor>,
    {
        let mut grouped: IndexMap<Arc<str>, Vec<Arc<MemberDescriptor>>> = IndexMap::new();
        for descriptor in descriptors {
            let name: Arc<str> = descriptor.name.clone();
            grouped.entry(name).or_default().push(Arc::new(descriptor));
        }
        let sets = grouped
            .into_iter()
            .map(|(name, members)| (name.clone(), OverloadSet::new(owner, name, members)))
            .collect();
        Self {
            owner: owner.clone(),
            sets,
        }
    }

    pub fn owner(&self) -> &ClassRef {
        &self.owner
    }

    pub fn get(&self, name: &str) -> Option<&OverloadSet> {
        self.sets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(|name| name.as_ref())
    }

    pub fn overload_sets(&self) -> impl Iterator<Item = &OverloadSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_by_kind() {
        let field = MemberKind::Field { writable: false };
        assert!(field.can_read());
        assert!(!field.can_write());
        assert!(!field.can_invoke());

        let setter_only = MemberKind::Property {
            readable: false,
            writable: true,
        };
        assert!(!setter_only.can_read());
        assert!(setter_only.can_write());

        assert!(MemberKind::Method.can_invoke());
        assert!(MemberKind::ProxyConstructor.can_invoke());
        assert!(!MemberKind::Constructor.can_read());

        assert!(field.is_accessible());
        assert!(setter_only.is_accessible());
        assert!(!MemberKind::Method.is_accessible());
        assert!(!MemberKind::Constructor.is_accessible());
    }

    #[test]
    fn test_variadic_slots() {
        let text = ClassRef::new("Text");
        let join = MemberDescriptor::method(
            &text,
            "join",
            vec![HostType::String, HostType::String],
            HostType::String,
        )
        .variadic();

        assert_eq!(join.param_count(), 2);
        assert_eq!(join.fixed_count(), 1);
        assert!(join.accepts_arity(1));
        assert!(join.accepts_arity(5));
        assert!(!join.accepts_arity(0));
        assert_eq!(join.param_type_at(0), Some(&HostType::String));
        assert_eq!(join.param_type_at(4), Some(&HostType::String));
        assert_eq!(join.to_string(), "Text.join(String, String...) -> String");
    }

    #[test]
    fn test_variadic_without_params_is_ignored() {
        let text = ClassRef::new("Text");
        let nothing = MemberDescriptor::method(&text, "noop", vec![], HostType::Void).variadic();
        assert!(!nothing.is_variadic());
        assert!(nothing.accepts_arity(0));
        assert!(!nothing.accepts_arity(1));
    }

    #[test]
    fn test_constructors_are_static() {
        let point = ClassRef::new("Point");
        let ctor = MemberDescriptor::constructor(&point, vec![HostType::Int, HostType::Int]);
        let proxy = MemberDescriptor::proxy_constructor(&point);

        assert!(ctor.is_static());
        assert!(proxy.is_static());
        assert_eq!(proxy.param_types(), &[HostType::Handle]);
        assert_eq!(ctor.return_type(), &HostType::class(&point));
        assert_eq!(proxy.what(), "proxy constructor");
    }

    #[test]
    fn test_member_table_groups_in_order() {
        let point = ClassRef::new("Point");
        let table = MemberTable::new(
            &point,
            vec![
                MemberDescriptor::field(&point, "x", HostType::Int, true),
                MemberDescriptor::method(&point, "scale", vec![HostType::Int], HostType::Void),
                MemberDescriptor::method(&point, "scale", vec![HostType::Double], HostType::Void),
                MemberDescriptor::field(&point, "y", HostType::Int, true),
            ],
        );

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["x", "scale", "y"]);
        let scale = table.get("scale").unwrap();
        assert_eq!(scale.len(), 2);
        assert_eq!(scale.members()[1].param_types(), &[HostType::Double]);
        assert!(table.get("z").is_none());
    }
}
