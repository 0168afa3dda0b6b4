//! Call-site plumbing shared with the guest runtime.
//!
//! The guest runtime owns its value stack; this module only defines what the
//! dispatcher needs from it ([`GuestStack`]) and the owned argument list that
//! is built from it ([`ArgumentList`]). Neither is touched by the resolver or
//! the conversion engine, which only see [`TypeTag`]s and values.

use std::fmt;

use crate::types::HostType;
use crate::value::Value;

/// The runtime type of one call argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// The guest's nil.
    Nil,
    /// A value with a known host type.
    Type(HostType),
    /// A guest function value.
    Function,
    /// Opaque userdata, carrying a host type when it wraps a host object.
    Userdata(Option<HostType>),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Nil => f.write_str("nil"),
            TypeTag::Type(ty) => write!(f, "{}", ty),
            TypeTag::Function => f.write_str("function"),
            TypeTag::Userdata(None) => f.write_str("userdata"),
            TypeTag::Userdata(Some(ty)) => write!(f, "userdata<{}>", ty),
        }
    }
}

/// Render a tag sequence as `(int, String)`.
pub fn render_tags(tags: &[TypeTag]) -> String {
    let mut out = String::from("(");
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&tag.to_string());
    }
    out.push(')');
    out
}

/// Ordered call arguments with their tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList {
    values: Vec<Value>,
    tags: Vec<TypeTag>,
}

impl ArgumentList {
    pub fn new(values: Vec<Value>) -> Self {
        let tags = values.iter().map(Value::tag).collect();
        Self { values, tags }
    }

    /// Read `count` slots starting at `base` without popping them.
    pub fn from_stack<S: GuestStack + ?Sized>(stack: &S, base: usize, count: usize) -> Self {
        let mut values = Vec::with_capacity(count);
        let mut tags = Vec::with_capacity(count);
        for slot in base..base + count {
            tags.push(stack.tag_of(slot));
            values.push(stack.value_at(slot).unwrap_or(Value::Nil));
        }
        Self { values, tags }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }
}

impl FromIterator<Value> for ArgumentList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ArgumentList::new(iter.into_iter().collect())
    }
}

/// The guest runtime's value stack, as seen by the dispatcher.
///
/// Slots are zero-based from the bottom of the stack.
pub trait GuestStack {
    fn len(&self) -> usize;

    fn value_at(&self, slot: usize) -> Option<Value>;

    /// Tag of the value at `slot`; empty slots read as nil.
    fn tag_of(&self, slot: usize) -> TypeTag {
        self.value_at(slot).map_or(TypeTag::Nil, |value| value.tag())
    }

    fn push(&mut self, value: Value);

    /// Drop the top `n` values.
    fn pop(&mut self, n: usize);
}

impl GuestStack for Vec<Value> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn value_at(&self, slot: usize) -> Option<Value> {
        self.get(slot).cloned()
    }

    fn push(&mut self, value: Value) {
        Vec::push(self, value);
    }

    fn pop(&mut self, n: usize) {
        let keep = Vec::len(self).saturating_sub(n);
        self.truncate(keep);
    }
}
