//! Vnode construction.
//!
//! [`h`] is the element constructor: `(type, props, ...children) -> Vnode`.
//! Nested child lists are flattened into one ordered sequence.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{ComponentType, FunctionComponent};
use crate::types::{Primitive, PropMap, PropValue, Props};

// =============================================================================
// Vnode Type
// =============================================================================

/// What a vnode renders as.
#[derive(Clone)]
pub enum VnodeType {
    /// Native element tag (`"div"`, `"span"`, ...).
    Tag(Rc<str>),
    /// Stateful component descriptor.
    Component(ComponentType),
    /// Plain rendering function.
    Function(FunctionComponent),
}

impl fmt::Debug for VnodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VnodeType::Tag(tag) => write!(f, "Tag({tag})"),
            VnodeType::Component(ty) => write!(f, "Component({})", ty.name()),
            VnodeType::Function(func) => write!(f, "Function({})", func.name()),
        }
    }
}

impl From<&str> for VnodeType {
    fn from(value: &str) -> Self {
        VnodeType::Tag(Rc::from(value))
    }
}

impl From<String> for VnodeType {
    fn from(value: String) -> Self {
        VnodeType::Tag(Rc::from(value))
    }
}

impl From<ComponentType> for VnodeType {
    fn from(value: ComponentType) -> Self {
        VnodeType::Component(value)
    }
}

impl From<FunctionComponent> for VnodeType {
    fn from(value: FunctionComponent) -> Self {
        VnodeType::Function(value)
    }
}

// =============================================================================
// Vnode
// =============================================================================

/// Immutable declarative tree node.
pub struct Vnode {
    pub kind: VnodeType,
    pub props: Props,
    pub children: Vec<Child>,
    /// Props with `children` merged in, built once so its identity is stable.
    merged: OnceCell<Props>,
}

impl Vnode {
    pub fn new(kind: impl Into<VnodeType>, props: impl Into<Props>, children: Vec<Child>) -> Self {
        Self {
            kind: kind.into(),
            props: props.into(),
            children,
            merged: OnceCell::new(),
        }
    }

    /// The `key` prop, if any. Keys are carried but never used for matching.
    pub fn key(&self) -> Option<&PropValue> {
        self.props.get("key")
    }

    /// Props as a component sees them: the vnode props plus the reserved `children` entry.
    ///
    /// Repeated calls on the same vnode return the same `Rc`.
    pub fn merged_props(&self) -> Props {
        self.merged
            .get_or_init(|| {
                if self.children.is_empty() && !self.props.contains_key("children") {
                    return self.props.clone();
                }
                let mut merged = (*self.props).clone();
                merged.insert(
                    "children".to_string(),
                    PropValue::Children(self.children.clone()),
                );
                Rc::new(merged)
            })
            .clone()
    }
}

impl fmt::Debug for Vnode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vnode")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}

// =============================================================================
// Child
// =============================================================================

/// One entry of a children sequence.
#[derive(Clone, Debug)]
pub enum Child {
    Node(Rc<Vnode>),
    Primitive(Primitive),
}

impl Child {
    pub fn as_vnode(&self) -> Option<&Rc<Vnode>> {
        match self {
            Child::Node(v) => Some(v),
            Child::Primitive(_) => None,
        }
    }
}

/// Vnodes compare by identity, primitives by value.
impl PartialEq for Child {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Child::Node(a), Child::Node(b)) => Rc::ptr_eq(a, b),
            (Child::Primitive(a), Child::Primitive(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Vnode> for Child {
    fn from(value: Vnode) -> Self {
        Child::Node(Rc::new(value))
    }
}

impl From<Rc<Vnode>> for Child {
    fn from(value: Rc<Vnode>) -> Self {
        Child::Node(value)
    }
}

impl From<Primitive> for Child {
    fn from(value: Primitive) -> Self {
        Child::Primitive(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Primitive(Primitive::from(value))
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Primitive(Primitive::from(value))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Primitive(Primitive::Number(value))
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Primitive(Primitive::from(value))
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Primitive(Primitive::Bool(value))
    }
}

// =============================================================================
// Child Input (variadic children, flattened)
// =============================================================================

/// A child argument to [`h`]: a single child or a nested list.
#[derive(Clone, Debug)]
pub enum ChildInput {
    One(Child),
    Many(Vec<ChildInput>),
}

impl ChildInput {
    fn flatten_into(self, out: &mut Vec<Child>) {
        match self {
            ChildInput::One(child) => out.push(child),
            ChildInput::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

macro_rules! child_input_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ChildInput {
                fn from(value: $ty) -> Self {
                    ChildInput::One(Child::from(value))
                }
            }
        )*
    };
}

child_input_from!(Child, Vnode, Rc<Vnode>, Primitive, &str, String, f64, i32, bool);

impl From<Vec<Child>> for ChildInput {
    fn from(value: Vec<Child>) -> Self {
        ChildInput::Many(value.into_iter().map(ChildInput::One).collect())
    }
}

impl From<Vec<ChildInput>> for ChildInput {
    fn from(value: Vec<ChildInput>) -> Self {
        ChildInput::Many(value)
    }
}

/// Element constructor.
///
/// # Arguments
/// * `kind` - Tag name, [`ComponentType`] or [`FunctionComponent`]
/// * `props` - Prop map (see [`props!`](crate::props))
/// * `children` - Children; nested lists are flattened in order
pub fn h(
    kind: impl Into<VnodeType>,
    props: PropMap,
    children: impl IntoIterator<Item = ChildInput>,
) -> Vnode {
    let mut flat = Vec::new();
    for input in children {
        input.flatten_into(&mut flat);
    }
    Vnode::new(kind, Rc::new(props), flat)
}

/// Build a [`PropMap`](crate::types::PropMap) from `key => value` pairs.
///
/// Values go through `PropValue::from`.
#[macro_export]
macro_rules! props {
    () => {
        $crate::types::PropMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::PropMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::types::PropValue::from($value),
            );
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h_flattens_children() {
        let node = h(
            "ul",
            crate::props! {},
            [
                "a".into(),
                ChildInput::from(vec![Child::from("b"), Child::from("c")]),
                ChildInput::Many(vec![ChildInput::Many(vec!["d".into()])]),
            ],
        );
        let texts: Vec<String> = node
            .children
            .iter()
            .map(|c| match c {
                Child::Primitive(p) => p.text(),
                Child::Node(_) => String::new(),
            })
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merged_props_identity_is_stable() {
        let node = h("div", crate::props! { "id" => "x" }, ["text".into()]);
        let a = node.merged_props();
        let b = node.merged_props();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.get("children").and_then(PropValue::as_children).is_some());
        assert!(node.props.get("children").is_none());
    }

    #[test]
    fn test_merged_props_without_children_reuses_props() {
        let node = h("div", crate::props! { "id" => "x" }, []);
        assert!(Rc::ptr_eq(&node.merged_props(), &node.props));
    }

    #[test]
    fn test_key_is_readable() {
        let node = h("li", crate::props! { "key" => "row-1" }, []);
        assert_eq!(node.key(), Some(&PropValue::from("row-1")));
    }
}
