//! Core types for spark-vdom.
//!
//! These types define the foundation that everything builds on.
//! They flow through resolution and diffing and define what the live target understands.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::renderer::LiveNode;
use crate::vnode::Child;

// =============================================================================
// Primitives
// =============================================================================

/// A leaf value in a vnode tree.
///
/// Primitives carry no props and no children. `Date` and `BoxedStr` are the
/// "object-like" primitives: they classify as primitives but already have an
/// identity of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Str(Rc<str>),
    Number(f64),
    Bool(bool),
    Null,
    /// Milliseconds since the Unix epoch.
    Date(i64),
    /// An already boxed string.
    BoxedStr(Rc<str>),
}

impl Primitive {
    /// Text form used when the primitive is written into a text node.
    pub fn text(&self) -> String {
        match self {
            Primitive::Str(s) | Primitive::BoxedStr(s) => s.to_string(),
            Primitive::Number(n) => format_number(*n),
            Primitive::Bool(b) => b.to_string(),
            Primitive::Null => String::new(),
            Primitive::Date(ms) => format!("Date({ms})"),
        }
    }

    /// Whether this primitive already carries its own identity (date-like or boxed string).
    pub fn is_object_like(&self) -> bool {
        matches!(self, Primitive::Date(_) | Primitive::BoxedStr(_))
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::Str(Rc::from(value))
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::Str(Rc::from(value))
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Number(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Number(f64::from(value))
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

/// Integers print without a fractional part, everything else uses `f64` display.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Events
// =============================================================================

/// An event delivered to a handler installed on a live node.
#[derive(Debug, Clone)]
pub struct Event {
    /// Lower-cased event name (`"click"`, `"input"`, ...).
    pub name: String,
    /// Node the event was dispatched on.
    pub target: LiveNode,
    /// Optional payload.
    pub detail: PropValue,
}

impl Event {
    pub fn new(name: impl Into<String>, target: LiveNode) -> Self {
        Self {
            name: name.into(),
            target,
            detail: PropValue::Null,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<PropValue>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Event handler callback (Rc for shared ownership between props and the live target).
///
/// Two handlers are equal only if they are the same allocation, so a freshly
/// built closure always counts as a change.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Prop Values
// =============================================================================

/// Ordered prop map. Ordering keeps key-union iteration deterministic.
pub type PropMap = BTreeMap<String, PropValue>;

/// Shared, immutable props. Identity (`Rc::ptr_eq`) is what marks an instance dirty.
pub type Props = Rc<PropMap>;

/// Component state. Replaced wholesale on every merge.
pub type State = Rc<PropMap>;

/// Context passed down through component boundaries.
pub type Context = Rc<PropMap>;

/// An arbitrary prop value.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    List(Vec<PropValue>),
    Map(PropMap),
    Handler(EventHandler),
    /// Reserved `children` prop.
    Children(Vec<Child>),
    /// Opaque user data, compared by identity.
    Any(Rc<dyn Any>),
}

impl PropValue {
    /// Truthiness as used for class maps and attribute removal.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Values that clear an attribute rather than set it.
    pub fn is_removal(&self) -> bool {
        matches!(self, PropValue::Null | PropValue::Bool(false))
    }

    /// Text form for scalar values; `None` for structured values.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropValue::Null => Some(String::new()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Number(n) => Some(format_number(*n)),
            PropValue::Str(s) => Some(s.to_string()),
            PropValue::Date(ms) => Some(format!("Date({ms})")),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropMap> {
        match self {
            PropValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[Child]> {
        match self {
            PropValue::Children(c) => Some(c),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Date(a), PropValue::Date(b)) => a == b,
            (PropValue::List(a), PropValue::List(b)) => a == b,
            (PropValue::Map(a), PropValue::Map(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a == b,
            (PropValue::Children(a), PropValue::Children(b)) => a == b,
            (PropValue::Any(a), PropValue::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "Null"),
            PropValue::Bool(b) => write!(f, "Bool({b})"),
            PropValue::Number(n) => write!(f, "Number({n})"),
            PropValue::Str(s) => write!(f, "Str({s:?})"),
            PropValue::Date(ms) => write!(f, "Date({ms})"),
            PropValue::List(l) => f.debug_tuple("List").field(l).finish(),
            PropValue::Map(m) => f.debug_tuple("Map").field(m).finish(),
            PropValue::Handler(h) => h.fmt(f),
            PropValue::Children(c) => f.debug_tuple("Children").field(c).finish(),
            PropValue::Any(_) => write!(f, "Any(..)"),
        }
    }
}

impl Default for PropValue {
    fn default() -> Self {
        PropValue::Null
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(f64::from(value))
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Number(f64::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

impl From<PropMap> for PropValue {
    fn from(value: PropMap) -> Self {
        PropValue::Map(value)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        PropValue::List(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => PropValue::Null,
            Value::Bool(b) => PropValue::Bool(b),
            Value::Number(n) => PropValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => PropValue::from(s),
            Value::Array(items) => PropValue::List(items.into_iter().map(PropValue::from).collect()),
            Value::Object(map) => PropValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, PropValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Build a prop map from a JSON object. Non-object documents yield an empty map.
pub fn props_from_json(value: serde_json::Value) -> PropMap {
    match PropValue::from(value) {
        PropValue::Map(map) => map,
        _ => PropMap::new(),
    }
}

/// Shallow merge: `base` entries overwritten by `patch` entries.
pub fn merge_maps(base: &PropMap, patch: &PropMap) -> PropMap {
    let mut merged = base.clone();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

// =============================================================================
// Instance Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Status bits of a component instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InstanceFlags: u8 {
        const NONE = 0;
        /// Props changed or state was mutated since the last render.
        const DIRTY = 1 << 0;
        /// Skip the `should_update` predicate on the next pass.
        const FORCE = 1 << 1;
        /// Between lookup and render inside a resolution pass.
        const RESOLVING = 1 << 2;
        /// `did_mount` has been delivered.
        const MOUNTED = 1 << 3;
        /// A state-driven re-render is queued for the end of the current pass.
        const QUEUED = 1 << 4;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_text() {
        assert_eq!(Primitive::from("Hi").text(), "Hi");
        assert_eq!(Primitive::Number(3.0).text(), "3");
        assert_eq!(Primitive::Number(2.5).text(), "2.5");
        assert_eq!(Primitive::Bool(true).text(), "true");
        assert_eq!(Primitive::Null.text(), "");
        assert!(Primitive::Date(0).is_object_like());
        assert!(!Primitive::from("x").is_object_like());
    }

    #[test]
    fn test_truthiness() {
        assert!(!PropValue::Null.is_truthy());
        assert!(!PropValue::Bool(false).is_truthy());
        assert!(!PropValue::from(0).is_truthy());
        assert!(!PropValue::from("").is_truthy());
        assert!(PropValue::from("a").is_truthy());
        assert!(PropValue::Map(PropMap::new()).is_truthy());
    }

    #[test]
    fn test_handler_identity() {
        let a = EventHandler::new(|_| {});
        let b = a.clone();
        let c = EventHandler::new(|_| {});
        assert_eq!(PropValue::from(a.clone()), PropValue::from(b));
        assert_ne!(PropValue::from(a), PropValue::from(c));
    }

    #[test]
    fn test_props_from_json() {
        let map = props_from_json(serde_json::json!({
            "class": "msg",
            "style": { "color": "red" },
            "count": 2,
        }));
        assert_eq!(map.get("class"), Some(&PropValue::from("msg")));
        assert_eq!(map.get("count"), Some(&PropValue::Number(2.0)));
        let style = map.get("style").and_then(PropValue::as_map).unwrap();
        assert_eq!(style.get("color"), Some(&PropValue::from("red")));
    }

    #[test]
    fn test_merge_maps() {
        let mut base = PropMap::new();
        base.insert("a".into(), 1.into());
        base.insert("b".into(), 2.into());
        let mut patch = PropMap::new();
        patch.insert("b".into(), 3.into());
        let merged = merge_maps(&base, &patch);
        assert_eq!(merged.get("a"), Some(&PropValue::from(1)));
        assert_eq!(merged.get("b"), Some(&PropValue::from(3)));
    }
}
