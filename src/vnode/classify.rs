//! Classification predicates and primitive boxing.
//!
//! The resolver classifies each child in a fixed order:
//! functional component, primitive, stateful component, element.
//!
//! Boxing gives primitives a stable wrapper so identity-bearing operations have
//! somewhere to attach. Classification and boxing deliberately disagree on one
//! point: a date-like value classifies as a primitive, but only an already boxed
//! string is exempt from boxing, so dates are converted to their text form like
//! any scalar.

use std::rc::Rc;

use super::element::{Child, VnodeType};
use crate::types::Primitive;

/// Classification of a child, in resolver order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    FunctionalComponent,
    Primitive,
    Component,
    Element,
}

/// Classify a child. Checks run in resolver order.
pub fn classify(child: &Child) -> NodeClass {
    if is_functional_component(child) {
        NodeClass::FunctionalComponent
    } else if is_primitive(child) {
        NodeClass::Primitive
    } else if is_component(child) {
        NodeClass::Component
    } else {
        NodeClass::Element
    }
}

/// Strings, numbers, booleans, null, date-like and boxed-string values.
pub fn is_primitive(child: &Child) -> bool {
    matches!(child, Child::Primitive(_))
}

/// A stateful component descriptor.
pub fn is_component(child: &Child) -> bool {
    matches!(child, Child::Node(v) if matches!(v.kind, VnodeType::Component(_)))
}

/// A plain rendering function.
pub fn is_functional_component(child: &Child) -> bool {
    matches!(child, Child::Node(v) if matches!(v.kind, VnodeType::Function(_)))
}

/// A native element tag.
pub fn is_element(child: &Child) -> bool {
    matches!(child, Child::Node(v) if matches!(v.kind, VnodeType::Tag(_)))
}

// =============================================================================
// Boxing
// =============================================================================

/// A primitive wrapped into a stable reference type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxedPrimitive {
    /// The value as it appeared in the vnode tree.
    pub original: Primitive,
    /// Text written into the live text node.
    pub text: Rc<str>,
}

impl BoxedPrimitive {
    /// Whether boxing produced a new wrapper (false for already boxed strings).
    pub fn was_converted(&self) -> bool {
        !matches!(self.original, Primitive::BoxedStr(_))
    }
}

/// Box a primitive. Already boxed strings keep their allocation.
pub fn box_primitive(value: &Primitive) -> BoxedPrimitive {
    let text = match value {
        Primitive::BoxedStr(s) => s.clone(),
        other => Rc::from(other.text()),
    };
    BoxedPrimitive {
        original: value.clone(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FunctionComponent;
    use crate::vnode::{h, Vnode};

    #[test]
    fn test_classification_order() {
        let func = FunctionComponent::new("Label", |_, _| None);
        assert_eq!(
            classify(&Child::from(Vnode::new(func, crate::props! {}, vec![]))),
            NodeClass::FunctionalComponent
        );
        assert_eq!(classify(&Child::from("text")), NodeClass::Primitive);
        assert_eq!(
            classify(&Child::from(Primitive::Date(0))),
            NodeClass::Primitive
        );
        assert_eq!(
            classify(&Child::from(h("div", crate::props! {}, []))),
            NodeClass::Element
        );
    }

    #[test]
    fn test_boxing_split() {
        let boxed = box_primitive(&Primitive::from(7));
        assert_eq!(&*boxed.text, "7");
        assert!(boxed.was_converted());

        // Date-like values are primitives but still get converted.
        let date = box_primitive(&Primitive::Date(1000));
        assert!(date.was_converted());
        assert_eq!(&*date.text, "Date(1000)");

        // Boxed strings are exempt and keep their allocation.
        let shared: Rc<str> = Rc::from("kept");
        let kept = box_primitive(&Primitive::BoxedStr(shared.clone()));
        assert!(!kept.was_converted());
        assert!(Rc::ptr_eq(&kept.text, &shared));
    }
}
