//! Live target abstraction - the host tree the differ patches.
//!
//! The differ never touches a concrete document. It talks to a
//! [`LiveTarget`], identifying host nodes by opaque [`LiveNode`] handles.
//! Methods take `&self`: event handlers run while the target is shared, and
//! may trigger re-renders that patch the same target.

use std::rc::Rc;

use crate::types::EventHandler;

/// Opaque handle to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiveNode(usize);

impl LiveNode {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Host tree operations used by the differ and the attribute reconciler.
pub trait LiveTarget {
    // Nodes
    fn create_element(&self, tag: &str) -> LiveNode;
    fn create_text(&self, text: &str) -> LiveNode;
    fn set_text(&self, node: LiveNode, text: &str);

    // Structure
    fn parent(&self, node: LiveNode) -> Option<LiveNode>;
    fn children(&self, node: LiveNode) -> Vec<LiveNode>;
    fn append_child(&self, parent: LiveNode, child: LiveNode);
    /// Insert `child` before `reference`, or append when `reference` is `None`.
    fn insert_before(&self, parent: LiveNode, child: LiveNode, reference: Option<LiveNode>);
    fn replace_child(&self, parent: LiveNode, new_child: LiveNode, old_child: LiveNode);
    fn remove_child(&self, parent: LiveNode, child: LiveNode);

    // Attributes and properties
    fn set_attribute(&self, node: LiveNode, name: &str, value: &str);
    fn remove_attribute(&self, node: LiveNode, name: &str);
    /// Whether `name` is a writable property of `node`. Writes are only
    /// attempted when this returns true.
    fn supports_property(&self, node: LiveNode, name: &str) -> bool;
    fn set_property(&self, node: LiveNode, name: &str, value: Option<&str>);

    // Style
    fn set_style_text(&self, node: LiveNode, css: &str);
    fn set_style_property(&self, node: LiveNode, name: &str, value: &str);
    fn remove_style_property(&self, node: LiveNode, name: &str);

    // Raw markup
    fn set_inner_html(&self, node: LiveNode, html: &str);

    // Events
    fn add_event_listener(&self, node: LiveNode, event: &str, handler: EventHandler);
    fn remove_event_listener(&self, node: LiveNode, event: &str, handler: &EventHandler);
}

/// Shared live target.
pub type Target = Rc<dyn LiveTarget>;
