//! In-memory live target.
//!
//! [`MemoryDom`] keeps a node arena with attributes, properties, inline style,
//! raw markup and listeners, and records every mutation it receives. It backs
//! the tests and serves hosts that only need a materialized tree.
//!
//! # Example
//!
//! ```ignore
//! let dom = MemoryDom::new();
//! let root = dom.create_element("body");
//! let target: Target = dom.clone();
//! let handle = render(h("p", props! {}, ["hi".into()]), &target, root, None)?;
//! assert_eq!(dom.to_markup(root), "<body><p>hi</p></body>");
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::target::{LiveNode, LiveTarget};
use crate::types::{Event, EventHandler};

/// Property names [`MemoryDom`] treats as writable element properties.
const KNOWN_PROPERTIES: &[&str] = &[
    "value",
    "checked",
    "selected",
    "disabled",
    "id",
    "title",
    "hidden",
    "tabIndex",
    "href",
    "src",
    "type",
    "name",
    "placeholder",
];

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement(LiveNode, String),
    CreateText(LiveNode, String),
    SetText(LiveNode, String),
    Append { parent: LiveNode, child: LiveNode },
    Insert { parent: LiveNode, child: LiveNode, before: Option<LiveNode> },
    Replace { parent: LiveNode, new: LiveNode, old: LiveNode },
    Remove { parent: LiveNode, child: LiveNode },
    SetAttribute(LiveNode, String, String),
    RemoveAttribute(LiveNode, String),
    SetProperty(LiveNode, String, Option<String>),
    SetStyleText(LiveNode, String),
    SetStyleProperty(LiveNode, String, String),
    RemoveStyleProperty(LiveNode, String),
    SetInnerHtml(LiveNode, String),
    AddListener(LiveNode, String),
    RemoveListener(LiveNode, String),
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct MemoryNode {
    kind: NodeKind,
    parent: Option<LiveNode>,
    children: Vec<LiveNode>,
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, Option<String>>,
    style: BTreeMap<String, String>,
    inner_html: Option<String>,
    listeners: Vec<(String, EventHandler)>,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            style: BTreeMap::new(),
            inner_html: None,
            listeners: Vec::new(),
        }
    }
}

#[derive(Default)]
struct DomState {
    nodes: Vec<MemoryNode>,
    mutations: Vec<Mutation>,
}

/// Arena-backed in-memory document.
#[derive(Default)]
pub struct MemoryDom {
    state: RefCell<DomState>,
}

impl MemoryDom {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn push(&self, kind: NodeKind, mutation: impl FnOnce(LiveNode) -> Mutation) -> LiveNode {
        let mut state = self.state.borrow_mut();
        let node = LiveNode::new(state.nodes.len());
        state.nodes.push(MemoryNode::new(kind));
        state.mutations.push(mutation(node));
        node
    }

    fn with_node<R>(&self, node: LiveNode, f: impl FnOnce(&MemoryNode) -> R) -> Option<R> {
        self.state.borrow().nodes.get(node.index()).map(f)
    }

    fn edit(&self, node: LiveNode, mutation: Mutation, f: impl FnOnce(&mut MemoryNode)) {
        let mut state = self.state.borrow_mut();
        state.mutations.push(mutation);
        match state.nodes.get_mut(node.index()) {
            Some(n) => f(n),
            None => tracing::warn!(node = node.index(), "mutation on unknown node"),
        }
    }

    fn detach(state: &mut DomState, child: LiveNode) {
        let parent = state.nodes.get(child.index()).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = state.nodes.get_mut(parent.index()) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(c) = state.nodes.get_mut(child.index()) {
            c.parent = None;
        }
    }

    fn link(state: &mut DomState, parent: LiveNode, child: LiveNode, at: Option<usize>) {
        Self::detach(state, child);
        if let Some(p) = state.nodes.get_mut(parent.index()) {
            match at {
                Some(index) if index <= p.children.len() => p.children.insert(index, child),
                _ => p.children.push(child),
            }
        }
        if let Some(c) = state.nodes.get_mut(child.index()) {
            c.parent = Some(parent);
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Drain the mutation log.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.state.borrow_mut().mutations)
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    pub fn tag(&self, node: LiveNode) -> Option<String> {
        self.with_node(node, |n| match &n.kind {
            NodeKind::Element(tag) => Some(tag.clone()),
            NodeKind::Text(_) => None,
        })
        .flatten()
    }

    pub fn text(&self, node: LiveNode) -> Option<String> {
        self.with_node(node, |n| match &n.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element(_) => None,
        })
        .flatten()
    }

    pub fn attribute(&self, node: LiveNode, name: &str) -> Option<String> {
        self.with_node(node, |n| n.attributes.get(name).cloned()).flatten()
    }

    pub fn property(&self, node: LiveNode, name: &str) -> Option<String> {
        self.with_node(node, |n| n.properties.get(name).cloned().flatten())
            .flatten()
    }

    pub fn style(&self, node: LiveNode, name: &str) -> Option<String> {
        self.with_node(node, |n| n.style.get(name).cloned()).flatten()
    }

    /// Inline style serialized as `name: value; ...`.
    pub fn style_text(&self, node: LiveNode) -> String {
        self.with_node(node, |n| {
            n.style
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default()
    }

    pub fn inner_html(&self, node: LiveNode) -> Option<String> {
        self.with_node(node, |n| n.inner_html.clone()).flatten()
    }

    pub fn listener_count(&self, node: LiveNode, event: &str) -> usize {
        self.with_node(node, |n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Serialize a subtree: elements with their attributes, text verbatim.
    pub fn to_markup(&self, node: LiveNode) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: LiveNode, out: &mut String) {
        let Some((kind, attrs, children, html)) = self.with_node(node, |n| {
            (
                n.kind.clone(),
                n.attributes.clone(),
                n.children.clone(),
                n.inner_html.clone(),
            )
        }) else {
            return;
        };

        match kind {
            NodeKind::Text(text) => out.push_str(&text),
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(&tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                match html {
                    Some(html) if !html.is_empty() => out.push_str(&html),
                    _ => {
                        for child in children {
                            self.write_markup(child, out);
                        }
                    }
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Invoke every listener registered on `node` for `event.name`.
    ///
    /// Handlers are cloned out first, so a handler may re-render and patch
    /// this document.
    pub fn dispatch(&self, node: LiveNode, event: &Event) -> usize {
        let handlers: Vec<EventHandler> = self
            .with_node(node, |n| {
                n.listeners
                    .iter()
                    .filter(|(name, _)| *name == event.name)
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();

        tracing::trace!(node = node.index(), event = %event.name, count = handlers.len(), "dispatch");
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }
}

impl LiveTarget for MemoryDom {
    fn create_element(&self, tag: &str) -> LiveNode {
        self.push(NodeKind::Element(tag.to_string()), |n| {
            Mutation::CreateElement(n, tag.to_string())
        })
    }

    fn create_text(&self, text: &str) -> LiveNode {
        self.push(NodeKind::Text(text.to_string()), |n| {
            Mutation::CreateText(n, text.to_string())
        })
    }

    fn set_text(&self, node: LiveNode, text: &str) {
        self.edit(node, Mutation::SetText(node, text.to_string()), |n| {
            n.kind = NodeKind::Text(text.to_string());
        });
    }

    fn parent(&self, node: LiveNode) -> Option<LiveNode> {
        self.with_node(node, |n| n.parent).flatten()
    }

    fn children(&self, node: LiveNode) -> Vec<LiveNode> {
        self.with_node(node, |n| n.children.clone()).unwrap_or_default()
    }

    fn append_child(&self, parent: LiveNode, child: LiveNode) {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Append { parent, child });
        Self::link(&mut state, parent, child, None);
    }

    fn insert_before(&self, parent: LiveNode, child: LiveNode, reference: Option<LiveNode>) {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Insert {
            parent,
            child,
            before: reference,
        });
        Self::detach(&mut state, child);
        let at = reference.and_then(|r| {
            state
                .nodes
                .get(parent.index())
                .and_then(|p| p.children.iter().position(|c| *c == r))
        });
        Self::link(&mut state, parent, child, at);
    }

    fn replace_child(&self, parent: LiveNode, new_child: LiveNode, old_child: LiveNode) {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Replace {
            parent,
            new: new_child,
            old: old_child,
        });
        Self::detach(&mut state, new_child);
        let at = state
            .nodes
            .get(parent.index())
            .and_then(|p| p.children.iter().position(|c| *c == old_child));
        Self::detach(&mut state, old_child);
        Self::link(&mut state, parent, new_child, at);
    }

    fn remove_child(&self, parent: LiveNode, child: LiveNode) {
        let mut state = self.state.borrow_mut();
        state.mutations.push(Mutation::Remove { parent, child });
        let attached = state.nodes.get(child.index()).and_then(|c| c.parent) == Some(parent);
        if attached {
            Self::detach(&mut state, child);
        }
    }

    fn set_attribute(&self, node: LiveNode, name: &str, value: &str) {
        let mutation = Mutation::SetAttribute(node, name.to_string(), value.to_string());
        self.edit(node, mutation, |n| {
            n.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_attribute(&self, node: LiveNode, name: &str) {
        self.edit(node, Mutation::RemoveAttribute(node, name.to_string()), |n| {
            n.attributes.remove(name);
        });
    }

    fn supports_property(&self, node: LiveNode, name: &str) -> bool {
        self.with_node(node, |n| matches!(n.kind, NodeKind::Element(_)))
            .unwrap_or(false)
            && KNOWN_PROPERTIES.contains(&name)
    }

    fn set_property(&self, node: LiveNode, name: &str, value: Option<&str>) {
        let value = value.map(str::to_string);
        let mutation = Mutation::SetProperty(node, name.to_string(), value.clone());
        self.edit(node, mutation, |n| {
            n.properties.insert(name.to_string(), value);
        });
    }

    fn set_style_text(&self, node: LiveNode, css: &str) {
        self.edit(node, Mutation::SetStyleText(node, css.to_string()), |n| {
            n.style = parse_style_text(css);
        });
    }

    fn set_style_property(&self, node: LiveNode, name: &str, value: &str) {
        let mutation = Mutation::SetStyleProperty(node, name.to_string(), value.to_string());
        self.edit(node, mutation, |n| {
            n.style.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_style_property(&self, node: LiveNode, name: &str) {
        self.edit(node, Mutation::RemoveStyleProperty(node, name.to_string()), |n| {
            n.style.remove(name);
        });
    }

    fn set_inner_html(&self, node: LiveNode, html: &str) {
        self.edit(node, Mutation::SetInnerHtml(node, html.to_string()), |n| {
            n.inner_html = Some(html.to_string());
        });
    }

    fn add_event_listener(&self, node: LiveNode, event: &str, handler: EventHandler) {
        self.edit(node, Mutation::AddListener(node, event.to_string()), |n| {
            n.listeners.push((event.to_string(), handler));
        });
    }

    fn remove_event_listener(&self, node: LiveNode, event: &str, handler: &EventHandler) {
        self.edit(node, Mutation::RemoveListener(node, event.to_string()), |n| {
            if let Some(pos) = n
                .listeners
                .iter()
                .position(|(e, h)| e == event && h == handler)
            {
                n.listeners.remove(pos);
            }
        });
    }
}

/// Parse `a: b; c: d` into a map. Empty declarations are skipped.
fn parse_style_text(css: &str) -> BTreeMap<String, String> {
    css.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_structure_ops() {
        let dom = MemoryDom::new();
        let root = dom.create_element("div");
        let a = dom.create_text("a");
        let b = dom.create_text("b");
        let c = dom.create_text("c");

        dom.append_child(root, a);
        dom.append_child(root, c);
        dom.insert_before(root, b, Some(c));
        assert_eq!(dom.children(root), vec![a, b, c]);
        assert_eq!(dom.parent(b), Some(root));

        let d = dom.create_text("d");
        dom.replace_child(root, d, b);
        assert_eq!(dom.children(root), vec![a, d, c]);
        assert_eq!(dom.parent(b), None);

        dom.remove_child(root, a);
        assert_eq!(dom.to_markup(root), "<div>dc</div>");
    }

    #[test]
    fn test_style_text_parsing() {
        let dom = MemoryDom::new();
        let el = dom.create_element("p");
        dom.set_style_text(el, "color: red; ;margin:0");
        assert_eq!(dom.style(el, "color").as_deref(), Some("red"));
        assert_eq!(dom.style(el, "margin").as_deref(), Some("0"));
        dom.set_style_text(el, "");
        assert_eq!(dom.style_text(el), "");
    }

    #[test]
    fn test_supports_property() {
        let dom = MemoryDom::new();
        let el = dom.create_element("input");
        let text = dom.create_text("x");
        assert!(dom.supports_property(el, "value"));
        assert!(!dom.supports_property(el, "data-x"));
        assert!(!dom.supports_property(text, "value"));
    }

    #[test]
    fn test_dispatch_and_remove_listener() {
        let dom = MemoryDom::new();
        let el = dom.create_element("button");
        let hits = Rc::new(Cell::new(0));
        let hits_in = hits.clone();
        let handler = EventHandler::new(move |_| hits_in.set(hits_in.get() + 1));

        dom.add_event_listener(el, "click", handler.clone());
        assert_eq!(dom.dispatch(el, &Event::new("click", el)), 1);
        assert_eq!(dom.dispatch(el, &Event::new("keydown", el)), 0);
        assert_eq!(hits.get(), 1);

        dom.remove_event_listener(el, "click", &handler);
        assert_eq!(dom.listener_count(el, "click"), 0);
    }

    #[test]
    fn test_mutation_log() {
        let dom = MemoryDom::new();
        let el = dom.create_element("p");
        dom.set_attribute(el, "class", "x");
        assert_eq!(
            dom.take_mutations(),
            vec![
                Mutation::CreateElement(el, "p".into()),
                Mutation::SetAttribute(el, "class".into(), "x".into()),
            ]
        );
        assert!(dom.take_mutations().is_empty());
    }
}
