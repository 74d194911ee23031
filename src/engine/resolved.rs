//! Resolved tree - component-free output of the resolver.
//!
//! Every resolved node carries:
//! - its content ([`ResolvedKind`]): a boxed primitive or an element
//! - the component stack: ids of the instances that, nested, produced it,
//!   indexed by nesting depth (outermost first)
//! - the live-node back-reference set by the differ
//! - a weak link to the element it sits under, with its index there
//!
//! The stack is a weak lookup, never ownership. It is interior-mutable because
//! a memoized output is shared between an instance and every ancestor that
//! re-renders around it; each of them writes its own depth slot.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::registry::ComponentId;
use crate::renderer::LiveNode;
use crate::types::Props;
use crate::vnode::BoxedPrimitive;

/// Shared handle to a resolved node.
pub type RNode = Rc<Resolved>;

/// Content of a resolved node.
#[derive(Clone, Debug)]
pub enum ResolvedKind {
    Text(BoxedPrimitive),
    Element {
        tag: Rc<str>,
        props: Props,
        children: Vec<Option<RNode>>,
    },
    /// A component rendered nothing. Keeps the component stack reachable;
    /// treated as absent by the differ.
    Void,
}

pub struct Resolved {
    kind: RefCell<ResolvedKind>,
    stack: RefCell<Vec<Option<ComponentId>>>,
    live: Cell<Option<LiveNode>>,
    parent: RefCell<Weak<Resolved>>,
    slot: Cell<usize>,
}

impl Resolved {
    fn with_kind(kind: ResolvedKind) -> RNode {
        let node = Rc::new(Self {
            kind: RefCell::new(kind),
            stack: RefCell::new(Vec::new()),
            live: Cell::new(None),
            parent: RefCell::new(Weak::new()),
            slot: Cell::new(0),
        });
        node.link_children();
        node
    }

    /// Point every child's parent link at this node.
    fn link_children(self: &Rc<Self>) {
        for (slot, child) in self.children().into_iter().enumerate() {
            if let Some(child) = child {
                *child.parent.borrow_mut() = Rc::downgrade(self);
                child.slot.set(slot);
            }
        }
    }

    pub fn text(boxed: BoxedPrimitive) -> RNode {
        Self::with_kind(ResolvedKind::Text(boxed))
    }

    pub fn void() -> RNode {
        Self::with_kind(ResolvedKind::Void)
    }

    pub fn element(tag: Rc<str>, props: Props, children: Vec<Option<RNode>>) -> RNode {
        Self::with_kind(ResolvedKind::Element {
            tag,
            props,
            children,
        })
    }

    /// Borrow the content. Do not hold across calls back into the engine.
    pub fn kind(&self) -> Ref<'_, ResolvedKind> {
        self.kind.borrow()
    }

    /// Clone of the content (children are `Rc` clones).
    pub fn kind_cloned(&self) -> ResolvedKind {
        self.kind.borrow().clone()
    }

    pub fn is_void(&self) -> bool {
        matches!(*self.kind.borrow(), ResolvedKind::Void)
    }

    pub fn is_text(&self) -> bool {
        matches!(*self.kind.borrow(), ResolvedKind::Text(_))
    }

    pub fn tag(&self) -> Option<Rc<str>> {
        match &*self.kind.borrow() {
            ResolvedKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn props(&self) -> Option<Props> {
        match &*self.kind.borrow() {
            ResolvedKind::Element { props, .. } => Some(props.clone()),
            _ => None,
        }
    }

    pub fn text_value(&self) -> Option<Rc<str>> {
        match &*self.kind.borrow() {
            ResolvedKind::Text(boxed) => Some(boxed.text.clone()),
            _ => None,
        }
    }

    /// Children, empty for text and void nodes.
    pub fn children(&self) -> Vec<Option<RNode>> {
        match &*self.kind.borrow() {
            ResolvedKind::Element { children, .. } => children.clone(),
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Component Stack
    // =========================================================================

    /// Instance recorded at `depth`.
    pub fn stack_at(&self, depth: usize) -> Option<ComponentId> {
        self.stack.borrow().get(depth).copied().flatten()
    }

    /// Record `id` at `depth`, keeping entries at other depths.
    pub(crate) fn set_stack_at(&self, depth: usize, id: ComponentId) {
        let mut stack = self.stack.borrow_mut();
        if stack.len() <= depth {
            stack.resize(depth + 1, None);
        }
        stack[depth] = Some(id);
    }

    /// Recorded instances, outermost first.
    pub fn stack(&self) -> Vec<ComponentId> {
        self.stack.borrow().iter().flatten().copied().collect()
    }

    /// Recorded instances at `depth` and deeper, outermost first.
    pub fn stack_from(&self, depth: usize) -> Vec<ComponentId> {
        self.stack
            .borrow()
            .iter()
            .skip(depth)
            .flatten()
            .copied()
            .collect()
    }

    // =========================================================================
    // Live Back-Reference
    // =========================================================================

    pub fn live(&self) -> Option<LiveNode> {
        self.live.get()
    }

    pub(crate) fn set_live(&self, live: Option<LiveNode>) {
        self.live.set(live);
    }

    /// Live node of the nearest later sibling that has one.
    ///
    /// Used as the insertion reference when this node gains a live node
    /// outside a full pass over its parent.
    pub(crate) fn next_live_sibling(&self) -> Option<LiveNode> {
        let parent = self.parent.borrow().upgrade()?;
        let children = parent.children();
        children
            .iter()
            .skip(self.slot.get() + 1)
            .flatten()
            .find_map(|child| child.live())
    }

    // =========================================================================
    // In-Place Replacement
    // =========================================================================

    /// Take over the content of `other`, keeping this node's identity.
    ///
    /// Stack entries recorded in `other` win; shallower entries of this node
    /// (outer instances that did not take part) are kept.
    pub(crate) fn adopt(self: &Rc<Self>, other: &Resolved) {
        *self.kind.borrow_mut() = other.kind_cloned();
        {
            let theirs = other.stack.borrow().clone();
            let mut ours = self.stack.borrow_mut();
            if ours.len() < theirs.len() {
                ours.resize(theirs.len(), None);
            }
            for (depth, entry) in theirs.into_iter().enumerate() {
                if entry.is_some() {
                    ours[depth] = entry;
                }
            }
        }
        self.live.set(other.live.get());
        self.link_children();
    }

    /// Mark this node as rendering nothing, keeping its stack for instance lookup.
    pub(crate) fn void_out(&self) {
        *self.kind.borrow_mut() = ResolvedKind::Void;
        self.live.set(None);
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("kind", &*self.kind.borrow())
            .field("stack", &*self.stack.borrow())
            .field("live", &self.live.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PropMap, Primitive};
    use crate::vnode::box_primitive;

    fn id(index: usize) -> ComponentId {
        ComponentId::from_raw(index, 0)
    }

    #[test]
    fn test_stack_is_depth_indexed() {
        let node = Resolved::text(box_primitive(&Primitive::from("x")));
        node.set_stack_at(1, id(7));
        assert_eq!(node.stack_at(0), None);
        assert_eq!(node.stack_at(1), Some(id(7)));

        node.set_stack_at(0, id(3));
        assert_eq!(node.stack(), vec![id(3), id(7)]);
        assert_eq!(node.stack_from(1), vec![id(7)]);

        // Writing the same depth again is idempotent.
        node.set_stack_at(0, id(3));
        assert_eq!(node.stack(), vec![id(3), id(7)]);
    }

    #[test]
    fn test_adopt_keeps_outer_entries() {
        let old = Resolved::element(Rc::from("div"), Rc::new(PropMap::new()), vec![]);
        old.set_stack_at(0, id(1));
        old.set_stack_at(1, id(2));

        let new = Resolved::text(box_primitive(&Primitive::from("y")));
        new.set_stack_at(1, id(2));
        new.set_live(Some(LiveNode::new(9)));

        old.adopt(&new);
        assert!(old.is_text());
        assert_eq!(old.stack(), vec![id(1), id(2)]);
        assert_eq!(old.live(), Some(LiveNode::new(9)));
    }

    #[test]
    fn test_next_live_sibling_skips_unattached() {
        let hidden = Resolved::void();
        let empty = Resolved::void();
        let tail = Resolved::text(box_primitive(&Primitive::from("tail")));
        tail.set_live(Some(LiveNode::new(5)));
        let parent = Resolved::element(
            Rc::from("div"),
            Rc::new(PropMap::new()),
            vec![Some(hidden.clone()), None, Some(empty), Some(tail.clone())],
        );

        assert_eq!(hidden.next_live_sibling(), Some(LiveNode::new(5)));
        assert_eq!(tail.next_live_sibling(), None);
        drop(parent);
        assert_eq!(hidden.next_live_sibling(), None);
    }

    #[test]
    fn test_adopt_relinks_children() {
        let old = Resolved::void();
        let shown = Resolved::text(box_primitive(&Primitive::from("a")));
        let after = Resolved::text(box_primitive(&Primitive::from("b")));
        after.set_live(Some(LiveNode::new(2)));
        let new = Resolved::element(
            Rc::from("p"),
            Rc::new(PropMap::new()),
            vec![Some(shown.clone()), Some(after)],
        );

        old.adopt(&new);
        drop(new);
        assert_eq!(shown.next_live_sibling(), Some(LiveNode::new(2)));
    }

    #[test]
    fn test_void_out() {
        let node = Resolved::text(box_primitive(&Primitive::from("z")));
        node.set_stack_at(0, id(4));
        node.set_live(Some(LiveNode::new(1)));
        node.void_out();
        assert!(node.is_void());
        assert_eq!(node.live(), None);
        assert_eq!(node.stack_at(0), Some(id(4)));
    }
}
