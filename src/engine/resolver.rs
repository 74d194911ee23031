//! Resolver - expands a vnode tree into a component-free tree.
//!
//! # Algorithm
//!
//! Each child is classified (functional component, primitive, stateful
//! component, element) and:
//!
//! - primitives are boxed into text nodes
//! - elements resolve their children pairwise against the previous node's
//!   children, by position, up to the longer of the two lists
//! - components look up the instance recorded at `depth` in the previous
//!   node's component stack, reuse it if its origin matches, and otherwise
//!   unmount it and construct a fresh one
//!
//! A reused instance re-renders only when dirty (props `Rc` changed, state
//! mutated, or forced) and its `should_update` agrees. Otherwise its previous
//! output is returned as-is: same `Rc`, no hooks, no live-target work.
//!
//! Unmount notifications for vanished positions are issued here, never by the
//! differ.

use std::rc::Rc;

use super::component::{ComponentHandle, FunctionalAdapter, Origin};
use super::pass;
use super::registry::{self, ComponentId, Instance, Snapshot};
use super::resolved::{RNode, Resolved};
use crate::error::Result;
use crate::types::{merge_maps, Context, InstanceFlags, PropMap};
use crate::vnode::{box_primitive, Child, Vnode, VnodeType};

/// A fresh empty context.
pub fn empty_context() -> Context {
    Rc::new(PropMap::new())
}

/// Resolve `node` against `previous` at component nesting `depth`.
///
/// Returns `None` when there is no node. A component that rendered nothing
/// yields a [`ResolvedKind::Void`](super::ResolvedKind) node. Post-mount
/// notifications are not fired here; they belong to the differ once the
/// output is attached.
///
/// # Errors
/// [`Error::RerenderLimit`](crate::Error::RerenderLimit) if re-renders
/// requested by hooks during the pass did not settle.
pub fn resolve(
    node: Option<&Child>,
    previous: Option<&RNode>,
    depth: usize,
) -> Result<Option<RNode>> {
    pass::enter();
    let resolved = resolve_in(node, previous, depth, &empty_context());
    pass::exit()?;
    Ok(resolved)
}

pub(crate) fn resolve_in(
    node: Option<&Child>,
    previous: Option<&RNode>,
    depth: usize,
    context: &Context,
) -> Option<RNode> {
    let Some(node) = node else {
        if let Some(prev) = previous {
            unmount_subtree(prev, depth);
        }
        return None;
    };

    match node {
        Child::Primitive(value) => {
            if let Some(prev) = previous {
                unmount_subtree(prev, depth);
            }
            Some(Resolved::text(box_primitive(value)))
        }
        Child::Node(vnode) => match &vnode.kind {
            VnodeType::Function(function) => resolve_component(
                vnode,
                Origin::Function(function.clone()),
                previous,
                depth,
                context,
            ),
            VnodeType::Component(ty) => {
                resolve_component(vnode, Origin::Class(ty.clone()), previous, depth, context)
            }
            VnodeType::Tag(tag) => Some(resolve_element(vnode, tag, previous, depth, context)),
        },
    }
}

// =============================================================================
// Elements
// =============================================================================

fn resolve_element(
    vnode: &Rc<Vnode>,
    tag: &Rc<str>,
    previous: Option<&RNode>,
    depth: usize,
    context: &Context,
) -> RNode {
    let prev_children = match previous {
        Some(prev) => {
            // Instances that produced the previous node here are gone; children still pair up.
            for id in prev.stack_from(depth) {
                unmount_instance(id);
            }
            prev.children()
        }
        None => Vec::new(),
    };

    let len = vnode.children.len().max(prev_children.len());
    let mut children: Vec<Option<RNode>> = (0..len)
        .map(|i| {
            resolve_in(
                vnode.children.get(i),
                prev_children.get(i).and_then(Option::as_ref),
                0,
                context,
            )
        })
        .collect();

    while matches!(children.last(), Some(None)) {
        children.pop();
    }

    Resolved::element(tag.clone(), vnode.props.clone(), children)
}

// =============================================================================
// Components
// =============================================================================

fn resolve_component(
    vnode: &Rc<Vnode>,
    origin: Origin,
    previous: Option<&RNode>,
    depth: usize,
    context: &Context,
) -> Option<RNode> {
    let existing = previous.and_then(|prev| prev.stack_at(depth));
    let reusable = existing.filter(|&id| {
        registry::with_instance(id, |inst| inst.origin.matches(&origin)).unwrap_or(false)
    });

    match reusable {
        Some(id) => {
            tracing::trace!(%id, component = origin.name(), depth, "reusing instance");
            update_instance(id, vnode, false, depth, context)
        }
        None => {
            if let Some(prev) = previous {
                unmount_subtree(prev, depth);
            }
            let id = construct(vnode, origin, depth, context);
            update_instance(id, vnode, true, depth, context)
        }
    }
}

fn construct(vnode: &Rc<Vnode>, origin: Origin, depth: usize, context: &Context) -> ComponentId {
    let props = vnode.merged_props();
    let name = origin.name();

    let id = registry::allocate_instance(|id| {
        let handle = ComponentHandle::new(id);
        let component: Rc<dyn super::Component> = match &origin {
            Origin::Class(ty) => ty.construct(&props, context, handle),
            Origin::Function(function) => Rc::new(FunctionalAdapter::new(function.clone())),
        };
        let state = Rc::new(component.initial_state(&props));
        Instance::new(origin, component, props, state, context.clone(), depth)
    });
    tracing::debug!(%id, component = name, depth, "constructed instance");

    if let Some(component) = registry::component(id) {
        component.will_mount(&ComponentHandle::new(id));
    }
    id
}

/// Run the dirty-check/update state machine for one instance.
///
/// `fresh` marks a construction in this pass: fresh instances always render
/// and never see `will_update`.
pub(crate) fn update_instance(
    id: ComponentId,
    vnode: &Rc<Vnode>,
    fresh: bool,
    depth: usize,
    context: &Context,
) -> Option<RNode> {
    let component = registry::component(id)?;
    let props = vnode.merged_props();

    let props_changed = registry::with_instance_mut(id, |inst| {
        inst.flags.insert(InstanceFlags::RESOLVING);
        inst.vnode = Some(vnode.clone());
        inst.depth = depth;
        inst.snapshot = Some(Snapshot {
            props: inst.props.clone(),
            state: inst.state.clone(),
            context: inst.context.clone(),
        });
        let changed = !Rc::ptr_eq(&inst.props, &props);
        if changed {
            inst.flags.insert(InstanceFlags::DIRTY);
        }
        changed
    })?;

    if props_changed {
        component.will_receive_props(&props);
    }

    let (next_state, dirty, forced) = registry::with_instance_mut(id, |inst| {
        let next_state = inst.next_state.take().unwrap_or_else(|| inst.state.clone());
        let flags = inst.flags;
        inst.flags.remove(InstanceFlags::DIRTY | InstanceFlags::FORCE);
        (
            next_state,
            flags.contains(InstanceFlags::DIRTY),
            flags.contains(InstanceFlags::FORCE),
        )
    })?;

    let rerender =
        fresh || (dirty && (forced || component.should_update(&props, &next_state, context)));

    if !rerender {
        // Memoized: commit the inputs, hand back the previous output untouched.
        let rendered = registry::with_instance_mut(id, |inst| {
            inst.props = props;
            inst.state = next_state;
            inst.context = context.clone();
            inst.snapshot = None;
            inst.flags.remove(InstanceFlags::RESOLVING);
            inst.rendered.clone()
        })?;
        tracing::trace!(%id, dirty, "memoized");
        return rendered;
    }

    if !fresh {
        component.will_update(&props, &next_state);
    }

    let prev_rendered = registry::with_instance_mut(id, |inst| {
        inst.props = props.clone();
        inst.state = next_state.clone();
        inst.context = context.clone();
        inst.rendered.clone()
    })?;

    let raw = component.render(&props, &next_state, context);
    registry::with_instance_mut(id, |inst| inst.flags.remove(InstanceFlags::RESOLVING));

    let child_context = match component.child_context() {
        Some(extra) => Rc::new(merge_maps(context, &extra)),
        None => context.clone(),
    };
    // Rendering nothing still yields a node, so the instance stays reachable by position.
    let out = resolve_in(raw.as_ref(), prev_rendered.as_ref(), depth + 1, &child_context)
        .unwrap_or_else(Resolved::void);
    out.set_stack_at(depth, id);
    if out.live().is_none() && !out.is_void() {
        out.set_live(prev_rendered.as_ref().and_then(|prev| prev.live()));
    }
    let output = Some(out);

    let snapshot = registry::with_instance_mut(id, |inst| {
        inst.rendered = output.clone();
        inst.snapshot.clone()
    })
    .flatten();
    tracing::debug!(%id, fresh, depth, "rendered");

    if let Some(snapshot) = snapshot {
        component.did_update(&snapshot.props, &snapshot.state, &snapshot.context);
    }
    registry::with_instance_mut(id, |inst| inst.snapshot = None);

    output
}

// =============================================================================
// Unmounting
// =============================================================================

/// Unmount every instance recorded at `from_depth` or deeper, then every
/// instance anywhere below the node.
pub(crate) fn unmount_subtree(node: &RNode, from_depth: usize) {
    for id in node.stack_from(from_depth) {
        unmount_instance(id);
    }
    for child in node.children().into_iter().flatten() {
        unmount_subtree(&child, 0);
    }
}

fn unmount_instance(id: ComponentId) {
    let Some(component) = registry::component(id) else {
        return;
    };
    tracing::debug!(%id, "will_unmount");
    component.will_unmount(&ComponentHandle::new(id));
    registry::release(id);
}
