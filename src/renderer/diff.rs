//! Differ - patches the live target to match a resolved tree.
//!
//! The differ compares the new resolved tree to the previous one and only
//! touches live nodes whose position changed.
//!
//! # Algorithm
//!
//! 1. Resolve the new vnode against the previous resolved tree
//! 2. For each position, in order:
//!    - Same `Rc` as before (memoized): rebind, no live work
//!    - Nothing before, or no live node yet: materialize and attach
//!    - Nothing now: detach the live node
//!    - Shape changed (text vs element, or different tag): materialize and replace
//!    - Both text: set the text if it changed
//!    - Same element: reconcile props, then recurse into children by position
//! 3. Leave the pass; the outermost exit delivers `did_mount` (innermost first)
//!    and any re-renders hooks requested meanwhile
//!
//! Children are paired strictly by index. There is no key matching or move
//! detection: reordering same-typed children diffs every shifted position
//! against the wrong previous child.

use std::rc::Rc;

use super::attributes::apply_props;
use super::target::{LiveNode, Target};
use crate::engine::registry::{self, ComponentId};
use crate::engine::{pass, resolver, RNode, ResolvedKind};
use crate::error::Result;
use crate::pipeline::config::config;
use crate::vnode::Child;

/// Outcome of one diff: the live root and the resolved tree to diff against next time.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub live: Option<LiveNode>,
    pub tree: Option<RNode>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Resolve `vnode` against `previous` and patch `live` to match.
///
/// The live parent is read from the target. Use [`render`](crate::render) to
/// attach under an explicit parent.
pub fn diff(
    target: &Target,
    live: Option<LiveNode>,
    vnode: Option<&Child>,
    previous: Option<&RNode>,
) -> Result<Rendered> {
    let parent = live.and_then(|node| target.parent(node));
    diff_into(target, live, parent, vnode, previous)
}

pub(crate) fn diff_into(
    target: &Target,
    live: Option<LiveNode>,
    parent: Option<LiveNode>,
    vnode: Option<&Child>,
    previous: Option<&RNode>,
) -> Result<Rendered> {
    pass::enter();
    let tree = resolver::resolve_in(vnode, previous, 0, &resolver::empty_context());
    let live = patch(target, live, parent, tree.as_ref(), previous, None);
    tracing::debug!(live = ?live.map(|n| n.index()), "diff applied");
    pass::exit()?;
    Ok(Rendered { live, tree })
}

/// Patch one position of an already resolved tree.
///
/// # Arguments
/// * `live` - Live node currently at this position, if any
/// * `parent` - Live parent to attach to or detach from
/// * `node` - New resolved node (`None` = position is now absent)
/// * `previous` - Resolved node `live` was built from
///
/// # Returns
/// The live node now at this position.
pub fn idiff(
    target: &Target,
    live: Option<LiveNode>,
    parent: Option<LiveNode>,
    node: Option<&RNode>,
    previous: Option<&RNode>,
) -> Result<Option<LiveNode>> {
    pass::enter();
    let live = patch(target, live, parent, node, previous, None);
    pass::exit()?;
    Ok(live)
}

// =============================================================================
// Patching
// =============================================================================

fn patch(
    target: &Target,
    live: Option<LiveNode>,
    parent: Option<LiveNode>,
    node: Option<&RNode>,
    previous: Option<&RNode>,
    position: Option<usize>,
) -> Option<LiveNode> {
    let previous = previous.filter(|p| !p.is_void());

    let Some(node) = node.filter(|n| !n.is_void()) else {
        if let Some(live) = live {
            detach(target, live);
        }
        // Instances that render nothing still learn where they would attach.
        if let Some(void) = node {
            bind(target, void, None, parent);
        }
        return None;
    };

    let (Some(prev), Some(live)) = (previous, live) else {
        let fresh = materialize(target, node)?;
        match live {
            Some(old) => replace(target, parent, fresh, old),
            None => {
                if let Some(parent) = parent {
                    let reference = position.and_then(|i| target.children(parent).get(i).copied());
                    target.insert_before(parent, fresh, reference);
                }
            }
        }
        bind(target, node, Some(fresh), parent);
        return Some(fresh);
    };

    if Rc::ptr_eq(node, prev) {
        bind(target, node, Some(live), parent);
        return Some(live);
    }

    match (node.kind_cloned(), prev.kind_cloned()) {
        (ResolvedKind::Text(new), ResolvedKind::Text(old)) => {
            if new.text != old.text {
                target.set_text(live, &new.text);
            }
        }
        (
            ResolvedKind::Element {
                tag,
                props,
                children,
            },
            ResolvedKind::Element {
                tag: old_tag,
                props: old_props,
                children: old_children,
            },
        ) if tag == old_tag => {
            let raw_key = config().raw_markup_key.clone();
            let raw = props.contains_key(&raw_key);
            if raw && !old_props.contains_key(&raw_key) {
                // Raw markup takes over the content.
                for child in old_children.iter().flatten() {
                    if let Some(child_live) = child.live() {
                        target.remove_child(live, child_live);
                    }
                }
            }
            apply_props(&**target, live, &props, Some(&*old_props));
            if !raw {
                patch_children(target, live, &children, &old_children);
            }
        }
        _ => {
            let fresh = materialize(target, node)?;
            replace(target, parent, fresh, live);
            bind(target, node, Some(fresh), parent);
            return Some(fresh);
        }
    }

    bind(target, node, Some(live), parent);
    Some(live)
}

fn patch_children(
    target: &Target,
    parent: LiveNode,
    children: &[Option<RNode>],
    old_children: &[Option<RNode>],
) {
    let len = children.len().max(old_children.len());
    let mut placed = 0;
    for i in 0..len {
        let new = children.get(i).and_then(Option::as_ref);
        let old = old_children.get(i).and_then(Option::as_ref);
        let live = old.and_then(|o| o.live());
        if patch(target, live, Some(parent), new, old, Some(placed)).is_some() {
            placed += 1;
        }
    }
}

fn detach(target: &Target, live: LiveNode) {
    match target.parent(live) {
        Some(parent) => target.remove_child(parent, live),
        None => tracing::warn!(node = live.index(), "detaching a node with no live parent"),
    }
}

fn replace(target: &Target, parent: Option<LiveNode>, fresh: LiveNode, old: LiveNode) {
    match target.parent(old).or(parent) {
        Some(parent) => target.replace_child(parent, fresh, old),
        None => tracing::warn!(node = old.index(), "replacing a node with no live parent"),
    }
}

// =============================================================================
// Materialization
// =============================================================================

/// Build a detached live subtree for `node`. `None` for void nodes.
fn materialize(target: &Target, node: &RNode) -> Option<LiveNode> {
    match node.kind_cloned() {
        ResolvedKind::Void => None,
        ResolvedKind::Text(boxed) => Some(target.create_text(&boxed.text)),
        ResolvedKind::Element {
            tag,
            props,
            children,
        } => {
            let element = target.create_element(&tag);
            apply_props(&**target, element, &props, None);
            if !props.contains_key(&config().raw_markup_key) {
                for child in children.iter().flatten() {
                    let child_live = materialize(target, child);
                    if let Some(child_live) = child_live {
                        target.append_child(element, child_live);
                    }
                    bind(target, child, child_live, Some(element));
                }
            }
            Some(element)
        }
    }
}

/// Record `live` on the node and the attach point on every instance in its
/// stack, innermost first, queueing `did_mount` for those that have not had
/// it. Void nodes bind with no live node and queue nothing.
fn bind(target: &Target, node: &RNode, live: Option<LiveNode>, parent: Option<LiveNode>) {
    node.set_live(live);
    for id in node.stack().into_iter().rev() {
        registry::with_instance_mut(id, |inst| {
            inst.parent_live = parent;
            inst.target = Some(target.clone());
        });
        if live.is_some() {
            pass::queue_mount(id);
        }
    }
}

// =============================================================================
// State-Driven Re-Render
// =============================================================================

/// Re-render one instance in place and patch its live subtree.
///
/// The new output is folded into the instance's previous output node, so
/// every ancestor's resolved tree sees the change without being re-resolved.
pub(crate) fn rerender_instance(id: ComponentId) {
    let snapshot = registry::with_instance(id, |inst| {
        Some((
            inst.vnode.clone()?,
            inst.rendered.clone(),
            inst.depth,
            inst.context.clone(),
            inst.target.clone()?,
            inst.parent_live,
        ))
    })
    .flatten();
    let Some((vnode, rendered, depth, context, target, parent_live)) = snapshot else {
        tracing::debug!(%id, "re-render skipped, instance not attached");
        return;
    };

    tracing::debug!(%id, "state-driven re-render");
    let live = rendered.as_ref().and_then(|r| r.live());
    let output = resolver::update_instance(id, &vnode, false, depth, &context);
    let parent = live.and_then(|l| target.parent(l)).or(parent_live);
    // A node coming back from void goes in front of its next attached sibling.
    let position = match (live, parent, &rendered) {
        (None, Some(parent), Some(old)) => old
            .next_live_sibling()
            .and_then(|anchor| target.children(parent).iter().position(|&c| c == anchor)),
        _ => None,
    };
    let new_live = patch(&target, live, parent, output.as_ref(), rendered.as_ref(), position);

    match (&rendered, &output) {
        (Some(old), Some(new)) if !Rc::ptr_eq(old, new) => old.adopt(new),
        (Some(old), None) => old.void_out(),
        _ => {}
    }

    let canonical = rendered.or(output);
    if let Some(node) = &canonical {
        bind(&target, node, new_live, parent);
    }
    registry::with_instance_mut(id, |inst| inst.rendered = canonical);
}
