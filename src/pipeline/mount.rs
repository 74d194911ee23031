//! Mount API - attach a vnode tree under a live parent and keep it updated.
//!
//! # Example
//!
//! ```ignore
//! let dom = MemoryDom::new();
//! let root = dom.create_element("body");
//! let target: Target = dom.clone();
//!
//! let mut handle = render(h("p", props! {}, ["one".into()]), &target, root, None)?;
//! handle.update(h("p", props! {}, ["two".into()]))?;
//! handle.unmount()?;
//! ```

use crate::engine::RNode;
use crate::error::Result;
use crate::renderer::diff::diff_into;
use crate::renderer::{LiveNode, Target};
use crate::vnode::Child;

/// Handle to a mounted tree.
///
/// Holds the resolved tree of the last render so the next update can be
/// diffed against it.
pub struct MountHandle {
    target: Target,
    parent: LiveNode,
    live: Option<LiveNode>,
    tree: Option<RNode>,
}

impl MountHandle {
    /// Live root node. Follows replacements made by state-driven re-renders.
    pub fn live(&self) -> Option<LiveNode> {
        match &self.tree {
            Some(tree) if !tree.is_void() => tree.live(),
            Some(_) => None,
            None => self.live,
        }
    }

    /// Resolved tree of the last render.
    pub fn tree(&self) -> Option<&RNode> {
        self.tree.as_ref()
    }

    pub fn parent(&self) -> LiveNode {
        self.parent
    }

    /// Re-render with a new root vnode.
    pub fn update(&mut self, vnode: impl Into<Child>) -> Result<()> {
        let child = vnode.into();
        let rendered = diff_into(
            &self.target,
            self.live(),
            Some(self.parent),
            Some(&child),
            self.tree.as_ref(),
        )?;
        self.live = rendered.live;
        self.tree = rendered.tree;
        Ok(())
    }

    /// Remove the tree from the live target, unmounting every instance in it.
    pub fn unmount(self) -> Result<()> {
        tracing::debug!(parent = self.parent.index(), "unmount");
        diff_into(
            &self.target,
            self.live(),
            Some(self.parent),
            None,
            self.tree.as_ref(),
        )?;
        Ok(())
    }
}

/// Mount `vnode` under `parent`.
///
/// `existing` is a live node already standing in the tree's place; it is
/// replaced by the rendered root. The root is appended to `parent` unless it
/// is already attached there.
pub fn render(
    vnode: impl Into<Child>,
    target: &Target,
    parent: LiveNode,
    existing: Option<LiveNode>,
) -> Result<MountHandle> {
    let child = vnode.into();
    tracing::debug!(parent = parent.index(), "mount");
    let rendered = diff_into(target, existing, Some(parent), Some(&child), None)?;

    if let Some(live) = rendered.live {
        if target.parent(live) != Some(parent) {
            target.append_child(parent, live);
        }
    }

    Ok(MountHandle {
        target: target.clone(),
        parent,
        live: rendered.live,
        tree: rendered.tree,
    })
}
