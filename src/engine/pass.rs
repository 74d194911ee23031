//! Pass bookkeeping - deferred post-mount notifications and state re-renders.
//!
//! Resolution and diffing run synchronously on the caller's stack. Two kinds of
//! work are held back until the outermost pass finishes:
//!
//! - `did_mount`, so it only fires once the live subtree is fully attached
//! - state-driven re-renders requested from hooks while a pass is running,
//!   so the live target is never patched underneath an in-progress diff
//!
//! Both queues are flushed before the outermost entry point returns. A hook
//! that keeps requesting re-renders would recurse forever; flushing is bounded
//! by `Config::max_rerender_passes` and reports [`Error::RerenderLimit`].

use std::cell::RefCell;

use super::component::ComponentHandle;
use super::registry::{self, ComponentId};
use crate::error::{Error, Result};
use crate::pipeline::config;
use crate::renderer::diff;
use crate::types::InstanceFlags;

#[derive(Default)]
struct PassState {
    depth: usize,
    mounts: Vec<ComponentId>,
    rerenders: Vec<ComponentId>,
}

thread_local! {
    static PASS: RefCell<PassState> = RefCell::new(PassState::default());
}

// =============================================================================
// Pass Scope
// =============================================================================

/// Whether a resolution/diff pass is running on this thread.
pub fn is_active() -> bool {
    PASS.with(|pass| pass.borrow().depth > 0)
}

pub(crate) fn enter() {
    PASS.with(|pass| pass.borrow_mut().depth += 1);
}

/// Leave a pass. The outermost exit flushes both queues.
pub(crate) fn exit() -> Result<()> {
    let outermost = PASS.with(|pass| {
        let mut pass = pass.borrow_mut();
        pass.depth = pass.depth.saturating_sub(1);
        pass.depth == 0
    });
    if outermost { flush() } else { Ok(()) }
}

// =============================================================================
// Queues
// =============================================================================

/// Queue `did_mount` for an instance that has not received it yet.
pub(crate) fn queue_mount(id: ComponentId) {
    let mounted = registry::with_instance(id, |inst| inst.flags.contains(InstanceFlags::MOUNTED))
        .unwrap_or(true);
    if mounted {
        return;
    }
    PASS.with(|pass| {
        let mut pass = pass.borrow_mut();
        if !pass.mounts.contains(&id) {
            pass.mounts.push(id);
        }
    });
}

/// Re-render an instance now, or queue it if a pass is running.
pub(crate) fn request_rerender(id: ComponentId) -> Result<()> {
    if is_active() {
        let queued = registry::with_instance_mut(id, |inst| {
            let already = inst.flags.contains(InstanceFlags::QUEUED);
            inst.flags.insert(InstanceFlags::QUEUED);
            already
        })
        .ok_or(Error::StaleHandle(id))?;
        if !queued {
            PASS.with(|pass| pass.borrow_mut().rerenders.push(id));
        }
        return Ok(());
    }

    let attached = registry::with_instance(id, |inst| inst.target.is_some())
        .ok_or(Error::StaleHandle(id))?;
    if !attached {
        // Never reached the live target; the next pass picks the dirty flag up.
        return Ok(());
    }

    enter();
    diff::rerender_instance(id);
    exit()
}

fn flush() -> Result<()> {
    let limit = config().max_rerender_passes;
    let mut rounds = 0;

    loop {
        let (mounts, rerenders) = PASS.with(|pass| {
            let mut pass = pass.borrow_mut();
            (
                std::mem::take(&mut pass.mounts),
                std::mem::take(&mut pass.rerenders),
            )
        });
        if mounts.is_empty() && rerenders.is_empty() {
            return Ok(());
        }

        rounds += 1;
        if rounds > limit {
            for id in rerenders {
                registry::with_instance_mut(id, |inst| inst.flags.remove(InstanceFlags::QUEUED));
            }
            tracing::error!(limit, "state-driven re-renders did not settle");
            return Err(Error::RerenderLimit { limit });
        }

        // Work done here counts as in-pass: nested requests land in the next round.
        PASS.with(|pass| pass.borrow_mut().depth = 1);

        for id in mounts {
            deliver_mount(id);
        }
        for id in rerenders {
            let dirty = registry::with_instance_mut(id, |inst| {
                inst.flags.remove(InstanceFlags::QUEUED);
                inst.flags.contains(InstanceFlags::DIRTY) && inst.target.is_some()
            })
            .unwrap_or(false);
            if dirty {
                diff::rerender_instance(id);
            }
        }

        PASS.with(|pass| pass.borrow_mut().depth = 0);
    }
}

fn deliver_mount(id: ComponentId) {
    let component = registry::with_instance_mut(id, |inst| {
        if inst.flags.contains(InstanceFlags::MOUNTED) {
            return None;
        }
        inst.flags.insert(InstanceFlags::MOUNTED);
        Some(inst.component.clone())
    })
    .flatten();

    if let Some(component) = component {
        tracing::debug!(%id, "did_mount");
        component.did_mount(&ComponentHandle::new(id));
    }
}

/// Clear pass state (for testing).
pub(crate) fn reset_pass() {
    PASS.with(|pass| *pass.borrow_mut() = PassState::default());
}
