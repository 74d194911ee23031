//! Component Registry - Arena of component instances.
//!
//! Manages the lifecycle of instance slots:
//! - Slot index + generation → [`ComponentId`]
//! - Free index pool for O(1) reuse
//! - Generation bump on release so stale handles never alias a new instance
//!
//! Instances are never owned by vnodes. A resolved node only records the ids of
//! the instances that produced it (its component stack); the arena owns the
//! instances until their position disappears.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::component::{Component, Origin};
use super::resolved::RNode;
use crate::renderer::{LiveNode, Target};
use crate::types::{Context, InstanceFlags, Props, State};
use crate::vnode::Vnode;

// =============================================================================
// Ids and Instances
// =============================================================================

/// Generation-checked index of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId {
    index: usize,
    generation: u32,
}

impl ComponentId {
    pub fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub(crate) fn from_raw(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}.{}", self.index, self.generation)
    }
}

/// Rollback snapshot, valid only during one resolution pass.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub props: Props,
    pub state: State,
    pub context: Context,
}

/// A mounted component instance.
pub(crate) struct Instance {
    pub origin: Origin,
    pub component: Rc<dyn Component>,
    pub props: Props,
    pub state: State,
    pub context: Context,
    /// State merged by `set_state`, consumed by the next pass.
    pub next_state: Option<State>,
    pub snapshot: Option<Snapshot>,
    pub flags: InstanceFlags,
    /// Latest resolved output.
    pub rendered: Option<RNode>,
    /// Latest input vnode, replayed by state-driven re-renders.
    pub vnode: Option<Rc<Vnode>>,
    pub depth: usize,
    /// Live parent the output attaches under, recorded even while it renders nothing.
    pub parent_live: Option<LiveNode>,
    pub target: Option<Target>,
}

impl Instance {
    pub(crate) fn new(
        origin: Origin,
        component: Rc<dyn Component>,
        props: Props,
        state: State,
        context: Context,
        depth: usize,
    ) -> Self {
        Self {
            origin,
            component,
            props,
            state,
            context,
            next_state: None,
            snapshot: None,
            flags: InstanceFlags::NONE,
            rendered: None,
            vnode: None,
            depth,
            parent_live: None,
            target: None,
        }
    }
}

struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Instance slots, indexed by `ComponentId::index`.
    static SLOTS: RefCell<Vec<Slot>> = const { RefCell::new(Vec::new()) };

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate a slot and install the instance built by `build`.
///
/// `build` runs with no registry borrow held, so constructors may use their
/// handle (reads return `None` until the instance is installed).
pub(crate) fn allocate_instance(build: impl FnOnce(ComponentId) -> Instance) -> ComponentId {
    let index = FREE_INDICES.with(|free| free.borrow_mut().pop());
    let id = SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        match index {
            Some(index) => ComponentId {
                index,
                generation: slots[index].generation,
            },
            None => {
                slots.push(Slot {
                    generation: 0,
                    instance: None,
                });
                ComponentId {
                    index: slots.len() - 1,
                    generation: 0,
                }
            }
        }
    });

    let instance = build(id);

    SLOTS.with(|slots| {
        slots.borrow_mut()[id.index].instance = Some(instance);
    });
    id
}

/// Release an instance back to the pool, returning it.
pub(crate) fn release(id: ComponentId) -> Option<Instance> {
    let instance = SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        let slot = slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(instance)
    })?;

    FREE_INDICES.with(|free| free.borrow_mut().push(id.index));
    Some(instance)
}

// =============================================================================
// Lookups
// =============================================================================

/// Read an instance. `None` if the id is stale.
///
/// The registry stays borrowed while `f` runs: never call component hooks from `f`.
pub(crate) fn with_instance<R>(id: ComponentId, f: impl FnOnce(&Instance) -> R) -> Option<R> {
    SLOTS.with(|slots| {
        let slots = slots.borrow();
        let slot = slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.instance.as_ref().map(f)
    })
}

/// Mutate an instance. `None` if the id is stale.
pub(crate) fn with_instance_mut<R>(id: ComponentId, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
    SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        let slot = slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.instance.as_mut().map(f)
    })
}

/// The component object of an instance, cloned out so hooks run without a borrow.
pub(crate) fn component(id: ComponentId) -> Option<Rc<dyn Component>> {
    with_instance(id, |inst| inst.component.clone())
}

/// Check if an id refers to a live instance.
pub fn is_alive(id: ComponentId) -> bool {
    with_instance(id, |_| ()).is_some()
}

/// Get the count of live instances.
pub fn instance_count() -> usize {
    SLOTS.with(|slots| {
        slots
            .borrow()
            .iter()
            .filter(|slot| slot.instance.is_some())
            .count()
    })
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every instance without notifying it (for testing).
pub fn reset_registry() {
    // Move the slots out first: dropping instances may drop user components.
    let slots = SLOTS.with(|slots| std::mem::take(&mut *slots.borrow_mut()));
    drop(slots);
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    super::pass::reset_pass();
}
