//! Component capability set.
//!
//! A stateful rendering unit implements [`Component`] (render, update predicate,
//! lifecycle notifications) and [`Construct`] (how a fresh instance is built).
//! Plain rendering functions are wrapped in [`FunctionComponent`] and run
//! through a built-in adapter so they get the same instance-based treatment.
//!
//! Hooks take `&self`: a hook may reenter the engine (e.g. call
//! [`ComponentHandle::set_state`]) while the engine holds the instance, so
//! components keep their own mutable fields in `Cell`/`RefCell`.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use super::pass;
use super::registry::{self, ComponentId};
use crate::error::{Error, Result};
use crate::types::{merge_maps, Context, InstanceFlags, PropMap, Props, State};
use crate::vnode::Child;

// =============================================================================
// Component Trait
// =============================================================================

/// Capability set required of a stateful rendering unit.
///
/// Only [`render`](Component::render) is required. Hook order within one
/// resolution pass:
///
/// ```text
/// fresh:   will_mount → render → did_update ... (after commit) did_mount
/// reused:  [will_receive_props] → should_update → will_update → render → did_update
/// removed: will_unmount
/// ```
pub trait Component: 'static {
    /// Produce the raw subtree. `None` means "nothing at this position".
    fn render(&self, props: &Props, state: &State, context: &Context) -> Option<Child>;

    /// Update-necessity predicate. Not consulted for fresh instances.
    fn should_update(&self, _next_props: &Props, _next_state: &State, _next_context: &Context) -> bool {
        true
    }

    /// Initial state, read once right after construction.
    fn initial_state(&self, _props: &Props) -> PropMap {
        PropMap::new()
    }

    /// Extra context entries for descendants.
    fn child_context(&self) -> Option<PropMap> {
        None
    }

    /// Pre-mount.
    fn will_mount(&self, _handle: &ComponentHandle) {}

    /// Post-mount, once the live subtree is attached.
    fn did_mount(&self, _handle: &ComponentHandle) {}

    /// Pre-unmount.
    fn will_unmount(&self, _handle: &ComponentHandle) {}

    /// Props-incoming, fired when the props `Rc` changed.
    fn will_receive_props(&self, _next_props: &Props) {}

    /// Pre-update. The handle still reports the previous props/state here.
    fn will_update(&self, _next_props: &Props, _next_state: &State) {}

    /// Post-update. Fires after every render, including the first.
    fn did_update(&self, _prev_props: &Props, _prev_state: &State, _prev_context: &Context) {}
}

/// How a fresh instance of a stateful component is built.
pub trait Construct: Component + Sized {
    fn construct(props: &Props, context: &Context, handle: ComponentHandle) -> Self;
}

// =============================================================================
// Component Descriptors
// =============================================================================

type ConstructFn = fn(&Props, &Context, ComponentHandle) -> Rc<dyn Component>;

fn construct_erased<C: Construct>(
    props: &Props,
    context: &Context,
    handle: ComponentHandle,
) -> Rc<dyn Component> {
    Rc::new(C::construct(props, context, handle))
}

/// Stateful component descriptor (the vnode `type` of a component node).
///
/// Two descriptors match when they were built for the same Rust type.
#[derive(Clone)]
pub struct ComponentType {
    type_id: TypeId,
    name: &'static str,
    construct: ConstructFn,
}

impl ComponentType {
    pub fn of<C: Construct>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            construct: construct_erased::<C>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self, props: &Props, context: &Context, handle: ComponentHandle) -> Rc<dyn Component> {
        (self.construct)(props, context, handle)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

type RenderFn = dyn Fn(&Props, &Context) -> Option<Child>;

/// Plain rendering function used as a vnode `type`.
///
/// Identity is the allocation: clone a `FunctionComponent` to reuse it across
/// renders, building a new one each render remounts the position.
#[derive(Clone)]
pub struct FunctionComponent {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl FunctionComponent {
    pub fn new(
        name: &'static str,
        render: impl Fn(&Props, &Context) -> Option<Child> + 'static,
    ) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, props: &Props, context: &Context) -> Option<Child> {
        (self.render)(props, context)
    }
}

impl PartialEq for FunctionComponent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionComponent({})", self.name)
    }
}

/// Adapter giving a plain function the instance-based treatment. No behavior of its own.
pub(crate) struct FunctionalAdapter {
    function: FunctionComponent,
}

impl FunctionalAdapter {
    pub(crate) fn new(function: FunctionComponent) -> Self {
        Self { function }
    }
}

impl Component for FunctionalAdapter {
    fn render(&self, props: &Props, _state: &State, context: &Context) -> Option<Child> {
        self.function.call(props, context)
    }
}

/// Constructor identity an instance was created from.
#[derive(Clone, Debug)]
pub(crate) enum Origin {
    Class(ComponentType),
    Function(FunctionComponent),
}

impl Origin {
    pub(crate) fn matches(&self, other: &Origin) -> bool {
        match (self, other) {
            (Origin::Class(a), Origin::Class(b)) => a == b,
            (Origin::Function(a), Origin::Function(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Origin::Class(ty) => ty.name(),
            Origin::Function(func) => func.name(),
        }
    }
}

// =============================================================================
// State Updates
// =============================================================================

type StateFn = Box<dyn FnOnce(&PropMap, &PropMap) -> PropMap>;

/// Partial state handed to [`ComponentHandle::set_state`].
pub enum StateUpdate {
    /// Shallow-merge these entries.
    Merge(PropMap),
    /// Compute the entries from `(state, props)`.
    With(StateFn),
}

impl StateUpdate {
    pub fn with(f: impl FnOnce(&PropMap, &PropMap) -> PropMap + 'static) -> Self {
        StateUpdate::With(Box::new(f))
    }
}

impl From<PropMap> for StateUpdate {
    fn from(value: PropMap) -> Self {
        StateUpdate::Merge(value)
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Merge(map) => f.debug_tuple("Merge").field(map).finish(),
            StateUpdate::With(_) => write!(f, "With(..)"),
        }
    }
}

// =============================================================================
// Component Handle
// =============================================================================

/// Handle to a live component instance.
///
/// Handed to the constructor and to the mount/unmount hooks. Cheap to copy;
/// becomes stale once the instance is unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    id: ComponentId,
}

impl ComponentHandle {
    pub(crate) fn new(id: ComponentId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Whether the instance is still alive.
    pub fn is_alive(&self) -> bool {
        registry::is_alive(self.id)
    }

    /// Whether `did_mount` has been delivered.
    pub fn is_mounted(&self) -> bool {
        registry::with_instance(self.id, |inst| inst.flags.contains(InstanceFlags::MOUNTED))
            .unwrap_or(false)
    }

    /// Externally visible props.
    pub fn props(&self) -> Option<Props> {
        registry::with_instance(self.id, |inst| inst.props.clone())
    }

    /// Externally visible state.
    pub fn state(&self) -> Option<State> {
        registry::with_instance(self.id, |inst| inst.state.clone())
    }

    /// Externally visible context.
    pub fn context(&self) -> Option<Context> {
        registry::with_instance(self.id, |inst| inst.context.clone())
    }

    /// Props captured at the start of the current resolution pass. `None` outside a pass.
    pub fn previous_props(&self) -> Option<Props> {
        registry::with_instance(self.id, |inst| inst.snapshot.as_ref().map(|s| s.props.clone()))
            .flatten()
    }

    /// State captured at the start of the current resolution pass. `None` outside a pass.
    pub fn previous_state(&self) -> Option<State> {
        registry::with_instance(self.id, |inst| inst.snapshot.as_ref().map(|s| s.state.clone()))
            .flatten()
    }

    /// Merge a partial state and re-render.
    ///
    /// Outside a pass the instance's subtree is re-rendered through the live
    /// target before this returns. Inside a pass (from a lifecycle hook) the
    /// re-render is queued and runs before the outermost pass returns.
    ///
    /// A hook that mutates state on every update re-queues forever; the flush
    /// stops at `Config::max_rerender_passes` and reports [`Error::RerenderLimit`].
    pub fn set_state(&self, update: impl Into<StateUpdate>) -> Result<()> {
        let (state, props) = registry::with_instance(self.id, |inst| {
            (
                inst.next_state.clone().unwrap_or_else(|| inst.state.clone()),
                inst.props.clone(),
            )
        })
        .ok_or(Error::StaleHandle(self.id))?;

        let patch = match update.into() {
            StateUpdate::Merge(map) => map,
            StateUpdate::With(f) => f(&state, &props),
        };
        let merged = Rc::new(merge_maps(&state, &patch));

        registry::with_instance_mut(self.id, |inst| {
            inst.next_state = Some(merged);
            inst.flags.insert(InstanceFlags::DIRTY);
        })
        .ok_or(Error::StaleHandle(self.id))?;

        pass::request_rerender(self.id)
    }

    /// Re-render without consulting `should_update`.
    pub fn force_update(&self) -> Result<()> {
        registry::with_instance_mut(self.id, |inst| {
            inst.flags.insert(InstanceFlags::DIRTY | InstanceFlags::FORCE);
        })
        .ok_or(Error::StaleHandle(self.id))?;
        pass::request_rerender(self.id)
    }
}
