//! # spark-vdom
//!
//! Tree reconciliation for declarative UI trees.
//!
//! ## Architecture
//!
//! A render describes the desired UI as an immutable [`Vnode`] tree. The engine
//! expands every component in it (reusing component instances by position),
//! producing a component-free resolved tree, and the renderer patches a live
//! target until it matches:
//!
//! ```text
//! Vnode tree → resolve → resolved tree (+ component stacks) → diff → live target
//! ```
//!
//! Everything runs synchronously on the caller's thread. Component state
//! changes re-render the affected subtree before `set_state` returns.
//!
//! ## Modules
//!
//! - [`types`] - Primitives, prop values, events, instance flags
//! - [`vnode`] - Vnode model, `h`, classification and primitive boxing
//! - [`engine`] - Component instances, resolver, pass bookkeeping
//! - [`renderer`] - Live target, attribute reconciler, differ
//! - [`pipeline`] - Mount API and configuration
//!
//! ## Example
//!
//! ```ignore
//! use spark_vdom::{h, props, render, MemoryDom, Target};
//!
//! let dom = MemoryDom::new();
//! let body = dom.create_element("body");
//! let target: Target = dom.clone();
//! let handle = render(h("span", props! { "class" => "msg" }, ["Hi".into()]), &target, body, None)?;
//! ```

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use vnode::{
    box_primitive, classify, h, is_component, is_element, is_functional_component,
    is_primitive, BoxedPrimitive, Child, ChildInput, NodeClass, Vnode, VnodeType,
};

pub use engine::{
    empty_context, in_pass, instance_count, is_alive, reset_registry, resolve, Component,
    ComponentHandle, ComponentId, ComponentType, Construct, FunctionComponent, RNode, Resolved,
    ResolvedKind, StateUpdate,
};

pub use renderer::{
    apply_props, diff, idiff, LiveNode, LiveTarget, MemoryDom, Mutation, Rendered, Target,
};

pub use pipeline::{config, render, reset_config, set_config, Config, MountHandle};
