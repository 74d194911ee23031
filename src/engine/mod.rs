//! Reconciliation engine - component instances and the resolver.
//!
//! The engine manages the core data structures:
//! - Registry: generation-checked arena of component instances
//! - Resolved tree: component-free output, tagged with component stacks
//! - Resolver: expands vnodes, drives the instance lifecycle
//! - Pass: deferred `did_mount` delivery and state-driven re-renders
//!
//! # Architecture
//!
//! Instances are NOT owned by the tree. They live in the registry and are
//! found again through the component stack of the resolved node they produced:
//!
//! ```text
//! Outer (depth 0) → Inner (depth 1) → <div>   stack of <div> = [outer, inner]
//! ```
//!
//! A later pass resolving the same position against that `<div>` looks up
//! depth 0 to find `outer`, and `outer` looks up depth 1 to find `inner`.

mod component;
pub(crate) mod pass;
pub(crate) mod registry;
mod resolved;
pub(crate) mod resolver;

pub use component::{
    Component, ComponentHandle, ComponentType, Construct, FunctionComponent, StateUpdate,
};
pub use pass::is_active as in_pass;
pub use registry::{instance_count, is_alive, reset_registry, ComponentId};
pub use resolved::{RNode, Resolved, ResolvedKind};
pub use resolver::{empty_context, resolve};
