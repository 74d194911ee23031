//! Renderer - live target, attribute reconciler and differ.
//!
//! Components:
//! - [`LiveTarget`] - host tree operations, addressed by [`LiveNode`]
//! - [`MemoryDom`] - in-memory target with a mutation log
//! - [`apply_props`] - per-node prop delta
//! - [`diff`]/[`idiff`] - positional tree patching

pub mod attributes;
pub mod diff;
mod memory;
mod target;

pub use attributes::apply_props;
pub use diff::{diff, idiff, Rendered};
pub use memory::{MemoryDom, Mutation};
pub use target::{LiveNode, LiveTarget, Target};
