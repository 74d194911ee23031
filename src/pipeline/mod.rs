//! Render Pipeline
//!
//! This module connects the vnode model to a live target.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Vnode tree → resolve (engine) → resolved tree → diff (renderer) → live target
//! ```
//!
//! ## Data Flow
//!
//! 1. **render** - first pass: resolve against nothing, materialize, attach
//! 2. **MountHandle::update** - resolve against the previous resolved tree, patch
//! 3. **set_state** - re-render one instance's subtree in place
//!
//! Configuration (reserved prop names, the re-render bound) lives in [`config`].

pub mod config;
mod mount;

pub use config::{config, reset_config, set_config, Config};
pub use mount::{render, MountHandle};
