//! Vnode Model - The declarative tree handed to the resolver.
//!
//! A vnode describes the desired shape of one render:
//! - [`VnodeType`] - tag name, stateful component, or plain rendering function
//! - props - shared [`Props`](crate::types::Props) map (reserved keys: `key`, `ref`, `children`)
//! - children - ordered [`Child`] sequence (vnodes or primitives)
//!
//! Vnodes are immutable once built. Identity of the props `Rc` is significant:
//! handing the resolver the same vnode twice means "props unchanged".
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::{h, props};
//!
//! let node = h("span", props! { "class" => "msg" }, ["Hi".into()]);
//! ```

pub mod classify;
mod element;

pub use classify::*;
pub use element::*;
