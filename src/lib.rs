//! # spark-fiber
//!
//! Fiber-style UI tree reconciler with hooks.
//!
//! Application code describes the tree it wants as [`Element`]s. A [`Root`]
//! diffs that description against the tree it committed last, applies the
//! minimal set of mutations through a [`HostConfig`] adapter, and runs
//! component effects afterwards.
//!
//! ## Architecture
//!
//! Two phases per update, driven synchronously:
//!
//! ```text
//! render(element) / dispatch(update)
//!   → render phase: begin (top-down) + complete (bottom-up) over the
//!     work-in-progress tree, reconciling children and running hooks
//!   → commit phase: placements, updates, deletions on the host tree;
//!     work-in-progress becomes current
//!   → passive effects: cleanups, then effect bodies
//! ```
//!
//! The committed tree stays intact until the swap, so a failed render
//! leaves the host exactly as it was.
//!
//! ## Example
//!
//! ```
//! use spark_fiber::host::memory::MemoryHost;
//! use spark_fiber::{create_root, Child, Element, Hooks, Result};
//!
//! fn greeting(hooks: &mut Hooks<'_>) -> Result<Child> {
//!     let (name, _set_name) = hooks.use_state(String::from("world"))?;
//!     Ok(Element::host("p").child(format!("hello {name}")).into())
//! }
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let root = create_root(host, container);
//!
//! root.render(Element::component(greeting))?;
//! assert_eq!(root.with_host(|h| h.to_html(container))?, "<p>hello world</p>");
//! # Ok::<(), spark_fiber::ReconcileError>(())
//! ```
//!
//! ## Modules
//!
//! - [`element`] - Element and child values, builder
//! - [`hooks`] - `use_state`, `use_effect`, dispatchers, dependency lists
//! - [`host`] - Host adapter trait and the in-memory host
//! - [`engine`] - Fiber arena, update queues, lanes
//! - [`types`] - Work tags and flag sets

pub mod commit;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod host;
mod reconciler;
pub mod root;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use commit::CommitStats;
pub use config::{ReconcilerConfig, UnmountCleanup};
pub use element::{AttrValue, Child, Component, ComponentType, Element, ElementType, HostProps, Key, Props};
pub use engine::FiberId;
pub use engine::lanes::{Lane, Lanes};
pub use error::{ReconcileError, Result};
pub use hooks::{Cleanup, Dep, Dispatch, Hooks};
pub use host::HostConfig;
pub use root::{Root, create_root, create_root_with_config};
