//! Fiber engine - node storage, update queues, and lanes.
//!
//! The engine holds the data structures the render and commit phases work
//! on:
//! - Arena: fiber slots, each with a current and a work-in-progress buffer
//! - Fiber: one node of the tree, linked to others by [`FiberId`]
//! - Update queue: batched state transitions, replayed in order
//! - Lanes: the priority tag every update carries
//!
//! # Architecture
//!
//! Fibers are NOT reference-counted objects. They are slots in one arena and
//! refer to each other by id:
//!
//! ```text
//! Slot 0: HostRoot       (parent=-,  child=1)
//! Slot 1: App            (parent=0,  child=2)
//! Slot 2: div            (parent=1,  child=3)
//! Slot 3: "hello"        (parent=2,  sibling=-)
//! ```
//!
//! A slot's id stays valid across renders, so the current and the
//! work-in-progress version of a node share it.

pub(crate) mod arena;
pub(crate) mod fiber;
pub mod lanes;
pub mod update_queue;

pub use fiber::FiberId;
