//! Containers shared by the pathfinder and the turn scheduler.
mod priority_queue;

pub use priority_queue::{HeapIdentity, PriorityQueue};
