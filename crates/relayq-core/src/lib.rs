//! Intrusive multi-producer single-consumer queues
//!
//! This crate provides three MPSC queue algorithms behind one polymorphic
//! surface, intended as building blocks for event pipelines and
//! cross-thread message passing:
//!
//! - [`MpscQueue`]: the primary back-end. A lock-free intrusive
//!   singly-linked queue with a permanent stub node and a three-state
//!   poll. Producers use a single atomic exchange; the consumer is
//!   wait-free on the uncontended fast path.
//! - [`TreiberQueue`]: producers push onto a LIFO stack with CAS; the
//!   consumer detaches the whole stack at once and reverses it into
//!   FIFO order.
//! - [`LockedQueue`]: a mutex-guarded producer list spliced onto a
//!   consumer-owned list, serving as a correctness and performance
//!   baseline.
//!
//! The queues are intrusive: linkage lives inside caller-owned payloads
//! and the queues never allocate. [`AnyNode`] overlays the three linkage
//! layouts so one payload can be routed to any back-end through the
//! [`Backend`] trait.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod mpsc;
pub mod tailq;
pub mod treiber;

pub use backend::{registry, AnyNode, Backend};
pub use error::{QueueError, Result};
pub use mpsc::{ConsumerGuard, MpscNode, MpscQueue, Poll};
pub use tailq::{LockedNode, LockedQueue};
pub use treiber::{TreiberNode, TreiberQueue};
