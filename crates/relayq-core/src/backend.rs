//! Polymorphic back-end surface shared by the three queues
//!
//! [`AnyNode`] overlays the linkage layouts of every back-end so a
//! payload can embed one linkage field and be routed to any queue. The
//! [`Backend`] trait is the common vtable: init, empty check, single and
//! batch insert, pop. Back-ends are plain constructor-returned values;
//! [`registry`] boxes one of each for harnesses that want to iterate
//! over them.

use core::mem::ManuallyDrop;
use core::ptr::NonNull;

use crate::mpsc::{MpscNode, MpscQueue};
use crate::tailq::{LockedNode, LockedQueue};
use crate::treiber::{TreiberNode, TreiberQueue};

/// Linkage union embedded in a caller-owned payload.
///
/// A node may live in any back-end, one at a time. Every variant starts
/// at offset zero, so a node handle converts to the back-end specific
/// link type by pointer cast.
#[repr(C)]
pub union AnyNode {
    linked: ManuallyDrop<MpscNode>,
    treiber: ManuallyDrop<TreiberNode>,
    locked: ManuallyDrop<LockedNode>,
}

// Linkage mutation is governed by whichever queue currently borrows the
// node; the layouts themselves are bare pointers with no drop glue.
unsafe impl Send for AnyNode {}
unsafe impl Sync for AnyNode {}

impl AnyNode {
    /// Create an unlinked node.
    pub const fn new() -> Self {
        Self {
            linked: ManuallyDrop::new(MpscNode::new()),
        }
    }

    /// View the node as [`MpscQueue`] linkage.
    ///
    /// # Safety
    ///
    /// The node must not currently be threaded through another back-end.
    pub unsafe fn as_linked(&self) -> &MpscNode {
        &self.linked
    }

    /// View the node as [`TreiberQueue`] linkage.
    ///
    /// # Safety
    ///
    /// The node must not currently be threaded through another back-end.
    pub unsafe fn as_treiber(&self) -> &TreiberNode {
        &self.treiber
    }

    /// View the node as [`LockedQueue`] linkage.
    ///
    /// # Safety
    ///
    /// The node must not currently be threaded through another back-end.
    pub unsafe fn as_locked(&self) -> &LockedNode {
        &self.locked
    }
}

impl Default for AnyNode {
    fn default() -> Self {
        Self::new()
    }
}

unsafe fn as_linked(node: NonNull<AnyNode>) -> NonNull<MpscNode> {
    NonNull::from(node.as_ref().as_linked())
}

unsafe fn as_treiber(node: NonNull<AnyNode>) -> NonNull<TreiberNode> {
    NonNull::from(node.as_ref().as_treiber())
}

unsafe fn as_locked(node: NonNull<AnyNode>) -> NonNull<LockedNode> {
    NonNull::from(node.as_ref().as_locked())
}

/// Common surface of every MPSC back-end.
///
/// The same ownership rules apply through this trait as through the
/// inherent APIs: nodes are caller-owned, a node is borrowed by the
/// queue between insert and the matching pop, and exactly one thread
/// acts as consumer at any instant.
pub trait Backend: Send + Sync {
    /// Short human-readable name of the back-end.
    fn desc(&self) -> &'static str;

    /// Reset the queue to the empty state.
    ///
    /// # Safety
    ///
    /// No other thread may access the queue during initialization. For
    /// address-sensitive back-ends the queue must not move afterwards.
    unsafe fn init(&self);

    /// Best-effort empty check; false negatives are possible under
    /// concurrent inserts.
    ///
    /// # Safety
    ///
    /// Consumer-only for back-ends with consumer-private state.
    unsafe fn is_empty(&self) -> bool;

    /// Insert one node, transferring its ownership to the queue.
    ///
    /// # Safety
    ///
    /// The node must not already be in a queue and must stay live until
    /// popped.
    unsafe fn insert(&self, node: NonNull<AnyNode>);

    /// Insert an ordered batch of nodes.
    ///
    /// Back-ends without native batch support fall through to single
    /// inserts, so every back-end accepts the batch API.
    ///
    /// # Safety
    ///
    /// Same contract as [`Backend::insert`] for every node; the nodes
    /// must be distinct.
    unsafe fn insert_batch(&self, nodes: &[NonNull<AnyNode>]) {
        for &node in nodes {
            self.insert(node);
        }
    }

    /// Pop one node, returning its ownership to the caller.
    ///
    /// # Safety
    ///
    /// Only one thread may act as consumer at a time; nodes in the queue
    /// must still be live.
    unsafe fn pop(&self) -> Option<NonNull<AnyNode>>;
}

impl Backend for MpscQueue {
    fn desc(&self) -> &'static str {
        "mpsc-queue"
    }

    unsafe fn init(&self) {
        MpscQueue::init(self);
    }

    unsafe fn is_empty(&self) -> bool {
        MpscQueue::is_empty(self)
    }

    unsafe fn insert(&self, node: NonNull<AnyNode>) {
        MpscQueue::insert(self, as_linked(node));
    }

    unsafe fn insert_batch(&self, nodes: &[NonNull<AnyNode>]) {
        // NonNull<AnyNode> and NonNull<MpscNode> share one layout.
        let nodes = core::slice::from_raw_parts(
            nodes.as_ptr() as *const NonNull<MpscNode>,
            nodes.len(),
        );
        MpscQueue::insert_batch(self, nodes);
    }

    unsafe fn pop(&self) -> Option<NonNull<AnyNode>> {
        MpscQueue::pop(self).map(NonNull::cast)
    }
}

impl Backend for TreiberQueue {
    fn desc(&self) -> &'static str {
        "treiber-stack"
    }

    unsafe fn init(&self) {
        TreiberQueue::init(self);
    }

    unsafe fn is_empty(&self) -> bool {
        TreiberQueue::is_empty(self)
    }

    unsafe fn insert(&self, node: NonNull<AnyNode>) {
        TreiberQueue::insert(self, as_treiber(node));
    }

    unsafe fn pop(&self) -> Option<NonNull<AnyNode>> {
        TreiberQueue::pop(self).map(NonNull::cast)
    }
}

impl Backend for LockedQueue {
    fn desc(&self) -> &'static str {
        "tailq"
    }

    unsafe fn init(&self) {
        LockedQueue::init(self);
    }

    unsafe fn is_empty(&self) -> bool {
        LockedQueue::is_empty(self)
    }

    unsafe fn insert(&self, node: NonNull<AnyNode>) {
        LockedQueue::insert(self, as_locked(node));
    }

    unsafe fn insert_batch(&self, nodes: &[NonNull<AnyNode>]) {
        let nodes = core::slice::from_raw_parts(
            nodes.as_ptr() as *const NonNull<LockedNode>,
            nodes.len(),
        );
        LockedQueue::insert_batch(self, nodes);
    }

    unsafe fn pop(&self) -> Option<NonNull<AnyNode>> {
        LockedQueue::pop(self).map(NonNull::cast)
    }
}

/// One boxed instance of every back-end, in display order.
///
/// Boxing keeps the queues at stable addresses; call
/// [`Backend::init`] before first use.
pub fn registry() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(MpscQueue::new()),
        Box::new(LockedQueue::new()),
        Box::new(TreiberQueue::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct Element {
        node: AnyNode,
        id: usize,
    }

    fn elements(n: usize) -> Box<[Element]> {
        (0..n)
            .map(|id| Element {
                node: AnyNode::new(),
                id,
            })
            .collect()
    }

    unsafe fn elem_of<'a>(node: NonNull<AnyNode>, _anchor: &'a [Element]) -> &'a Element {
        &*(node.as_ptr() as *const Element)
    }

    #[test]
    fn test_registry_descriptions() {
        let descs: Vec<&str> = registry().iter().map(|b| b.desc()).collect();
        assert_eq!(descs, ["mpsc-queue", "tailq", "treiber-stack"]);
    }

    #[test]
    fn test_every_backend_is_fifo() {
        for backend in registry() {
            let elems = elements(50);
            unsafe {
                backend.init();
                assert!(backend.is_empty(), "{} should start empty", backend.desc());

                for e in elems.iter() {
                    backend.insert(NonNull::from(&e.node));
                }
                assert!(!backend.is_empty());

                for want in 0..elems.len() {
                    let node = backend.pop().expect("missing element");
                    assert_eq!(elem_of(node, &elems).id, want, "{}", backend.desc());
                }
                assert!(backend.pop().is_none());
                assert!(backend.is_empty());
            }
        }
    }

    #[test]
    fn test_every_backend_accepts_batches() {
        // The Treiber back-end exercises the default single-insert
        // fallback; the other two use their native batch paths.
        for backend in registry() {
            let elems = elements(64);
            unsafe {
                backend.init();

                let nodes: Vec<NonNull<AnyNode>> =
                    elems.iter().map(|e| NonNull::from(&e.node)).collect();
                backend.insert_batch(&nodes);

                for want in 0..elems.len() {
                    let node = backend.pop().expect("missing batch element");
                    assert_eq!(elem_of(node, &elems).id, want, "{}", backend.desc());
                }
                assert!(backend.pop().is_none(), "{}", backend.desc());

                backend.insert_batch(&[]);
                assert!(backend.is_empty());
            }
        }
    }

    #[test]
    fn test_reinit_between_uses() {
        for backend in registry() {
            let elems = elements(4);
            unsafe {
                backend.init();
                for e in elems.iter() {
                    backend.insert(NonNull::from(&e.node));
                }
                backend.pop().unwrap();

                backend.init();
                assert!(backend.is_empty());
                assert!(backend.pop().is_none());
            }
        }
    }
}
