//! Lock-guarded dual tail-queue MPSC back-end
//!
//! Two doubly-linked lists: producers append to `plist` under a mutex,
//! the consumer owns `clist` outright. A pop that finds `clist` empty
//! splices the whole `plist` onto it in one critical section. This
//! back-end is the correctness and performance baseline for the
//! lock-free queues.

use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};

use parking_lot::Mutex;

/// Linkage embedded in a caller-owned payload.
///
/// Both links are mutated only under the producer lock or by the single
/// consumer, never concurrently.
pub struct LockedNode {
    next: UnsafeCell<*mut LockedNode>,
    prev: UnsafeCell<*mut LockedNode>,
}

// Links are guarded by the queue protocol: the plist mutex on the
// producer side, consumer exclusivity on the clist side.
unsafe impl Send for LockedNode {}
unsafe impl Sync for LockedNode {}

impl LockedNode {
    /// Create an unlinked node.
    pub const fn new() -> Self {
        Self {
            next: UnsafeCell::new(ptr::null_mut()),
            prev: UnsafeCell::new(ptr::null_mut()),
        }
    }
}

impl Default for LockedNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Doubly-linked list of intrusive nodes.
struct RawList {
    head: *mut LockedNode,
    tail: *mut LockedNode,
}

// Raw pointers gate Send; the list is only reached through the mutex or
// through the consumer-owned cell.
unsafe impl Send for RawList {}

impl RawList {
    const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        }
    }

    fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    unsafe fn push_back(&mut self, node: NonNull<LockedNode>) {
        let node_ptr = node.as_ptr();
        *node.as_ref().next.get() = ptr::null_mut();
        *node.as_ref().prev.get() = self.tail;
        if self.tail.is_null() {
            self.head = node_ptr;
        } else {
            *(*self.tail).next.get() = node_ptr;
        }
        self.tail = node_ptr;
    }

    unsafe fn pop_front(&mut self) -> Option<NonNull<LockedNode>> {
        let head = self.head;
        if head.is_null() {
            return None;
        }

        let next = *(*head).next.get();
        self.head = next;
        if next.is_null() {
            self.tail = ptr::null_mut();
        } else {
            *(*next).prev.get() = ptr::null_mut();
        }

        *(*head).next.get() = ptr::null_mut();
        *(*head).prev.get() = ptr::null_mut();
        Some(NonNull::new_unchecked(head))
    }

    /// Move every node of `other` onto the back of `self`.
    unsafe fn splice_back(&mut self, other: &mut RawList) {
        if other.head.is_null() {
            return;
        }

        if self.tail.is_null() {
            self.head = other.head;
        } else {
            *(*self.tail).next.get() = other.head;
            *(*other.head).prev.get() = self.tail;
        }
        self.tail = other.tail;

        other.head = ptr::null_mut();
        other.tail = ptr::null_mut();
    }
}

/// MPSC queue over two locked tail-queues.
pub struct LockedQueue {
    /// Producer list, guarded by its mutex.
    plist: Mutex<RawList>,
    /// Consumer list, touched only by the consumer.
    clist: UnsafeCell<RawList>,
}

// plist is mutex-guarded; clist belongs to the single consumer.
unsafe impl Send for LockedQueue {}
unsafe impl Sync for LockedQueue {}

impl LockedQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            plist: Mutex::new(RawList::new()),
            clist: UnsafeCell::new(RawList::new()),
        }
    }

    /// Reset to the empty state. Must only run while no other thread
    /// accesses the queue.
    ///
    /// # Safety
    ///
    /// No concurrent producers or consumer.
    pub unsafe fn init(&self) {
        *self.plist.lock() = RawList::new();
        *self.clist.get() = RawList::new();
    }

    /* Producer API. */

    /// Append one node to the producer list.
    ///
    /// # Safety
    ///
    /// The caller transfers ownership of `node` to the queue. The node
    /// must not already be in any queue and its storage must remain
    /// valid until it is returned by a pop.
    pub unsafe fn insert(&self, node: NonNull<LockedNode>) {
        self.plist.lock().push_back(node);
    }

    /// Append a batch of nodes in slice order.
    ///
    /// The batch is linked into a private list without the lock, then
    /// spliced onto the producer list in a single critical section.
    ///
    /// # Safety
    ///
    /// Same contract as [`LockedQueue::insert`], applied to every node.
    /// The nodes must be distinct.
    pub unsafe fn insert_batch(&self, nodes: &[NonNull<LockedNode>]) {
        if nodes.is_empty() {
            return;
        }

        let mut batch = RawList::new();
        for &node in nodes {
            batch.push_back(node);
        }
        self.plist.lock().splice_back(&mut batch);
    }

    /* Consumer API. */

    /// Remove one node from the front of the queue.
    ///
    /// # Safety
    ///
    /// Only one thread may act as consumer at a time. Nodes in the queue
    /// must still be live.
    pub unsafe fn pop(&self) -> Option<NonNull<LockedNode>> {
        let clist = &mut *self.clist.get();

        if clist.is_empty() {
            let mut plist = self.plist.lock();
            clist.splice_back(&mut plist);
        }

        clist.pop_front()
    }

    /// Best-effort empty check. The fast path inspects the consumer
    /// list; the slow path takes the lock.
    ///
    /// # Safety
    ///
    /// Consumer-only; the consumer list is inspected without
    /// synchronization.
    pub unsafe fn is_empty(&self) -> bool {
        if !(*self.clist.get()).is_empty() {
            return false;
        }
        self.plist.lock().is_empty()
    }
}

impl Default for LockedQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct Element {
        node: LockedNode,
        id: usize,
    }

    fn elements(n: usize) -> Box<[Element]> {
        (0..n)
            .map(|id| Element {
                node: LockedNode::new(),
                id,
            })
            .collect()
    }

    fn node_of(elem: &Element) -> NonNull<LockedNode> {
        NonNull::from(&elem.node)
    }

    unsafe fn elem_of<'a>(node: NonNull<LockedNode>, _anchor: &'a [Element]) -> &'a Element {
        &*(node.as_ptr() as *const Element)
    }

    #[test]
    fn test_fifo_across_splices() {
        let elems = elements(8);
        let q = LockedQueue::new();

        unsafe {
            assert!(q.is_empty());
            assert!(q.pop().is_none());

            for e in &elems[..5] {
                q.insert(node_of(e));
            }
            assert!(!q.is_empty());

            // The first pop splices plist onto clist; later inserts land
            // behind the spliced nodes.
            assert_eq!(elem_of(q.pop().unwrap(), &elems).id, 0);
            assert_eq!(elem_of(q.pop().unwrap(), &elems).id, 1);

            for e in &elems[5..] {
                q.insert(node_of(e));
            }

            for want in 2..elems.len() {
                assert_eq!(elem_of(q.pop().unwrap(), &elems).id, want);
            }
            assert!(q.pop().is_none());
            assert!(q.is_empty());
        }
    }

    #[test]
    fn test_insert_batch_splices_once() {
        let elems = elements(10);
        let q = LockedQueue::new();

        unsafe {
            q.insert(node_of(&elems[0]));

            let nodes: Vec<NonNull<LockedNode>> = elems[1..].iter().map(node_of).collect();
            q.insert_batch(&nodes);

            for want in 0..elems.len() {
                assert_eq!(elem_of(q.pop().unwrap(), &elems).id, want);
            }
            assert!(q.pop().is_none());

            q.insert_batch(&[]);
            assert!(q.is_empty());
        }
    }

    #[test]
    fn test_is_empty_paths() {
        let elems = elements(2);
        let q = LockedQueue::new();

        unsafe {
            assert!(q.is_empty());

            // Pending in plist only.
            q.insert(node_of(&elems[0]));
            assert!(!q.is_empty());

            // Spliced into clist with more left behind.
            q.pop().unwrap();
            q.insert(node_of(&elems[0]));
            q.insert(node_of(&elems[1]));
            q.pop().unwrap();
            assert!(!q.is_empty());

            q.pop().unwrap();
            assert!(q.is_empty());
        }
    }

    #[test]
    fn test_reinit_clears_both_lists() {
        let elems = elements(4);
        let q = LockedQueue::new();

        unsafe {
            q.insert(node_of(&elems[0]));
            q.insert(node_of(&elems[1]));
            q.pop().unwrap();
            q.insert(node_of(&elems[2]));

            q.init();
            assert!(q.is_empty());
            assert!(q.pop().is_none());

            q.insert(node_of(&elems[3]));
            assert_eq!(elem_of(q.pop().unwrap(), &elems).id, 3);
        }
    }
}
