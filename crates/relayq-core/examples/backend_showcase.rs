//! Showcase of the three MPSC back-ends behind one interface
//!
//! Drives the same payloads through every back-end, then demonstrates the
//! primary back-end's consumer-side extras: the three-state poll, front
//! insertion and the consume-lock.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Barrier;
use std::thread;

use relayq_core::{registry, AnyNode, MpscQueue, Poll};

#[repr(C)]
struct Message {
    node: AnyNode,
    seq: usize,
    delivered: AtomicU64,
}

impl Message {
    fn new(seq: usize) -> Self {
        Self {
            node: AnyNode::new(),
            seq,
            delivered: AtomicU64::new(0),
        }
    }
}

fn main() {
    demo_backends();
    demo_poll_protocol();
    demo_consume_lock();
    println!("all demonstrations completed");
}

/// Push messages through every back-end with two producer threads and a
/// concurrently draining consumer.
fn demo_backends() {
    const N_MESSAGES: usize = 100_000;
    const N_PRODUCERS: usize = 2;
    let per_thread = N_MESSAGES / N_PRODUCERS;

    for backend in registry() {
        let messages: Box<[Message]> = (0..N_MESSAGES).map(Message::new).collect();
        unsafe { backend.init() };

        let barrier = Barrier::new(N_PRODUCERS + 1);
        thread::scope(|s| {
            for p in 0..N_PRODUCERS {
                let messages = &messages;
                let barrier = &barrier;
                let backend = backend.as_ref();
                s.spawn(move || {
                    barrier.wait();
                    for msg in &messages[p * per_thread..(p + 1) * per_thread] {
                        unsafe { backend.insert(NonNull::from(&msg.node)) };
                    }
                });
            }

            barrier.wait();
            let mut delivered = 0;
            while delivered < N_MESSAGES {
                match unsafe { backend.pop() } {
                    Some(node) => {
                        let msg = unsafe { &*(node.as_ptr() as *const Message) };
                        msg.delivered.fetch_add(1, Ordering::Relaxed);
                        delivered += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }
        });

        let clean = messages
            .iter()
            .all(|m| m.delivered.load(Ordering::Relaxed) == 1);
        println!(
            "{:>15}: {} messages delivered exactly once: {}",
            backend.desc(),
            N_MESSAGES,
            clean
        );
        assert!(clean);
    }
}

/// Show the three poll outcomes on the primary back-end.
fn demo_poll_protocol() {
    let queue = MpscQueue::new();
    queue.init();

    let messages: Box<[Message]> = (0..3).map(Message::new).collect();

    unsafe {
        assert!(matches!(queue.poll(), Poll::Empty));

        for msg in messages.iter() {
            queue.insert(NonNull::from(msg.node.as_linked()));
        }

        while let Poll::Item(node) = queue.poll() {
            let msg = &*(node.as_ptr() as *const Message);
            println!("polled message {}", msg.seq);
        }

        // Front insertion puts a message at the head of the line.
        queue.insert(NonNull::from(messages[1].node.as_linked()));
        queue.push_front(NonNull::from(messages[0].node.as_linked()));
        let urgent = queue.pop().unwrap();
        println!(
            "front-inserted message {} popped first",
            (*(urgent.as_ptr() as *const Message)).seq
        );
        queue.pop().unwrap();
    }
}

/// Arbitrate the consumer role between two threads with the consume-lock.
fn demo_consume_lock() {
    let queue = MpscQueue::new();
    queue.init();

    let guard = queue.try_consumer().expect("uncontested lock");
    assert!(queue.try_consumer().is_err());
    drop(guard);
    assert!(queue.try_consumer().is_ok());
    println!("consume-lock arbitration ok");
}
