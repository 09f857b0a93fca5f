//! Benchmark harness: producer threads, concurrent consumer, timing.
//!
//! One run drives `n_elems` caller-owned elements through a back-end
//! with `cores` producer threads inserting in batches while the driver
//! thread consumes. Producers and consumer start together behind a
//! barrier; each side reports wall-clock milliseconds. After the drain,
//! every element's mark must equal exactly one.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Instant;

use relayq_core::{AnyNode, Backend};
use tracing::error;

use crate::error::{BenchError, BenchResult};

/// Largest batch a producer hands to `insert_batch` in one call.
pub const MAX_BATCH: usize = 64;

/// Element cap for warm-up runs.
pub const WARMUP_ELEMS: usize = 100_000;

/// Benchmark payload: a queue node plus a consumption mark.
#[repr(C)]
pub struct Element {
    node: AnyNode,
    mark: AtomicU64,
}

impl Element {
    fn new() -> Self {
        Self {
            node: AnyNode::new(),
            mark: AtomicU64::new(0),
        }
    }
}

/// Allocate the element arena shared by all runs.
pub fn elements(n: usize) -> Box<[Element]> {
    (0..n).map(|_| Element::new()).collect()
}

/// Parameters of one benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Total elements pushed through the queue.
    pub n_elems: usize,
    /// Number of producer threads.
    pub cores: usize,
    /// Batch size per `insert_batch` call.
    pub batch: usize,
}

/// Timings of one benchmark run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Back-end name.
    pub desc: &'static str,
    /// Wall-clock milliseconds spent draining by the consumer.
    pub consumer_ms: u64,
    /// Wall-clock milliseconds spent inserting, per producer thread.
    pub producer_ms: Vec<u64>,
}

impl RunResult {
    /// Mean producer time in milliseconds.
    pub fn producer_avg_ms(&self) -> u64 {
        if self.producer_ms.is_empty() {
            return 0;
        }
        self.producer_ms.iter().sum::<u64>() / self.producer_ms.len() as u64
    }
}

unsafe fn elem_of<'a>(node: NonNull<AnyNode>, _anchor: &'a [Element]) -> &'a Element {
    // `node` is the first field of a repr(C) Element.
    &*(node.as_ptr() as *const Element)
}

/// Run one back-end through a full produce/consume cycle and verify
/// that every element was consumed exactly once.
pub fn run_one(queue: &dyn Backend, arena: &[Element], cfg: &RunConfig) -> BenchResult<RunResult> {
    let n_elems = cfg.n_elems;
    let elems = &arena[..n_elems];
    let per_thread = n_elems / cfg.cores;

    for e in elems {
        e.mark.store(0, Ordering::Relaxed);
    }
    // Safety: the run owns the queue and the arena outlives it.
    unsafe { queue.init() };

    // Elements beyond an even split are inserted outside the timed
    // producer stripes.
    unsafe {
        for e in &elems[n_elems - (n_elems % cfg.cores)..] {
            queue.insert(NonNull::from(&e.node));
        }
    }

    let barrier = Barrier::new(cfg.cores + 1);
    let mut consumer_ms = 0;
    let mut producer_ms = vec![0u64; cfg.cores];

    thread::scope(|s| {
        let handles: Vec<_> = (0..cfg.cores)
            .map(|p| {
                let elems = &elems;
                let barrier = &barrier;
                s.spawn(move || {
                    let stripe = &elems[p * per_thread..(p + 1) * per_thread];
                    let mut nodes = Vec::with_capacity(cfg.batch);

                    barrier.wait();
                    let start = Instant::now();

                    for chunk in stripe.chunks(cfg.batch.max(1)) {
                        nodes.clear();
                        nodes.extend(chunk.iter().map(|e| NonNull::from(&e.node)));
                        unsafe { queue.insert_batch(&nodes) };
                    }

                    start.elapsed().as_millis() as u64
                })
            })
            .collect();

        barrier.wait();
        let start = Instant::now();

        let mut counter = 0usize;
        while counter < n_elems {
            match unsafe { queue.pop() } {
                Some(node) => {
                    unsafe { elem_of(node, elems) }.mark.fetch_add(1, Ordering::Relaxed);
                    counter += 1;
                }
                None => std::hint::spin_loop(),
            }
        }

        consumer_ms = start.elapsed().as_millis() as u64;

        for (p, handle) in handles.into_iter().enumerate() {
            producer_ms[p] = handle.join().expect("producer thread panicked");
        }
    });

    let failed = elems
        .iter()
        .filter(|e| e.mark.load(Ordering::Relaxed) != 1)
        .count();
    if failed > 0 {
        for (i, e) in elems.iter().enumerate() {
            let mark = e.mark.load(Ordering::Relaxed);
            if mark != 1 {
                error!("element {i} was consumed {mark} times");
            }
        }
        return Err(BenchError::Verification { failed });
    }

    if !unsafe { queue.is_empty() } {
        error!("{} still holds elements after the drain", queue.desc());
        return Err(BenchError::Verification { failed: 0 });
    }

    Ok(RunResult {
        desc: queue.desc(),
        consumer_ms,
        producer_ms,
    })
}
