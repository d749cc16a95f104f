//! A fixed-capacity, lock-free, multi-producer multi-consumer queue for handing values
//! between threads, e.g. inside a thread pool or between pipeline stages.
//!
//! Every cell of the ring carries a sequence number that alone says whether the cell is ready
//! to be written or read in the current lap. A producer or consumer claims a cell with one
//! compare-and-swap on its own cursor, then publishes with a release store to the cell's
//! sequence. Nothing blocks, nothing is locked, and nothing is allocated after construction:
//! a full or empty ring is simply reported back to the caller.
//!
//! The algorithm is Dmitry Vyukov's bounded MPMC queue.
//!
//! https://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue
//!
//! ```
//! let queue = seqring::Queue::new(1024);
//!
//! let mut out = String::from("test1");
//! assert!(!queue.dequeue(&mut out));
//!
//! assert!(queue.enqueue(String::from("hello")));
//! assert!(queue.dequeue(&mut out));
//! assert_eq!(out, "hello");
//! ```
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub use channel::{
    mpmc,
    Sender,
    Receiver,
};
pub use error::Full;
pub use queue::Queue;
pub use trace::init_tracing;

mod channel;
mod error;
mod loom_exports;
mod queue;
mod trace;
