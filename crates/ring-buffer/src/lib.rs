//! Fixed-Capacity Ring Buffer
//!
//! Bounded history window used by the subject tracker: movement samples
//! (capacity 30) and recent liveness checks (capacity 10). Pushing onto a
//! full buffer evicts the oldest entry.

mod buffer;

pub use buffer::{Iter, RingBuffer, DEFAULT_CAPACITY};
