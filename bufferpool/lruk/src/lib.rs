//! LRU-K replacement policy for buffer-pool frames.
//!
//! This crate provides the frame replacer used by a buffer pool to decide
//! which resident frame to evict when the pool is under memory pressure.
//! LRU-K improves on plain LRU by tracking the K most recent access
//! timestamps per frame: a frame is only considered "hot" once it has been
//! accessed K times, which keeps one-shot sequential scans from flushing
//! the working set.
//!
//! # Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                       LruKReplacer                            |
//! |                                                               |
//! |  Mutex<ReplacerState>                                         |
//! |  +---------------------------------------------------------+  |
//! |  | frames: HashMap<FrameId, FrameRecord>                   |  |
//! |  |                                                         |  |
//! |  |   frame 1 -> history [t3, t9]      evictable            |  |
//! |  |   frame 2 -> history [t5]          pinned               |  |
//! |  |   frame 3 -> history [t1, t7]      evictable            |  |
//! |  |                                                         |  |
//! |  | current_timestamp: monotonic, one tick per access       |  |
//! |  | curr_size: count of evictable frames                    |  |
//! |  +---------------------------------------------------------+  |
//! +---------------------------------------------------------------+
//! ```
//!
//! # Eviction Rule
//!
//! Candidates are the evictable frames. Frames with fewer than K recorded
//! accesses have an infinite backward K-distance and are always preferred
//! over frames with a full history. Within either class the victim is the
//! frame with the smallest oldest-retained timestamp. Timestamps are
//! globally unique, so the rule is deterministic.
//!
//! # Thread Safety
//!
//! All operations on a replacer are serialized through a single internal
//! mutex; [`LruKReplacer`] is `Send + Sync` and is shared by reference
//! (or `Arc`) between the buffer pool's worker threads.
//!
//! # Example
//!
//! ```
//! use lruk::LruKReplacer;
//!
//! let replacer = LruKReplacer::new(8, 2);
//! replacer.record_access(3);
//! replacer.set_evictable(3, true);
//! assert_eq!(replacer.evict(), Some(3));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod replacer;

pub use error::{ReplacerError, ReplacerResult};
pub use replacer::{FrameId, LruKReplacer, ReplacerStats};
