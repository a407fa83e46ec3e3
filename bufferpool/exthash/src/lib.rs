//! Extendible hash table for buffer-pool metadata indexing.
//!
//! This crate provides the directory-based hash table a buffer pool
//! uses to map page ids to resident frames (and similar metadata). The
//! table grows incrementally: instead of rehashing everything when load
//! climbs, it doubles a small directory of bucket references and splits
//! only the bucket that overflowed.
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |               ExtendibleHashtable<K, V, S>                   |
//! |                                                              |
//! |  Mutex<Directory>                                            |
//! |  +--------------------------------------------------------+  |
//! |  | directory (2^global_depth slots of bucket ids)         |  |
//! |  |                                                        |  |
//! |  |   00 ----> bucket A (local depth 2)                    |  |
//! |  |   01 --+-> bucket B (local depth 1, aliased)           |  |
//! |  |   10 ----> bucket C (local depth 2)                    |  |
//! |  |   11 --+                                               |  |
//! |  |                                                        |  |
//! |  | bucket arena: Vec<Bucket>, grown by splits             |  |
//! |  +--------------------------------------------------------+  |
//! +--------------------------------------------------------------+
//! ```
//!
//! A bucket whose local depth is below the global depth is referenced
//! by several directory slots at once. Splitting it raises its local
//! depth by one, moves the entries whose hash disagrees in the new bit
//! into a fresh sibling bucket, and repoints the affected slots. When
//! the overflowing bucket already has `local == global` depth, the
//! directory doubles first.
//!
//! # Thread Safety
//!
//! All operations on a table are serialized through a single internal
//! mutex; [`ExtendibleHashtable`] is `Send + Sync` for `Send` key and
//! value types. Lookups return clones, never references into the table.
//!
//! # Example
//!
//! ```
//! use exthash::ExtendibleHashtable;
//!
//! let table: ExtendibleHashtable<u64, String> = ExtendibleHashtable::new(4);
//! table.insert(7, "frame three".to_string()).unwrap();
//! assert_eq!(table.find(&7).as_deref(), Some("frame three"));
//! assert!(table.remove(&7));
//! assert_eq!(table.find(&7), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bucket;
mod error;
mod table;

pub use error::{TableError, TableResult};
pub use table::{ExtendibleHashtable, MAX_GLOBAL_DEPTH, TableStats};
