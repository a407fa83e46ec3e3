//! The extendible hash table.
//!
//! A directory of `2^global_depth` slots indexes into an arena of
//! buckets by bucket id. A bucket with local depth `d` is referenced by
//! every slot whose low `d` bits match the bucket's signature, so a
//! bucket with `d < global_depth` is aliased by several slots at once.
//! Splitting a full bucket peels the aliased slots apart one bit at a
//! time; when the full bucket already owns a single slot, the directory
//! doubles first.

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;
use parking_lot::Mutex;

use crate::bucket::Bucket;
use crate::error::{TableError, TableResult};

/// Upper bound on the directory-index width, in bits.
///
/// A directory never grows past `2^MAX_GLOBAL_DEPTH` slots. Inserting a
/// set of keys that collide in all `MAX_GLOBAL_DEPTH` low hash bits and
/// overflow one bucket fails with [`TableError::CapacityExceeded`]
/// instead of splitting forever.
pub const MAX_GLOBAL_DEPTH: u32 = 32;

/// Mask selecting the low `depth` bits of a hash.
const fn low_bits(depth: u32) -> u64 {
    (1u64 << depth) - 1
}

/// Identifies a bucket in the table's bucket arena.
///
/// Directory slots store bucket ids rather than owning buckets so that
/// several slots can alias one bucket; slot aliasing is what makes a
/// bucket's local depth meaningful.
type BucketId = u32;

/// Operation counters for a table, snapshotted under the lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Entries inserted (excluding overwrites of existing keys).
    pub inserts: u64,
    /// Inserts that replaced the value of an existing key.
    pub overwrites: u64,
    /// Entries removed.
    pub removals: u64,
    /// Bucket splits performed.
    pub splits: u64,
    /// Directory doublings performed.
    pub directory_doublings: u64,
}

/// Directory state, guarded by the table's mutex.
struct Directory<K, V> {
    /// Number of hash bits used to index `slots`; `slots.len()` is
    /// always exactly `2^global_depth`.
    global_depth: u32,
    slots: Vec<BucketId>,
    /// Bucket arena. Splits push new buckets; nothing is ever freed,
    /// since the split bucket always keeps at least one slot.
    buckets: Vec<Bucket<K, V>>,
    num_entries: usize,
    stats: TableStats,
}

impl<K, V> Directory<K, V> {
    fn index_of(&self, hash: u64) -> usize {
        (hash & low_bits(self.global_depth)) as usize
    }

    /// Double the directory: append a copy of the slot array and use
    /// one more hash bit. Existing slot aliases are preserved in order.
    fn double(&mut self) {
        self.slots.extend_from_within(..);
        self.global_depth += 1;
        self.stats.directory_doublings += 1;
    }
}

/// A concurrent extendible hash table mapping `K` to `V`.
///
/// The table grows by doubling its directory and splitting individual
/// buckets on demand; it never shrinks, and removal never merges
/// buckets. Lookups return values by clone, so no reference into the
/// table outlives the internal lock.
///
/// Hashing is pluggable through the `S: BuildHasher` parameter and
/// defaults to [`ahash::RandomState`]. The hasher must be deterministic
/// for the lifetime of the table.
///
/// # Thread Safety
///
/// Every public operation acquires the internal mutex for its full
/// duration; concurrent callers observe a sequentially consistent order
/// of operations on the same instance.
///
/// # Example
///
/// ```
/// use exthash::ExtendibleHashtable;
///
/// let table = ExtendibleHashtable::new(4);
/// table.insert(1u64, "one").unwrap();
/// assert_eq!(table.find(&1), Some("one"));
/// assert!(table.remove(&1));
/// ```
pub struct ExtendibleHashtable<K, V, S = RandomState> {
    bucket_size: usize,
    hash_builder: S,
    inner: Mutex<Directory<K, V>>,
}

impl<K: Hash + Eq, V> ExtendibleHashtable<K, V> {
    /// Create a table whose buckets hold up to `bucket_size` entries.
    ///
    /// The table starts with a single bucket of local depth 0 and a
    /// one-slot directory.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExtendibleHashtable<K, V, S> {
    /// Create a table using the supplied hasher state.
    ///
    /// Use this to pin the hash function, e.g. for deterministic bucket
    /// placement in tests.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        assert!(bucket_size >= 1, "bucket size must be at least 1");
        Self {
            bucket_size,
            hash_builder,
            inner: Mutex::new(Directory {
                global_depth: 0,
                slots: vec![0],
                buckets: vec![Bucket::new(bucket_size, 0)],
                num_entries: 0,
                stats: TableStats::default(),
            }),
        }
    }

    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Look up `key` and return a clone of its value.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash(key);
        let dir = self.inner.lock();
        let bucket_id = dir.slots[dir.index_of(hash)];
        dir.buckets[bucket_id as usize].get(key).cloned()
    }

    /// Insert `key -> value`, overwriting the value of an existing key.
    ///
    /// A full target bucket is split until the key's slot has room,
    /// doubling the directory whenever the bucket's local depth has
    /// caught up with the global depth.
    ///
    /// # Returns
    ///
    /// - `Ok(())` once the entry is stored
    /// - `Err(TableError::CapacityExceeded)` if more keys than one
    ///   bucket can hold collide in all [`MAX_GLOBAL_DEPTH`] indexable
    ///   hash bits; splits already performed are kept and no entry is
    ///   lost
    pub fn insert(&self, key: K, value: V) -> TableResult<()> {
        let hash = self.hash(&key);
        let dir = &mut *self.inner.lock();
        loop {
            let bucket_id = dir.slots[dir.index_of(hash)];
            let bucket = &mut dir.buckets[bucket_id as usize];

            if let Some(existing) = bucket.get_mut(&key) {
                *existing = value;
                dir.stats.overwrites += 1;
                return Ok(());
            }
            if bucket.len() < self.bucket_size {
                bucket.push(key, value);
                dir.num_entries += 1;
                dir.stats.inserts += 1;
                return Ok(());
            }

            // The bucket is full. If every resident key collides with
            // the new key in all indexable hash bits, no split depth
            // can separate them.
            let max_mask = low_bits(MAX_GLOBAL_DEPTH);
            if bucket
                .keys()
                .all(|k| self.hash(k) & max_mask == hash & max_mask)
            {
                return Err(TableError::CapacityExceeded);
            }

            if bucket.local_depth() == dir.global_depth {
                if dir.global_depth == MAX_GLOBAL_DEPTH {
                    return Err(TableError::CapacityExceeded);
                }
                dir.double();
            } else {
                self.split(dir, bucket_id);
            }
            // Retry against the regrown directory.
        }
    }

    /// Split a full bucket, peeling one directory bit apart.
    ///
    /// The bucket's local depth is incremented, a sibling bucket is
    /// allocated at the same depth, entries move to the sibling when
    /// their hash differs from the bucket's signature in the new bit,
    /// and the directory slots on the sibling's side of the split are
    /// repointed.
    fn split(&self, dir: &mut Directory<K, V>, bucket_id: BucketId) {
        let new_depth = dir.buckets[bucket_id as usize].increment_depth();
        let home_mask = low_bits(new_depth - 1);
        let full_mask = low_bits(new_depth);

        // Before the split every entry shares its low (new_depth - 1)
        // hash bits; read the shared signature off any resident key.
        let home = {
            let key = dir.buckets[bucket_id as usize]
                .any_key()
                .expect("split target is a full bucket");
            self.hash(key) & home_mask
        };

        let moved =
            dir.buckets[bucket_id as usize].drain_where(|key| self.hash(key) & full_mask != home);
        let mut sibling = Bucket::new(self.bucket_size, new_depth);
        sibling.absorb(moved);
        let sibling_id = dir.buckets.len() as BucketId;
        dir.buckets.push(sibling);

        // Slots that shared the bucket's old signature but disagree in
        // the new bit now belong to the sibling.
        for (index, slot) in dir.slots.iter_mut().enumerate() {
            let index = index as u64;
            if index & home_mask == home && index & full_mask != home {
                *slot = sibling_id;
            }
        }
        dir.stats.splits += 1;
    }

    /// Remove `key` from the table.
    ///
    /// Buckets are never merged and the directory never shrinks.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed, `false` if the key was absent.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let dir = &mut *self.inner.lock();
        let bucket_id = dir.slots[dir.index_of(hash)];
        let removed = dir.buckets[bucket_id as usize].remove(key);
        if removed {
            dir.num_entries -= 1;
            dir.stats.removals += 1;
        }
        removed
    }

    /// Number of hash bits currently used to index the directory.
    pub fn global_depth(&self) -> u32 {
        self.inner.lock().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is not a valid directory index.
    pub fn local_depth(&self, dir_index: usize) -> u32 {
        let dir = self.inner.lock();
        let bucket_id = dir.slots[dir_index];
        dir.buckets[bucket_id as usize].local_depth()
    }

    /// Number of distinct buckets backing the directory.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Number of entries stored in the table.
    pub fn len(&self) -> usize {
        self.inner.lock().num_entries
    }

    /// `true` when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the operation counters.
    pub fn stats(&self) -> TableStats {
        self.inner.lock().stats
    }

    /// Walk the whole table and panic on the first violated invariant.
    ///
    /// Checks that the directory size matches the global depth, that
    /// every bucket is referenced by exactly the slots its local depth
    /// and signature prescribe, that every entry hashes into its
    /// bucket's signature, and that no bucket exceeds its capacity.
    /// Intended for tests and debugging; the walk is O(directory +
    /// entries) and holds the lock throughout.
    pub fn check_integrity(&self) {
        let dir = self.inner.lock();
        assert_eq!(
            dir.slots.len(),
            1usize << dir.global_depth,
            "directory size must be 2^global_depth"
        );

        let mut slot_counts = vec![0usize; dir.buckets.len()];
        let mut signatures: Vec<Option<u64>> = vec![None; dir.buckets.len()];
        for (index, &bucket_id) in dir.slots.iter().enumerate() {
            let bucket = &dir.buckets[bucket_id as usize];
            assert!(
                bucket.local_depth() <= dir.global_depth,
                "bucket {bucket_id} local depth exceeds global depth"
            );
            let signature = (index as u64) & low_bits(bucket.local_depth());
            let expected = signatures[bucket_id as usize].get_or_insert(signature);
            assert_eq!(
                signature, *expected,
                "slots aliasing bucket {bucket_id} disagree on its signature"
            );
            slot_counts[bucket_id as usize] += 1;
        }

        let mut total_entries = 0;
        for (bucket_id, bucket) in dir.buckets.iter().enumerate() {
            let signature = signatures[bucket_id]
                .unwrap_or_else(|| panic!("bucket {bucket_id} is referenced by no slot"));
            assert_eq!(
                slot_counts[bucket_id],
                1usize << (dir.global_depth - bucket.local_depth()),
                "bucket {bucket_id} has the wrong number of aliased slots"
            );
            assert!(
                bucket.len() <= self.bucket_size,
                "bucket {bucket_id} exceeds its capacity"
            );
            for key in bucket.keys() {
                assert_eq!(
                    self.hash(key) & low_bits(bucket.local_depth()),
                    signature,
                    "entry hashed outside its bucket's signature"
                );
            }
            total_entries += bucket.len();
        }
        assert_eq!(total_entries, dir.num_entries, "entry count out of sync");
    }
}
