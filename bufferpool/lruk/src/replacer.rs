//! The LRU-K replacer.
//!
//! Tracks per-frame access history and selects eviction victims by
//! backward K-distance. See the crate docs for the eviction rule.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::error::{ReplacerError, ReplacerResult};

/// Identifier for a buffer-pool frame.
///
/// Frame ids are dense small integers handed out by the buffer pool;
/// a replacer constructed with capacity `c` accepts ids in `0..=c`.
pub type FrameId = u32;

/// Operation counters for a replacer, snapshotted under the lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplacerStats {
    /// Number of `record_access` calls.
    pub accesses: u64,
    /// Number of successful evictions.
    pub evictions: u64,
    /// Number of frames dropped through `remove`.
    pub removals: u64,
}

/// Access bookkeeping for a single tracked frame.
struct FrameRecord {
    /// Timestamps of the most recent accesses, oldest at the front.
    /// Non-empty from creation; never longer than K.
    history: VecDeque<u64>,
    evictable: bool,
}

impl FrameRecord {
    fn new(k: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(k),
            evictable: false,
        }
    }
}

/// Mutable replacer state, guarded by the replacer's mutex.
struct ReplacerState {
    frames: HashMap<FrameId, FrameRecord>,
    /// Logical clock; advances by exactly one per recorded access, so
    /// timestamps are globally unique across all frames.
    current_timestamp: u64,
    /// Count of frames currently marked evictable.
    curr_size: usize,
    stats: ReplacerStats,
}

/// LRU-K replacement policy over buffer-pool frames.
///
/// The replacer tracks up to `capacity` distinct frames. Frames enter
/// tracking on their first [`record_access`](Self::record_access), start
/// out pinned, and leave through [`evict`](Self::evict) or
/// [`remove`](Self::remove).
///
/// # Thread Safety
///
/// Every public operation acquires the internal mutex for its full
/// duration; concurrent callers observe a sequentially consistent order
/// of operations on the same instance.
pub struct LruKReplacer {
    capacity: usize,
    k: usize,
    inner: Mutex<ReplacerState>,
}

impl LruKReplacer {
    /// Create a replacer for `capacity` frames tracking `k` accesses each.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `k` is zero.
    pub fn new(capacity: usize, k: usize) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        assert!(k >= 1, "k must be at least 1");
        Self {
            capacity,
            k,
            inner: Mutex::new(ReplacerState {
                frames: HashMap::with_capacity(capacity),
                current_timestamp: 0,
                curr_size: 0,
                stats: ReplacerStats::default(),
            }),
        }
    }

    /// Record an access to `frame_id` at the current logical timestamp.
    ///
    /// The first access to a frame creates its record in the pinned
    /// state. Subsequent accesses append to the frame's history; only the
    /// K most recent timestamps are retained.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` exceeds the configured capacity. An id out of
    /// range is a buffer-pool bug, not a recoverable condition.
    pub fn record_access(&self, frame_id: FrameId) {
        assert!(
            frame_id as usize <= self.capacity,
            "frame id {frame_id} out of range"
        );
        let state = &mut *self.inner.lock();
        let timestamp = state.current_timestamp;
        state.current_timestamp += 1;
        state.stats.accesses += 1;

        let record = state
            .frames
            .entry(frame_id)
            .or_insert_with(|| FrameRecord::new(self.k));
        record.history.push_back(timestamp);
        if record.history.len() > self.k {
            record.history.pop_front();
        }
    }

    /// Mark `frame_id` as evictable or pinned.
    ///
    /// Untracked frames are ignored. The call is idempotent: the
    /// evictable count only changes when the flag actually flips.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let state = &mut *self.inner.lock();
        if let Some(record) = state.frames.get_mut(&frame_id)
            && record.evictable != evictable
        {
            record.evictable = evictable;
            if evictable {
                state.curr_size += 1;
            } else {
                state.curr_size -= 1;
            }
        }
    }

    /// Drop `frame_id` from tracking, discarding its access history.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the frame was removed, or was not tracked at all
    /// - `Err(ReplacerError::NotEvictable)` if the frame is pinned; the
    ///   frame's record is left untouched
    pub fn remove(&self, frame_id: FrameId) -> ReplacerResult<()> {
        let state = &mut *self.inner.lock();
        match state.frames.get(&frame_id) {
            None => Ok(()),
            Some(record) if !record.evictable => Err(ReplacerError::NotEvictable),
            Some(_) => {
                state.frames.remove(&frame_id);
                state.curr_size -= 1;
                state.stats.removals += 1;
                Ok(())
            }
        }
    }

    /// Evict the frame with the largest backward K-distance.
    ///
    /// Frames with fewer than K recorded accesses (infinite K-distance)
    /// are always preferred over frames with a full history; within
    /// either class the frame with the smallest oldest-retained timestamp
    /// wins. The victim's record is dropped.
    ///
    /// # Returns
    ///
    /// The evicted frame id, or `None` if no frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let state = &mut *self.inner.lock();
        if state.curr_size == 0 {
            return None;
        }

        // (frame, has a full K-history, oldest retained timestamp)
        let mut victim: Option<(FrameId, bool, u64)> = None;
        for (&frame_id, record) in &state.frames {
            if !record.evictable {
                continue;
            }
            let Some(&oldest) = record.history.front() else {
                continue;
            };
            let mature = record.history.len() == self.k;
            let better = match victim {
                None => true,
                // An infant frame always beats a mature one.
                Some((_, best_mature, _)) if mature != best_mature => best_mature,
                Some((_, _, best_oldest)) => oldest < best_oldest,
            };
            if better {
                victim = Some((frame_id, mature, oldest));
            }
        }

        let (frame_id, _, _) = victim?;
        state.frames.remove(&frame_id);
        state.curr_size -= 1;
        state.stats.evictions += 1;
        Some(frame_id)
    }

    /// Number of frames currently marked evictable.
    ///
    /// Not the number of tracked frames: pinned frames are excluded.
    pub fn size(&self) -> usize {
        self.inner.lock().curr_size
    }

    /// `true` when no frame is evictable.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Maximum number of distinct frames this replacer tracks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The K in LRU-K: how many recent accesses are retained per frame.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Snapshot the operation counters.
    pub fn stats(&self) -> ReplacerStats {
        self.inner.lock().stats
    }
}
