//! LRU-K page replacement algorithm.
//!
//! The algorithm implemented here is based on the [LRU-K paper](https://dl.acm.org/doi/10.1145/170036.170081).
//!
//! Every frame keeps the timestamps of its `k` most recent accesses. The
//! victim is the evictable frame with the largest backward k-distance, i.e.
//! the one whose k-th most recent access lies furthest in the past. Frames
//! with fewer than `k` recorded accesses have infinite k-distance and are
//! evicted first, oldest access first.

use {
    crate::{AccessType, EvictError, EvictResult, EvictionPolicy, FrameId, util::LogicalClock},
    parking_lot::Mutex,
    priority_queue::PriorityQueue,
    std::{
        cmp::Reverse,
        collections::{HashMap, VecDeque},
    },
    tracing::{debug, trace, warn},
};

/// Default look-back window for LRU-K frame replacer.
pub const LRUK_REPLACER_K: usize = 2;

/// Default number of frames tracked by LRU-K frame replacer.
pub const LRUK_REPLACER_CAPACITY: usize = 4096;

/// Configuration of the LRU-K replacer.
#[derive(Debug, Clone)]
pub struct LruKConfig {
    /// Maximum number of frames to keep track of.
    pub capacity: usize,

    /// Number of most recent page accesses to keep track of. Must be at
    /// least 1.
    pub k: usize,

    /// Correlated reference period (in logical ticks).
    ///
    /// Consider intra-transaction references for an update operation, where
    /// page is first referenced during database search and then when the update
    /// is committed. Such access is considered correlated and should not affect
    /// (reward or penalize) the page's backward-k distance.
    ///
    /// Accesses that come within `ref_period` ticks of the previous access to
    /// the same frame are correlated. Zero disables correlation tracking.
    pub ref_period: u64,
}

impl Default for LruKConfig {
    fn default() -> Self {
        Self {
            capacity: LRUK_REPLACER_CAPACITY,
            k: LRUK_REPLACER_K,
            ref_period: 0,
        }
    }
}

/// Eviction tier of a frame.
///
/// Variant order matters: cold frames are evicted before hot ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    /// Fewer than `k` accesses recorded, infinite backward k-distance.
    Cold,
    /// Full history of `k` accesses, finite backward k-distance.
    Hot,
}

/// Eviction priority of an evictable frame. The smallest key is evicted first.
///
/// History is capped at `k` entries, so its front is the oldest access for a
/// cold frame and the k-th most recent access for a hot one. Either way, the
/// older the front timestamp, the better the eviction candidate. The frame id
/// breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EvictionKey<F> {
    tier: Tier,
    timestamp: u64,
    id: F,
}

impl<F> EvictionKey<F> {
    /// Backward k-distance at time `now`, `None` standing for infinity.
    fn k_distance(&self, now: u64) -> Option<u64> {
        match self.tier {
            Tier::Cold => None,
            Tier::Hot => Some(now.saturating_sub(self.timestamp)),
        }
    }
}

/// Access history of a single frame.
#[derive(Debug)]
struct FrameHistory {
    /// Timestamps of up to the `k` most recent *uncorrelated* accesses.
    ///
    /// The most recent reference is at the back of the list.
    refs: VecDeque<u64>,

    /// Timestamp of the last access.
    ///
    /// This value is updated on every access, i.e. even if the access is a
    /// correlated reference -- therefore `refs[refs.len()-1]` and `last_ref`
    /// are not always the same.
    last_ref: u64,

    /// Whether the frame may be chosen for eviction.
    evictable: bool,
}

impl FrameHistory {
    fn new(k: usize) -> Self {
        Self {
            refs: VecDeque::with_capacity(k),
            last_ref: 0,
            evictable: false,
        }
    }

    /// Records an access at `timestamp`.
    ///
    /// History is only extended on uncorrelated references; see
    /// [`LruKConfig::ref_period`].
    fn touch(&mut self, timestamp: u64, k: usize, ref_period: u64) {
        let correlated = ref_period > 0
            && !self.refs.is_empty()
            && timestamp - self.last_ref <= ref_period;

        if !correlated {
            // Shift the references to close the previous correlated period.
            let shift = self.refs.back().map_or(0, |newest| self.last_ref - newest);
            if shift > 0 {
                for history_el in &mut self.refs {
                    *history_el += shift;
                }
            }

            if self.refs.len() >= k {
                self.refs.pop_front();
            }
            self.refs.push_back(timestamp);
        }

        self.last_ref = timestamp;
    }

    fn eviction_key<F>(&self, id: F, k: usize) -> EvictionKey<F> {
        EvictionKey {
            tier: if self.refs.len() < k {
                Tier::Cold
            } else {
                Tier::Hot
            },
            timestamp: self.refs.front().copied().unwrap_or_default(),
            id,
        }
    }
}

/// Implements the LRU-K page replacement algorithm.
///
/// All state lives behind a single mutex, so the replacer can be shared
/// between buffer pool workers (e.g. wrapped in an `Arc`).
pub struct LruKReplacer<F: FrameId> {
    inner: Mutex<Inner<F>>,
}

struct Inner<F: FrameId> {
    /// Configuration of the replacer.
    config: LruKConfig,

    /// Access history of every tracked frame.
    frames: HashMap<F, FrameHistory>,

    /// Evictable frames, ordered by eviction priority.
    ///
    /// Contains exactly the frames whose history is marked evictable, so its
    /// length is the size of the replacer.
    evictable: PriorityQueue<F, Reverse<EvictionKey<F>>>,

    /// Logical time, advanced on every recorded access.
    clock: LogicalClock,
}

impl<F: FrameId> Default for LruKReplacer<F> {
    fn default() -> Self {
        Self::with_config(LruKConfig::default())
    }
}

impl<F: FrameId> LruKReplacer<F> {
    /// Creates a new LRU-K replacer with the given capacity and `k` value.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(capacity: usize, k: usize) -> Self {
        Self::with_config(LruKConfig {
            capacity,
            k,
            ..LruKConfig::default()
        })
    }

    /// Creates a new LRU-K replacer with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is zero.
    pub fn with_config(config: LruKConfig) -> Self {
        assert!(config.k >= 1, "LRU-K replacer requires k >= 1");

        let capacity = config.capacity;
        Self {
            inner: Mutex::new(Inner {
                config,
                frames: HashMap::with_capacity(capacity),
                evictable: PriorityQueue::with_capacity(capacity),
                clock: LogicalClock::new(),
            }),
        }
    }

    /// The `k` this replacer was configured with.
    pub fn k(&self) -> usize {
        self.inner.lock().config.k
    }

    /// Current logical timestamp, i.e. the timestamp of the latest access.
    pub fn now(&self) -> u64 {
        self.inner.lock().clock.now()
    }

    /// Recorded access timestamps of a frame, oldest first.
    pub fn history(&self, id: F) -> Option<Vec<u64>> {
        let inner = self.inner.lock();
        inner
            .frames
            .get(&id)
            .map(|frame| frame.refs.iter().copied().collect())
    }

    /// Whether a tracked frame is evictable; `None` for unknown frames.
    pub fn is_evictable(&self, id: F) -> Option<bool> {
        self.inner.lock().frames.get(&id).map(|frame| frame.evictable)
    }
}

impl<F: FrameId> EvictionPolicy<F> for LruKReplacer<F> {
    type Error = EvictError<F>;

    fn evict(&self) -> Option<F> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let (id, Reverse(key)) = inner.evictable.pop()?;
        inner.frames.remove(&id);

        debug!(
            frame = %id,
            tier = ?key.tier,
            k_distance = ?key.k_distance(inner.clock.now()),
            "evicted frame"
        );
        Some(id)
    }

    fn peek(&self) -> Option<F> {
        let inner = self.inner.lock();
        inner.evictable.peek().map(|(id, _)| *id)
    }

    fn record_access(&self, id: F, access_type: AccessType) -> EvictResult<(), F> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        // The replacer is full, cannot track a new frame.
        if !inner.frames.contains_key(&id) && inner.frames.len() >= inner.config.capacity {
            return Err(EvictError::FrameReplacerFull);
        }

        let timestamp = inner.clock.tick().ok_or(EvictError::SequenceExhausted)?;
        let k = inner.config.k;

        let frame = inner
            .frames
            .entry(id)
            .or_insert_with(|| FrameHistory::new(k));
        frame.touch(timestamp, k, inner.config.ref_period);

        // History changed, so does the eviction priority.
        if frame.evictable {
            inner
                .evictable
                .change_priority(&id, Reverse(frame.eviction_key(id, k)));
        }

        trace!(frame = %id, %access_type, timestamp, "recorded frame access");
        Ok(())
    }

    fn set_evictable(&self, id: F, evictable: bool) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let k = inner.config.k;

        // Unknown frames are ignored.
        let Some(frame) = inner.frames.get_mut(&id) else {
            return;
        };

        // No-op if the frame is already in the desired state.
        if frame.evictable == evictable {
            return;
        }

        frame.evictable = evictable;
        if evictable {
            inner.evictable.push(id, Reverse(frame.eviction_key(id, k)));
        } else {
            inner.evictable.remove(&id);
        }

        trace!(frame = %id, evictable, "changed frame evictability");
    }

    fn remove(&self, id: F) -> EvictResult<(), F> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(frame) = inner.frames.get(&id) else {
            return Ok(());
        };
        if !frame.evictable {
            warn!(frame = %id, "refusing to remove pinned frame");
            return Err(EvictError::PinnedFrameRemoval(id));
        }

        inner.frames.remove(&id);
        inner.evictable.remove(&id);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.inner.lock().config.capacity
    }

    fn size(&self) -> usize {
        self.inner.lock().evictable.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_capped_at_k() {
        let mut frame = FrameHistory::new(3);
        for ts in 1..=5 {
            frame.touch(ts, 3, 0);
        }
        assert_eq!(frame.refs, [3, 4, 5]);
        assert_eq!(frame.last_ref, 5);
    }

    #[test]
    fn correlated_refs_are_collapsed() {
        let mut frame = FrameHistory::new(2);

        // 1 opens the period, 2 and 3 are correlated with it.
        frame.touch(1, 2, 2);
        frame.touch(2, 2, 2);
        frame.touch(3, 2, 2);
        assert_eq!(frame.refs, [1]);
        assert_eq!(frame.last_ref, 3);

        // Uncorrelated access: the burst [1..3] is closed by shifting the
        // history forward by its length.
        frame.touch(10, 2, 2);
        assert_eq!(frame.refs, [3, 10]);
        assert_eq!(frame.last_ref, 10);
    }

    #[test]
    fn eviction_key_tiers() {
        let mut cold = FrameHistory::new(2);
        cold.touch(7, 2, 0);
        let mut hot = FrameHistory::new(2);
        hot.touch(1, 2, 0);
        hot.touch(2, 2, 0);

        let cold_key = cold.eviction_key(1u32, 2);
        let hot_key = hot.eviction_key(2u32, 2);
        assert_eq!(cold_key.tier, Tier::Cold);
        assert_eq!(hot_key.tier, Tier::Hot);
        assert_eq!(cold_key.k_distance(10), None);
        assert_eq!(hot_key.k_distance(10), Some(9));

        // Cold frame goes first, even though its access is more recent.
        assert!(cold_key < hot_key);
    }

    #[test]
    fn same_tick_ties_break_on_frame_id() {
        let mut queue = PriorityQueue::new();
        for id in [9u32, 3, 5] {
            let key = EvictionKey {
                tier: Tier::Cold,
                timestamp: 4,
                id,
            };
            queue.push(id, Reverse(key));
        }
        queue.push(
            1,
            Reverse(EvictionKey {
                tier: Tier::Hot,
                timestamp: 1,
                id: 1,
            }),
        );

        let order: Vec<u32> = std::iter::from_fn(|| queue.pop().map(|(id, _)| id)).collect();
        assert_eq!(order, [3, 5, 9, 1]);
    }
}
