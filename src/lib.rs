#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(elided_lifetimes_in_paths)]

mod error;
pub mod replacer;
mod util;

use std::{fmt, hash::Hash};

pub use {
    error::{EvictError, EvictResult},
    replacer::{LruKConfig, LruKReplacer},
};

/// Frame identifier type.
///
/// Conceptually, the buffer pool is a fixed-size array of frames, where each
/// frame is a slot that holds some page of data. The frame identifier is an
/// index into this array; the replacer treats it as an opaque, totally ordered
/// key (the order is used to break ties between equally old frames).
pub trait FrameId: Copy + Hash + Ord + fmt::Display + fmt::Debug {}

impl<T> FrameId for T where T: Copy + Hash + Ord + fmt::Display + fmt::Debug {}

/// Page access type.
///
/// The buffer pool tags every access with the reason the page was touched.
/// The tag is informational: it ends up in the trace log, but does not change
/// the backward k-distance of a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Access of unspecified nature.
    #[default]
    Unknown,
    /// Page was read.
    Read,
    /// Page was modified.
    Write,
    /// Page was freshly allocated and loaded into the frame.
    New,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessType::Unknown => "unknown",
            AccessType::Read => "read",
            AccessType::Write => "write",
            AccessType::New => "new",
        };
        f.write_str(s)
    }
}

/// Page eviction policy.
///
/// Defines an interface between the buffer pool and a page replacement
/// strategy: logging data access, managing per-frame metadata, and eventually
/// locating the next frame to evict.
pub trait EvictionPolicy<F: FrameId> {
    /// Error type for the eviction policy.
    type Error: std::error::Error;

    /// Find the next frame to be evicted and evict it.
    ///
    /// Only evictable (non-pinned) frames are candidates for eviction.
    ///
    /// Successful eviction of a frame decreases the number of evictable
    /// frames and drops the frame's access history.
    fn evict(&self) -> Option<F>;

    /// Peek into the next frame to be evicted.
    ///
    /// Returns the same frame the next [`EvictionPolicy::evict`] call would,
    /// but leaves the replacer untouched.
    fn peek(&self) -> Option<F>;

    /// Notifies the policy that a page held by the frame has been accessed.
    ///
    /// A previously unseen frame starts being tracked, initially
    /// non-evictable.
    fn record_access(&self, id: F, access_type: AccessType) -> Result<(), Self::Error>;

    /// Same as [`EvictionPolicy::record_access`] with
    /// [`AccessType::Unknown`].
    fn touch(&self, id: F) -> Result<(), Self::Error> {
        self.record_access(id, AccessType::Unknown)
    }

    /// Marks a frame as evictable or not.
    ///
    /// Unknown frames are ignored, and setting the flag to its current value
    /// is a no-op.
    fn set_evictable(&self, id: F, evictable: bool);

    /// Pin a frame, marking it as non-evictable.
    fn pin(&self, id: F) {
        self.set_evictable(id, false);
    }

    /// Unpin a frame, marking it as evictable.
    fn unpin(&self, id: F) {
        self.set_evictable(id, true);
    }

    /// Removes an evictable frame along with its access history.
    ///
    /// In contrast to [`evict`](crate::EvictionPolicy::evict), this function
    /// removes an arbitrary evictable frame, not necessarily the one with
    /// the highest priority. Removing an unknown frame does nothing.
    ///
    /// If the frame is pinned, then this function should return an error.
    fn remove(&self, id: F) -> Result<(), Self::Error>;

    /// Returns the maximum number of frames that can be tracked.
    fn capacity(&self) -> usize;

    /// The number of frames that can be evicted.
    fn size(&self) -> usize;
}
