//! Client-side content cache.
//!
//! Decoded rectangles are kept in an [`AdaptiveCache`], keyed by the
//! [`ContentId`] the server assigned, and bounded by the total number of
//! pixel bytes held rather than by entry count.
//!
//! # ARC Caching Algorithm
//!
//! The cache uses the Adaptive Replacement Cache algorithm with byte
//! weights. Four lists are maintained:
//!
//! - `T1` - entries seen once since they were inserted
//! - `T2` - entries hit at least once more
//! - `B1`, `B2` - ghosts of entries evicted from `T1` / `T2`; id and size
//!   only, no pixels
//!
//! Re-inserting an id that is still remembered as a ghost adapts the byte
//! target `p` for `T1`: a `B1` ghost grows it, a `B2` ghost shrinks it.
//! Eviction takes the oldest entry of whichever resident list is over its
//! share, and reports the id through the eviction callback before the entry
//! leaves the bookkeeping.
//!
//! # Examples
//!
//! ```
//! use rectcache::cache::{AdaptiveCache, CacheEntry, ListKind};
//! use rectcache::content::{ContentId, PixelBuffer, PixelFormat};
//! use std::sync::{Arc, Mutex};
//!
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&evicted);
//! let mut cache = AdaptiveCache::with_eviction_callback(
//!     1000,
//!     Box::new(move |id: &ContentId| sink.lock().unwrap().push(*id)),
//! );
//!
//! let entry = |name: &[u8]| {
//!     let id = ContentId::from_bytes(name).unwrap();
//!     let pixels = PixelBuffer::packed(PixelFormat::RGB888, 10, 15, vec![0u8; 600]).unwrap();
//!     (id, CacheEntry::new(id, pixels))
//! };
//!
//! let (a, entry_a) = entry(b"a");
//! let (b, entry_b) = entry(b"b");
//! cache.insert(a, entry_a).unwrap();
//! cache.insert(b, entry_b).unwrap();
//!
//! assert_eq!(*evicted.lock().unwrap(), vec![a]);
//! assert_eq!(cache.list_of(&a), Some(ListKind::B1));
//! assert!(cache.contains(&b));
//! ```
//!
//! [`ContentId`]: crate::content::ContentId

mod adaptive;
mod entry;
mod error;
mod stats;

pub use adaptive::{AdaptiveCache, EvictionCallback, ListKind};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use stats::CacheStats;
