use thiserror::Error;

/// Reasons an entry can be refused by the cache.
///
/// Running out of room is never an error; eviction always makes space for
/// anything that fits the configured capacity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("entry of {size} bytes exceeds cache capacity of {capacity} bytes")]
    EntryTooLarge { size: usize, capacity: usize },

    #[error("entry holds no pixel data")]
    EmptyEntry,
}
