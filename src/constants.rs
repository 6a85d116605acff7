//! Protocol constants and tuning parameters.
//!
//! Defaults for the cache size, id width and eviction batching. Every value
//! here can be overridden per connection through [`CacheConfig`].
//!
//! [`CacheConfig`]: crate::CacheConfig

use std::time::Duration;

// ============================================================================
// Content identifiers
// ============================================================================

/// Smallest accepted content id length in bytes
pub const MIN_ID_LEN: usize = 1;

/// Largest accepted content id length in bytes (SHA-512 output)
pub const MAX_ID_LEN: usize = 64;

/// Default digest width in bytes
pub const DEFAULT_HASH_WIDTH: usize = 16;

/// Widths up to this use SHA-256, wider ones SHA-512
pub const SHA256_MAX_WIDTH: usize = 32;

// ============================================================================
// Cache sizing
// ============================================================================

/// Default client cache capacity (2GB of decoded pixels)
pub const DEFAULT_CACHE_SIZE: usize = 2048 * 1024 * 1024;

// ============================================================================
// Synchronization
// ============================================================================

/// Maximum ids carried by a single eviction-notify message
pub const DEFAULT_IDS_PER_NOTIFY: usize = 100;

/// Maximum ids flushed as eviction-notify per update cycle
pub const DEFAULT_IDS_PER_FLUSH: usize = 1000;

/// Hard wire limit on ids per eviction-notify (u16 count field)
pub const MAX_IDS_PER_NOTIFY_WIRE: usize = u16::MAX as usize;

/// Maximum canonical -> observed aliases remembered per connection
pub const DEFAULT_MAX_ALIASES: usize = 4096;

/// Rectangles at least this many pixels are seeded by [`MinAreaSeed`] by default
///
/// [`MinAreaSeed`]: crate::server::MinAreaSeed
pub const DEFAULT_MIN_SEED_AREA: u32 = 64 * 64;

// ============================================================================
// Wire framing
// ============================================================================

/// Frame header: one tag byte plus a u32 body length
pub const FRAME_HEADER_LEN: usize = 5;

/// Largest frame body accepted from the wire (64MB)
pub const MAX_FRAME_BODY: usize = 64 * 1024 * 1024;

/// Initial capacity of the transport read buffer
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Read timeout for a single frame
pub const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Write timeout for a single frame
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
