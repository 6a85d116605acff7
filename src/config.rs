//! Per-connection tuning.
//!
//! [`CacheConfig`] starts from the defaults in [`crate::constants`] and is
//! adjusted with `with_*` builders. Both agents validate it on construction.
//!
//! ```
//! use rectcache::{CacheConfig, MissPolicy};
//!
//! let config = CacheConfig::default()
//!     .with_cache_size_mb(256)
//!     .with_hash_width(20)
//!     .with_miss_policy(MissPolicy::RequestRefresh);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.cache_size, 256 * 1024 * 1024);
//! ```

use crate::constants::{
    DEFAULT_CACHE_SIZE, DEFAULT_HASH_WIDTH, DEFAULT_IDS_PER_FLUSH, DEFAULT_IDS_PER_NOTIFY,
    DEFAULT_MAX_ALIASES, MAX_IDS_PER_NOTIFY_WIRE, MAX_ID_LEN, MIN_ID_LEN,
};
use crate::content::ContentHasher;
use thiserror::Error;

/// What the client does when a reference names content it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissPolicy {
    /// Treat the miss as a protocol violation.
    #[default]
    Fatal,
    /// Ask the server to resend the content with a query and report the
    /// rectangle as needing a full update.
    RequestRefresh,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("hash width {0} outside 1..=64")]
    InvalidHashWidth(usize),

    #[error("cache size must be non-zero")]
    ZeroCacheSize,

    #[error("{0} must be non-zero")]
    ZeroLimit(&'static str),

    #[error("max ids per notify {0} exceeds wire limit {max}", max = MAX_IDS_PER_NOTIFY_WIRE)]
    NotifyLimitTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Client cache capacity in bytes of decoded pixels.
    pub cache_size: usize,
    /// Content id width in bytes.
    pub hash_width: usize,
    /// Ids per eviction-notify message.
    pub max_ids_per_notify: usize,
    /// Ids per flush, across all eviction-notify messages.
    pub max_ids_per_flush: usize,
    /// Canonical to observed aliases remembered by the server.
    pub max_aliases: usize,
    pub miss_policy: MissPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            hash_width: DEFAULT_HASH_WIDTH,
            max_ids_per_notify: DEFAULT_IDS_PER_NOTIFY,
            max_ids_per_flush: DEFAULT_IDS_PER_FLUSH,
            max_aliases: DEFAULT_MAX_ALIASES,
            miss_policy: MissPolicy::Fatal,
        }
    }
}

impl CacheConfig {
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    pub fn with_cache_size_mb(mut self, mb: usize) -> Self {
        self.cache_size = mb.saturating_mul(1024 * 1024);
        self
    }

    pub fn with_hash_width(mut self, width: usize) -> Self {
        self.hash_width = width;
        self
    }

    pub fn with_max_ids_per_notify(mut self, max: usize) -> Self {
        self.max_ids_per_notify = max;
        self
    }

    pub fn with_max_ids_per_flush(mut self, max: usize) -> Self {
        self.max_ids_per_flush = max;
        self
    }

    pub fn with_max_aliases(mut self, max: usize) -> Self {
        self.max_aliases = max;
        self
    }

    pub fn with_miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&self.hash_width) {
            return Err(ConfigError::InvalidHashWidth(self.hash_width));
        }
        if self.cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize);
        }
        if self.max_ids_per_notify == 0 {
            return Err(ConfigError::ZeroLimit("max_ids_per_notify"));
        }
        if self.max_ids_per_notify > MAX_IDS_PER_NOTIFY_WIRE {
            return Err(ConfigError::NotifyLimitTooLarge(self.max_ids_per_notify));
        }
        if self.max_ids_per_flush == 0 {
            return Err(ConfigError::ZeroLimit("max_ids_per_flush"));
        }
        if self.max_aliases == 0 {
            return Err(ConfigError::ZeroLimit("max_aliases"));
        }
        Ok(())
    }

    /// Hasher for the configured id width.
    pub fn hasher(&self) -> Result<ContentHasher, ConfigError> {
        ContentHasher::new(self.hash_width)
            .map_err(|_| ConfigError::InvalidHashWidth(self.hash_width))
    }
}
