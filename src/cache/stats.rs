/// Point-in-time counters for an [`AdaptiveCache`].
///
/// [`AdaptiveCache`]: super::AdaptiveCache
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub used_bytes: usize,
    pub capacity: usize,
    pub target_t1_bytes: usize,
    pub t1_len: usize,
    pub t2_len: usize,
    pub b1_len: usize,
    pub b2_len: usize,
    pub hits: u64,
    pub misses: u64,
    /// Misses on ids still remembered by a ghost list.
    pub ghost_hits: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub rejections: u64,
}

impl CacheStats {
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.capacity as f64
        }
    }
}
