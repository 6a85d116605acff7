use super::error::ClientError;
use crate::cache::{AdaptiveCache, CacheEntry, CacheStats};
use crate::codec::{FramebufferSink, PixelDecoder};
use crate::config::{CacheConfig, MissPolicy};
use crate::content::{ContentHasher, ContentId, PixelBuffer, Rect};
use crate::ledger::BandwidthLedger;
use crate::protocol::{CacheMessage, Direction, ProtocolError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What applying one server message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// An init was decoded and drawn.
    Decoded { id: ContentId },
    /// A reference was drawn from the cache.
    Cached { id: ContentId },
    /// A seed announced an upcoming init.
    Seeded { id: ContentId },
    /// A reference missed; a query is queued and `rect` must be redrawn
    /// from a full update.
    NeedsRefresh { rect: Rect, id: ContentId },
}

/// Per-connection client cache and its outbound message queues.
pub struct ClientCacheAgent<D> {
    cache: AdaptiveCache,
    // Filled by the cache's eviction callback.
    evicted: Arc<Mutex<VecDeque<ContentId>>>,
    hasher: ContentHasher,
    decoder: D,
    ledger: Arc<BandwidthLedger>,
    config: CacheConfig,
    pending_reports: VecDeque<(ContentId, ContentId)>,
    pending_queries: VecDeque<ContentId>,
    // observed id -> canonical id the entry is stored under
    observed: HashMap<ContentId, ContentId>,
    observed_by_canonical: HashMap<ContentId, Vec<ContentId>>,
}

impl<D: PixelDecoder> ClientCacheAgent<D> {
    pub fn new(decoder: D, config: CacheConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let evicted = Arc::new(Mutex::new(VecDeque::new()));
        let queue = Arc::clone(&evicted);
        let cache = AdaptiveCache::with_eviction_callback(
            config.cache_size,
            Box::new(move |id: &ContentId| queue.lock().push_back(*id)),
        );

        Ok(Self {
            cache,
            evicted,
            hasher: config.hasher()?,
            decoder,
            ledger: Arc::new(BandwidthLedger::new()),
            config,
            pending_reports: VecDeque::new(),
            pending_queries: VecDeque::new(),
            observed: HashMap::new(),
            observed_by_canonical: HashMap::new(),
        })
    }

    pub fn with_ledger(mut self, ledger: Arc<BandwidthLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Applies one message from the server, drawing through `sink`.
    pub fn handle_message<S>(
        &mut self,
        message: &CacheMessage,
        sink: &mut S,
    ) -> Result<MessageOutcome, ClientError>
    where
        S: FramebufferSink + ?Sized,
    {
        match message {
            CacheMessage::Init { rect, id, payload } => self.on_init(rect, *id, payload, sink),
            CacheMessage::Reference { rect, id } => {
                self.on_reference(rect, *id, message.encoded_len(), sink)
            }
            CacheMessage::Seed { id } => {
                trace!("Server seeded {}", id);
                Ok(MessageOutcome::Seeded { id: *id })
            }
            _ => Err(ProtocolError::WrongDirection {
                tag: message.tag(),
                expected: Direction::ServerToClient,
            }
            .into()),
        }
    }

    fn on_init<S>(
        &mut self,
        rect: &Rect,
        id: ContentId,
        payload: &Bytes,
        sink: &mut S,
    ) -> Result<MessageOutcome, ClientError>
    where
        S: FramebufferSink + ?Sized,
    {
        let pixels = self.decoder.decode(rect, payload)?;
        check_geometry(rect, &pixels)?;

        let observed = self.hasher.hash_rect(&pixels);
        if observed != id {
            if self.decoder.is_lossy() {
                debug!("Lossy decode of {} hashed to {}", id, observed);
                self.pending_reports.push_back((id, observed));
                self.link_observed(id, observed);
            } else {
                warn!(
                    "Lossless decode of {} hashed to {}; codec or stride handling is inconsistent",
                    id, observed
                );
            }
        }

        if let Err(e) = self.cache.insert(id, CacheEntry::new(id, pixels.clone())) {
            // Drawn but not kept; the server must not reference it.
            warn!("Not caching {}: {}", id, e);
            self.evicted.lock().push_back(id);
        }

        sink.decoded_pixels_ready(rect, &pixels);
        Ok(MessageOutcome::Decoded { id })
    }

    fn on_reference<S>(
        &mut self,
        rect: &Rect,
        id: ContentId,
        wire_bytes: usize,
        sink: &mut S,
    ) -> Result<MessageOutcome, ClientError>
    where
        S: FramebufferSink + ?Sized,
    {
        let key = if self.cache.contains(&id) {
            id
        } else {
            self.observed.get(&id).copied().unwrap_or(id)
        };

        let Some(entry) = self.cache.lookup(&key) else {
            return self.on_miss(rect, id);
        };

        check_geometry(rect, entry.pixels())?;
        sink.cached_pixels_ready(rect, entry.pixels());
        self.ledger.record_reference(wire_bytes, entry.byte_size());
        trace!("Drew cached {} at {:?}", id, rect);
        Ok(MessageOutcome::Cached { id })
    }

    fn on_miss(&mut self, rect: &Rect, id: ContentId) -> Result<MessageOutcome, ClientError> {
        match self.config.miss_policy {
            MissPolicy::Fatal => Err(ClientError::ReferenceMiss(id)),
            MissPolicy::RequestRefresh => {
                // The server seeds and inits under the canonical id.
                let wanted = self.observed.get(&id).copied().unwrap_or(id);
                warn!("Reference to uncached {}, requesting refresh of {}", id, wanted);
                if !self.pending_queries.contains(&wanted) {
                    self.pending_queries.push_back(wanted);
                }
                Ok(MessageOutcome::NeedsRefresh { rect: *rect, id })
            }
        }
    }

    fn link_observed(&mut self, canonical: ContentId, observed: ContentId) {
        self.observed.insert(observed, canonical);
        let aliases = self.observed_by_canonical.entry(canonical).or_default();
        if !aliases.contains(&observed) {
            aliases.push(observed);
        }
    }

    /// Drains the outbound queues into messages for the server.
    ///
    /// Hash reports go first so the server learns aliases before hearing
    /// about their eviction, then queries, then eviction notifies. At most
    /// `max_ids_per_flush` evicted ids are sent per call; the rest wait for
    /// the next flush.
    pub fn flush(&mut self) -> Vec<CacheMessage> {
        let mut messages: Vec<CacheMessage> = self
            .pending_reports
            .drain(..)
            .map(|(canonical, observed)| CacheMessage::HashReport {
                canonical,
                observed,
            })
            .collect();
        messages.extend(
            self.pending_queries
                .drain(..)
                .map(|id| CacheMessage::Query { id }),
        );

        let evicted = self.drain_evictions();
        if !evicted.is_empty() {
            debug!("Notifying server of {} evicted ids", evicted.len());
            messages.extend(CacheMessage::eviction_batches(
                &evicted,
                self.config.max_ids_per_notify,
            ));
        }
        messages
    }

    fn drain_evictions(&mut self) -> Vec<ContentId> {
        let cap = self.config.max_ids_per_flush;
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = self.evicted.lock();

        while let Some(&id) = queue.front() {
            // Re-sent and cached again since it was evicted.
            if self.cache.contains(&id) || seen.contains(&id) {
                queue.pop_front();
                continue;
            }

            let aliases = self
                .observed_by_canonical
                .get(&id)
                .map_or(0, |observed| observed.len());
            if !ids.is_empty() && ids.len() + 1 + aliases > cap {
                break;
            }

            queue.pop_front();
            seen.insert(id);
            ids.push(id);

            for observed in self.observed_by_canonical.remove(&id).unwrap_or_default() {
                if self.observed.get(&observed) == Some(&id) {
                    self.observed.remove(&observed);
                }
                if seen.insert(observed) {
                    ids.push(observed);
                }
            }
        }
        ids
    }

    /// Evicted ids not yet flushed.
    pub fn pending_evictions(&self) -> usize {
        self.evicted.lock().len()
    }

    pub fn cache(&self) -> &AdaptiveCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn ledger(&self) -> &Arc<BandwidthLedger> {
        &self.ledger
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Discards the cache and every queued message, as on connection
    /// teardown. Nothing is reported to the server.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.evicted.lock().clear();
        self.pending_reports.clear();
        self.pending_queries.clear();
        self.observed.clear();
        self.observed_by_canonical.clear();
    }
}

fn check_geometry(rect: &Rect, pixels: &PixelBuffer) -> Result<(), ClientError> {
    if pixels.fits(rect) {
        Ok(())
    } else {
        Err(ClientError::GeometryMismatch {
            rect: *rect,
            width: pixels.width(),
            height: pixels.height(),
        })
    }
}
