use super::error::ServerError;
use super::peer_state::{PeerSyncState, SyncState};
use super::policy::{MinAreaSeed, SeedPolicy};
use crate::codec::PixelEncoder;
use crate::config::CacheConfig;
use crate::content::{ContentHasher, ContentId, PixelBuffer, Rect};
use crate::ledger::BandwidthLedger;
use crate::protocol::{CacheMessage, Direction, ProtocolError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// How one rectangle was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeDecision {
    /// The client already holds the content under `id`.
    Reference { id: ContentId },
    /// The full payload was sent, to be cached under `id`.
    Init { id: ContentId },
    /// Not cacheable right now; send through the ordinary encoding path.
    Fallback,
}

/// Result of [`EncodeDecisionEngine::encode_rect`].
#[derive(Debug, Clone)]
pub struct EncodeOutput {
    /// Canonical id of the rectangle's pixels.
    pub canonical: ContentId,
    pub decision: EncodeDecision,
    /// Messages to write, in order. Empty for [`EncodeDecision::Fallback`].
    pub messages: Vec<CacheMessage>,
}

/// Per-connection encode decisions for the cache protocol.
pub struct EncodeDecisionEngine<E, P = MinAreaSeed> {
    hasher: ContentHasher,
    encoder: E,
    policy: P,
    peer: PeerSyncState,
    ledger: Arc<BandwidthLedger>,
    // Encoded size of each init sent, for crediting later references.
    payload_sizes: HashMap<ContentId, usize>,
    config: CacheConfig,
}

impl<E: PixelEncoder> EncodeDecisionEngine<E, MinAreaSeed> {
    pub fn new(encoder: E, config: CacheConfig) -> Result<Self, ServerError> {
        Self::with_policy(encoder, MinAreaSeed::default(), config)
    }
}

impl<E: PixelEncoder, P: SeedPolicy> EncodeDecisionEngine<E, P> {
    pub fn with_policy(encoder: E, policy: P, config: CacheConfig) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self {
            hasher: config.hasher()?,
            encoder,
            policy,
            peer: PeerSyncState::with_max_aliases(config.max_aliases),
            ledger: Arc::new(BandwidthLedger::new()),
            payload_sizes: HashMap::new(),
            config,
        })
    }

    /// Shares an existing ledger, e.g. one also read by a stats reporter.
    pub fn with_ledger(mut self, ledger: Arc<BandwidthLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Decides how to send `pixels` at `rect` and produces the messages.
    ///
    /// In order: a `Known` id is referenced; a `Known` alias is referenced;
    /// a `Requested` id gets an init; an `Unknown` id the seed policy likes
    /// gets a seed and an init; anything else falls back.
    pub fn encode_rect(
        &mut self,
        rect: &Rect,
        pixels: &PixelBuffer,
    ) -> Result<EncodeOutput, ServerError> {
        if !pixels.fits(rect) {
            return Err(ServerError::GeometryMismatch {
                rect: *rect,
                width: pixels.width(),
                height: pixels.height(),
            });
        }

        let canonical = self.hasher.hash_rect(pixels);

        if self.peer.is_known(&canonical) {
            return Ok(self.reference(rect, canonical, canonical, pixels));
        }

        if let Some(alias) = self.peer.alias_for(&canonical) {
            if self.peer.is_known(&alias) {
                return Ok(self.reference(rect, canonical, alias, pixels));
            }
        }

        match self.peer.state(&canonical) {
            SyncState::Requested => {
                let init = self.init(rect, canonical, pixels)?;
                Ok(EncodeOutput {
                    canonical,
                    decision: EncodeDecision::Init { id: canonical },
                    messages: vec![init],
                })
            }
            SyncState::Unknown if self.policy.should_seed(rect, pixels) => {
                self.peer.seed(canonical);
                debug!("Seeding {} for {}x{} rect", canonical, rect.width, rect.height);
                let init = self.init(rect, canonical, pixels)?;
                Ok(EncodeOutput {
                    canonical,
                    decision: EncodeDecision::Init { id: canonical },
                    messages: vec![CacheMessage::Seed { id: canonical }, init],
                })
            }
            _ => {
                trace!("Fallback for {} at {:?}", canonical, rect);
                Ok(EncodeOutput {
                    canonical,
                    decision: EncodeDecision::Fallback,
                    messages: Vec::new(),
                })
            }
        }
    }

    /// Announces `id` ahead of its init, for regions assembled from
    /// several sub-rectangles. Only `Unknown` ids are seeded.
    pub fn seed(&mut self, id: ContentId) -> Option<CacheMessage> {
        if self.peer.seed(id) {
            debug!("Seeded {}", id);
            Some(CacheMessage::Seed { id })
        } else {
            None
        }
    }

    /// Applies a message received from the client.
    pub fn handle_client_message(&mut self, message: &CacheMessage) -> Result<(), ServerError> {
        if message.direction() != Direction::ClientToServer {
            return Err(ProtocolError::WrongDirection {
                tag: message.tag(),
                expected: Direction::ClientToServer,
            }
            .into());
        }

        match message {
            CacheMessage::Query { id } => {
                trace!("Client queried {}", id);
                self.peer.on_query(*id);
            }
            CacheMessage::HashReport {
                canonical,
                observed,
            } => {
                if self.peer.on_hash_report(*canonical, *observed) {
                    if let Some(size) = self.payload_sizes.remove(canonical) {
                        self.payload_sizes.insert(*observed, size);
                    }
                }
            }
            CacheMessage::EvictionNotify { ids } => {
                if ids.len() > self.config.max_ids_per_notify {
                    return Err(ProtocolError::TooManyIds {
                        count: ids.len(),
                        max: self.config.max_ids_per_notify,
                    }
                    .into());
                }
                debug!("Client evicted {} ids", ids.len());
                for id in ids {
                    self.peer.on_eviction(id);
                    self.payload_sizes.remove(id);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn reference(
        &mut self,
        rect: &Rect,
        canonical: ContentId,
        id: ContentId,
        pixels: &PixelBuffer,
    ) -> EncodeOutput {
        let message = CacheMessage::Reference { rect: *rect, id };
        let baseline = self
            .payload_sizes
            .get(&id)
            .copied()
            .unwrap_or_else(|| pixels.visible_bytes());
        self.ledger.record_reference(message.encoded_len(), baseline);
        trace!("Reference {} at {:?}", id, rect);

        EncodeOutput {
            canonical,
            decision: EncodeDecision::Reference { id },
            messages: vec![message],
        }
    }

    fn init(
        &mut self,
        rect: &Rect,
        id: ContentId,
        pixels: &PixelBuffer,
    ) -> Result<CacheMessage, ServerError> {
        let payload = self.encoder.encode(pixels)?;
        let payload_len = payload.len();
        self.peer.mark_init_sent(id);
        self.payload_sizes.insert(id, payload_len);

        let message = CacheMessage::Init {
            rect: *rect,
            id,
            payload,
        };
        self.ledger.record_init(message.encoded_len(), payload_len);
        trace!("Init {} ({} bytes) at {:?}", id, payload_len, rect);
        Ok(message)
    }

    pub fn state(&self) -> &PeerSyncState {
        &self.peer
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

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Discards peer state on connection teardown. The ledger is kept.
    pub fn reset(&mut self) {
        self.peer.reset();
        self.payload_sizes.clear();
    }
}
