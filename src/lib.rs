//! rectcache - A content cache protocol for remote framebuffers
//!
//! Instead of resending pixel rectangles the client has already seen, the
//! server names them by content hash and sends a short reference. Both ends
//! keep the server's view of the client cache in step with the cache itself,
//! so a reference is only ever sent for content the client holds.
//!
//! # Modules
//!
//! - [`content`] - Content ids, rectangles, pixel buffers, hashing
//! - [`cache`] - Byte-bounded adaptive replacement cache
//! - [`protocol`] - Wire messages, framing, async transport
//! - [`server`] - Peer sync state and per-rectangle encode decisions
//! - [`client`] - Client cache agent and outbound message queues
//! - [`codec`] - Seams to the pixel codec and the renderer
//! - [`ledger`] - Bandwidth accounting
//! - [`config`] - Per-connection tuning
//!
//! # Example
//!
//! ```
//! use rectcache::{CacheConfig, ClientCacheAgent, EncodeDecisionEngine, RawCodec};
//! use rectcache::codec::FramebufferSink;
//! use rectcache::content::{PixelBuffer, PixelFormat, Rect};
//!
//! struct Screen;
//!
//! impl FramebufferSink for Screen {
//!     fn decoded_pixels_ready(&mut self, _rect: &Rect, _pixels: &PixelBuffer) {}
//!     fn cached_pixels_ready(&mut self, _rect: &Rect, _pixels: &PixelBuffer) {}
//! }
//!
//! let codec = RawCodec::new(PixelFormat::RGB888);
//! let mut server = EncodeDecisionEngine::new(codec, CacheConfig::default()).unwrap();
//! let mut client = ClientCacheAgent::new(codec, CacheConfig::default()).unwrap();
//!
//! let rect = Rect::new(0, 0, 64, 64);
//! let pixels = PixelBuffer::packed(PixelFormat::RGB888, 64, 64, vec![0x80; 64 * 64 * 4]).unwrap();
//!
//! // First sight: seeded and sent in full. Second: a reference.
//! for _ in 0..2 {
//!     for message in server.encode_rect(&rect, &pixels).unwrap().messages {
//!         client.handle_message(&message, &mut Screen).unwrap();
//!     }
//! }
//!
//! assert_eq!(client.ledger().summary().reference_count, 1);
//! ```

pub mod cache;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod content;
pub mod ledger;
pub mod protocol;
pub mod server;

pub use cache::{AdaptiveCache, CacheEntry, CacheError, CacheStats, ListKind};
pub use client::{ClientCacheAgent, ClientError, MessageOutcome};
pub use codec::{CodecError, FramebufferSink, PixelDecoder, PixelEncoder, RawCodec};
pub use config::{CacheConfig, ConfigError, MissPolicy};
pub use content::{ContentError, ContentHasher, ContentId, PixelBuffer, PixelFormat, Rect};
pub use ledger::{BandwidthLedger, LedgerSummary};
pub use protocol::{CacheMessage, CacheTransport, Direction, MessageTag, ProtocolError};
pub use server::{
    EncodeDecision, EncodeDecisionEngine, EncodeOutput, MinAreaSeed, NeverSeed, PeerSyncState,
    SeedPolicy, ServerError, SyncState,
};
