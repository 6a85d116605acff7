use super::*;
use crate::cache::ListKind;
use crate::codec::{CodecError, FramebufferSink, PixelDecoder, RawCodec};
use crate::config::{CacheConfig, MissPolicy};
use crate::content::{ContentHasher, ContentId, PixelBuffer, PixelFormat, Rect};
use crate::protocol::{CacheMessage, ProtocolError};
use bytes::Bytes;

#[derive(Default)]
struct RecordingSink {
    decoded: Vec<(Rect, PixelBuffer)>,
    cached: Vec<(Rect, PixelBuffer)>,
}

impl FramebufferSink for RecordingSink {
    fn decoded_pixels_ready(&mut self, rect: &Rect, pixels: &PixelBuffer) {
        self.decoded.push((*rect, pixels.clone()));
    }

    fn cached_pixels_ready(&mut self, rect: &Rect, pixels: &PixelBuffer) {
        self.cached.push((*rect, pixels.clone()));
    }
}

/// Raw decoding that perturbs the first byte, like a lossy codec would.
struct Blurry;

impl PixelDecoder for Blurry {
    fn decode(&mut self, rect: &Rect, payload: &Bytes) -> Result<PixelBuffer, CodecError> {
        let mut data = payload.to_vec();
        if let Some(first) = data.first_mut() {
            *first ^= 0x01;
        }
        RawCodec::new(PixelFormat::RGB888).decode(rect, &Bytes::from(data))
    }

    fn is_lossy(&self) -> bool {
        true
    }
}

/// Same perturbation, but claims to be lossless.
struct Broken;

impl PixelDecoder for Broken {
    fn decode(&mut self, rect: &Rect, payload: &Bytes) -> Result<PixelBuffer, CodecError> {
        Blurry.decode(rect, payload)
    }

    fn is_lossy(&self) -> bool {
        false
    }
}

fn raw_agent(config: CacheConfig) -> ClientCacheAgent<RawCodec> {
    ClientCacheAgent::new(RawCodec::new(PixelFormat::RGB888), config).unwrap()
}

fn payload(width: u16, height: u16, value: u8) -> Bytes {
    Bytes::from(vec![value; width as usize * height as usize * 4])
}

fn init(rect: Rect, value: u8) -> (ContentId, CacheMessage) {
    let data = payload(rect.width, rect.height, value);
    let pixels =
        PixelBuffer::packed(PixelFormat::RGB888, rect.width, rect.height, data.clone()).unwrap();
    let id = ContentHasher::default().hash_rect(&pixels);
    (
        id,
        CacheMessage::Init {
            rect,
            id,
            payload: data,
        },
    )
}

#[test]
fn test_init_then_reference() {
    let mut agent = raw_agent(CacheConfig::default());
    let mut sink = RecordingSink::default();
    let rect = Rect::new(0, 0, 4, 4);
    let (id, msg) = init(rect, 7);

    let outcome = agent.handle_message(&msg, &mut sink).unwrap();
    assert_eq!(outcome, MessageOutcome::Decoded { id });
    assert_eq!(sink.decoded.len(), 1);
    assert!(agent.cache().contains(&id));

    let there = Rect::new(40, 40, 4, 4);
    let reference = CacheMessage::Reference { rect: there, id };
    let outcome = agent.handle_message(&reference, &mut sink).unwrap();
    assert_eq!(outcome, MessageOutcome::Cached { id });
    assert_eq!(sink.cached.len(), 1);
    assert_eq!(sink.cached[0].0, there);
    assert_eq!(sink.cached[0].1, sink.decoded[0].1);
    assert_eq!(agent.cache().list_of(&id), Some(ListKind::T2));

    let summary = agent.ledger().summary();
    assert_eq!(summary.reference_count, 1);
    assert_eq!(summary.baseline_bytes, 64);

    // Lossless, no mismatch: nothing to tell the server.
    assert!(agent.flush().is_empty());
}

#[test]
fn test_reference_miss_is_fatal_by_default() {
    let mut agent = raw_agent(CacheConfig::default());
    let mut sink = RecordingSink::default();
    let id = ContentId::from_hex("abcd").unwrap();

    let err = agent
        .handle_message(
            &CacheMessage::Reference {
                rect: Rect::new(0, 0, 4, 4),
                id,
            },
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::ReferenceMiss(missing) if missing == id));
    assert!(sink.cached.is_empty());
}

#[test]
fn test_reference_miss_requests_refresh() {
    let mut agent = raw_agent(CacheConfig::default().with_miss_policy(MissPolicy::RequestRefresh));
    let mut sink = RecordingSink::default();
    let id = ContentId::from_hex("abcd").unwrap();
    let rect = Rect::new(0, 0, 4, 4);
    let reference = CacheMessage::Reference { rect, id };

    let outcome = agent.handle_message(&reference, &mut sink).unwrap();
    assert_eq!(outcome, MessageOutcome::NeedsRefresh { rect, id });
    agent.handle_message(&reference, &mut sink).unwrap();

    assert_eq!(agent.flush(), vec![CacheMessage::Query { id }]);
    assert!(sink.cached.is_empty());
}

#[test]
fn test_eviction_queued_and_flushed() {
    let mut agent = raw_agent(CacheConfig::default().with_cache_size(1000));
    let mut sink = RecordingSink::default();

    // 10x15 RGB888 = 600 bytes each.
    let (a, first) = init(Rect::new(0, 0, 10, 15), 1);
    let (b, second) = init(Rect::new(0, 0, 10, 15), 2);
    agent.handle_message(&first, &mut sink).unwrap();
    agent.handle_message(&second, &mut sink).unwrap();

    assert!(!agent.cache().contains(&a));
    assert!(agent.cache().contains(&b));
    assert_eq!(agent.pending_evictions(), 1);

    assert_eq!(
        agent.flush(),
        vec![CacheMessage::EvictionNotify { ids: vec![a] }]
    );
    assert_eq!(agent.pending_evictions(), 0);
    assert!(agent.flush().is_empty());
}

#[test]
fn test_resent_content_not_reported_evicted() {
    let mut agent = raw_agent(CacheConfig::default().with_cache_size(1000));
    let mut sink = RecordingSink::default();
    let (_, first) = init(Rect::new(0, 0, 10, 15), 1);
    let (_, second) = init(Rect::new(0, 0, 10, 15), 2);

    agent.handle_message(&first, &mut sink).unwrap();
    agent.handle_message(&second, &mut sink).unwrap();
    agent.handle_message(&first, &mut sink).unwrap();

    // `a` came back; only `b` is gone now.
    let (b, _) = init(Rect::new(0, 0, 10, 15), 2);
    assert_eq!(
        agent.flush(),
        vec![CacheMessage::EvictionNotify { ids: vec![b] }]
    );
}

#[test]
fn test_oversized_init_drawn_but_not_cached() {
    let mut agent = raw_agent(CacheConfig::default().with_cache_size(100));
    let mut sink = RecordingSink::default();
    let (id, msg) = init(Rect::new(0, 0, 8, 8), 3);

    agent.handle_message(&msg, &mut sink).unwrap();
    assert_eq!(sink.decoded.len(), 1);
    assert!(!agent.cache().contains(&id));
    assert_eq!(agent.stats().rejections, 1);
    assert_eq!(
        agent.flush(),
        vec![CacheMessage::EvictionNotify { ids: vec![id] }]
    );
}

#[test]
fn test_lossy_mismatch_reports_and_resolves_observed() {
    let mut agent = ClientCacheAgent::new(Blurry, CacheConfig::default()).unwrap();
    let mut sink = RecordingSink::default();
    let rect = Rect::new(0, 0, 4, 4);
    let (canonical, msg) = init(rect, 9);

    agent.handle_message(&msg, &mut sink).unwrap();
    let observed = agent.hasher().hash_rect(&sink.decoded[0].1);
    assert_ne!(observed, canonical);

    assert_eq!(
        agent.flush(),
        vec![CacheMessage::HashReport {
            canonical,
            observed
        }]
    );

    // Stored once, reachable under both ids.
    assert_eq!(agent.cache().len(), 1);
    for id in [canonical, observed] {
        let outcome = agent
            .handle_message(&CacheMessage::Reference { rect, id }, &mut sink)
            .unwrap();
        assert_eq!(outcome, MessageOutcome::Cached { id });
    }
}

#[test]
fn test_evicting_aliased_entry_notifies_both_ids() {
    let config = CacheConfig::default().with_cache_size(1000);
    let mut agent = ClientCacheAgent::new(Blurry, config).unwrap();
    let mut sink = RecordingSink::default();
    let (h, first) = init(Rect::new(0, 0, 10, 15), 1);
    let (_, second) = init(Rect::new(0, 0, 10, 15), 2);

    agent.handle_message(&first, &mut sink).unwrap();
    let l = agent.hasher().hash_rect(&sink.decoded[0].1);
    agent.handle_message(&second, &mut sink).unwrap();

    let messages = agent.flush();
    assert!(matches!(messages[0], CacheMessage::HashReport { .. }));
    assert!(matches!(messages[1], CacheMessage::HashReport { .. }));
    assert_eq!(
        messages[2],
        CacheMessage::EvictionNotify { ids: vec![h, l] }
    );

    let err = agent
        .handle_message(
            &CacheMessage::Reference {
                rect: Rect::new(0, 0, 10, 15),
                id: l,
            },
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::ReferenceMiss(_)));
}

#[test]
fn test_miss_on_observed_id_queries_canonical() {
    let config = CacheConfig::default()
        .with_cache_size(1000)
        .with_miss_policy(MissPolicy::RequestRefresh);
    let mut agent = ClientCacheAgent::new(Blurry, config).unwrap();
    let mut sink = RecordingSink::default();
    let rect = Rect::new(0, 0, 10, 15);
    let (h, first) = init(rect, 1);
    let (_, second) = init(rect, 2);

    agent.handle_message(&first, &mut sink).unwrap();
    let l = agent.hasher().hash_rect(&sink.decoded[0].1);
    agent.handle_message(&second, &mut sink).unwrap();

    let outcome = agent
        .handle_message(&CacheMessage::Reference { rect, id: l }, &mut sink)
        .unwrap();
    assert_eq!(outcome, MessageOutcome::NeedsRefresh { rect, id: l });

    let messages = agent.flush();
    assert!(messages.contains(&CacheMessage::Query { id: h }));
    assert!(!messages.contains(&CacheMessage::Query { id: l }));
}

#[test]
fn test_lossless_mismatch_is_not_reported() {
    let mut agent = ClientCacheAgent::new(Broken, CacheConfig::default()).unwrap();
    let mut sink = RecordingSink::default();
    let (id, msg) = init(Rect::new(0, 0, 4, 4), 9);

    agent.handle_message(&msg, &mut sink).unwrap();
    assert!(agent.cache().contains(&id));
    assert!(agent.flush().is_empty());
}

#[test]
fn test_flush_caps_and_batches_evictions() {
    let config = CacheConfig::default()
        .with_cache_size(64)
        .with_max_ids_per_notify(3)
        .with_max_ids_per_flush(5);
    let mut agent = raw_agent(config);
    let mut sink = RecordingSink::default();

    // Each 4x4 entry fills the cache, so every init evicts the previous one.
    let mut ids = Vec::new();
    for value in 0..9u8 {
        let (id, msg) = init(Rect::new(0, 0, 4, 4), value);
        agent.handle_message(&msg, &mut sink).unwrap();
        ids.push(id);
    }
    assert_eq!(agent.pending_evictions(), 8);

    let first = agent.flush();
    assert_eq!(
        first,
        vec![
            CacheMessage::EvictionNotify {
                ids: ids[0..3].to_vec()
            },
            CacheMessage::EvictionNotify {
                ids: ids[3..5].to_vec()
            },
        ]
    );

    let second = agent.flush();
    assert_eq!(
        second,
        vec![CacheMessage::EvictionNotify {
            ids: ids[5..8].to_vec()
        }]
    );
    assert_eq!(agent.pending_evictions(), 0);
}

#[test]
fn test_client_messages_rejected() {
    let mut agent = raw_agent(CacheConfig::default());
    let mut sink = RecordingSink::default();
    let err = agent
        .handle_message(
            &CacheMessage::EvictionNotify {
                ids: vec![ContentId::from_hex("01").unwrap()],
            },
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::WrongDirection { .. })
    ));
}

#[test]
fn test_geometry_mismatch_not_drawn() {
    let mut agent = raw_agent(CacheConfig::default());
    let mut sink = RecordingSink::default();
    let (id, msg) = init(Rect::new(0, 0, 4, 4), 1);
    agent.handle_message(&msg, &mut sink).unwrap();

    let err = agent
        .handle_message(
            &CacheMessage::Reference {
                rect: Rect::new(0, 0, 8, 2),
                id,
            },
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::GeometryMismatch { .. }));
    assert!(sink.cached.is_empty());
}

#[test]
fn test_reset_drops_everything_silently() {
    let mut agent = raw_agent(CacheConfig::default().with_cache_size(1000));
    let mut sink = RecordingSink::default();
    let (a, first) = init(Rect::new(0, 0, 10, 15), 1);
    let (_, second) = init(Rect::new(0, 0, 10, 15), 2);
    agent.handle_message(&first, &mut sink).unwrap();
    agent.handle_message(&second, &mut sink).unwrap();

    agent.reset();
    assert!(agent.cache().is_empty());
    assert!(agent.flush().is_empty());
    assert!(!agent.cache().contains(&a));
}
