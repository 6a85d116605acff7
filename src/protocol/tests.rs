use super::*;
use crate::content::{ContentId, Rect};
use bytes::{BufMut, Bytes, BytesMut};

fn id(hex: &str) -> ContentId {
    ContentId::from_hex(hex).unwrap()
}

fn sample_messages() -> Vec<CacheMessage> {
    vec![
        CacheMessage::Query { id: id("01") },
        CacheMessage::Seed {
            id: id("0011223344556677"),
        },
        CacheMessage::Reference {
            rect: Rect::new(10, 20, 64, 64),
            id: id("aabbccdd"),
        },
        CacheMessage::Init {
            rect: Rect::new(0, 0, 2, 1),
            id: id("ff"),
            payload: Bytes::from_static(b"12345678"),
        },
        CacheMessage::HashReport {
            canonical: id("aa"),
            observed: id("bbbb"),
        },
        CacheMessage::EvictionNotify {
            ids: vec![id("01"), id("0202"), id("030303")],
        },
    ]
}

#[test]
fn test_message_encode_decode() {
    for msg in sample_messages() {
        let encoded = msg.encode().unwrap();
        assert_eq!(encoded.len(), msg.encoded_len(), "{:?}", msg.tag());
        assert_eq!(encoded[0], msg.tag() as u8);
        assert_eq!(CacheMessage::decode(encoded).unwrap(), msg);
    }
}

#[test]
fn test_reference_wire_layout() {
    let msg = CacheMessage::Reference {
        rect: Rect::new(1, 2, 3, 4),
        id: id("abcd"),
    };
    let encoded = msg.encode().unwrap();
    assert_eq!(
        encoded.as_ref(),
        &[2, 0, 0, 0, 11, 0, 1, 0, 2, 0, 3, 0, 4, 2, 0xab, 0xcd]
    );
}

#[test]
fn test_directions() {
    use MessageTag::*;
    for tag in [Query, HashReport, EvictionNotify] {
        assert_eq!(tag.direction(), Direction::ClientToServer);
    }
    for tag in [Seed, Reference, Init] {
        assert_eq!(tag.direction(), Direction::ServerToClient);
    }
}

#[test]
fn test_unknown_tag() {
    let data = Bytes::from_static(&[42, 0, 0, 0, 0]);
    assert!(matches!(
        CacheMessage::decode(data),
        Err(ProtocolError::UnknownTag(42))
    ));
}

#[test]
fn test_zero_length_id_rejected() {
    let data = Bytes::from_static(&[0, 0, 0, 0, 1, 0]);
    assert!(matches!(
        CacheMessage::decode(data),
        Err(ProtocolError::InvalidIdLength(0))
    ));
}

#[test]
fn test_oversized_id_rejected() {
    let mut buf = BytesMut::new();
    buf.put_u8(MessageTag::Seed as u8);
    buf.put_u32(66);
    buf.put_u8(65);
    buf.put_slice(&[0u8; 65]);
    assert!(matches!(
        CacheMessage::decode(buf.freeze()),
        Err(ProtocolError::InvalidIdLength(65))
    ));
}

#[test]
fn test_truncated_frames_rejected() {
    for msg in sample_messages() {
        let encoded = msg.encode().unwrap();
        for cut in 0..encoded.len() {
            assert!(
                CacheMessage::decode(encoded.slice(..cut)).is_err(),
                "{:?} truncated to {} bytes decoded",
                msg.tag(),
                cut
            );
        }
    }
}

#[test]
fn test_trailing_body_bytes_rejected() {
    let mut buf = BytesMut::new();
    buf.put_u8(MessageTag::Query as u8);
    buf.put_u32(3);
    buf.put_u8(1);
    buf.put_u8(0xaa);
    buf.put_u8(0xbb);
    assert!(matches!(
        CacheMessage::decode(buf.freeze()),
        Err(ProtocolError::InvalidMessage(_))
    ));
}

#[test]
fn test_eviction_count_mismatch_rejected() {
    let mut buf = BytesMut::new();
    buf.put_u8(MessageTag::EvictionNotify as u8);
    buf.put_u32(6);
    buf.put_u16(500);
    buf.put_u8(1);
    buf.put_u8(0x01);
    buf.put_u8(1);
    buf.put_u8(0x02);
    assert!(matches!(
        CacheMessage::decode(buf.freeze()),
        Err(ProtocolError::InvalidMessage(_))
    ));

    let mut buf = BytesMut::new();
    buf.put_u8(MessageTag::EvictionNotify as u8);
    buf.put_u32(2);
    buf.put_u16(0);
    assert!(CacheMessage::decode(buf.freeze()).is_err());
}

#[test]
fn test_init_payload_length_checked() {
    let mut buf = BytesMut::new();
    buf.put_u8(MessageTag::Init as u8);
    buf.put_u32(8 + 2 + 4 + 2);
    buf.put_slice(&[0, 0, 0, 0, 0, 1, 0, 1]);
    buf.put_u8(1);
    buf.put_u8(0x77);
    buf.put_u32(100);
    buf.put_slice(&[1, 2]);
    assert!(matches!(
        CacheMessage::decode(buf.freeze()),
        Err(ProtocolError::InvalidMessage(_))
    ));
}

#[test]
fn test_eviction_batches() {
    let ids: Vec<ContentId> = (0..250u16)
        .map(|i| ContentId::from_bytes(&i.to_be_bytes()).unwrap())
        .collect();

    let batches = CacheMessage::eviction_batches(&ids, 100);
    assert_eq!(batches.len(), 3);

    let mut seen = Vec::new();
    for batch in &batches {
        match batch {
            CacheMessage::EvictionNotify { ids } => {
                assert!(ids.len() <= 100);
                seen.extend_from_slice(ids);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(seen, ids);

    assert!(CacheMessage::eviction_batches(&[], 100).is_empty());
}

#[test]
fn test_oversized_eviction_notify_not_encoded() {
    let ids: Vec<ContentId> = (0..=u16::MAX as u32)
        .map(|i| ContentId::from_bytes(&i.to_be_bytes()).unwrap())
        .collect();
    let msg = CacheMessage::EvictionNotify { ids };

    assert!(matches!(
        msg.encode(),
        Err(ProtocolError::TooManyIds { count: 65_536, max: 65_535 })
    ));

    let mut buf = BytesMut::new();
    assert!(msg.encode_into(&mut buf).is_err());
    assert!(buf.is_empty());
}

#[tokio::test]
async fn test_transport_refuses_unencodable_batch() {
    let (a, _b) = tokio::io::duplex(64);
    let mut sender = CacheTransport::new(a);
    let ids: Vec<ContentId> = (0..70_000u32)
        .map(|i| ContentId::from_bytes(&i.to_be_bytes()).unwrap())
        .collect();
    let batch = vec![
        CacheMessage::Query { id: id("01") },
        CacheMessage::EvictionNotify { ids },
    ];

    assert!(matches!(
        sender.send_batch(&batch).await,
        Err(ProtocolError::TooManyIds { count: 70_000, .. })
    ));
}

#[tokio::test]
async fn test_transport_round_trip() {
    let (a, b) = tokio::io::duplex(64);
    let mut sender = CacheTransport::new(a);
    let mut receiver = CacheTransport::new(b);

    let messages = sample_messages();
    let expected = messages.clone();

    let send = tokio::spawn(async move {
        sender.send_batch(&messages).await.unwrap();
        sender.send_message(&CacheMessage::Query { id: id("09") }).await.unwrap();
        sender.flush().await.unwrap();
        sender
    });

    for msg in expected {
        assert_eq!(receiver.receive_message().await.unwrap(), msg);
    }
    assert_eq!(
        receiver.receive_message().await.unwrap(),
        CacheMessage::Query { id: id("09") }
    );

    drop(send.await.unwrap());
    assert!(matches!(
        receiver.receive_message().await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_transport_rejects_oversized_frame() {
    use tokio::io::AsyncWriteExt;

    let (mut a, b) = tokio::io::duplex(64);
    let mut receiver = CacheTransport::new(b).with_max_frame_body(16);

    a.write_all(&[MessageTag::Init as u8, 0, 0, 1, 0]).await.unwrap();

    assert!(matches!(
        receiver.receive_message().await,
        Err(ProtocolError::MessageTooLarge(256))
    ));
}

#[tokio::test]
async fn test_transport_rejects_unknown_tag_early() {
    use tokio::io::AsyncWriteExt;

    let (mut a, b) = tokio::io::duplex(64);
    let mut receiver = CacheTransport::new(b);

    a.write_all(&[99, 0, 0, 0, 10]).await.unwrap();

    assert!(matches!(
        receiver.receive_message().await,
        Err(ProtocolError::UnknownTag(99))
    ));
}
