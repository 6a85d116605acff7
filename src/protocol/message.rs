use super::error::ProtocolError;
use crate::constants::{FRAME_HEADER_LEN, MAX_IDS_PER_NOTIFY_WIRE, MAX_ID_LEN, MIN_ID_LEN};
use crate::content::{ContentId, Rect};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const RECT_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    Query = 0,
    Seed = 1,
    Reference = 2,
    Init = 3,
    HashReport = 4,
    EvictionNotify = 5,
}

impl TryFrom<u8> for MessageTag {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageTag::Query),
            1 => Ok(MessageTag::Seed),
            2 => Ok(MessageTag::Reference),
            3 => Ok(MessageTag::Init),
            4 => Ok(MessageTag::HashReport),
            5 => Ok(MessageTag::EvictionNotify),
            _ => Err(ProtocolError::UnknownTag(value)),
        }
    }
}

impl MessageTag {
    pub fn direction(self) -> Direction {
        match self {
            MessageTag::Query | MessageTag::HashReport | MessageTag::EvictionNotify => {
                Direction::ClientToServer
            }
            MessageTag::Seed | MessageTag::Reference | MessageTag::Init => {
                Direction::ServerToClient
            }
        }
    }
}

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMessage {
    /// The client does not hold `id`; register it when next sending it.
    Query { id: ContentId },
    /// A canonical id the server is about to send an init for.
    Seed { id: ContentId },
    /// Draw the cached content for `id` at `rect`.
    Reference { rect: Rect, id: ContentId },
    /// Full encoded payload to be drawn at `rect` and cached under `id`.
    Init {
        rect: Rect,
        id: ContentId,
        payload: Bytes,
    },
    /// The content sent as `canonical` decoded to pixels hashing to `observed`.
    HashReport {
        canonical: ContentId,
        observed: ContentId,
    },
    /// These ids are no longer cached by the client.
    EvictionNotify { ids: Vec<ContentId> },
}

impl CacheMessage {
    pub fn tag(&self) -> MessageTag {
        match self {
            CacheMessage::Query { .. } => MessageTag::Query,
            CacheMessage::Seed { .. } => MessageTag::Seed,
            CacheMessage::Reference { .. } => MessageTag::Reference,
            CacheMessage::Init { .. } => MessageTag::Init,
            CacheMessage::HashReport { .. } => MessageTag::HashReport,
            CacheMessage::EvictionNotify { .. } => MessageTag::EvictionNotify,
        }
    }

    pub fn direction(&self) -> Direction {
        self.tag().direction()
    }

    /// Splits `ids` into eviction-notify messages of at most `per_message`
    /// ids each.
    pub fn eviction_batches(ids: &[ContentId], per_message: usize) -> Vec<CacheMessage> {
        let per_message = per_message.clamp(1, MAX_IDS_PER_NOTIFY_WIRE);
        ids.chunks(per_message)
            .map(|chunk| CacheMessage::EvictionNotify {
                ids: chunk.to_vec(),
            })
            .collect()
    }

    fn body_len(&self) -> usize {
        match self {
            CacheMessage::Query { id } | CacheMessage::Seed { id } => 1 + id.len(),
            CacheMessage::Reference { id, .. } => RECT_LEN + 1 + id.len(),
            CacheMessage::Init { id, payload, .. } => RECT_LEN + 1 + id.len() + 4 + payload.len(),
            CacheMessage::HashReport {
                canonical,
                observed,
            } => 2 + canonical.len() + observed.len(),
            CacheMessage::EvictionNotify { ids } => {
                2 + ids.iter().map(|id| 1 + id.len()).sum::<usize>()
            }
        }
    }

    /// Size of the full frame on the wire.
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_LEN + self.body_len()
    }

    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Appends the frame to `buf`.
    ///
    /// Fails without writing anything if an eviction notify holds more than
    /// `u16::MAX` ids (split them with [`CacheMessage::eviction_batches`]) or
    /// the body does not fit the 32-bit length field.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        if let CacheMessage::EvictionNotify { ids } = self {
            if ids.len() > MAX_IDS_PER_NOTIFY_WIRE {
                return Err(ProtocolError::TooManyIds {
                    count: ids.len(),
                    max: MAX_IDS_PER_NOTIFY_WIRE,
                });
            }
        }
        let body_len = self.body_len();
        if body_len > u32::MAX as usize {
            return Err(ProtocolError::MessageTooLarge(body_len));
        }

        buf.reserve(self.encoded_len());
        buf.put_u8(self.tag() as u8);
        buf.put_u32(body_len as u32);

        match self {
            CacheMessage::Query { id } | CacheMessage::Seed { id } => {
                put_id(buf, id);
            }
            CacheMessage::Reference { rect, id } => {
                put_rect(buf, rect);
                put_id(buf, id);
            }
            CacheMessage::Init { rect, id, payload } => {
                put_rect(buf, rect);
                put_id(buf, id);
                buf.put_u32(payload.len() as u32);
                buf.put_slice(payload);
            }
            CacheMessage::HashReport {
                canonical,
                observed,
            } => {
                put_id(buf, canonical);
                put_id(buf, observed);
            }
            CacheMessage::EvictionNotify { ids } => {
                buf.put_u16(ids.len() as u16);
                for id in ids {
                    put_id(buf, id);
                }
            }
        }
        Ok(())
    }

    /// Decodes one complete frame.
    pub fn decode(mut data: Bytes) -> Result<Self, ProtocolError> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(ProtocolError::InvalidMessage("too short".into()));
        }

        let tag = MessageTag::try_from(data.get_u8())?;
        let length = data.get_u32() as usize;

        if data.remaining() < length {
            return Err(ProtocolError::InvalidMessage("incomplete message".into()));
        }
        if data.remaining() > length {
            return Err(ProtocolError::InvalidMessage(format!(
                "{} bytes after frame end",
                data.remaining() - length
            )));
        }

        Self::decode_body(tag, data)
    }

    /// Decodes a frame body whose tag has already been read.
    pub fn decode_body(tag: MessageTag, mut body: Bytes) -> Result<Self, ProtocolError> {
        let msg = match tag {
            MessageTag::Query => CacheMessage::Query {
                id: get_id(&mut body)?,
            },
            MessageTag::Seed => CacheMessage::Seed {
                id: get_id(&mut body)?,
            },
            MessageTag::Reference => {
                let rect = get_rect(&mut body, "reference")?;
                let id = get_id(&mut body)?;
                CacheMessage::Reference { rect, id }
            }
            MessageTag::Init => {
                let rect = get_rect(&mut body, "init")?;
                let id = get_id(&mut body)?;
                if body.remaining() < 4 {
                    return Err(ProtocolError::InvalidMessage("init too short".into()));
                }
                let payload_len = body.get_u32() as usize;
                if body.remaining() < payload_len {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "init payload truncated: {} of {} bytes",
                        body.remaining(),
                        payload_len
                    )));
                }
                let payload = body.copy_to_bytes(payload_len);
                CacheMessage::Init { rect, id, payload }
            }
            MessageTag::HashReport => {
                let canonical = get_id(&mut body)?;
                let observed = get_id(&mut body)?;
                CacheMessage::HashReport {
                    canonical,
                    observed,
                }
            }
            MessageTag::EvictionNotify => {
                if body.remaining() < 2 {
                    return Err(ProtocolError::InvalidMessage(
                        "eviction notify too short".into(),
                    ));
                }
                let count = body.get_u16() as usize;
                if count == 0 {
                    return Err(ProtocolError::InvalidMessage("empty eviction notify".into()));
                }
                // Each id needs at least two bytes, so a lying count is caught
                // before allocating for it.
                if count * (1 + MIN_ID_LEN) > body.remaining() {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "eviction notify claims {} ids in {} bytes",
                        count,
                        body.remaining()
                    )));
                }
                let mut ids = Vec::with_capacity(count);
                for _ in 0..count {
                    ids.push(get_id(&mut body)?);
                }
                CacheMessage::EvictionNotify { ids }
            }
        };

        if body.has_remaining() {
            return Err(ProtocolError::InvalidMessage(format!(
                "{} trailing bytes in {:?}",
                body.remaining(),
                tag
            )));
        }

        Ok(msg)
    }
}

fn put_id(buf: &mut BytesMut, id: &ContentId) {
    buf.put_u8(id.len() as u8);
    buf.put_slice(id.as_bytes());
}

fn put_rect(buf: &mut BytesMut, rect: &Rect) {
    buf.put_u16(rect.x);
    buf.put_u16(rect.y);
    buf.put_u16(rect.width);
    buf.put_u16(rect.height);
}

fn get_id(data: &mut Bytes) -> Result<ContentId, ProtocolError> {
    if data.remaining() < 1 {
        return Err(ProtocolError::InvalidMessage("missing id length".into()));
    }
    let len = data.get_u8() as usize;
    if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&len) {
        return Err(ProtocolError::InvalidIdLength(len));
    }
    if data.remaining() < len {
        return Err(ProtocolError::InvalidMessage(format!(
            "id truncated: {} of {} bytes",
            data.remaining(),
            len
        )));
    }
    let bytes = data.copy_to_bytes(len);
    ContentId::from_bytes(&bytes).map_err(|_| ProtocolError::InvalidIdLength(len))
}

fn get_rect(data: &mut Bytes, what: &str) -> Result<Rect, ProtocolError> {
    if data.remaining() < RECT_LEN {
        return Err(ProtocolError::InvalidMessage(format!("{} too short", what)));
    }
    Ok(Rect {
        x: data.get_u16(),
        y: data.get_u16(),
        width: data.get_u16(),
        height: data.get_u16(),
    })
}
