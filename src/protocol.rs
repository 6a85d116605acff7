//! Cache synchronization wire protocol.
//!
//! Six messages keep the server's view of the client cache in step with
//! the cache itself:
//!
//! | Message | Direction | Purpose |
//! |---|---|---|
//! | `query` | client to server | the client lacks an id; send it in full next time |
//! | `seed` | server to client | announce a canonical id ahead of its init |
//! | `reference` | server to client | draw cached content for an id at a rect |
//! | `init` | server to client | full payload, to be cached under an id |
//! | `hash-report` | client to server | decoded pixels hashed to a different id |
//! | `eviction-notify` | client to server | these ids are no longer cached |
//!
//! # Framing
//!
//! Every frame starts with a one byte tag and a big-endian `u32` body
//! length. Ids are a length byte (1 to 64) followed by the id bytes;
//! rects are four big-endian `u16` values (x, y, width, height).
//!
//! # Examples
//!
//! ```
//! use rectcache::content::{ContentId, Rect};
//! use rectcache::protocol::CacheMessage;
//!
//! let msg = CacheMessage::Reference {
//!     rect: Rect::new(0, 0, 64, 64),
//!     id: ContentId::from_hex("00112233445566778899aabbccddeeff").unwrap(),
//! };
//!
//! let encoded = msg.encode().unwrap();
//! assert_eq!(encoded.len(), msg.encoded_len());
//! assert_eq!(CacheMessage::decode(encoded).unwrap(), msg);
//! ```

mod error;
mod message;
mod transport;

pub use error::ProtocolError;
pub use message::{CacheMessage, Direction, MessageTag};
pub use transport::CacheTransport;

#[cfg(test)]
mod tests;
