use super::error::ContentError;
use crate::constants::{MAX_ID_LEN, MIN_ID_LEN};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A content identifier: the (possibly truncated) digest of pixel bytes.
///
/// Stored inline so ids are `Copy` and never allocate; only the first
/// `len` bytes are significant.
#[derive(Clone, Copy)]
pub struct ContentId {
    bytes: [u8; MAX_ID_LEN],
    len: u8,
}

impl ContentId {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContentError> {
        if bytes.len() < MIN_ID_LEN || bytes.len() > MAX_ID_LEN {
            return Err(ContentError::InvalidIdLength(bytes.len()));
        }
        let mut arr = [0u8; MAX_ID_LEN];
        arr[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: arr,
            len: bytes.len() as u8,
        })
    }

    /// Builds an id from a digest prefix already known to be 1..=64 bytes.
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        debug_assert!((MIN_ID_LEN..=MAX_ID_LEN).contains(&digest.len()));
        let len = digest.len().min(MAX_ID_LEN);
        let mut arr = [0u8; MAX_ID_LEN];
        arr[..len].copy_from_slice(&digest[..len]);
        Self {
            bytes: arr,
            len: len as u8,
        }
    }

    pub fn from_hex(s: &str) -> Result<Self, ContentError> {
        let bytes = hex_decode(s).ok_or_else(|| ContentError::InvalidHex(s.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; ids have at least one byte. Present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_hex(&self) -> String {
        hex_encode(self.as_bytes())
    }
}

impl PartialEq for ContentId {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ContentId {}

impl Hash for ContentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl AsRef<[u8]> for ContentId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for ContentId {
    type Error = ContentError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "ContentId({})", hex.get(..16).unwrap_or(&hex))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
        s
    })
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
