use std::fmt;

use xxhash_rust::xxh3::Xxh3;

const FRAME_HASH_SEED: u64 = 0x5c2e_91d4_7a0b_38f6;

/// 128-bit content hash over everything that influences a rendered frame's
/// pixels: effective render parameters plus the upstream graph state.
///
/// The hash doubles as the on-disk cache key, so two timeline instants whose
/// upstream state digests identically share one artifact.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHash([u8; 16]);

impl FrameHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> FrameHash {
        FrameHash(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Full 32-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(32);
        for b in self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }

    /// Hex of the first byte; selects the shallow cache subdirectory so
    /// directory fan-out stays bounded at 256 entries.
    pub fn shard_hex(&self) -> String {
        format!("{:02x}", self.0[0])
    }

    /// Hex of the remaining fifteen bytes; the cache file stem.
    pub fn tail_hex(&self) -> String {
        let mut s = String::with_capacity(30);
        for b in &self.0[1..] {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

impl fmt::Debug for FrameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameHash({})", self.to_hex())
    }
}

impl fmt::Display for FrameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Byte-oriented builder for [`FrameHash`] values.
///
/// Fixed-width little-endian encodings keep the digest stable across
/// platforms.
pub struct FrameHasher {
    inner: Xxh3,
}

impl FrameHasher {
    /// Start a new digest.
    pub fn new() -> FrameHasher {
        FrameHasher {
            inner: Xxh3::with_seed(FRAME_HASH_SEED),
        }
    }

    /// Feed raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    /// Feed one byte.
    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    /// Feed a bool as one byte.
    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// Feed a u32, little-endian.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Feed a u64, little-endian.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Feed an i64, little-endian.
    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Feed an f64 by bit pattern.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Feed a string, length-prefixed so concatenations cannot collide.
    pub fn write_str(&mut self, v: &str) {
        self.write_u64(v.len() as u64);
        self.write_bytes(v.as_bytes());
    }

    /// Finish the digest.
    pub fn finish(self) -> FrameHash {
        FrameHash(self.inner.digest128().to_be_bytes())
    }
}

impl Default for FrameHasher {
    fn default() -> Self {
        FrameHasher::new()
    }
}
