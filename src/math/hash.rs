//! FNV-1a content hashing for cache keys

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Incremental FNV-1a hasher.
///
/// Stable across runs and platforms, unlike `DefaultHasher`, so hashes can key
/// caches that outlive a single process.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    hash: u64,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self { hash: FNV_OFFSET }
    }

    pub fn write_u64(&mut self, value: u64) {
        for byte in value.to_le_bytes() {
            self.hash ^= byte as u64;
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u32(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            self.hash ^= byte as u64;
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }

    /// Hash the bit pattern, so `0.0` and `-0.0` differ
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    pub fn write_str(&mut self, value: &str) {
        for byte in value.bytes() {
            self.hash ^= byte as u64;
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
        self.write_u32(value.len() as u32);
    }

    pub fn finish(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_sensitive() {
        let mut a = ContentHasher::new();
        a.write_u32(1);
        a.write_u32(2);
        let mut b = ContentHasher::new();
        b.write_u32(2);
        b.write_u32(1);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_stable_value() {
        // Empty input is the FNV offset basis
        assert_eq!(ContentHasher::new().finish(), 0xcbf29ce484222325);
    }
}
