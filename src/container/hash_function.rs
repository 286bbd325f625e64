use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use xxhash_rust::xxh3::Xxh3;

/// Hash function for index keys. The default uses xxh3; the identity variant
/// exposes an integer key's own bits, which lets tests place keys in chosen
/// buckets.
pub struct HashFunction<K> {
    kind: HashKind,
    _marker: PhantomData<K>,
}

#[derive(Debug, Clone, Copy)]
enum HashKind {
    Xxh3,
    Identity,
}

impl<K> HashFunction<K> {
    pub fn new() -> Self {
        Self {
            kind: HashKind::Xxh3,
            _marker: PhantomData,
        }
    }

    pub fn identity() -> Self {
        Self {
            kind: HashKind::Identity,
            _marker: PhantomData,
        }
    }
}

impl<K> Default for HashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash> HashFunction<K> {
    pub fn get_hash(&self, key: &K) -> u64 {
        match self.kind {
            HashKind::Xxh3 => {
                let mut hasher = Xxh3::new();
                key.hash(&mut hasher);
                hasher.finish()
            }
            HashKind::Identity => {
                let mut hasher = IdentityHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

/// Passes an integer key through unchanged.
#[derive(Default)]
struct IdentityHasher {
    value: u64,
}

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.value
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut buf = [0u8; 8];
        let len = bytes.len().min(8);
        buf[..len].copy_from_slice(&bytes[..len]);
        self.value = u64::from_le_bytes(buf);
    }

    fn write_u32(&mut self, n: u32) {
        self.value = n as u64;
    }

    fn write_u64(&mut self, n: u64) {
        self.value = n;
    }

    fn write_i64(&mut self, n: i64) {
        self.value = n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xxh3_is_deterministic() {
        let hash_fn: HashFunction<u64> = HashFunction::new();
        assert_eq!(hash_fn.get_hash(&42), hash_fn.get_hash(&42));
        assert_ne!(hash_fn.get_hash(&42), hash_fn.get_hash(&43));
    }

    #[test]
    fn test_identity_exposes_key_bits() {
        let hash_fn: HashFunction<u32> = HashFunction::identity();
        assert_eq!(hash_fn.get_hash(&0b101), 0b101);
    }
}
