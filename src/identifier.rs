//! Identifier schemes: how each backend mints keys and maps them to and from
//! the canonical external id string.
//!
//! Every scheme guarantees `from_external(&to_external(k)) == Some(k)`. Strings
//! that do not parse yield `None`, which stores report as "not found".

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use uuid::Uuid;

pub trait IdScheme: Send + Sync {
    type Key: Clone + Eq + fmt::Debug + Send + Sync;

    fn generate(&self) -> Self::Key;
    fn to_external(&self, key: &Self::Key) -> String;
    fn from_external(&self, external: &str) -> Option<Self::Key>;
}

/// Random opaque tokens (UUID v4, hyphenated). The key is the string itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenIds;

impl IdScheme for TokenIds {
    type Key = String;

    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn to_external(&self, key: &String) -> String {
        key.clone()
    }

    fn from_external(&self, external: &str) -> Option<String> {
        (!external.is_empty()).then(|| external.to_string())
    }
}

/// 12-byte document keys: 4-byte big-endian seconds, 5 bytes fixed per
/// generator, 3-byte big-endian counter. Rendered as 24 lowercase hex chars.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ObjectKey([u8; 12]);

impl ObjectKey {
    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut out = [0u8; 12];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug)]
pub struct ObjectIds {
    process: [u8; 5],
    counter: AtomicU32,
}

impl Default for ObjectIds {
    fn default() -> Self {
        let seed = Uuid::new_v4();
        let seed = seed.as_bytes();
        let mut process = [0u8; 5];
        process.copy_from_slice(&seed[..5]);
        let counter = u32::from_be_bytes([0, seed[5], seed[6], seed[7]]);
        Self { process, counter: AtomicU32::new(counter) }
    }
}

impl IdScheme for ObjectIds {
    type Key = ObjectKey;

    fn generate(&self) -> ObjectKey {
        let secs = jiff::Timestamp::now().as_second() as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut key = [0u8; 12];
        key[..4].copy_from_slice(&secs.to_be_bytes());
        key[4..9].copy_from_slice(&self.process);
        key[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectKey(key)
    }

    fn to_external(&self, key: &ObjectKey) -> String {
        key.to_hex()
    }

    fn from_external(&self, external: &str) -> Option<ObjectKey> {
        // Only the canonical lowercase form resolves, keeping the mapping one-to-one.
        if external.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        ObjectKey::parse_hex(external)
    }
}

/// UUID v4 keys stored as 16 raw bytes in relational tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryUuidIds;

impl BinaryUuidIds {
    /// Decodes a stored binary key, failing on anything that is not 16 bytes.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        Uuid::from_slice(bytes).ok().map(|u| u.hyphenated().to_string())
    }
}

impl IdScheme for BinaryUuidIds {
    type Key = [u8; 16];

    fn generate(&self) -> [u8; 16] {
        *Uuid::new_v4().as_bytes()
    }

    fn to_external(&self, key: &[u8; 16]) -> String {
        Uuid::from_bytes(*key).hyphenated().to_string()
    }

    fn from_external(&self, external: &str) -> Option<[u8; 16]> {
        let uuid = Uuid::parse_str(external).ok()?;
        (uuid.hyphenated().to_string() == external).then(|| *uuid.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn roundtrips<S: IdScheme>(scheme: &S) {
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let key = scheme.generate();
            let external = scheme.to_external(&key);
            assert!(!external.is_empty());
            assert!(seen.insert(external.clone()), "duplicate id {external}");
            assert_eq!(scheme.from_external(&external), Some(key));
        }
    }

    #[test]
    fn token_ids_roundtrip() {
        roundtrips(&TokenIds);
    }

    #[test]
    fn object_ids_roundtrip() {
        roundtrips(&ObjectIds::default());
    }

    #[test]
    fn binary_uuid_ids_roundtrip() {
        roundtrips(&BinaryUuidIds);
    }

    #[test]
    fn object_ids_reject_malformed_strings() {
        let ids = ObjectIds::default();
        assert_eq!(ids.from_external(""), None);
        assert_eq!(ids.from_external("not-an-id"), None);
        assert_eq!(ids.from_external("65a1f0c2e4b0a1b2c3d4e5f"), None);
        assert_eq!(ids.from_external("65a1f0c2e4b0a1b2c3d4e5fz"), None);
        assert_eq!(ids.from_external("65A1F0C2E4B0A1B2C3D4E5F6"), None);
        assert!(ids.from_external("65a1f0c2e4b0a1b2c3d4e5f6").is_some());
    }

    #[test]
    fn binary_uuid_ids_reject_non_canonical_strings() {
        let ids = BinaryUuidIds;
        assert_eq!(ids.from_external("42"), None);
        assert_eq!(ids.from_external("c8a1f0c2e4b04a1b8c3d4e5f60718293"), None);
        assert_eq!(ids.from_external("C8A1F0C2-E4B0-4A1B-8C3D-4E5F60718293"), None);
        assert!(ids.from_external("c8a1f0c2-e4b0-4a1b-8c3d-4e5f60718293").is_some());
        assert_eq!(ids.decode(&[1, 2, 3]), None);
    }

    #[test]
    fn binary_uuid_ids_render_stored_bytes() {
        let ids = BinaryUuidIds;
        let key = [
            0xc8, 0xa1, 0xf0, 0xc2, 0xe4, 0xb0, 0x4a, 0x1b, 0x8c, 0x3d, 0x4e, 0x5f, 0x60, 0x71, 0x82,
            0x93,
        ];
        let external = ids.to_external(&key);
        assert_eq!(external, "c8a1f0c2-e4b0-4a1b-8c3d-4e5f60718293");
        assert_eq!(ids.decode(&key), Some(external));
    }

    #[test]
    fn object_keys_are_time_prefixed() {
        let key = ObjectIds::default().generate();
        let secs = u32::from_be_bytes([key.bytes()[0], key.bytes()[1], key.bytes()[2], key.bytes()[3]]);
        let now = jiff::Timestamp::now().as_second() as u32;
        assert!(now.abs_diff(secs) <= 5);
    }
}
