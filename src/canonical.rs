//! Canonical serialization for deterministic fingerprints.
//!
//! Templates and policies are fingerprinted from their canonical JSON form so
//! two runs over the same input can be compared without rendering YAML.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Vec and BTreeSet contents serialize in iteration order
//! - No HashMap in fingerprinted data

use std::io;

use serde::Serialize;
use xxhash_rust::xxh64::Xxh64;

/// Canonical serialization of a value failed.
#[derive(Debug, thiserror::Error)]
#[error("canonical serialization failed: {0}")]
pub struct CanonicalError(#[from] serde_json::Error);

/// Serialize a value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    Ok(serde_json::to_vec(value)?)
}

/// Feeds serializer output straight into the hasher.
struct HashWriter(Xxh64);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// xxh64 (seed 0) of the canonical bytes, computed without buffering them.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, CanonicalError> {
    let mut writer = HashWriter(Xxh64::new(0));
    serde_json::to_writer(&mut writer, value)?;
    Ok(writer.0.digest())
}

/// [`canonical_hash`] as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    canonical_hash(value).map(|hash| format!("{hash:016x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Version;
    use std::collections::BTreeMap;
    use xxhash_rust::xxh64::xxh64;

    #[test]
    fn test_version_list_hash_is_stable() {
        let versions = vec![Version::new(4, 0, 0), Version::new(4, 0, 1)];
        assert_eq!(canonical_hash(&versions).unwrap(), canonical_hash(&versions.clone()).unwrap());
        assert_eq!(canonical_hash_hex(&versions).unwrap().len(), 16);
    }

    #[test]
    fn test_streamed_hash_matches_buffered_bytes() {
        let versions = vec![Version::new(3, 62, 0), Version::new(4, 0, 0)];
        let bytes = to_canonical_bytes(&versions).unwrap();
        assert_eq!(bytes, br#"["3.62.0","4.0.0"]"#);
        assert_eq!(canonical_hash(&versions).unwrap(), xxh64(&bytes, 0));
    }

    #[test]
    fn test_order_changes_hash() {
        let a = vec![Version::new(4, 0, 0), Version::new(4, 0, 1)];
        let b = vec![Version::new(4, 0, 1), Version::new(4, 0, 0)];
        assert_ne!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }

    #[test]
    fn test_non_string_keys_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(Version::new(4, 0, 0), 1u8);
        map.insert(Version::new(4, 0, 1), 2u8);
        assert!(to_canonical_bytes(&map).is_ok());

        let mut tuples = BTreeMap::new();
        tuples.insert((1u8, 2u8), "x");
        assert!(matches!(canonical_hash(&tuples), Err(CanonicalError(_))));
    }
}
