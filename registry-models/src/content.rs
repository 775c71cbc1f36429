use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::ContentId;
use crate::tenant::TenantId;

/// A reference from one artifact's content to another artifact's coordinates,
/// e.g. an Avro schema's `import` or a Protobuf's `.proto` dependency. Order
/// is preserved as insertion order end to end (§6 persisted state layout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArtifactReference {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    /// The name by which the referencing content addresses this target
    /// (e.g. the Avro/Protobuf import alias).
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub tenant_id: TenantId,
    pub content_id: ContentId,
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
    pub content_hash: String,
    pub canonical_hash: Option<String>,
    #[sqlx(json)]
    pub references: Vec<ArtifactReference>,
}

/// Lowercase hex SHA-256 of `bytes`, the canonical `contentHash` form
/// persisted everywhere (§6).
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::content_hash;
    use quickcheck_macros::quickcheck;

    #[test]
    fn hash_is_lowercase_hex_and_deterministic() {
        let a = content_hash(b"hello world");
        let b = content_hash(b"hello world");
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn distinct_bytes_hash_differently() {
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    /// §8 property 1 (dedup) rests on `content_hash` being a pure function of
    /// its bytes: any two calls on identical input must agree, for any input.
    #[quickcheck]
    fn hash_is_a_pure_function_of_its_bytes(bytes: Vec<u8>) -> bool {
        content_hash(&bytes) == content_hash(&bytes)
    }

    #[quickcheck]
    fn hash_is_always_64_lowercase_hex_chars(bytes: Vec<u8>) -> bool {
        let hash = content_hash(&bytes);
        hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }
}
