//! Content fingerprints for pool configurations.
//!
//! The fingerprint covers the full unit list in declaration order, so two
//! configs with equal fingerprints produce identical candidate orderings
//! and identical timing for the same request stream.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::desc::FuPoolConfig;

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> ContentHash {
    let json = serde_json::to_vec(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hasher.finalize().into()
}

/// Fingerprint a pool configuration.
pub fn fingerprint(pool: &FuPoolConfig) -> ContentHash {
    content_hash(pool)
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FuPoolBuilder;
    use crate::op_class::OpClass;
    use crate::presets;

    #[test]
    fn identical_builds_share_fingerprint() {
        let a = presets::xeon_o3().fu_pool;
        let b = presets::xeon_o3().fu_pool;
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn override_changes_fingerprint() {
        let base = presets::xeon_exec_units();
        let mut builder = FuPoolBuilder::from_config(base.clone());
        builder.set_op_latency(0, OpClass::IntDiv, 2).unwrap();
        let derived = builder.build().unwrap();
        assert_ne!(fingerprint(&base), fingerprint(&derived));
    }

    #[test]
    fn unit_order_is_part_of_fingerprint() {
        let base = presets::xeon_exec_units();
        let mut swapped = base.clone();
        swapped.units.swap(2, 3);
        // port2 and port3 have the same capabilities but different names.
        assert_ne!(fingerprint(&base), fingerprint(&swapped));
    }

    #[test]
    fn hash_hex_format() {
        let h = fingerprint(&presets::default_x86());
        let hex = hash_hex(&h);
        assert_eq!(hex.len(), 64);
    }
}
