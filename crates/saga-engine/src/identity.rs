use sha2::{Digest, Sha256};

/// Stable, content-addressed summary of a run's semantically relevant input.
///
/// Two payloads describing the same logical request must produce the same
/// fingerprint, independent of wall-clock time, so that re-submitting the
/// request collides on the same transaction id. Fields that do not change
/// the meaning of the request (clocks, simulation hooks, intermediate step
/// results) must be excluded.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

/// Derive a deterministic transaction id from a payload fingerprint.
///
/// The id is a fixed `saga_` tag plus the first 16 hex characters of the
/// SHA-256 digest of the fingerprint.
#[must_use]
pub fn derive_transaction_id<D: Fingerprint>(data: &D) -> String {
    let digest = Sha256::digest(data.fingerprint().as_bytes());
    let hex = hex::encode(digest);
    format!("saga_{}", &hex[..16])
}
