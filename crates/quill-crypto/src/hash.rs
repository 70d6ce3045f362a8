use quill_core::{PublicKeyId, TxId};

/// BLAKE3 hash of arbitrary bytes.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive a `TxId` from a transaction's canonical bincode body bytes.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId(blake3_hash(body_bytes))
}

/// Derive the `PublicKeyId` this crate uses to name a signing key, from the
/// raw key bytes produced by whatever signature scheme the outer wallet/P2P
/// layer uses. This core never interprets the key material itself.
pub fn key_id_from_bytes(raw: &[u8]) -> PublicKeyId {
    PublicKeyId(blake3_hash(raw))
}
