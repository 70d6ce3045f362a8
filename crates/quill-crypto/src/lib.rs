pub mod hash;
pub mod signature;

pub use hash::{blake3_hash, key_id_from_bytes, tx_id_from_body};
pub use signature::{AssumeValid, SignatureVerifier};
