//! Signature verification is an outer-layer concern (the P2P/wallet stack
//! that is out of scope for this core). This trait is the seam: the
//! authority checker in `quill-state` asks a `SignatureVerifier` whether a
//! given key actually signed the transaction rather than doing any
//! cryptography itself. Tests and tools that only need to exercise
//! authority *resolution* (which keys/accounts are required, not whether
//! their signatures are genuine) can use `AssumeValid`, which treats every
//! key presented in `TransactionContext::signing_keys` as valid.

use quill_core::PublicKeyId;

pub trait SignatureVerifier {
    /// Returns true if `key` is among the keys that validly signed the
    /// transaction whose digest is `message_digest`.
    fn is_signed_by(&self, message_digest: &[u8; 32], key: &PublicKeyId) -> bool;
}

/// A verifier that trusts `TransactionContext::signing_keys` outright. Used
/// when the enclosing layer has already done real verification before
/// constructing the context (the normal production path), or in tests that
/// only want to exercise authority-weight resolution.
pub struct AssumeValid<'a> {
    pub signing_keys: &'a [PublicKeyId],
}

impl<'a> SignatureVerifier for AssumeValid<'a> {
    fn is_signed_by(&self, _message_digest: &[u8; 32], key: &PublicKeyId) -> bool {
        self.signing_keys.contains(key)
    }
}
