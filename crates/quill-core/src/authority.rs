//! Weighted-threshold multisig authority, generalized from the teacher's
//! `AuthPolicy`/`MultiSig` shape into the three-tier owner/active/posting
//! model this chain uses for every account.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::AccountName;

/// A public key, opaque to this crate. Real signature verification lives
/// outside this core (see `quill-crypto`); here a key is just a name used to
/// resolve authority weight.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKeyId(pub [u8; 32]);

impl std::fmt::Debug for PublicKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", hex::encode(&self.0[..4]))
    }
}

/// A weighted-threshold authority: satisfied when the sum of weights of the
/// keys/accounts that signed (directly, or indirectly through a satisfied
/// sub-account authority) meets or exceeds `weight_threshold`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Authority {
    pub weight_threshold: u32,
    pub key_auths: BTreeMap<PublicKeyId, u16>,
    pub account_auths: BTreeMap<AccountName, u16>,
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Self {
            weight_threshold,
            key_auths: BTreeMap::new(),
            account_auths: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: PublicKeyId, weight: u16) -> Self {
        self.key_auths.insert(key, weight);
        self
    }

    pub fn member_count(&self) -> usize {
        self.key_auths.len() + self.account_auths.len()
    }

    pub fn is_impossible(&self) -> bool {
        let total: u32 = self
            .key_auths
            .values()
            .map(|&w| w as u32)
            .chain(self.account_auths.values().map(|&w| w as u32))
            .sum();
        total < self.weight_threshold
    }
}

/// The full three-tier authority set an account carries, plus its single
/// posting-only memo key (used off-chain, never for signature checks).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountAuthority {
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: PublicKeyId,
}
