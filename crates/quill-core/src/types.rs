use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC). Matches the resolution used throughout the
/// state objects and housekeeping schedule.
pub type Timestamp = i64;

/// Monotonically increasing block height.
pub type BlockNum = u32;

/// Fixed-point share count used for vote weights, recent-claims accumulators,
/// and reward-curve intermediates prior to their final cast to an asset
/// amount.
pub type ShareType = i64;

// ── AccountName ───────────────────────────────────────────────────────────────

/// A human-chosen account name (not a derived key hash). Validated at
/// construction: 1–16 bytes, lowercase ascii letters/digits/hyphen, must not
/// start or end with a hyphen, dot-separated segments each following the
/// same rule (mirrors the original chain's account-name grammar).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountName(pub String);

impl AccountName {
    pub fn new(s: impl Into<String>) -> Result<Self, crate::error::QuillError> {
        let s = s.into();
        if !is_valid_account_name(&s) {
            return Err(crate::error::QuillError::InvalidAccountName(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_account_name(s: &str) -> bool {
    if s.len() < 3 || s.len() > 16 {
        return false;
    }
    for part in s.split('.') {
        if part.is_empty() {
            return false;
        }
        let bytes = part.as_bytes();
        if !bytes[0].is_ascii_lowercase() {
            return false;
        }
        if !bytes.last().unwrap().is_ascii_alphanumeric() {
            return false;
        }
        for &b in bytes {
            if !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
                return false;
            }
        }
    }
    true
}

// ── Permlink ──────────────────────────────────────────────────────────────────

/// Case-sensitive identifier for a post or comment, unique within its
/// author's namespace. Up to `MAX_PERMLINK_BYTES` bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permlink(pub String);

impl fmt::Display for Permlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Permlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a specific post or comment: (author, permlink).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct AuthorPermlink {
    pub author: AccountName,
    pub permlink: Permlink,
}

// ── TxId ──────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the canonical bincode
/// serialization of the transaction body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── ObjectId ──────────────────────────────────────────────────────────────────

/// A monotonically increasing identifier within one object table, generic
/// over the table's tag type so ids from different tables cannot be mixed
/// up at the type level.
#[derive(Serialize, Deserialize)]
pub struct ObjectId<T>(pub u64, std::marker::PhantomData<T>);

impl<T> ObjectId<T> {
    pub fn new(id: u64) -> Self {
        Self(id, std::marker::PhantomData)
    }
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl<T> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ObjectId<T> {}
impl<T> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for ObjectId<T> {}
impl<T> PartialOrd for ObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for ObjectId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}
impl<T> std::hash::Hash for ObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
impl<T> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<T> From<u64> for ObjectId<T> {
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl<T> From<ObjectId<T>> for u64 {
    fn from(id: ObjectId<T>) -> u64 {
        id.0
    }
}
