//! Resolves whether a set of signing keys satisfies an account's authority,
//! recursively through `account_auths`, level-preserving at every step per
//! spec.md §4.1 ("resolved at that level"). The signature check itself is
//! delegated to a `SignatureVerifier` so this module never has to know how
//! a key proves possession of itself.

use std::collections::HashSet;

use quill_core::authority::{Authority, PublicKeyId};
use quill_core::constants::{MAX_AUTHORITY_MEMBERSHIP, MAX_SIG_CHECK_ACCOUNTS, MAX_SIG_CHECK_DEPTH};
use quill_core::error::QuillError;
use quill_core::types::AccountName;

use crate::store::Store;

/// Which of an account's three authority levels is required to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityLevel {
    Owner,
    Active,
    Posting,
}

pub fn check_authority(
    store: &Store,
    account: &AccountName,
    level: AuthorityLevel,
    digest: &[u8; 32],
    verifier: &dyn quill_crypto::SignatureVerifier,
) -> Result<(), QuillError> {
    if authority_satisfied(store, account, level, digest, verifier, &mut HashSet::new(), 0)? {
        Ok(())
    } else {
        Err(QuillError::MissingAuthority(account.to_string()))
    }
}

fn authority_for<'a>(store: &'a Store, account: &AccountName, level: AuthorityLevel) -> Option<&'a Authority> {
    let acct = store.get_account_by_name(account)?;
    Some(match level {
        AuthorityLevel::Owner => &acct.authority.owner,
        AuthorityLevel::Active => &acct.authority.active,
        AuthorityLevel::Posting => &acct.authority.posting,
    })
}

/// Recursively checks whether the accumulated weight of directly-signed
/// keys, plus transitively satisfied `account_auths`, meets the authority's
/// threshold. `visited` prevents cycles (and double counting); `depth` caps
/// recursion per `MAX_SIG_CHECK_DEPTH`.
fn authority_satisfied(
    store: &Store,
    account: &AccountName,
    level: AuthorityLevel,
    digest: &[u8; 32],
    verifier: &dyn quill_crypto::SignatureVerifier,
    visited: &mut HashSet<AccountName>,
    depth: u8,
) -> Result<bool, QuillError> {
    if depth > MAX_SIG_CHECK_DEPTH {
        return Err(QuillError::AuthorityRecursionTooDeep { max: MAX_SIG_CHECK_DEPTH });
    }
    if !visited.insert(account.clone()) {
        return Ok(false);
    }
    if visited.len() > MAX_SIG_CHECK_ACCOUNTS {
        return Err(QuillError::TooManyAuthorityAccounts { max: MAX_SIG_CHECK_ACCOUNTS });
    }

    let authority = authority_for(store, account, level)
        .ok_or_else(|| QuillError::UnknownAccount(account.to_string()))?;

    if authority.member_count() > MAX_AUTHORITY_MEMBERSHIP {
        return Err(QuillError::AuthorityTooLarge { max: MAX_AUTHORITY_MEMBERSHIP });
    }

    let mut total_weight: u32 = 0;

    for (key, &weight) in &authority.key_auths {
        if key_satisfied(key, digest, verifier) {
            total_weight += weight as u32;
        }
    }

    for (sub_account, &weight) in &authority.account_auths {
        // A named sub-account's authority is resolved at the same level as
        // the authority being checked (spec.md §4.1: "resolved at that
        // level"), not collapsed to active for owner/active alike.
        let sub_level = level;
        if authority_satisfied(store, sub_account, sub_level, digest, verifier, visited, depth + 1)? {
            total_weight += weight as u32;
        }
        if total_weight >= authority.weight_threshold {
            break;
        }
    }

    Ok(total_weight >= authority.weight_threshold)
}

fn key_satisfied(key: &PublicKeyId, digest: &[u8; 32], verifier: &dyn quill_crypto::SignatureVerifier) -> bool {
    verifier.is_signed_by(digest, key)
}
