//! Vesting delegation objects. A delegation grants the delegatee additional
//! effective vesting shares (voting/curation weight) without transferring
//! ownership; decreasing or removing a delegation does not return the
//! shares to the delegator immediately but schedules a
//! `VestingDelegationExpiration` so the delegatee cannot double-spend the
//! borrowed stake across an instantaneous delegate/undelegate/vote cycle.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct DelegationTag;
pub type DelegationId = ObjectId<DelegationTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VestingDelegation {
    pub id: DelegationId,
    pub delegator: AccountName,
    pub delegatee: AccountName,
    pub vesting_shares: Asset,
    pub min_delegation_time: Timestamp,
}

pub struct DelegationExpirationTag;
pub type DelegationExpirationId = ObjectId<DelegationExpirationTag>;

/// Created when a delegation is decreased or removed; the shares return to
/// the delegator's own `vesting_shares`-effective pool only once
/// `expiration` has passed and housekeeping processes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VestingDelegationExpiration {
    pub id: DelegationExpirationId,
    pub delegator: AccountName,
    pub vesting_shares: Asset,
    pub expiration: Timestamp,
}
