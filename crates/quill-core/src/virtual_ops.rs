//! Virtual operations: not submitted by users, but emitted by evaluators
//! and housekeeping to record effects that would otherwise be invisible in
//! the operation log (reward payouts, order fills, interest, expirations).
//! Consumers (e.g. indexers) read these; the state engine itself never
//! re-applies them.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{AccountName, Permlink};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum VirtualOp {
    AuthorReward {
        author: AccountName,
        permlink: Permlink,
        liquid_payout: Asset,
        dollar_payout: Asset,
        vesting_payout: Asset,
    },
    CurationReward {
        curator: AccountName,
        reward: Asset,
        permlink: Permlink,
        comment_author: AccountName,
    },
    CommentPayout {
        author: AccountName,
        permlink: Permlink,
        payout: Asset,
    },
    LiquidityReward {
        owner: AccountName,
        payout: Asset,
    },
    Interest {
        owner: AccountName,
        interest: Asset,
    },
    FillConvertRequest {
        owner: AccountName,
        request_id: u32,
        amount_in: Asset,
        amount_out: Asset,
    },
    FillOrder {
        current_owner: AccountName,
        current_order_id: u32,
        current_pays: Asset,
        open_owner: AccountName,
        open_order_id: u32,
        open_pays: Asset,
    },
    ShutdownWitness {
        owner: AccountName,
    },
    FillVestingWithdraw {
        from_account: AccountName,
        to_account: AccountName,
        withdrawn: Asset,
        deposited: Asset,
    },
    ReturnVestingDelegation {
        account: AccountName,
        vesting_shares: Asset,
    },
    HardforkOp {
        hardfork_id: u32,
    },
}
