//! Posts, comments, and votes. A "post" is simply a comment with no parent.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{AccountName, ObjectId, Permlink, ShareType, Timestamp};

pub struct CommentTag;
pub type CommentId = ObjectId<CommentTag>;

/// Which currency split an author chose for their content reward payout.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RewardSplit {
    /// Default split: `DEFAULT_VESTING_SHARE_PERCENT` in VESTS, remainder
    /// split between LIQUID and DOLLAR.
    Default,
    /// 100% of the non-VESTS portion paid in LIQUID, none in DOLLAR.
    DeclineDollar,
    /// No reward at all; the author opted out.
    DeclinePayout,
}

/// A beneficiary route: a fraction (basis points) of a post's reward is
/// redirected to another account instead of the author.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Beneficiary {
    pub account: AccountName,
    pub weight: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: AccountName,
    pub permlink: Permlink,
    pub parent_author: Option<AccountName>,
    pub parent_permlink: Permlink,
    pub root_comment: CommentId,
    pub depth: u16,

    pub created: Timestamp,
    pub last_update: Timestamp,
    pub active: Timestamp,
    pub cashout_time: Option<Timestamp>,
    pub last_payout: Option<Timestamp>,

    pub children: u32,
    pub net_rshares: i64,
    pub abs_rshares: i64,
    pub vote_rshares: i64,
    pub children_abs_rshares: i64,

    pub net_votes: i32,
    pub total_vote_weight: u64,

    pub reward_weight: u16,
    pub max_accepted_payout: Asset,
    pub percent_dollar: u16,
    pub reward_split: RewardSplit,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub beneficiaries: Vec<Beneficiary>,

    pub total_payout_value: Asset,
    pub curator_payout_value: Asset,
    pub author_rewards: i64,

    pub body: String,
    pub json_metadata: String,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_author.is_none()
    }

    pub fn pending_payout(&self) -> bool {
        self.cashout_time.is_some()
    }
}

pub struct CommentVoteTag;
pub type CommentVoteId = ObjectId<CommentVoteTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentVote {
    pub id: CommentVoteId,
    pub voter: AccountName,
    pub comment: CommentId,
    pub weight: u64,
    pub rshares: ShareType,
    pub vote_percent: i16,
    pub last_update: Timestamp,
    /// `-1` is a sentinel marking a post-cashout vote record that accepts no
    /// further changes (see `MAX_VOTE_CHANGES`).
    pub num_changes: i32,
}
