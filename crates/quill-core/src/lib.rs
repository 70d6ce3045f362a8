pub mod account;
pub mod asset;
pub mod authority;
pub mod constants;
pub mod content;
pub mod error;
pub mod escrow;
pub mod global;
pub mod market;
pub mod operation;
pub mod savings;
pub mod types;
pub mod vesting;
pub mod virtual_ops;
pub mod witness;

pub use account::*;
pub use asset::{Asset, Price, Symbol};
pub use authority::{AccountAuthority, Authority, PublicKeyId};
pub use constants::*;
pub use content::{Beneficiary, Comment, CommentVote, RewardSplit};
pub use error::QuillError;
pub use escrow::{Escrow, EscrowStatus};
pub use global::{DynamicGlobalProperties, RewardCurve, RewardFund};
pub use market::{ConvertRequest, LimitOrder};
pub use operation::{Operation, Transaction, TransactionContext};
pub use savings::SavingsWithdraw;
pub use types::*;
pub use vesting::{VestingDelegation, VestingDelegationExpiration};
pub use virtual_ops::VirtualOp;
pub use witness::{ChainProperties, FeedHistory, Witness, WitnessSchedule};
