//! Time-delayed savings withdrawals: moving funds out of
//! `savings_liquid_balance`/`savings_dollar_balance` always incurs a
//! `SAVINGS_WITHDRAW_DELAY_SECS` delay, even back to the same account.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct SavingsWithdrawTag;
pub type SavingsWithdrawId = ObjectId<SavingsWithdrawTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavingsWithdraw {
    pub id: SavingsWithdrawId,
    pub from: AccountName,
    pub to: AccountName,
    pub request_id: u32,
    pub memo: String,
    pub amount: Asset,
    pub complete: Timestamp,
}
