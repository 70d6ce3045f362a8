//! Three-party escrow state machine: `Created` -> `Ratified` ->
//! `Released` | `Disputed`. See `quill_state::evaluators::escrow` for the
//! transition table.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct EscrowTag;
pub type EscrowId = ObjectId<EscrowTag>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EscrowStatus {
    Created,
    Ratified,
    Disputed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Escrow {
    pub id: EscrowId,
    pub escrow_id: u32,
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub ratification_deadline: Timestamp,
    pub escrow_expiration: Timestamp,
    pub liquid_balance: Asset,
    pub dollar_balance: Asset,
    pub fee: Asset,
    pub to_approved: bool,
    pub agent_approved: bool,
    pub status: EscrowStatus,
}

impl Escrow {
    pub fn is_approved(&self) -> bool {
        self.to_approved && self.agent_approved
    }
}
