//! Limit-order book and DOLLAR<->LIQUID conversion requests.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, Price};
use crate::types::{AccountName, ObjectId, Timestamp};

pub struct OrderTag;
pub type OrderId = ObjectId<OrderTag>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: OrderId,
    pub owner: AccountName,
    /// Id chosen by the client, unique per (owner) only, used to cancel.
    pub order_id: u32,
    pub created: Timestamp,
    pub expiration: Timestamp,
    pub for_sale: Asset,
    pub sell_price: Price,
    pub fill_or_kill: bool,
}

impl LimitOrder {
    /// The amount of the other asset this order would receive if fully
    /// filled at its own price.
    pub fn amount_to_receive(&self) -> Result<Asset, crate::error::QuillError> {
        self.sell_price.multiply(&self.for_sale)
    }
}

pub struct ConvertRequestTag;
pub type ConvertRequestId = ObjectId<ConvertRequestTag>;

/// A request to convert DOLLAR into LIQUID at the feed-median price,
/// settled after `CONVERSION_DELAY_SECS`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub id: ConvertRequestId,
    pub owner: AccountName,
    pub request_id: u32,
    pub amount: Asset,
    pub conversion_date: Timestamp,
}
