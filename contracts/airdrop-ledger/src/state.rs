use airdrop_common::types::DropFee;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<Config> = Item::new("config");
pub const LEDGER_STATE: Item<LedgerState> = Item::new("ledger_state");
pub const DROPS: Map<u64, Airdrop> = Map::new("drops");
/// Has-claimed flag per (drop, wallet). The stored value is the amount paid out.
/// An entry is never removed, so its presence alone blocks a second claim.
pub const CLAIMS: Map<(u64, &Addr), Uint128> = Map::new("claims");

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    /// Native denom claim fees are paid in. Fixed at instantiation.
    pub fee_denom: String,
    /// Protocol side of the owner/treasury fee split
    pub treasury: Addr,
    /// Template snapshotted into every new drop that brings no fee terms of its own
    pub fee_policy: FeePolicy,
}

#[cw_serde]
pub struct FeePolicy {
    /// Per-claim fee in `fee_denom`; zero disables the fee
    pub claim_fee: Uint128,
    /// Drop owner's share of each fee in basis points, the rest goes to treasury
    pub owner_share_bps: u16,
}

#[cw_serde]
pub struct LedgerState {
    pub next_drop_id: u64,
    pub total_drops: u64,
    pub total_claims: u64,
    pub total_refunds: u64,
}

#[cw_serde]
pub struct Airdrop {
    pub id: u64,
    pub creator: Addr,
    /// Hex-encoded sorted-pair sha256 root over (address, amount) leaves
    pub merkle_root: String,
    /// CW20 contract holding the distributed asset
    pub token: Addr,
    pub total_amount: Uint128,
    /// Everything paid out so far; set to `total_amount` by a refund
    pub claimed_amount: Uint128,
    /// What the refund swept to `expiration_recipient`, zero until then
    pub refunded_amount: Uint128,
    pub start_time: Timestamp,
    pub expiration_time: Timestamp,
    pub expiration_recipient: Addr,
    pub fee: Option<DropFee>,
    pub created_at: Timestamp,
}

impl Airdrop {
    pub fn remaining(&self) -> Uint128 {
        self.total_amount.saturating_sub(self.claimed_amount)
    }
}
