use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};

/// One leg of a claim-fee split.
#[cw_serde]
pub struct FeeShare {
    pub recipient: Addr,
    /// Share of each claim fee in basis points (2500 = 25%)
    pub bps: u16,
}

/// Fee terms fixed on a drop at creation time.
/// Shares always sum to exactly 10000 bps; the first share absorbs rounding dust.
#[cw_serde]
pub struct DropFee {
    /// Native-currency cost of a single claim
    pub claim_fee: Uint128,
    pub shares: Vec<FeeShare>,
}
