use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Uint128};
use cw2::ContractVersion;

use crate::state::{Airdrop, Config, LedgerState};

#[cw_serde]
pub struct InstantiateMsg {
    /// Defaults to the instantiating sender
    pub admin: Option<String>,
    pub fee_denom: String,
    pub treasury: String,
    pub claim_fee: Uint128,
    pub owner_share_bps: u16,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock `total_amount` of a CW20 token behind a merkle root.
    /// The ledger must already hold an allowance from the sender.
    CreateDrop { terms: DropTerms },
    /// Same as `CreateDrop`, but first forwards a signed permit to the token.
    /// A rejected permit is ignored and the pull falls back to any existing allowance.
    CreateDropWithPermit { terms: DropTerms, permit: Permit },
    /// Claim the sender's allotment. Attach `claim_fee` in the fee denom when the drop has one.
    Claim {
        drop_id: u64,
        amount: Uint128,
        /// Merkle proof (list of hex-encoded sibling hashes)
        proof: Vec<String>,
    },
    /// Claim from several drops at once. All three lists must have the same length.
    BatchClaim {
        drop_ids: Vec<u64>,
        amounts: Vec<Uint128>,
        proofs: Vec<Vec<String>>,
    },
    /// Sweep the unclaimed remainder of an expired drop. Anyone can call.
    Refund { drop_id: u64 },
    /// Update configuration. Admin only.
    UpdateConfig {
        admin: Option<String>,
        treasury: Option<String>,
    },
    /// Update the fee template for future drops. Admin only.
    UpdateFeePolicy {
        claim_fee: Option<Uint128>,
        owner_share_bps: Option<u16>,
    },
}

#[cw_serde]
pub struct DropTerms {
    /// Hex-encoded 32-byte root
    pub merkle_root: String,
    pub total_amount: Uint128,
    /// CW20 token contract address
    pub token: String,
    /// Unix seconds; defaults to the current block time
    pub start_time: Option<u64>,
    /// Unix seconds; claims are accepted strictly before this instant
    pub expiration_time: u64,
    pub expiration_recipient: String,
    /// Explicit fee split. When absent the current fee policy is snapshotted.
    pub fee: Option<FeeTerms>,
    pub metadata: DropMetadata,
}

#[cw_serde]
pub struct FeeTerms {
    pub claim_fee: Uint128,
    pub recipients: Vec<FeeRecipient>,
}

#[cw_serde]
pub struct FeeRecipient {
    pub address: String,
    pub bps: u16,
}

/// Only emitted in the creation event, never stored.
#[cw_serde]
pub struct DropMetadata {
    pub description: String,
    /// Where the full tree (leaves and proofs) is published
    pub uri: String,
}

/// Off-band signed allowance from the sender to this contract.
#[cw_serde]
pub struct Permit {
    pub amount: Uint128,
    pub deadline: u64,
    pub signature: Binary,
}

/// Execute messages understood by the token contract.
#[cw_serde]
pub enum TokenExecuteMsg {
    Transfer {
        recipient: String,
        amount: Uint128,
    },
    TransferFrom {
        owner: String,
        recipient: String,
        amount: Uint128,
    },
    Permit {
        owner: String,
        spender: String,
        amount: Uint128,
        deadline: u64,
        signature: Binary,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(LedgerState)]
    LedgerState {},
    #[returns(Airdrop)]
    Drop { drop_id: u64 },
    #[returns(DropsResponse)]
    Drops {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(ClaimStatusResponse)]
    ClaimStatus { drop_id: u64, address: String },
    #[returns(bool)]
    VerifyClaim {
        drop_id: u64,
        address: String,
        amount: Uint128,
        proof: Vec<String>,
    },
    #[returns(ContractVersion)]
    Version {},
}

#[cw_serde]
pub struct DropsResponse {
    pub drops: Vec<Airdrop>,
}

#[cw_serde]
pub struct ClaimStatusResponse {
    pub drop_id: u64,
    pub address: String,
    pub claimed: bool,
    pub amount: Option<Uint128>,
}
