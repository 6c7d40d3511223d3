use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    // ── Drop terms ──
    #[error("invalid merkle root: {reason}")]
    InvalidMerkleRoot { reason: String },

    #[error("drop total amount must be greater than zero")]
    ZeroTotalAmount,

    #[error("invalid token address: {address}")]
    InvalidTokenAddress { address: String },

    #[error("expiration {expiration} is not after current time {now}")]
    ExpirationInPast { expiration: u64, now: u64 },

    #[error("expiration {expiration} is not after start {start}")]
    ExpirationBeforeStart { start: u64, expiration: u64 },

    #[error("invalid expiration recipient: {address}")]
    InvalidExpirationRecipient { address: String },

    #[error("invalid fee recipient: {address}")]
    InvalidFeeRecipient { address: String },

    #[error("fee recipient {address} has a zero share")]
    ZeroFeeShare { address: String },

    #[error("duplicate fee recipient: {address}")]
    DuplicateFeeRecipient { address: String },

    #[error("too many fee recipients: {count} (max {max})")]
    TooManyFeeRecipients { count: usize, max: usize },

    #[error("fee shares must sum to 10000 bps, got {total}")]
    BpsSumMismatch { total: u32 },

    #[error("invalid basis points: {field} = {value} (must be <= 10000)")]
    InvalidBps { field: String, value: u16 },

    #[error("permit covers {permitted} but drop needs {required}")]
    PermitAmountTooLow {
        permitted: Uint128,
        required: Uint128,
    },

    // ── Lookup ──
    #[error("drop {drop_id} not found")]
    DropNotFound { drop_id: u64 },

    // ── Timing ──
    #[error("drop {drop_id} has not started yet (start: {start})")]
    ClaimNotStarted { drop_id: u64, start: u64 },

    #[error("drop {drop_id} has expired (expiration: {expiration})")]
    DropExpired { drop_id: u64, expiration: u64 },

    #[error("drop {drop_id} has not expired yet (expiration: {expiration})")]
    DropNotExpired { drop_id: u64, expiration: u64 },

    // ── State ──
    #[error("{address} already claimed drop {drop_id}")]
    AlreadyClaimed { drop_id: u64, address: String },

    #[error("drop {drop_id} has {remaining} tokens left, requested {requested}")]
    InsufficientRemaining {
        drop_id: u64,
        requested: Uint128,
        remaining: Uint128,
    },

    #[error("all tokens of drop {drop_id} are already claimed or refunded")]
    NothingToRefund { drop_id: u64 },

    #[error("claim amount must be greater than zero")]
    ZeroClaimAmount,

    // ── Proof ──
    #[error("invalid merkle proof")]
    InvalidMerkleProof,

    // ── Batch ──
    #[error("batch length mismatch: {drop_ids} drop ids, {amounts} amounts, {proofs} proofs")]
    BatchLengthMismatch {
        drop_ids: usize,
        amounts: usize,
        proofs: usize,
    },

    #[error("batch claim must contain at least one entry")]
    EmptyBatch,

    // ── Payment ──
    #[error("insufficient claim fee: need {required}, sent {provided}")]
    InsufficientFee {
        required: Uint128,
        provided: Uint128,
    },

    #[error("unsupported funds denom {denom}")]
    InvalidFunds { denom: String },

    #[error("this operation does not accept funds")]
    UnexpectedFunds,

    #[error("unknown reply id {id}")]
    UnknownReplyId { id: u64 },
}
