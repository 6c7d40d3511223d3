use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use airdrop_common::fee::{owner_treasury_shares, total_bps, BPS_DENOMINATOR, MAX_FEE_RECIPIENTS};
use airdrop_common::merkle::{compute_leaf_hash, parse_hash, verify_merkle_proof};
use airdrop_common::types::{DropFee, FeeShare};
use cosmwasm_std::{
    coins, to_json_binary, Addr, BankMsg, Coin, Deps, DepsMut, Env, Event, MessageInfo, Reply,
    Response, StdResult, SubMsg, SubMsgResult, Timestamp, Uint128, WasmMsg,
};

use crate::error::ContractError;
use crate::msg::{DropMetadata, DropTerms, FeeTerms, Permit, TokenExecuteMsg};
use crate::state::{Airdrop, Config, CLAIMS, CONFIG, DROPS, LEDGER_STATE};

/// Reply id for the best-effort permit forwarded ahead of the token pull.
pub const PERMIT_REPLY_ID: u64 = 1;

/// Reject bps values above 100%.
pub fn validate_bps(field: &str, value: u16) -> Result<(), ContractError> {
    if value > BPS_DENOMINATOR {
        return Err(ContractError::InvalidBps {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn ensure_no_funds(info: &MessageInfo) -> Result<(), ContractError> {
    if !info.funds.is_empty() {
        return Err(ContractError::UnexpectedFunds);
    }
    Ok(())
}

fn token_msg(token: &Addr, msg: &TokenExecuteMsg) -> StdResult<WasmMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_json_binary(msg)?,
        funds: vec![],
    })
}

/// Lock tokens behind a merkle root. Pulls `total_amount` from the sender
/// through the token allowance.
pub fn create_drop(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    terms: DropTerms,
) -> Result<Response, ContractError> {
    ensure_no_funds(&info)?;

    let drop = build_drop(deps.as_ref(), &env, &info.sender, &terms)?;
    let drop = store_drop(deps, drop)?;

    creation_response(&env, &drop, &terms.metadata, None, "create_drop")
}

/// Create a drop after forwarding a signed permit to the token contract.
///
/// The permit can be front-run or invalidated by anyone, so its failure is
/// swallowed in `reply` and the pull relies on whatever allowance exists.
pub fn create_drop_with_permit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    terms: DropTerms,
    permit: Permit,
) -> Result<Response, ContractError> {
    ensure_no_funds(&info)?;

    let drop = build_drop(deps.as_ref(), &env, &info.sender, &terms)?;
    if permit.amount < drop.total_amount {
        return Err(ContractError::PermitAmountTooLow {
            permitted: permit.amount,
            required: drop.total_amount,
        });
    }
    let drop = store_drop(deps, drop)?;

    creation_response(
        &env,
        &drop,
        &terms.metadata,
        Some(&permit),
        "create_drop_with_permit",
    )
}

/// Validate terms in a fixed order and build the drop (id not yet assigned).
fn build_drop(
    deps: Deps,
    env: &Env,
    creator: &Addr,
    terms: &DropTerms,
) -> Result<Airdrop, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let now = env.block.time;

    // 1. Root
    let root = parse_hash(&terms.merkle_root).ok_or_else(|| ContractError::InvalidMerkleRoot {
        reason: "must be 32 hex-encoded bytes".to_string(),
    })?;
    if root == [0u8; 32] {
        return Err(ContractError::InvalidMerkleRoot {
            reason: "root must be non-zero".to_string(),
        });
    }

    // 2. Amount
    if terms.total_amount.is_zero() {
        return Err(ContractError::ZeroTotalAmount);
    }

    // 3. Token
    let token =
        deps.api
            .addr_validate(&terms.token)
            .map_err(|_| ContractError::InvalidTokenAddress {
                address: terms.token.clone(),
            })?;

    // 4-5. Window
    let expiration_time = Timestamp::from_seconds(terms.expiration_time);
    if expiration_time <= now {
        return Err(ContractError::ExpirationInPast {
            expiration: terms.expiration_time,
            now: now.seconds(),
        });
    }
    let start_time = terms.start_time.map(Timestamp::from_seconds).unwrap_or(now);
    if expiration_time <= start_time {
        return Err(ContractError::ExpirationBeforeStart {
            start: start_time.seconds(),
            expiration: terms.expiration_time,
        });
    }

    // 6. Refund destination
    let expiration_recipient = deps
        .api
        .addr_validate(&terms.expiration_recipient)
        .map_err(|_| ContractError::InvalidExpirationRecipient {
            address: terms.expiration_recipient.clone(),
        })?;

    // 7. Fee
    let fee = match &terms.fee {
        Some(fee_terms) => validate_fee_terms(deps, fee_terms)?,
        None => snapshot_fee_policy(&config, creator),
    };

    Ok(Airdrop {
        id: 0,
        creator: creator.clone(),
        merkle_root: hex::encode(root),
        token,
        total_amount: terms.total_amount,
        claimed_amount: Uint128::zero(),
        refunded_amount: Uint128::zero(),
        start_time,
        expiration_time,
        expiration_recipient,
        fee,
        created_at: now,
    })
}

fn validate_fee_terms(deps: Deps, terms: &FeeTerms) -> Result<Option<DropFee>, ContractError> {
    if terms.claim_fee.is_zero() {
        return Ok(None);
    }
    if terms.recipients.len() > MAX_FEE_RECIPIENTS {
        return Err(ContractError::TooManyFeeRecipients {
            count: terms.recipients.len(),
            max: MAX_FEE_RECIPIENTS,
        });
    }

    let mut seen = BTreeSet::new();
    let mut shares = Vec::with_capacity(terms.recipients.len());
    for recipient in &terms.recipients {
        let address = deps.api.addr_validate(&recipient.address).map_err(|_| {
            ContractError::InvalidFeeRecipient {
                address: recipient.address.clone(),
            }
        })?;
        if recipient.bps == 0 {
            return Err(ContractError::ZeroFeeShare {
                address: recipient.address.clone(),
            });
        }
        if !seen.insert(address.clone()) {
            return Err(ContractError::DuplicateFeeRecipient {
                address: recipient.address.clone(),
            });
        }
        shares.push(FeeShare {
            recipient: address,
            bps: recipient.bps,
        });
    }

    let total = total_bps(&shares);
    if total != BPS_DENOMINATOR as u32 {
        return Err(ContractError::BpsSumMismatch { total });
    }

    Ok(Some(DropFee {
        claim_fee: terms.claim_fee,
        shares,
    }))
}

/// Copy the current global policy onto a new drop. Later policy updates
/// never reach existing drops.
fn snapshot_fee_policy(config: &Config, owner: &Addr) -> Option<DropFee> {
    let policy = &config.fee_policy;
    if policy.claim_fee.is_zero() {
        return None;
    }
    Some(DropFee {
        claim_fee: policy.claim_fee,
        shares: owner_treasury_shares(owner, &config.treasury, policy.owner_share_bps),
    })
}

/// Assign the next id and persist.
fn store_drop(deps: DepsMut, mut drop: Airdrop) -> Result<Airdrop, ContractError> {
    let mut state = LEDGER_STATE.load(deps.storage)?;
    drop.id = state.next_drop_id;
    state.next_drop_id += 1;
    state.total_drops += 1;

    DROPS.save(deps.storage, drop.id, &drop)?;
    LEDGER_STATE.save(deps.storage, &state)?;
    Ok(drop)
}

fn creation_response(
    env: &Env,
    drop: &Airdrop,
    metadata: &DropMetadata,
    permit: Option<&Permit>,
    action: &str,
) -> Result<Response, ContractError> {
    let mut response = Response::new();

    if let Some(permit) = permit {
        let permit_msg = token_msg(
            &drop.token,
            &TokenExecuteMsg::Permit {
                owner: drop.creator.to_string(),
                spender: env.contract.address.to_string(),
                amount: permit.amount,
                deadline: permit.deadline,
                signature: permit.signature.clone(),
            },
        )?;
        response = response.add_submessage(SubMsg::reply_on_error(permit_msg, PERMIT_REPLY_ID));
    }

    let pull_msg = token_msg(
        &drop.token,
        &TokenExecuteMsg::TransferFrom {
            owner: drop.creator.to_string(),
            recipient: env.contract.address.to_string(),
            amount: drop.total_amount,
        },
    )?;

    let (claim_fee, fee_shares) = match &drop.fee {
        Some(fee) => (
            fee.claim_fee,
            fee.shares
                .iter()
                .map(|s| format!("{}:{}", s.recipient, s.bps))
                .collect::<Vec<_>>()
                .join(","),
        ),
        None => (Uint128::zero(), String::new()),
    };

    Ok(response
        .add_message(pull_msg)
        .add_attribute("action", action)
        .add_attribute("drop_id", drop.id.to_string())
        .add_attribute("creator", drop.creator.to_string())
        .add_attribute("total_amount", drop.total_amount.to_string())
        .add_event(
            Event::new("airdrop_created")
                .add_attribute("drop_id", drop.id.to_string())
                .add_attribute("creator", drop.creator.to_string())
                .add_attribute("token", drop.token.to_string())
                .add_attribute("merkle_root", drop.merkle_root.clone())
                .add_attribute("total_amount", drop.total_amount.to_string())
                .add_attribute("start_time", drop.start_time.seconds().to_string())
                .add_attribute("expiration_time", drop.expiration_time.seconds().to_string())
                .add_attribute("expiration_recipient", drop.expiration_recipient.to_string())
                .add_attribute("claim_fee", claim_fee.to_string())
                .add_attribute("fee_shares", fee_shares)
                .add_attribute("description", metadata.description.clone())
                .add_attribute("uri", metadata.uri.clone()),
        ))
}

/// Permit failures are expected and never abort creation.
pub fn permit_reply(_deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    if msg.id != PERMIT_REPLY_ID {
        return Err(ContractError::UnknownReplyId { id: msg.id });
    }

    match msg.result {
        SubMsgResult::Err(reason) => Ok(Response::new()
            .add_attribute("action", "permit_skipped")
            .add_attribute("reason", reason)),
        SubMsgResult::Ok(_) => Ok(Response::new()),
    }
}

/// A single (drop, amount, proof) entry of a claim call.
pub struct ClaimRequest {
    pub drop_id: u64,
    pub amount: Uint128,
    pub proof: Vec<String>,
}

/// Tracks the attached fee-denom funds while a call is charged.
struct FeePayment {
    provided: Uint128,
    charged: Uint128,
}

impl FeePayment {
    fn from_funds(funds: &[Coin], fee_denom: &str) -> Result<Self, ContractError> {
        let mut provided = Uint128::zero();
        for coin in funds {
            if coin.denom != fee_denom {
                return Err(ContractError::InvalidFunds {
                    denom: coin.denom.clone(),
                });
            }
            provided = provided.checked_add(coin.amount)?;
        }
        Ok(Self {
            provided,
            charged: Uint128::zero(),
        })
    }

    fn charge(&mut self, fee: Uint128) -> Result<(), ContractError> {
        let required = self.charged.checked_add(fee)?;
        if required > self.provided {
            return Err(ContractError::InsufficientFee {
                required,
                provided: self.provided,
            });
        }
        self.charged = required;
        Ok(())
    }

    fn excess(&self) -> Uint128 {
        self.provided - self.charged
    }
}

struct ClaimReceipt {
    drop_id: u64,
    token: Addr,
    amount: Uint128,
    fee: Option<DropFee>,
}

/// Claim the sender's allotment from one drop.
pub fn claim(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request: ClaimRequest,
) -> Result<Response, ContractError> {
    execute_claims(deps, env, info, vec![request], "claim")
}

/// Claim from several drops in one call. Either every entry succeeds or none does.
pub fn batch_claim(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    drop_ids: Vec<u64>,
    amounts: Vec<Uint128>,
    proofs: Vec<Vec<String>>,
) -> Result<Response, ContractError> {
    if drop_ids.len() != amounts.len() || drop_ids.len() != proofs.len() {
        return Err(ContractError::BatchLengthMismatch {
            drop_ids: drop_ids.len(),
            amounts: amounts.len(),
            proofs: proofs.len(),
        });
    }
    if drop_ids.is_empty() {
        return Err(ContractError::EmptyBatch);
    }

    let requests = drop_ids
        .into_iter()
        .zip(amounts)
        .zip(proofs)
        .map(|((drop_id, amount), proof)| ClaimRequest {
            drop_id,
            amount,
            proof,
        })
        .collect();

    execute_claims(deps, env, info, requests, "batch_claim")
}

/// Validate every request against an in-memory view of the touched drops,
/// then commit flags and totals, then dispatch transfers.
fn execute_claims(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    requests: Vec<ClaimRequest>,
    action: &str,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let claimant = info.sender;
    let mut payment = FeePayment::from_funds(&info.funds, &config.fee_denom)?;

    let mut touched: BTreeMap<u64, Airdrop> = BTreeMap::new();
    let mut receipts: Vec<ClaimReceipt> = Vec::with_capacity(requests.len());

    for request in requests {
        let ClaimRequest {
            drop_id,
            amount,
            proof,
        } = request;

        // 1. Existence
        let drop = match touched.entry(drop_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let drop = DROPS
                    .may_load(deps.storage, drop_id)?
                    .ok_or(ContractError::DropNotFound { drop_id })?;
                entry.insert(drop)
            }
        };

        // 2. Window [start, expiration)
        if env.block.time < drop.start_time {
            return Err(ContractError::ClaimNotStarted {
                drop_id,
                start: drop.start_time.seconds(),
            });
        }
        if env.block.time >= drop.expiration_time {
            return Err(ContractError::DropExpired {
                drop_id,
                expiration: drop.expiration_time.seconds(),
            });
        }

        // 3. One claim per wallet, including repeats inside this batch
        let claimed_in_batch = receipts.iter().any(|r| r.drop_id == drop_id);
        if claimed_in_batch || CLAIMS.has(deps.storage, (drop_id, &claimant)) {
            return Err(ContractError::AlreadyClaimed {
                drop_id,
                address: claimant.to_string(),
            });
        }

        // 4. Pool
        if amount.is_zero() {
            return Err(ContractError::ZeroClaimAmount);
        }
        let remaining = drop.remaining();
        if amount > remaining {
            return Err(ContractError::InsufficientRemaining {
                drop_id,
                requested: amount,
                remaining,
            });
        }

        // 5. Proof
        let leaf_hash = compute_leaf_hash(claimant.as_str(), amount.u128());
        if !verify_merkle_proof(&drop.merkle_root, &proof, &leaf_hash) {
            return Err(ContractError::InvalidMerkleProof);
        }

        if let Some(fee) = &drop.fee {
            payment.charge(fee.claim_fee)?;
        }

        drop.claimed_amount = drop.claimed_amount.checked_add(amount)?;
        receipts.push(ClaimReceipt {
            drop_id,
            token: drop.token.clone(),
            amount,
            fee: drop.fee.clone(),
        });
    }

    // Consume claims before any value leaves the contract
    for receipt in &receipts {
        CLAIMS.save(deps.storage, (receipt.drop_id, &claimant), &receipt.amount)?;
    }
    for (drop_id, drop) in &touched {
        DROPS.save(deps.storage, *drop_id, drop)?;
    }
    let mut state = LEDGER_STATE.load(deps.storage)?;
    state.total_claims += receipts.len() as u64;
    LEDGER_STATE.save(deps.storage, &state)?;

    let mut response = Response::new()
        .add_attribute("action", action)
        .add_attribute("claimant", claimant.to_string())
        .add_attribute("claims", receipts.len().to_string());

    for receipt in &receipts {
        response = response.add_message(token_msg(
            &receipt.token,
            &TokenExecuteMsg::Transfer {
                recipient: claimant.to_string(),
                amount: receipt.amount,
            },
        )?);

        let mut fee_paid = Uint128::zero();
        if let Some(fee) = &receipt.fee {
            for (recipient, fragment) in fee.fragments() {
                response = response.add_message(BankMsg::Send {
                    to_address: recipient.to_string(),
                    amount: coins(fragment.u128(), &config.fee_denom),
                });
            }
            fee_paid = fee.claim_fee;
        }

        response = response.add_event(
            Event::new("airdrop_claimed")
                .add_attribute("drop_id", receipt.drop_id.to_string())
                .add_attribute("claimant", claimant.to_string())
                .add_attribute("token", receipt.token.to_string())
                .add_attribute("amount", receipt.amount.to_string())
                .add_attribute("fee_paid", fee_paid.to_string()),
        );
    }

    let excess = payment.excess();
    if !excess.is_zero() {
        response = response
            .add_message(BankMsg::Send {
                to_address: claimant.to_string(),
                amount: coins(excess.u128(), &config.fee_denom),
            })
            .add_attribute("fee_returned", excess.to_string());
    }

    Ok(response)
}

/// Sweep the unclaimed remainder of an expired drop to its expiration
/// recipient. Anyone can call: the destination is fixed at creation.
pub fn refund(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    drop_id: u64,
) -> Result<Response, ContractError> {
    ensure_no_funds(&info)?;

    let mut drop = DROPS
        .may_load(deps.storage, drop_id)?
        .ok_or(ContractError::DropNotFound { drop_id })?;

    if env.block.time < drop.expiration_time {
        return Err(ContractError::DropNotExpired {
            drop_id,
            expiration: drop.expiration_time.seconds(),
        });
    }

    let remainder = drop.remaining();
    if remainder.is_zero() {
        return Err(ContractError::NothingToRefund { drop_id });
    }

    // Close the pool before the transfer is dispatched
    drop.claimed_amount = drop.total_amount;
    drop.refunded_amount = remainder;
    DROPS.save(deps.storage, drop_id, &drop)?;

    let mut state = LEDGER_STATE.load(deps.storage)?;
    state.total_refunds += 1;
    LEDGER_STATE.save(deps.storage, &state)?;

    let transfer = token_msg(
        &drop.token,
        &TokenExecuteMsg::Transfer {
            recipient: drop.expiration_recipient.to_string(),
            amount: remainder,
        },
    )?;

    Ok(Response::new()
        .add_message(transfer)
        .add_attribute("action", "refund")
        .add_attribute("drop_id", drop_id.to_string())
        .add_attribute("amount", remainder.to_string())
        .add_event(
            Event::new("airdrop_refunded")
                .add_attribute("drop_id", drop_id.to_string())
                .add_attribute("recipient", drop.expiration_recipient.to_string())
                .add_attribute("token", drop.token.to_string())
                .add_attribute("amount", remainder.to_string()),
        ))
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    admin: Option<String>,
    treasury: Option<String>,
) -> Result<Response, ContractError> {
    ensure_no_funds(&info)?;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(new_admin) = admin {
        config.admin = deps.api.addr_validate(&new_admin)?;
    }
    if let Some(new_treasury) = treasury {
        config.treasury = deps.api.addr_validate(&new_treasury)?;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("admin", config.admin.to_string())
        .add_attribute("treasury", config.treasury.to_string()))
}

/// Update the fee template for drops created from now on. Admin only.
pub fn update_fee_policy(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    claim_fee: Option<Uint128>,
    owner_share_bps: Option<u16>,
) -> Result<Response, ContractError> {
    ensure_no_funds(&info)?;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update the fee policy".to_string(),
        });
    }

    let old = config.fee_policy.clone();
    if let Some(fee) = claim_fee {
        config.fee_policy.claim_fee = fee;
    }
    if let Some(bps) = owner_share_bps {
        validate_bps("owner_share_bps", bps)?;
        config.fee_policy.owner_share_bps = bps;
    }

    CONFIG.save(deps.storage, &config)?;

    let new = &config.fee_policy;
    Ok(Response::new()
        .add_attribute("action", "update_fee_policy")
        .add_event(
            Event::new("airdrop_fee_policy_updated")
                .add_attribute("old_claim_fee", old.claim_fee.to_string())
                .add_attribute("new_claim_fee", new.claim_fee.to_string())
                .add_attribute("old_owner_share_bps", old.owner_share_bps.to_string())
                .add_attribute("new_owner_share_bps", new.owner_share_bps.to_string()),
        ))
}
