use airdrop_common::merkle::{compute_leaf_hash, verify_merkle_proof};
use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdError, StdResult, Uint128};
use cw2::get_contract_version;
use cw_storage_plus::Bound;

use crate::msg::{ClaimStatusResponse, DropsResponse};
use crate::state::{Airdrop, CLAIMS, CONFIG, DROPS, LEDGER_STATE};

fn load_drop(deps: Deps, drop_id: u64) -> StdResult<Airdrop> {
    DROPS
        .may_load(deps.storage, drop_id)?
        .ok_or_else(|| StdError::not_found(format!("drop {drop_id}")))
}

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_ledger_state(deps: Deps) -> StdResult<Binary> {
    let state = LEDGER_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_drop(deps: Deps, drop_id: u64) -> StdResult<Binary> {
    to_json_binary(&load_drop(deps, drop_id)?)
}

pub fn query_drops(deps: Deps, start_after: Option<u64>, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let drops = DROPS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, drop)| drop))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&DropsResponse { drops })
}

pub fn query_claim_status(deps: Deps, drop_id: u64, address: String) -> StdResult<Binary> {
    load_drop(deps, drop_id)?;
    let addr = deps.api.addr_validate(&address)?;
    let amount = CLAIMS.may_load(deps.storage, (drop_id, &addr))?;

    to_json_binary(&ClaimStatusResponse {
        drop_id,
        address,
        claimed: amount.is_some(),
        amount,
    })
}

/// Dry-run of the proof check a claim would perform.
pub fn query_verify_claim(
    deps: Deps,
    drop_id: u64,
    address: String,
    amount: Uint128,
    proof: Vec<String>,
) -> StdResult<Binary> {
    let drop = load_drop(deps, drop_id)?;
    let leaf_hash = compute_leaf_hash(&address, amount.u128());
    let valid = verify_merkle_proof(&drop.merkle_root, &proof, &leaf_hash);
    to_json_binary(&valid)
}

pub fn query_version(deps: Deps) -> StdResult<Binary> {
    let version = get_contract_version(deps.storage)?;
    to_json_binary(&version)
}
