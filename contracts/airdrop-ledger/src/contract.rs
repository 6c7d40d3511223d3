use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute::{self, ClaimRequest};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{Config, FeePolicy, LedgerState, CONFIG, LEDGER_STATE};

const CONTRACT_NAME: &str = "crates.io:airdrop-ledger";
/// Minor bump = logic change, major bump = message/storage interface change.
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    execute::validate_bps("owner_share_bps", msg.owner_share_bps)?;

    let admin = match msg.admin {
        Some(admin) => deps.api.addr_validate(&admin)?,
        None => info.sender.clone(),
    };
    let config = Config {
        admin: admin.clone(),
        fee_denom: msg.fee_denom,
        treasury: deps.api.addr_validate(&msg.treasury)?,
        fee_policy: FeePolicy {
            claim_fee: msg.claim_fee,
            owner_share_bps: msg.owner_share_bps,
        },
    };
    CONFIG.save(deps.storage, &config)?;

    // Ids are dense and start at 1
    let state = LedgerState {
        next_drop_id: 1,
        total_drops: 0,
        total_claims: 0,
        total_refunds: 0,
    };
    LEDGER_STATE.save(deps.storage, &state)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "airdrop-ledger")
        .add_attribute("admin", admin.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateDrop { terms } => execute::create_drop(deps, env, info, terms),
        ExecuteMsg::CreateDropWithPermit { terms, permit } => {
            execute::create_drop_with_permit(deps, env, info, terms, permit)
        }
        ExecuteMsg::Claim {
            drop_id,
            amount,
            proof,
        } => execute::claim(
            deps,
            env,
            info,
            ClaimRequest {
                drop_id,
                amount,
                proof,
            },
        ),
        ExecuteMsg::BatchClaim {
            drop_ids,
            amounts,
            proofs,
        } => execute::batch_claim(deps, env, info, drop_ids, amounts, proofs),
        ExecuteMsg::Refund { drop_id } => execute::refund(deps, env, info, drop_id),
        ExecuteMsg::UpdateConfig { admin, treasury } => {
            execute::update_config(deps, env, info, admin, treasury)
        }
        ExecuteMsg::UpdateFeePolicy {
            claim_fee,
            owner_share_bps,
        } => execute::update_fee_policy(deps, env, info, claim_fee, owner_share_bps),
    }
}

#[entry_point]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    execute::permit_reply(deps, env, msg)
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::LedgerState {} => query::query_ledger_state(deps),
        QueryMsg::Drop { drop_id } => query::query_drop(deps, drop_id),
        QueryMsg::Drops { start_after, limit } => query::query_drops(deps, start_after, limit),
        QueryMsg::ClaimStatus { drop_id, address } => {
            query::query_claim_status(deps, drop_id, address)
        }
        QueryMsg::VerifyClaim {
            drop_id,
            address,
            amount,
            proof,
        } => query::query_verify_claim(deps, drop_id, address, amount, proof),
        QueryMsg::Version {} => query::query_version(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
