//! Integration tests for the airdrop ledger.
//!
//! These tests drive the contract entry points directly using
//! `cosmwasm_std::testing` mocks. Token and bank movements are observed as
//! the messages the ledger dispatches; a failed call is assumed to revert
//! everything, so custody is reconstructed from successful responses only.
//!
//! Run:
//! ```bash
//! cargo test -p airdrop-integration-tests
//! ```

use airdrop_common::merkle::MerkleTree;
use airdrop_ledger::contract::{execute, instantiate, query};
use airdrop_ledger::msg::{
    ClaimStatusResponse, DropMetadata, DropTerms, DropsResponse, ExecuteMsg, FeeRecipient,
    FeeTerms, InstantiateMsg, QueryMsg, TokenExecuteMsg,
};
use airdrop_ledger::state::{Airdrop, LedgerState};
use airdrop_ledger::ContractError;
use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coins, from_json, Addr, BankMsg, Coin, CosmosMsg, Env, MemoryStorage, OwnedDeps, Response,
    Timestamp, Uint128, WasmMsg,
};

type Deps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

const DENOM: &str = "inj";
const WINDOW_SECONDS: u64 = 3600;

// ─── Helpers ───

fn setup_ledger(deps: &mut Deps, claim_fee: u128) {
    let admin = deps.api.addr_make("admin");
    let msg = InstantiateMsg {
        admin: None,
        fee_denom: DENOM.to_string(),
        treasury: deps.api.addr_make("treasury").to_string(),
        claim_fee: Uint128::new(claim_fee),
        owner_share_bps: 0,
    };
    instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();
}

/// The four-leaf, 3100-unit distribution used throughout.
fn recipients(deps: &Deps) -> Vec<(Addr, u128)> {
    vec![
        (deps.api.addr_make("alice"), 100),
        (deps.api.addr_make("bob"), 250),
        (deps.api.addr_make("carol"), 50),
        (deps.api.addr_make("dave"), 2700),
    ]
}

fn build_tree(entries: &[(Addr, u128)]) -> MerkleTree {
    MerkleTree::from_entries(entries.iter().map(|(addr, amount)| (addr.as_str(), *amount)))
        .unwrap()
}

fn terms(deps: &Deps, tree: &MerkleTree, total: u128, fee: Option<FeeTerms>) -> DropTerms {
    DropTerms {
        merkle_root: tree.root_hex(),
        total_amount: Uint128::new(total),
        token: deps.api.addr_make("token").to_string(),
        start_time: None,
        expiration_time: mock_env().block.time.seconds() + WINDOW_SECONDS,
        expiration_recipient: deps.api.addr_make("sink").to_string(),
        fee,
        metadata: DropMetadata {
            description: "season one".to_string(),
            uri: "https://example.org/tree.json".to_string(),
        },
    }
}

fn create_drop(deps: &mut Deps, tree: &MerkleTree, total: u128, fee: Option<FeeTerms>) -> u64 {
    let terms = terms(deps, tree, total, fee);
    let creator = deps.api.addr_make("creator");
    let res = execute(
        deps.as_mut(),
        mock_env(),
        message_info(&creator, &[]),
        ExecuteMsg::CreateDrop { terms },
    )
    .unwrap();
    res.attributes
        .iter()
        .find(|a| a.key == "drop_id")
        .unwrap()
        .value
        .parse()
        .unwrap()
}

fn claim(
    deps: &mut Deps,
    env: Env,
    claimant: &Addr,
    funds: &[Coin],
    drop_id: u64,
    amount: u128,
    proof: Vec<String>,
) -> Result<Response, ContractError> {
    execute(
        deps.as_mut(),
        env,
        message_info(claimant, funds),
        ExecuteMsg::Claim {
            drop_id,
            amount: Uint128::new(amount),
            proof,
        },
    )
}

fn refund(deps: &mut Deps, env: Env, drop_id: u64) -> Result<Response, ContractError> {
    let anyone = deps.api.addr_make("anyone");
    execute(
        deps.as_mut(),
        env,
        message_info(&anyone, &[]),
        ExecuteMsg::Refund { drop_id },
    )
}

fn after_expiry(extra_seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time =
        Timestamp::from_seconds(env.block.time.seconds() + WINDOW_SECONDS + extra_seconds);
    env
}

/// Sum of CW20 `Transfer`s leaving custody in a response.
fn tokens_out(res: &Response) -> u128 {
    res.messages
        .iter()
        .filter_map(|sub| match &sub.msg {
            CosmosMsg::Wasm(WasmMsg::Execute { msg, .. }) => {
                match from_json::<TokenExecuteMsg>(msg).unwrap() {
                    TokenExecuteMsg::Transfer { amount, .. } => Some(amount.u128()),
                    _ => None,
                }
            }
            _ => None,
        })
        .sum()
}

fn bank_sends(res: &Response) -> Vec<(String, u128)> {
    res.messages
        .iter()
        .filter_map(|sub| match &sub.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                Some((to_address.clone(), amount[0].amount.u128()))
            }
            _ => None,
        })
        .collect()
}

fn query_drop(deps: &Deps, drop_id: u64) -> Airdrop {
    from_json(query(deps.as_ref(), mock_env(), QueryMsg::Drop { drop_id }).unwrap()).unwrap()
}

fn has_claimed(deps: &Deps, drop_id: u64, address: &Addr) -> bool {
    let status: ClaimStatusResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::ClaimStatus {
                drop_id,
                address: address.to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    status.claimed
}

fn quarter_split(deps: &Deps, claim_fee: u128) -> FeeTerms {
    FeeTerms {
        claim_fee: Uint128::new(claim_fee),
        recipients: ["fee_a", "fee_b", "fee_c", "fee_d"]
            .iter()
            .map(|name| FeeRecipient {
                address: deps.api.addr_make(name).to_string(),
                bps: 2500,
            })
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_everyone_claims_then_refund_has_nothing_left() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let drop_id = create_drop(&mut deps, &tree, 3100, None);
    assert_eq!(drop_id, 1);

    let mut custody = 3100u128;
    for (index, (addr, amount)) in entries.iter().enumerate() {
        let res = claim(
            &mut deps,
            mock_env(),
            addr,
            &[],
            drop_id,
            *amount,
            tree.proof(index).unwrap(),
        )
        .unwrap();
        custody -= tokens_out(&res);
        assert!(has_claimed(&deps, drop_id, addr));
    }
    assert_eq!(custody, 0);

    let drop = query_drop(&deps, drop_id);
    assert_eq!(drop.claimed_amount, drop.total_amount);

    let err = refund(&mut deps, after_expiry(1), drop_id).unwrap_err();
    assert!(
        format!("{:?}", err).contains("NothingToRefund"),
        "Expected NothingToRefund, got: {:?}",
        err
    );
}

#[test]
fn test_refund_after_expiry_with_no_claims() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let tree = build_tree(&recipients(&deps));
    let drop_id = create_drop(&mut deps, &tree, 3100, None);

    let err = refund(&mut deps, mock_env(), drop_id).unwrap_err();
    assert!(matches!(err, ContractError::DropNotExpired { .. }));

    let res = refund(&mut deps, after_expiry(1), drop_id).unwrap();
    assert_eq!(tokens_out(&res), 3100);

    let err = refund(&mut deps, after_expiry(1), drop_id).unwrap_err();
    assert!(matches!(err, ContractError::NothingToRefund { .. }));

    let drop = query_drop(&deps, drop_id);
    assert_eq!(drop.claimed_amount, Uint128::new(3100));
    assert_eq!(drop.refunded_amount, Uint128::new(3100));

    let state: LedgerState =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::LedgerState {}).unwrap()).unwrap();
    assert_eq!(state.total_refunds, 1);
    assert_eq!(state.total_claims, 0);
}

#[test]
fn test_conservation_with_partial_claims() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let drop_id = create_drop(&mut deps, &tree, 3100, None);

    let mut paid = 0u128;
    for index in [0usize, 2] {
        let (addr, amount) = &entries[index];
        let res = claim(
            &mut deps,
            mock_env(),
            addr,
            &[],
            drop_id,
            *amount,
            tree.proof(index).unwrap(),
        )
        .unwrap();
        paid += tokens_out(&res);
        assert!(paid <= 3100);
    }

    // Claims after expiry are rejected, refund sweeps the rest
    let (bob, bob_amount) = &entries[1];
    let err = claim(
        &mut deps,
        after_expiry(0),
        bob,
        &[],
        drop_id,
        *bob_amount,
        tree.proof(1).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::DropExpired { .. }));

    let refunded = tokens_out(&refund(&mut deps, after_expiry(0), drop_id).unwrap());
    assert_eq!(paid, 150);
    assert_eq!(paid + refunded, 3100);
}

#[test]
fn test_proof_for_other_pair_is_rejected() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let drop_id = create_drop(&mut deps, &tree, 3100, None);

    let (alice, _) = &entries[0];
    let (_, bob_amount) = &entries[1];

    // Alice replays bob's (address, amount) proof with bob's amount
    let err = claim(
        &mut deps,
        mock_env(),
        alice,
        &[],
        drop_id,
        *bob_amount,
        tree.proof(1).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidMerkleProof));

    // An outsider with alice's proof
    let mallory = deps.api.addr_make("mallory");
    let err = claim(
        &mut deps,
        mock_env(),
        &mallory,
        &[],
        drop_id,
        100,
        tree.proof(0).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidMerkleProof));

    let verified: bool = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::VerifyClaim {
                drop_id,
                address: alice.to_string(),
                amount: Uint128::new(100),
                proof: tree.proof(0).unwrap(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert!(verified);
    assert!(!has_claimed(&deps, drop_id, alice));
}

#[test]
fn test_second_leaf_for_same_address_is_rejected() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);

    // Alice appears twice with different amounts
    let alice = deps.api.addr_make("alice");
    let entries = vec![
        (alice.clone(), 100u128),
        (alice.clone(), 200),
        (deps.api.addr_make("bob"), 250),
    ];
    let tree = build_tree(&entries);
    let drop_id = create_drop(&mut deps, &tree, 550, None);

    let res = claim(
        &mut deps,
        mock_env(),
        &alice,
        &[],
        drop_id,
        100,
        tree.proof(0).unwrap(),
    )
    .unwrap();
    assert_eq!(tokens_out(&res), 100);

    let verified: bool = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::VerifyClaim {
                drop_id,
                address: alice.to_string(),
                amount: Uint128::new(200),
                proof: tree.proof(1).unwrap(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert!(verified);

    let err = claim(
        &mut deps,
        mock_env(),
        &alice,
        &[],
        drop_id,
        200,
        tree.proof(1).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::AlreadyClaimed { drop_id: 1, .. }));
    assert_eq!(query_drop(&deps, drop_id).claimed_amount, Uint128::new(100));
}

#[test]
fn test_pool_check_is_independent_of_proof() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);

    // Tree promises alice more than the drop holds
    let alice = deps.api.addr_make("alice");
    let inflated = vec![(alice.clone(), 5000u128), (deps.api.addr_make("bob"), 250)];
    let tree = build_tree(&inflated);
    let drop_id = create_drop(&mut deps, &tree, 3100, None);

    let err = claim(
        &mut deps,
        mock_env(),
        &alice,
        &[],
        drop_id,
        5000,
        tree.proof(0).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ContractError::InsufficientRemaining {
            requested,
            remaining,
            ..
        } if requested == Uint128::new(5000) && remaining == Uint128::new(3100)
    ));
}

#[test]
fn test_batch_arity_mismatch_touches_nothing() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let first = create_drop(&mut deps, &tree, 3100, None);
    let second = create_drop(&mut deps, &tree, 3100, None);

    let (alice, amount) = &entries[0];
    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(alice, &[]),
        ExecuteMsg::BatchClaim {
            drop_ids: vec![first, second],
            amounts: vec![Uint128::new(*amount)],
            proofs: vec![tree.proof(0).unwrap(), tree.proof(0).unwrap()],
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ContractError::BatchLengthMismatch {
            drop_ids: 2,
            amounts: 1,
            proofs: 2
        }
    ));
    assert!(!has_claimed(&deps, first, alice));
    assert!(!has_claimed(&deps, second, alice));

    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(alice, &[]),
        ExecuteMsg::BatchClaim {
            drop_ids: vec![],
            amounts: vec![],
            proofs: vec![],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::EmptyBatch));
}

#[test]
fn test_batch_with_one_bad_entry_records_nothing() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let first = create_drop(&mut deps, &tree, 3100, None);
    let second = create_drop(&mut deps, &tree, 3100, None);

    let (alice, amount) = &entries[0];
    let before_first = query_drop(&deps, first);
    let before_second = query_drop(&deps, second);

    // Valid entry followed by a bad proof
    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(alice, &[]),
        ExecuteMsg::BatchClaim {
            drop_ids: vec![first, second],
            amounts: vec![Uint128::new(*amount), Uint128::new(*amount)],
            proofs: vec![tree.proof(0).unwrap(), tree.proof(1).unwrap()],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidMerkleProof));

    // Same drop twice in one batch
    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(alice, &[]),
        ExecuteMsg::BatchClaim {
            drop_ids: vec![first, first],
            amounts: vec![Uint128::new(*amount), Uint128::new(*amount)],
            proofs: vec![tree.proof(0).unwrap(), tree.proof(0).unwrap()],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::AlreadyClaimed { .. }));

    assert_eq!(query_drop(&deps, first), before_first);
    assert_eq!(query_drop(&deps, second), before_second);
    assert!(!has_claimed(&deps, first, alice));
    assert!(!has_claimed(&deps, second, alice));

    // The corrected batch goes through in full
    let res = execute(
        deps.as_mut(),
        mock_env(),
        message_info(alice, &[]),
        ExecuteMsg::BatchClaim {
            drop_ids: vec![first, second],
            amounts: vec![Uint128::new(*amount), Uint128::new(*amount)],
            proofs: vec![tree.proof(0).unwrap(), tree.proof(0).unwrap()],
        },
    )
    .unwrap();
    assert_eq!(tokens_out(&res), 200);
    assert!(has_claimed(&deps, first, alice));
    assert!(has_claimed(&deps, second, alice));
}

#[test]
fn test_fee_split_exact_and_overpaid() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let fee = quarter_split(&deps, 1000);
    let drop_id = create_drop(&mut deps, &tree, 3100, Some(fee));

    let fee_recipients: Vec<String> = ["fee_a", "fee_b", "fee_c", "fee_d"]
        .iter()
        .map(|name| deps.api.addr_make(name).to_string())
        .collect();

    // Exact payment: 4 x 250, nothing back
    let (alice, alice_amount) = &entries[0];
    let res = claim(
        &mut deps,
        mock_env(),
        alice,
        &coins(1000, DENOM),
        drop_id,
        *alice_amount,
        tree.proof(0).unwrap(),
    )
    .unwrap();
    let sends = bank_sends(&res);
    assert_eq!(
        sends,
        fee_recipients
            .iter()
            .map(|addr| (addr.clone(), 250))
            .collect::<Vec<_>>()
    );

    // Overpayment: same fragments, 500 back to the claimant
    let (bob, bob_amount) = &entries[1];
    let res = claim(
        &mut deps,
        mock_env(),
        bob,
        &coins(1500, DENOM),
        drop_id,
        *bob_amount,
        tree.proof(1).unwrap(),
    )
    .unwrap();
    let sends = bank_sends(&res);
    assert_eq!(sends.len(), 5);
    assert_eq!(sends[4], (bob.to_string(), 500));
    let total: u128 = sends.iter().map(|(_, amount)| amount).sum();
    assert_eq!(total, 1500);

    // Underpayment
    let (carol, carol_amount) = &entries[2];
    let err = claim(
        &mut deps,
        mock_env(),
        carol,
        &coins(999, DENOM),
        drop_id,
        *carol_amount,
        tree.proof(2).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InsufficientFee { .. }));
    assert!(!has_claimed(&deps, drop_id, carol));
}

#[test]
fn test_batch_fee_overpayment_returned_once() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let fee = quarter_split(&deps, 1000);
    let paid = create_drop(&mut deps, &tree, 3100, Some(fee));
    let free = create_drop(&mut deps, &tree, 3100, None);

    let (dave, amount) = &entries[3];
    let batch = |funds: u128| {
        (
            message_info(dave, &coins(funds, DENOM)),
            ExecuteMsg::BatchClaim {
                drop_ids: vec![paid, free],
                amounts: vec![Uint128::new(*amount), Uint128::new(*amount)],
                proofs: vec![tree.proof(3).unwrap(), tree.proof(3).unwrap()],
            },
        )
    };

    let (info, msg) = batch(500);
    let err = execute(deps.as_mut(), mock_env(), info, msg).unwrap_err();
    assert!(matches!(err, ContractError::InsufficientFee { .. }));

    let (info, msg) = batch(1300);
    let res = execute(deps.as_mut(), mock_env(), info, msg).unwrap();
    assert_eq!(tokens_out(&res), 5400);

    let sends = bank_sends(&res);
    let refunds: Vec<_> = sends
        .iter()
        .filter(|(to, _)| *to == dave.to_string())
        .collect();
    assert_eq!(refunds, vec![&(dave.to_string(), 300)]);
    assert_eq!(res.events.iter().filter(|e| e.ty == "airdrop_claimed").count(), 2);
}

#[test]
fn test_global_fee_policy_is_snapshotted() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 400);
    let entries = recipients(&deps);
    let tree = build_tree(&entries);
    let drop_id = create_drop(&mut deps, &tree, 3100, None);

    let admin = deps.api.addr_make("admin");
    execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::UpdateFeePolicy {
            claim_fee: Some(Uint128::zero()),
            owner_share_bps: None,
        },
    )
    .unwrap();

    // Still charged at the creation-time rate, all of it to treasury
    let (alice, amount) = &entries[0];
    let err = claim(
        &mut deps,
        mock_env(),
        alice,
        &[],
        drop_id,
        *amount,
        tree.proof(0).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InsufficientFee { .. }));

    let res = claim(
        &mut deps,
        mock_env(),
        alice,
        &coins(400, DENOM),
        drop_id,
        *amount,
        tree.proof(0).unwrap(),
    )
    .unwrap();
    assert_eq!(
        bank_sends(&res),
        vec![(deps.api.addr_make("treasury").to_string(), 400)]
    );

    // A drop created after the update carries no fee
    let fee_free = create_drop(&mut deps, &tree, 3100, None);
    assert!(query_drop(&deps, fee_free).fee.is_none());
}

#[test]
fn test_drops_pagination_and_not_found() {
    let mut deps = mock_dependencies();
    setup_ledger(&mut deps, 0);
    let tree = build_tree(&recipients(&deps));
    for total in [10u128, 20, 30] {
        create_drop(&mut deps, &tree, total, None);
    }

    let page: DropsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Drops {
                start_after: Some(1),
                limit: Some(1),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(page.drops.len(), 1);
    assert_eq!(page.drops[0].id, 2);
    assert_eq!(page.drops[0].total_amount, Uint128::new(20));

    assert!(query(deps.as_ref(), mock_env(), QueryMsg::Drop { drop_id: 4 }).is_err());
    assert!(query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::ClaimStatus {
            drop_id: 4,
            address: deps.api.addr_make("alice").to_string(),
        },
    )
    .is_err());
}
