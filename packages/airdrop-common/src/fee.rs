use cosmwasm_std::{Addr, Uint128};

use crate::types::{DropFee, FeeShare};

/// 100.00% expressed in basis points.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Upper bound on fee legs per drop, keeps claim gas bounded.
pub const MAX_FEE_RECIPIENTS: usize = 10;

/// Sum of all shares, widened so a malformed list cannot wrap.
pub fn total_bps(shares: &[FeeShare]) -> u32 {
    shares.iter().map(|s| s.bps as u32).sum()
}

/// Split `claim_fee` across `shares`.
///
/// Each fragment is `floor(claim_fee * bps / 10000)`. The integer remainder is
/// credited to the first share so the fragments always add back up to
/// `claim_fee` exactly. Returned amounts are index-aligned with `shares`.
pub fn split_fee(claim_fee: Uint128, shares: &[FeeShare]) -> Vec<Uint128> {
    let mut fragments: Vec<Uint128> = shares
        .iter()
        .map(|s| claim_fee.multiply_ratio(s.bps as u128, BPS_DENOMINATOR as u128))
        .collect();

    let distributed: Uint128 = fragments.iter().copied().sum();
    if let Some(first) = fragments.first_mut() {
        *first += claim_fee.saturating_sub(distributed);
    }
    fragments
}

/// Shares for the governance fee policy: `owner_share_bps` to the drop owner,
/// the rest to the protocol treasury. Zero legs are dropped and identical
/// addresses are merged into one leg.
pub fn owner_treasury_shares(owner: &Addr, treasury: &Addr, owner_share_bps: u16) -> Vec<FeeShare> {
    if owner == treasury {
        return vec![FeeShare {
            recipient: owner.clone(),
            bps: BPS_DENOMINATOR,
        }];
    }

    let treasury_bps = BPS_DENOMINATOR.saturating_sub(owner_share_bps);
    [(owner, owner_share_bps), (treasury, treasury_bps)]
        .into_iter()
        .filter(|(_, bps)| *bps > 0)
        .map(|(recipient, bps)| FeeShare {
            recipient: recipient.clone(),
            bps,
        })
        .collect()
}

impl DropFee {
    /// `(recipient, amount)` pairs for one claim, zero fragments skipped.
    pub fn fragments(&self) -> Vec<(&Addr, Uint128)> {
        self.shares
            .iter()
            .zip(split_fee(self.claim_fee, &self.shares))
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(share, amount)| (&share.recipient, amount))
            .collect()
    }
}
