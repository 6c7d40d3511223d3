pub mod fee;
pub mod merkle;
pub mod types;

pub use fee::{owner_treasury_shares, split_fee, BPS_DENOMINATOR, MAX_FEE_RECIPIENTS};
pub use merkle::{compute_leaf_hash, verify_merkle_proof, MerkleTree};
pub use types::{DropFee, FeeShare};
