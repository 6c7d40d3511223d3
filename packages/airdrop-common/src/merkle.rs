use sha2::{Digest, Sha256};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Compute the leaf hash for a (recipient, amount) entitlement.
///
/// `leaf_hash = sha256( 0x00 || address_bytes || amount_u128_be )`
///
/// The address is the raw bech32 string bytes (not decoded), exactly as the
/// chain reports the claiming sender.
pub fn compute_leaf_hash(address: &str, amount: u128) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(address.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.finalize().into()
}

/// Hash two sibling nodes into their parent.
///
/// Sorted-pair hashing: the smaller value always goes first, so a proof does
/// not need to carry left/right position bits.
pub fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    if a.as_slice() <= b.as_slice() {
        hasher.update(a);
        hasher.update(b);
    } else {
        hasher.update(b);
        hasher.update(a);
    }
    hasher.finalize().into()
}

/// Decode a hex-encoded 32-byte hash. Returns `None` on bad hex or wrong length.
pub fn parse_hash(value: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(value).ok()?;
    bytes.try_into().ok()
}

/// Verify a Merkle proof against a known root.
///
/// Folds the proof from the leaf upwards with [`hash_pair`] and compares the
/// result with the expected root. An all-zero root never verifies, and an
/// empty proof only verifies when the root is the leaf itself.
pub fn verify_merkle_proof(root_hex: &str, proof_hex: &[String], leaf_hash: &[u8; 32]) -> bool {
    let expected_root = match parse_hash(root_hex) {
        Some(root) => root,
        None => return false,
    };
    if expected_root == [0u8; 32] {
        return false;
    }

    let mut current = *leaf_hash;
    for sibling_hex in proof_hex {
        let sibling = match parse_hash(sibling_hex) {
            Some(sibling) => sibling,
            None => return false,
        };
        current = hash_pair(&current, &sibling);
    }

    current == expected_root
}

/// Off-chain tree builder matching [`verify_merkle_proof`].
///
/// Adjacent nodes are paired level by level; an odd trailing node is promoted
/// to the next level unchanged (and contributes no sibling to proofs).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree from already-hashed leaves. Returns `None` for an empty set.
    pub fn new(leaves: Vec<[u8; 32]>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let next: Vec<[u8; 32]> = levels[levels.len() - 1]
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }

        Some(Self { levels })
    }

    /// Build a tree straight from `(address, amount)` entitlements.
    pub fn from_entries<'a, I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, u128)>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(address, amount)| compute_leaf_hash(address, amount))
                .collect(),
        )
    }

    pub fn root(&self) -> [u8; 32] {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Hex-encoded sibling path for the leaf at `index`, bottom to top.
    pub fn proof(&self, index: usize) -> Option<Vec<String>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut proof = Vec::new();
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(position ^ 1) {
                proof.push(hex::encode(sibling));
            }
            position /= 2;
        }
        Some(proof)
    }
}
