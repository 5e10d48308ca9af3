//! # Merkle Tree Layer
//!
//! Leaves of the XMSS tree are W-OTS+ public keys compressed by an L-tree;
//! inner nodes are built with the bitmasked hash `H` under addresses of type
//! [`AdrsType::HashTree`].
//!
//! Producing an authentication path per signature is delegated to a
//! [`TreeTraversal`]. Two implementations exist, selected through
//! [`TraversalStrategy`]:
//!
//! - [`basic::FullTree`] keeps only the root and rebuilds the tree for every
//!   path. Small state, `O(2^h)` hashing per signature.
//! - [`bds::BdsState`] runs the Buchmann-Dahmen-Szydlo traversal and prepares
//!   the next path while signing. `O(h)` nodes of state and a bounded number of
//!   leaf computations per signature.
//!
//! Both produce bit-identical roots and paths.

use crate::hash::HashFunction;
use crate::params::{BDS_K, XMSS_N};
use crate::wots_plus::adrs::{Adrs, AdrsType};
use crate::wots_plus::{WotsChains, WotsPlus};
use crate::{Error, Result};
use zeroize::Zeroizing;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

pub(crate) mod basic;
pub(crate) mod bds;

/// How a signer computes authentication paths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum TraversalStrategy {
    /// Rebuild the whole tree for every signature.
    Basic,
    /// BDS traversal with `k` retained top levels. Needs `h > k >= 2` and
    /// `h - k` even.
    Fast { k: u32 },
}

impl TraversalStrategy {
    /// Checks that the strategy can walk a tree of `height`.
    pub(crate) fn validate(&self, height: u8) -> Result<()> {
        match *self {
            TraversalStrategy::Fast { k } if !bds::BdsState::accepts(height, k) => {
                Err(Error::InvalidBdsParameter { height, k })
            }
            _ => Ok(()),
        }
    }
}

impl Default for TraversalStrategy {
    fn default() -> Self {
        TraversalStrategy::Fast { k: BDS_K }
    }
}

/// Everything needed to compute leaves and nodes of one tree.
#[derive(Clone)]
pub(crate) struct TreeContext {
    wots: WotsPlus,
    sk_seed: Zeroizing<[u8; XMSS_N]>,
    height: u8,
}

impl TreeContext {
    pub(crate) fn new(
        hash_function: HashFunction,
        sk_seed: &[u8; XMSS_N],
        pub_seed: &[u8; XMSS_N],
        height: u8,
    ) -> Self {
        Self {
            wots: WotsPlus::new(hash_function, pub_seed),
            sk_seed: Zeroizing::new(*sk_seed),
            height,
        }
    }

    pub(crate) fn height(&self) -> u8 {
        self.height
    }

    pub(crate) fn wots(&self) -> &WotsPlus {
        &self.wots
    }

    pub(crate) fn sk_seed(&self) -> &[u8; XMSS_N] {
        &self.sk_seed
    }

    /// Number of leaves, `2^h`.
    pub(crate) fn leaf_count(&self) -> u64 {
        1u64 << self.height
    }

    /// Leaf `idx`: the L-tree root over the W-OTS+ public key at OTS index `idx`.
    pub(crate) fn gen_leaf(&self, idx: u32) -> [u8; XMSS_N] {
        let mut pk = self.wots.keygen(&self.sk_seed, idx);
        l_tree(&self.wots, &mut pk, idx)
    }

    /// Parent of two nodes at `node_height`, stored at `index` on the level above.
    pub(crate) fn hash_node(
        &self,
        left: &[u8; XMSS_N],
        right: &[u8; XMSS_N],
        node_height: u32,
        index: u32,
    ) -> [u8; XMSS_N] {
        hash_node(&self.wots, left, right, node_height, index)
    }
}

/// Produces the authentication paths of consecutive signatures.
pub(crate) trait TreeTraversal {
    /// Root of the tree the traversal walks.
    fn root(&self) -> &[u8; XMSS_N];

    /// Authentication path of leaf `index`, ordered leaf to root. Calls are
    /// expected with increasing indices; implementations may prepare the path
    /// of `index + 1` as a side effect.
    fn next_auth_path(&mut self, ctx: &TreeContext, index: u32) -> Vec<[u8; XMSS_N]>;

    /// Moves the traversal from `from` to `to` without producing paths.
    fn advance(&mut self, ctx: &TreeContext, from: u32, to: u32);
}

/// The traversal owned by a signer.
#[derive(Clone)]
pub(crate) enum Traversal {
    Basic(basic::FullTree),
    Fast(bds::BdsState),
}

impl Traversal {
    /// Builds the traversal for `ctx`, validating the strategy's parameters
    /// before any hashing is done.
    pub(crate) fn build(ctx: &TreeContext, strategy: TraversalStrategy) -> Result<Self> {
        strategy.validate(ctx.height())?;
        Ok(match strategy {
            TraversalStrategy::Basic => Traversal::Basic(basic::FullTree::new(ctx)),
            TraversalStrategy::Fast { k } => Traversal::Fast(bds::BdsState::new(ctx, k)),
        })
    }
}

impl TreeTraversal for Traversal {
    fn root(&self) -> &[u8; XMSS_N] {
        match self {
            Traversal::Basic(tree) => tree.root(),
            Traversal::Fast(state) => state.root(),
        }
    }

    fn next_auth_path(&mut self, ctx: &TreeContext, index: u32) -> Vec<[u8; XMSS_N]> {
        match self {
            Traversal::Basic(tree) => tree.next_auth_path(ctx, index),
            Traversal::Fast(state) => state.next_auth_path(ctx, index),
        }
    }

    fn advance(&mut self, ctx: &TreeContext, from: u32, to: u32) {
        match self {
            Traversal::Basic(tree) => tree.advance(ctx, from, to),
            Traversal::Fast(state) => state.advance(ctx, from, to),
        }
    }
}

/// Compresses an uncompressed W-OTS+ public key into one node.
///
/// Pairs are merged with `H`, one round per tree height; when a round has an
/// odd number of nodes the last one is carried up unchanged. `pk` is used as
/// scratch space.
pub(crate) fn l_tree(wots: &WotsPlus, pk: &mut WotsChains, leaf_idx: u32) -> [u8; XMSS_N] {
    let mut adrs = Adrs::from(AdrsType::LTree);
    adrs.set_ltree_addr(leaf_idx);

    let mut len = pk.len();
    let mut height = 0;
    while len > 1 {
        adrs.set_tree_height(height);
        for i in 0..len / 2 {
            adrs.set_tree_index(i as u32);
            let (left, right) = (pk[2 * i], pk[2 * i + 1]);
            wots.hasher()
                .hash_h(&mut pk[i], &left, &right, wots.pub_seed(), &mut adrs);
        }
        if len & 1 == 1 {
            pk[len / 2] = pk[len - 1];
            len = len / 2 + 1;
        } else {
            len /= 2;
        }
        height += 1;
    }
    pk[0]
}

pub(crate) fn hash_node(
    wots: &WotsPlus,
    left: &[u8; XMSS_N],
    right: &[u8; XMSS_N],
    node_height: u32,
    index: u32,
) -> [u8; XMSS_N] {
    let mut adrs = Adrs::from(AdrsType::HashTree);
    adrs.set_tree_height(node_height);
    adrs.set_tree_index(index);
    let mut parent = [0u8; XMSS_N];
    wots.hasher()
        .hash_h(&mut parent, left, right, wots.pub_seed(), &mut adrs);
    parent
}

/// Climbs from `leaf` to the root along `auth_path`. Bit `z` of `index` tells
/// whether the node at height `z` is a right child.
pub(crate) fn root_from_auth_path(
    wots: &WotsPlus,
    leaf: &[u8; XMSS_N],
    index: u32,
    auth_path: &[[u8; XMSS_N]],
) -> [u8; XMSS_N] {
    let mut node = *leaf;
    for (z, sibling) in auth_path.iter().enumerate() {
        let parent_index = index >> (z + 1);
        node = if (index >> z) & 1 == 1 {
            hash_node(wots, sibling, &node, z as u32, parent_index)
        } else {
            hash_node(wots, &node, sibling, z as u32, parent_index)
        };
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(height: u8) -> TreeContext {
        TreeContext::new(HashFunction::Shake128, &[1u8; XMSS_N], &[2u8; XMSS_N], height)
    }

    #[test]
    fn test_auth_path_climbs_to_root() {
        let ctx = context(4);
        let levels = basic::build_levels(&ctx);
        let root = levels[4][0];

        for index in 0..16u32 {
            let path = basic::auth_path(&levels, index);
            let leaf = ctx.gen_leaf(index);
            assert_eq!(root_from_auth_path(ctx.wots(), &leaf, index, &path), root);

            let wrong = root_from_auth_path(ctx.wots(), &leaf, index ^ 1, &path);
            assert_ne!(wrong, root);
        }
    }

    #[test]
    fn test_leaves_are_distinct() {
        let ctx = context(2);
        let leaves: Vec<_> = (0..4).map(|i| ctx.gen_leaf(i)).collect();
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(leaves[i], leaves[j]);
            }
        }
    }

    #[test]
    fn test_traversal_build_rejects_bad_k() {
        let ctx = context(6);
        assert!(Traversal::build(&ctx, TraversalStrategy::Fast { k: 2 }).is_ok());
        assert_eq!(
            Traversal::build(&ctx, TraversalStrategy::Fast { k: 3 }).err(),
            Some(Error::InvalidBdsParameter { height: 6, k: 3 })
        );
        assert_eq!(
            Traversal::build(&ctx, TraversalStrategy::Fast { k: 6 }).err(),
            Some(Error::InvalidBdsParameter { height: 6, k: 6 })
        );
    }

    #[test]
    fn test_strategies_share_root() {
        let ctx = context(4);
        let basic = Traversal::build(&ctx, TraversalStrategy::Basic).unwrap();
        let fast = Traversal::build(&ctx, TraversalStrategy::default()).unwrap();
        assert_eq!(basic.root(), fast.root());
    }
}
