use crate::params::XMSS_N;
use crate::tree::{TreeContext, TreeTraversal};
use rayon::prelude::*;

/// Levels above which the tree is split into independently hashed subtrees.
const SPLIT_HEIGHT: u32 = 4;

/// Traversal that keeps nothing but the root.
///
/// Every path request regenerates all `2^h` leaves. The tree is split into
/// at most `2^SPLIT_HEIGHT` subtrees that are hashed in parallel, each with a
/// treehash stack, so memory stays `O(h)` nodes per subtree.
#[derive(Clone, Debug)]
pub(crate) struct FullTree {
    root: [u8; XMSS_N],
}

impl FullTree {
    pub(crate) fn new(ctx: &TreeContext) -> Self {
        let (root, _) = root_and_auth_path(ctx, 0);
        Self { root }
    }
}

impl TreeTraversal for FullTree {
    fn root(&self) -> &[u8; XMSS_N] {
        &self.root
    }

    fn next_auth_path(&mut self, ctx: &TreeContext, index: u32) -> Vec<[u8; XMSS_N]> {
        root_and_auth_path(ctx, index).1
    }

    fn advance(&mut self, _ctx: &TreeContext, _from: u32, _to: u32) {}
}

/// Root of the tree and the authentication path of leaf `index`.
pub(crate) fn root_and_auth_path(
    ctx: &TreeContext,
    index: u32,
) -> ([u8; XMSS_N], Vec<[u8; XMSS_N]>) {
    let height = ctx.height() as u32;
    let split = height.min(SPLIT_HEIGHT);
    let sub_height = height - split;

    let mut subtrees: Vec<([u8; XMSS_N], Vec<[u8; XMSS_N]>)> = (0..1u32 << split)
        .into_par_iter()
        .map(|s| treehash(ctx, s << sub_height, sub_height, index))
        .collect();

    let mut path = core::mem::take(&mut subtrees[(index >> sub_height) as usize].1);
    let mut nodes: Vec<[u8; XMSS_N]> = subtrees.into_iter().map(|(root, _)| root).collect();
    for z in sub_height..height {
        path.push(nodes[((index >> z) ^ 1) as usize]);
        nodes = nodes
            .chunks(2)
            .enumerate()
            .map(|(j, pair)| ctx.hash_node(&pair[0], &pair[1], z, j as u32))
            .collect();
    }
    (nodes[0], path)
}

/// Treehash over the `2^height` leaves starting at `start`.
///
/// Returns the subtree root and the siblings of `target`'s path inside the
/// subtree. The siblings stay zero when `target` lies elsewhere.
fn treehash(
    ctx: &TreeContext,
    start: u32,
    height: u32,
    target: u32,
) -> ([u8; XMSS_N], Vec<[u8; XMSS_N]>) {
    let mut stack: Vec<([u8; XMSS_N], u32)> = Vec::with_capacity(height as usize + 1);
    let mut siblings = vec![[0u8; XMSS_N]; height as usize];
    let mut root = [0u8; XMSS_N];

    for idx in start..start + (1u32 << height) {
        let mut node = ctx.gen_leaf(idx);
        let mut node_height = 0u32;
        let mut node_index = idx;
        loop {
            if node_height < height && node_index == (target >> node_height) ^ 1 {
                siblings[node_height as usize] = node;
            }
            let left = match stack.last() {
                Some(&(left, top_height)) if top_height == node_height => left,
                _ => break,
            };
            stack.pop();
            node = ctx.hash_node(&left, &node, node_height, node_index >> 1);
            node_height += 1;
            node_index >>= 1;
        }
        if node_height == height {
            root = node;
        } else {
            stack.push((node, node_height));
        }
    }
    (root, siblings)
}

/// All levels of the tree, leaves first, for checking paths against.
#[cfg(test)]
pub(crate) fn build_levels(ctx: &TreeContext) -> Vec<Vec<[u8; XMSS_N]>> {
    let leaves: Vec<[u8; XMSS_N]> = (0..ctx.leaf_count() as u32)
        .map(|idx| ctx.gen_leaf(idx))
        .collect();

    let mut levels = vec![leaves];
    for z in 0..ctx.height() as u32 {
        let next: Vec<[u8; XMSS_N]> = levels[z as usize]
            .chunks(2)
            .enumerate()
            .map(|(j, pair)| ctx.hash_node(&pair[0], &pair[1], z, j as u32))
            .collect();
        levels.push(next);
    }
    levels
}

#[cfg(test)]
pub(crate) fn auth_path(levels: &[Vec<[u8; XMSS_N]>], index: u32) -> Vec<[u8; XMSS_N]> {
    levels[..levels.len() - 1]
        .iter()
        .enumerate()
        .map(|(z, level)| level[((index >> z) ^ 1) as usize])
        .collect()
}
