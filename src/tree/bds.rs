//! Buchmann-Dahmen-Szydlo tree traversal.
//!
//! The state holds the authentication path of the next leaf and spends a
//! bounded amount of work per signature to prepare the following one:
//!
//! - `keep`: left nodes saved for when their right sibling is finished,
//!   `h / 2` entries.
//! - `treehash`: one instance per height below `h - k`, each building the next
//!   right node of its height. The instances share one stack of at most
//!   `h + 1` nodes.
//! - `retain`: right nodes of the top `k` levels, computed once during setup.
//!
//! Every signature runs one [`round`](BdsState::round) and `(h - k) / 2`
//! treehash updates.

use crate::params::XMSS_N;
use crate::tree::{TreeContext, TreeTraversal};
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, Debug, Zeroize)]
struct TreeHashInstance {
    height: u32,
    next_idx: u32,
    stack_usage: u32,
    completed: bool,
    node: [u8; XMSS_N],
}

impl TreeHashInstance {
    fn idle(height: u32) -> Self {
        Self {
            height,
            next_idx: 0,
            stack_usage: 0,
            completed: true,
            node: [0u8; XMSS_N],
        }
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct BdsState {
    height: u32,
    k: u32,
    root: [u8; XMSS_N],
    stack: Vec<[u8; XMSS_N]>,
    stack_levels: Vec<u32>,
    auth: Vec<[u8; XMSS_N]>,
    keep: Vec<[u8; XMSS_N]>,
    treehash: Vec<TreeHashInstance>,
    retain: Vec<[u8; XMSS_N]>,
    next_leaf: u32,
}

impl BdsState {
    /// Whether a tree of `height` can be traversed with parameter `k`.
    pub(crate) fn accepts(height: u8, k: u32) -> bool {
        let h = height as u32;
        k >= 2 && k < h && (h - k) % 2 == 0
    }

    /// Computes the whole tree once, collecting the first authentication path,
    /// the first node of every treehash instance, and the retained top nodes.
    pub(crate) fn new(ctx: &TreeContext, k: u32) -> Self {
        let h = ctx.height() as u32;
        let mut state = Self {
            height: h,
            k,
            root: [0u8; XMSS_N],
            stack: Vec::with_capacity(h as usize + 1),
            stack_levels: Vec::with_capacity(h as usize + 1),
            auth: vec![[0u8; XMSS_N]; h as usize],
            keep: vec![[0u8; XMSS_N]; (h >> 1) as usize],
            treehash: (0..h - k).map(TreeHashInstance::idle).collect(),
            retain: vec![[0u8; XMSS_N]; (1usize << k) - k as usize - 1],
            next_leaf: 0,
        };
        state.setup(ctx);
        state
    }

    fn setup(&mut self, ctx: &TreeContext) {
        let h = self.height;
        let k = self.k;
        let mut stack: Vec<([u8; XMSS_N], u32)> = Vec::with_capacity(h as usize + 1);

        for idx in 0..(1u32 << h) {
            stack.push((ctx.gen_leaf(idx), 0));

            while stack.len() > 1 && stack[stack.len() - 1].1 == stack[stack.len() - 2].1 {
                let (right, level) = stack[stack.len() - 1];
                let node_index = idx >> level;
                if node_index == 1 {
                    self.auth[level as usize] = right;
                } else if level < h - k && node_index == 3 {
                    self.treehash[level as usize].node = right;
                } else if level >= h - k {
                    let slot = retain_offset(h, level) + ((node_index - 3) >> 1) as usize;
                    self.retain[slot] = right;
                }

                stack.pop();
                let (left, _) = stack[stack.len() - 1];
                let top = stack.len() - 1;
                stack[top] = (ctx.hash_node(&left, &right, level, idx >> (level + 1)), level + 1);
            }
        }
        self.root = stack[0].0;
    }

    /// Smallest node height on the shared stack among the entries owned by
    /// `instance`.
    fn min_height_on_stack(&self, instance: usize) -> u32 {
        let usage = self.treehash[instance].stack_usage as usize;
        self.stack_levels[self.stack_levels.len() - usage..]
            .iter()
            .copied()
            .fold(self.height, u32::min)
    }

    /// Adds one leaf to treehash instance `instance`, merging with the nodes it
    /// owns on the shared stack.
    fn treehash_update(&mut self, ctx: &TreeContext, instance: usize) {
        let next_idx = self.treehash[instance].next_idx;
        let mut node = ctx.gen_leaf(next_idx);
        let mut node_height = 0;

        while self.treehash[instance].stack_usage > 0
            && self.stack_levels.last() == Some(&node_height)
        {
            let left = match self.stack.pop() {
                Some(left) => left,
                None => break,
            };
            self.stack_levels.pop();
            node = ctx.hash_node(&left, &node, node_height, next_idx >> (node_height + 1));
            node_height += 1;
            self.treehash[instance].stack_usage -= 1;
        }

        let th = &mut self.treehash[instance];
        if node_height == th.height {
            th.node = node;
            th.completed = true;
        } else {
            self.stack.push(node);
            self.stack_levels.push(node_height);
            th.stack_usage += 1;
            th.next_idx += 1;
        }
    }

    /// Spends up to `updates` leaf computations on the treehash instances,
    /// always serving the one with the lowest node first. Returns the number
    /// of updates left unused.
    fn treehash_updates(&mut self, ctx: &TreeContext, updates: u32) -> u32 {
        let h = self.height;
        let mut used = 0;

        for _ in 0..updates {
            let mut l_min = h;
            let mut level = h - self.k;
            for i in 0..(h - self.k) {
                let th = &self.treehash[i as usize];
                let low = if th.completed {
                    h
                } else if th.stack_usage == 0 {
                    i
                } else {
                    self.min_height_on_stack(i as usize)
                };
                if low < l_min {
                    level = i;
                    l_min = low;
                }
            }
            if level == h - self.k {
                break;
            }
            self.treehash_update(ctx, level as usize);
            used += 1;
        }
        updates - used
    }

    /// Turns the authentication path of `leaf_idx` into the one of
    /// `leaf_idx + 1`.
    fn round(&mut self, ctx: &TreeContext, leaf_idx: u32) {
        let h = self.height;
        let k = self.k;

        // tau: height of the lowest left node on the path of leaf_idx
        let tau = (0..h).find(|&i| (leaf_idx >> i) & 1 == 0).unwrap_or(h);

        let carried = if tau > 0 {
            Some((
                self.auth[(tau - 1) as usize],
                self.keep[((tau - 1) >> 1) as usize],
            ))
        } else {
            None
        };

        if (leaf_idx >> (tau + 1)) & 1 == 0 && tau < h - 1 {
            self.keep[(tau >> 1) as usize] = self.auth[tau as usize];
        }

        match carried {
            None => self.auth[0] = ctx.gen_leaf(leaf_idx),
            Some((left, right)) => {
                self.auth[tau as usize] = ctx.hash_node(&left, &right, tau - 1, leaf_idx >> tau);

                for i in 0..tau {
                    self.auth[i as usize] = if i < h - k {
                        self.treehash[i as usize].node
                    } else {
                        let row = (((leaf_idx >> i) - 1) >> 1) as usize;
                        self.retain[retain_offset(h, i) + row]
                    };
                }

                for i in 0..tau.min(h - k) {
                    let start_idx = leaf_idx as u64 + 1 + 3 * (1u64 << i);
                    if start_idx < (1u64 << h) {
                        let th = &mut self.treehash[i as usize];
                        th.height = i;
                        th.next_idx = start_idx as u32;
                        th.completed = false;
                        th.stack_usage = 0;
                    }
                }
            }
        }
    }

    /// One signature's worth of work after handing out the path of `leaf_idx`.
    fn step(&mut self, ctx: &TreeContext, leaf_idx: u32) {
        if (leaf_idx as u64) < (1u64 << self.height) - 1 {
            self.round(ctx, leaf_idx);
            let unused = self.treehash_updates(ctx, (self.height - self.k) >> 1);
            trace!(leaf_idx, unused, "BDS round");
        }
    }
}

/// First `retain` slot used by the nodes at `level` (one of the top `k` levels).
fn retain_offset(h: u32, level: u32) -> usize {
    ((1usize << (h - 1 - level)) + level as usize) - h as usize
}

impl TreeTraversal for BdsState {
    fn root(&self) -> &[u8; XMSS_N] {
        &self.root
    }

    fn next_auth_path(&mut self, ctx: &TreeContext, index: u32) -> Vec<[u8; XMSS_N]> {
        if index > self.next_leaf {
            self.advance(ctx, self.next_leaf, index);
        }
        let path = self.auth.clone();
        self.step(ctx, index);
        self.next_leaf = index + 1;
        path
    }

    fn advance(&mut self, ctx: &TreeContext, from: u32, to: u32) {
        for leaf_idx in from..to {
            self.step(ctx, leaf_idx);
        }
        self.next_leaf = to;
    }
}
