use crate::utils::set_u32_at;

const OFFSET_LAYER: usize = 0;
const OFFSET_TREE: usize = 4;
const OFFSET_TYPE: usize = 12;
const OFFSET_OTS_ADDR: usize = 16;
const OFFSET_CHAIN_ADDR: usize = 20;
const OFFSET_HASH_ADDR: usize = 24;
const OFFSET_KEY_AND_MASK: usize = 28;

// L-tree and hash-tree addresses reuse words 4..7
const OFFSET_LTREE_ADDR: usize = OFFSET_OTS_ADDR;
const OFFSET_TREE_HGT: usize = OFFSET_CHAIN_ADDR;
const OFFSET_TREE_INDEX: usize = OFFSET_HASH_ADDR;

/// The three types of ADRS used by XMSS.
/// The corresponding value is set as the `type` word of an ADRS.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum AdrsType {
    /// 0, used for hashing through a WOTS+ chain and for key derivation.
    Ots,
    /// 1, used for compressing a WOTS+ public key into a leaf.
    LTree,
    /// 2, used for the nodes of the main Merkle tree.
    HashTree,
}

/// The address `Adrs` is a 32-byte value made of eight big-endian 32-bit words:
///
/// | word | OTS           | L-tree        | hash tree     |
/// |------|---------------|---------------|---------------|
/// | 0    | layer         | layer         | layer         |
/// | 1-2  | tree          | tree          | tree          |
/// | 3    | type = 0      | type = 1      | type = 2      |
/// | 4    | OTS index     | L-tree index  | padding       |
/// | 5    | chain         | tree height   | tree height   |
/// | 6    | hash          | tree index    | tree index    |
/// | 7    | keyAndMask    | keyAndMask    | keyAndMask    |
///
/// A single XMSS tree keeps layer and tree at zero.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Adrs([u8; 32]);

impl AsRef<[u8]> for Adrs {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<AdrsType> for Adrs {
    /// Returns an all-zero address with the given type.
    fn from(adrs_type: AdrsType) -> Self {
        let mut adrs = Self([0; 32]);
        adrs.set_type(adrs_type);
        adrs
    }
}

impl Adrs {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Specify which level of a multi-tree (the "layer") we're working on.
    pub fn set_layer_addr(&mut self, layer: u32) {
        set_u32_at(self.0.as_mut(), layer, OFFSET_LAYER);
    }

    /// Specify which tree within the layer we're working on.
    pub fn set_tree_addr(&mut self, tree: u64) {
        set_u32_at(self.0.as_mut(), (tree >> 32) as u32, OFFSET_TREE);
        set_u32_at(self.0.as_mut(), tree as u32, OFFSET_TREE + 4);
    }

    /// Set the type and clear every type-specific word, so that unrelated
    /// hashes never share an address.
    pub fn set_type(&mut self, adrs_type: AdrsType) {
        set_u32_at(self.0.as_mut(), adrs_type as u32, OFFSET_TYPE);
        self.0[OFFSET_OTS_ADDR..].fill(0);
    }

    /// Specify which OTS key pair (leaf) we're working on.
    pub fn set_ots_addr(&mut self, ots: u32) {
        set_u32_at(self.0.as_mut(), ots, OFFSET_OTS_ADDR);
    }

    /// Specify which chain within the OTS we're working with.
    pub fn set_chain_addr(&mut self, chain: u32) {
        set_u32_at(self.0.as_mut(), chain, OFFSET_CHAIN_ADDR);
    }

    /// Specify where in the chain we are.
    pub fn set_hash_addr(&mut self, hash: u32) {
        set_u32_at(self.0.as_mut(), hash, OFFSET_HASH_ADDR);
    }

    pub fn set_key_and_mask(&mut self, key_and_mask: u32) {
        set_u32_at(self.0.as_mut(), key_and_mask, OFFSET_KEY_AND_MASK);
    }

    /// Specify which L-tree (leaf) we're compressing.
    pub fn set_ltree_addr(&mut self, ltree: u32) {
        set_u32_at(self.0.as_mut(), ltree, OFFSET_LTREE_ADDR);
    }

    /// Height of the node being computed, counted from the children's level.
    pub fn set_tree_height(&mut self, tree_height: u32) {
        set_u32_at(self.0.as_mut(), tree_height, OFFSET_TREE_HGT);
    }

    /// Distance of the node from the left edge of its level.
    pub fn set_tree_index(&mut self, tree_index: u32) {
        set_u32_at(self.0.as_mut(), tree_index, OFFSET_TREE_INDEX);
    }

    /// Copy the layer and tree words into an address of another type, the
    /// way one tree drives OTS, L-tree, and node hashes side by side.
    pub fn with_type(&self, adrs_type: AdrsType) -> Self {
        let mut adrs = Self([0; 32]);
        adrs.0[..OFFSET_TYPE].copy_from_slice(&self.0[..OFFSET_TYPE]);
        adrs.set_type(adrs_type);
        adrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adrs_layout() {
        let mut adrs = Adrs::from(AdrsType::LTree);
        adrs.set_ltree_addr(0x0a0b0c0d);
        adrs.set_tree_height(2);
        adrs.set_tree_index(5);
        adrs.set_key_and_mask(1);

        let mut expected = [0u8; 32];
        expected[15] = 1;
        expected[16..20].copy_from_slice(&[0x0a, 0x0b, 0x0c, 0x0d]);
        expected[23] = 2;
        expected[27] = 5;
        expected[31] = 1;
        assert_eq!(adrs.as_bytes(), &expected);
    }

    #[test]
    fn test_set_type_clears_lower_words() {
        let mut adrs = Adrs::from(AdrsType::Ots);
        adrs.set_layer_addr(3);
        adrs.set_tree_addr(0x1_0000_0002);
        adrs.set_ots_addr(9);
        adrs.set_chain_addr(4);
        adrs.set_hash_addr(7);

        let node = adrs.with_type(AdrsType::HashTree);
        assert_eq!(node.as_bytes()[..12], adrs.as_bytes()[..12]);
        assert_eq!(node.as_bytes()[15], 2);
        assert!(node.as_bytes()[16..].iter().all(|&b| b == 0));
        assert_eq!(node.as_bytes()[4..12], [0, 0, 0, 1, 0, 0, 0, 2]);
    }
}
