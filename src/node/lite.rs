use crate::bitset256::BitSet256;
use crate::node::sparse::Array256;
use crate::node::{Child, NodeOps};

//------------ LiteNode -----------------------------------------------------

// The prefix-only representation: no payload is stored at all, the
// prefix bitset alone answers membership and in-node LPM. Children are
// kept popcount-compressed like in the compressed node. The payload type
// is the unit type, so the leaf and fringe kinds shrink to (implied)
// prefixes as well.

#[derive(Debug, Default)]
pub(crate) struct LiteNode {
    pfx_bits: BitSet256,
    children: Array256<Child<(), Self>>,
}

impl Clone for LiteNode {
    fn clone(&self) -> Self {
        LiteNode {
            pfx_bits: self.pfx_bits,
            children: self.children.clone(),
        }
    }
}

impl NodeOps<()> for LiteNode {
    fn prefix_count(&self) -> usize {
        self.pfx_bits.popcnt()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn prefix_bits(&self) -> &BitSet256 {
        &self.pfx_bits
    }

    fn child_bits(&self) -> &BitSet256 {
        self.children.bits()
    }

    fn insert_prefix(&mut self, idx: u8, _val: ()) -> Option<()> {
        if self.pfx_bits.test(idx) {
            return Some(());
        }
        self.pfx_bits.set(idx);
        None
    }

    fn get_prefix(&self, idx: u8) -> Option<&()> {
        self.pfx_bits.test(idx).then_some(&())
    }

    fn remove_prefix(&mut self, idx: u8) -> Option<()> {
        if !self.pfx_bits.test(idx) {
            return None;
        }
        self.pfx_bits.clear(idx);
        Some(())
    }

    fn insert_child(
        &mut self,
        octet: u8,
        child: Child<(), Self>,
    ) -> Option<Child<(), Self>> {
        self.children.insert(octet, child)
    }

    fn get_child(&self, octet: u8) -> Option<&Child<(), Self>> {
        self.children.get(octet)
    }

    fn get_child_mut(&mut self, octet: u8) -> Option<&mut Child<(), Self>> {
        self.children.get_mut(octet)
    }

    fn remove_child(&mut self, octet: u8) -> Option<Child<(), Self>> {
        self.children.remove(octet)
    }
}

//------------ Tests --------------------------------------------------------
