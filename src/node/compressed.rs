use crate::bitset256::BitSet256;
use crate::node::sparse::Array256;
use crate::node::{Child, NodeOps};

//------------ CompressedNode -----------------------------------------------

// The memory-minimal node representation: two popcount-compressed arrays,
// one over the CBT base indices holding the values and one over the next
// stride octets holding the children. In-node LPM walks the bitset
// against the precomputed ancestor sets; see the trait defaults.

#[derive(Debug)]
pub(crate) struct CompressedNode<V> {
    prefixes: Array256<V>,
    children: Array256<Child<V, Self>>,
}

impl<V> Default for CompressedNode<V> {
    fn default() -> Self {
        CompressedNode {
            prefixes: Array256::default(),
            children: Array256::default(),
        }
    }
}

impl<V: Clone> Clone for CompressedNode<V> {
    // A flat clone: the prefix values are cloned, the children keep
    // pointing at the shared subtrees.
    fn clone(&self) -> Self {
        CompressedNode {
            prefixes: self.prefixes.clone(),
            children: self.children.clone(),
        }
    }
}

impl<V: Clone> NodeOps<V> for CompressedNode<V> {
    fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn prefix_bits(&self) -> &BitSet256 {
        self.prefixes.bits()
    }

    fn child_bits(&self) -> &BitSet256 {
        self.children.bits()
    }

    fn insert_prefix(&mut self, idx: u8, val: V) -> Option<V> {
        self.prefixes.insert(idx, val)
    }

    fn get_prefix(&self, idx: u8) -> Option<&V> {
        self.prefixes.get(idx)
    }

    fn remove_prefix(&mut self, idx: u8) -> Option<V> {
        self.prefixes.remove(idx)
    }

    fn insert_child(
        &mut self,
        octet: u8,
        child: Child<V, Self>,
    ) -> Option<Child<V, Self>> {
        self.children.insert(octet, child)
    }

    fn get_child(&self, octet: u8) -> Option<&Child<V, Self>> {
        self.children.get(octet)
    }

    fn get_child_mut(&mut self, octet: u8) -> Option<&mut Child<V, Self>> {
        self.children.get_mut(octet)
    }

    fn remove_child(&mut self, octet: u8) -> Option<Child<V, Self>> {
        self.children.remove(octet)
    }
}

//------------ Tests --------------------------------------------------------
