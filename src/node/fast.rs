use std::sync::Arc;

use crate::bitset256::BitSet256;
use crate::node::{Child, NodeOps};

//------------ FastNode -----------------------------------------------------

// The time-optimal node representation, the classic ART layout: fixed
// 256 slot arrays with allotment. Every prefix value is held behind an
// Arc and that pointer is propagated ("allotted") to all covered slots
// of the complete binary tree, so the in-node longest-prefix-match is a
// single indexed load. The bitsets still record which prefix slots are
// *own* entries (as opposed to allotted copies) and which child slots
// are occupied.
//
// Allotment invariant: prefixes[i] is Some iff some own prefix covers
// index i, and it then points at the value of the longest such prefix.

#[derive(Debug)]
pub(crate) struct FastNode<V> {
    pfx_bits: BitSet256,
    child_bits: BitSet256,
    prefixes: Box<[Option<Arc<V>>; 256]>,
    children: Box<[Option<Child<V, Self>>; 256]>,
}

impl<V> Default for FastNode<V> {
    fn default() -> Self {
        FastNode {
            pfx_bits: BitSet256::default(),
            child_bits: BitSet256::default(),
            prefixes: Box::new([const { None }; 256]),
            children: Box::new([const { None }; 256]),
        }
    }
}

impl<V> Clone for FastNode<V> {
    // A flat clone: both arrays hold pointers, so cloning bumps
    // refcounts and keeps subtrees (and allotted values) shared.
    fn clone(&self) -> Self {
        FastNode {
            pfx_bits: self.pfx_bits,
            child_bits: self.child_bits,
            prefixes: self.prefixes.clone(),
            children: self.children.clone(),
        }
    }
}

// Pointer equality over optional allotment slots. Two empty slots count
// as equal; an empty and an occupied one never do.
fn same_slot<V>(a: Option<&Arc<V>>, b: Option<&Arc<V>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl<V: Clone> FastNode<V> {
    // Replace `old` with `new` in every slot of the CBT subtree rooted
    // at idx that still carries `old`. Subtrees under a more specific
    // own prefix carry a different pointer and are left alone. The walk
    // is iterative with an explicit stack; 256 slots bound its depth.
    fn allot(
        &mut self,
        idx: u8,
        old: Option<&Arc<V>>,
        new: Option<&Arc<V>>,
    ) {
        let mut stack = [0u8; 256];
        stack[0] = idx;
        let mut sp = 1;
        while sp > 0 {
            sp -= 1;
            let k = stack[sp];
            if !same_slot(self.prefixes[k as usize].as_ref(), old) {
                continue;
            }
            self.prefixes[k as usize] = new.cloned();
            if k < 128 {
                stack[sp] = k << 1;
                stack[sp + 1] = (k << 1) | 1;
                sp += 2;
            }
        }
    }
}

impl<V: Clone> NodeOps<V> for FastNode<V> {
    fn prefix_count(&self) -> usize {
        self.pfx_bits.popcnt()
    }

    fn child_count(&self) -> usize {
        self.child_bits.popcnt()
    }

    fn prefix_bits(&self) -> &BitSet256 {
        &self.pfx_bits
    }

    fn child_bits(&self) -> &BitSet256 {
        &self.child_bits
    }

    fn insert_prefix(&mut self, idx: u8, val: V) -> Option<V> {
        let new = Arc::new(val);
        if self.pfx_bits.test(idx) {
            // overwrite: swap the old pointer for the new one in the
            // whole covered subtree
            let old = self.prefixes[idx as usize]
                .clone()
                .expect("own prefix slot must be allotted");
            self.allot(idx, Some(&old), Some(&new));
            return Some(Arc::unwrap_or_clone(old));
        }
        self.pfx_bits.set(idx);
        // whatever the slot carried so far was allotted from an
        // ancestor (or nothing); the new value takes over from it
        let inherited = self.prefixes[idx as usize].clone();
        self.allot(idx, inherited.as_ref(), Some(&new));
        None
    }

    fn get_prefix(&self, idx: u8) -> Option<&V> {
        if self.pfx_bits.test(idx) {
            self.prefixes[idx as usize].as_deref()
        } else {
            None
        }
    }

    fn remove_prefix(&mut self, idx: u8) -> Option<V> {
        if !self.pfx_bits.test(idx) {
            return None;
        }
        self.pfx_bits.clear(idx);
        let old = self.prefixes[idx as usize]
            .clone()
            .expect("own prefix slot must be allotted");
        // the nearest remaining ancestor takes the subtree back
        let parent = if idx > 1 {
            self.prefixes[(idx >> 1) as usize].clone()
        } else {
            None
        };
        self.allot(idx, Some(&old), parent.as_ref());
        Some(Arc::unwrap_or_clone(old))
    }

    fn insert_child(
        &mut self,
        octet: u8,
        child: Child<V, Self>,
    ) -> Option<Child<V, Self>> {
        self.child_bits.set(octet);
        self.children[octet as usize].replace(child)
    }

    fn get_child(&self, octet: u8) -> Option<&Child<V, Self>> {
        self.children[octet as usize].as_ref()
    }

    fn get_child_mut(&mut self, octet: u8) -> Option<&mut Child<V, Self>> {
        self.children[octet as usize].as_mut()
    }

    fn remove_child(&mut self, octet: u8) -> Option<Child<V, Self>> {
        self.child_bits.clear(octet);
        self.children[octet as usize].take()
    }

    // O(1) by the allotment invariant.
    fn contains(&self, idx: u8) -> bool {
        self.prefixes[idx as usize].is_some()
    }

    // O(1) by the allotment invariant.
    fn lookup(&self, idx: u8) -> Option<&V> {
        self.prefixes[idx as usize].as_deref()
    }
}

//------------ Tests --------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art;

    #[test]
    fn allotment_propagates_on_insert() {
        let mut node = FastNode::<u32>::default();
        node.insert_prefix(1, 100);
        // the whole stride is now covered by the default route
        for octet in [0u8, 17, 255] {
            assert_eq!(node.lookup(art::octet_to_idx(octet)), Some(&100));
        }
        // a longer prefix takes over its half
        node.insert_prefix(art::pfx_to_idx(128, 1), 200);
        assert_eq!(node.lookup(art::octet_to_idx(0)), Some(&100));
        assert_eq!(node.lookup(art::octet_to_idx(200)), Some(&200));
        // own entries are distinguished from allotted ones
        assert_eq!(node.prefix_count(), 2);
        assert_eq!(node.get_prefix(art::octet_to_idx(200)), None);
    }

    #[test]
    fn allotment_restores_on_remove() {
        let mut node = FastNode::<u32>::default();
        node.insert_prefix(1, 100);
        node.insert_prefix(art::pfx_to_idx(128, 1), 200);
        assert_eq!(node.remove_prefix(art::pfx_to_idx(128, 1)), Some(200));
        // the parent pointer took the subtree back
        assert_eq!(node.lookup(art::octet_to_idx(200)), Some(&100));
        assert_eq!(node.remove_prefix(1), Some(100));
        assert_eq!(node.lookup(art::octet_to_idx(200)), None);
        assert!(node.is_empty());
    }

    #[test]
    fn overwrite_reallots() {
        let mut node = FastNode::<u32>::default();
        node.insert_prefix(1, 1);
        assert_eq!(node.insert_prefix(1, 2), Some(1));
        assert_eq!(node.prefix_count(), 1);
        assert_eq!(node.lookup(art::octet_to_idx(99)), Some(&2));
    }

    #[test]
    fn lookup_idx_agrees_with_allotment() {
        let mut node = FastNode::<u32>::default();
        node.insert_prefix(art::pfx_to_idx(64, 2), 7);
        let probe = art::octet_to_idx(70);
        assert_eq!(node.lookup(probe), Some(&7));
        assert_eq!(node.lookup_idx(probe), Some((art::pfx_to_idx(64, 2), &7)));
        assert_eq!(node.lookup(art::octet_to_idx(130)), None);
    }
}
