pub(crate) mod compressed;
pub(crate) mod fast;
pub(crate) mod lite;
pub(crate) mod sparse;

use std::sync::Arc;

use inetnum::addr::Prefix;

use crate::art;
use crate::bitset256::BitSet256;

//------------ LeafNode / FringeNode ----------------------------------------

// A path compressed terminal that carries the full original prefix. Used
// whenever the remaining suffix below the parent spans more than one
// stride and is not stride aligned.
#[derive(Clone, Debug)]
pub(crate) struct LeafNode<V> {
    pub(crate) prefix: Prefix,
    pub(crate) value: V,
}

// A path compressed terminal at a stride aligned depth (/8, /16, ...).
// Its prefix is implied by the position of the slot it occupies, so only
// the value is stored; it acts as the default route of the whole subtree
// under its slot.
#[derive(Clone, Debug)]
pub(crate) struct FringeNode<V> {
    pub(crate) value: V,
}

//------------ Child --------------------------------------------------------

// One occupied slot of the child table. The Arc is what makes the
// persistent table variants cheap: snapshots share children, and
// mutation paths are un-shared one node at a time via Arc::make_mut.
#[derive(Debug)]
pub(crate) enum Child<V, N> {
    Node(Arc<N>),
    Leaf(Arc<LeafNode<V>>),
    Fringe(Arc<FringeNode<V>>),
}

// Not derived: a child clones by bumping the refcount, V and N play no
// part in it.
impl<V, N> Clone for Child<V, N> {
    fn clone(&self) -> Self {
        match self {
            Child::Node(n) => Child::Node(Arc::clone(n)),
            Child::Leaf(l) => Child::Leaf(Arc::clone(l)),
            Child::Fringe(f) => Child::Fringe(Arc::clone(f)),
        }
    }
}

//------------ NodeOps ------------------------------------------------------

// The contract shared by the three node representations (compressed,
// fast, lite). Everything the trie algorithms need goes through this
// trait; the read half doubles as the interface for dumpers and
// statistics readers.
//
// A prefix table slot is addressed by CBT base index in 1..=255, a child
// table slot by the next stride octet. `contains`/`lookup`/`lookup_idx`
// answer longest-prefix-match questions within this single node; the
// defaults do the bitset walk and the fast representation overrides
// them with its O(1) allotment reads.
pub(crate) trait NodeOps<V>: Default + Clone {
    fn prefix_count(&self) -> usize;
    fn child_count(&self) -> usize;
    fn prefix_bits(&self) -> &BitSet256;
    fn child_bits(&self) -> &BitSet256;

    fn insert_prefix(&mut self, idx: u8, val: V) -> Option<V>;
    fn get_prefix(&self, idx: u8) -> Option<&V>;
    fn remove_prefix(&mut self, idx: u8) -> Option<V>;

    fn insert_child(
        &mut self,
        octet: u8,
        child: Child<V, Self>,
    ) -> Option<Child<V, Self>>;
    fn get_child(&self, octet: u8) -> Option<&Child<V, Self>>;
    fn get_child_mut(&mut self, octet: u8) -> Option<&mut Child<V, Self>>;
    fn remove_child(&mut self, octet: u8) -> Option<Child<V, Self>>;

    fn is_empty(&self) -> bool {
        self.prefix_count() == 0 && self.child_count() == 0
    }

    // Does any prefix in this node cover the base index?
    fn contains(&self, idx: u8) -> bool {
        self.prefix_bits().intersects(art::lookup_tbl(idx))
    }

    // The longest prefix in this node covering the base index.
    fn lookup(&self, idx: u8) -> Option<&V> {
        self.lookup_idx(idx).map(|(_, val)| val)
    }

    // As lookup, also returning the winning base index so that the
    // caller can reconstruct the matched prefix.
    fn lookup_idx(&self, idx: u8) -> Option<(u8, &V)> {
        let top = self
            .prefix_bits()
            .intersection_top(art::lookup_tbl(idx))?;
        Some((top, self.must_get_prefix(top)))
    }

    fn must_get_prefix(&self, idx: u8) -> &V {
        match self.get_prefix(idx) {
            Some(val) => val,
            None => panic!("occupied prefix slot {} has no value", idx),
        }
    }

    fn must_get_child(&self, octet: u8) -> &Child<V, Self> {
        match self.get_child(octet) {
            Some(child) => child,
            None => panic!("occupied child slot {} is empty", octet),
        }
    }
}
