pub(crate) mod iterators;
pub(crate) mod overlap;

use std::mem;
use std::net::IpAddr;
use std::sync::Arc;

use inetnum::addr::Prefix;
use log::trace;

use crate::art::{self, MAX_TREE_DEPTH};
use crate::node::{Child, FringeNode, LeafNode, NodeOps};
use crate::types::prefix;
use crate::types::ModifyResult;

//------------ TrieOps ------------------------------------------------------

// The trie algorithms, written once against the node contract and shared
// by all three representations. A node does not know its own depth or
// path; both are carried down by the caller, which is why most methods
// take the probe octets and the current depth.
//
// Mutation always reaches children through Arc::make_mut: on a uniquely
// owned path this is a plain dereference, on a path shared with a
// persistent snapshot it un-shares exactly the nodes along the walk.

pub(crate) trait TrieOps<V: Clone>: NodeOps<V> {
    // Insert pfx into the subtrie rooted at self, which sits at
    // start_depth on the path of pfx. Returns the previous value if the
    // prefix already existed.
    fn insert_at_depth(
        &mut self,
        pfx: &Prefix,
        val: V,
        start_depth: usize,
    ) -> Option<V> {
        let bits = pfx.len();
        let (octs, _) = prefix::octets(&pfx.addr());
        let (last, last_bits) = art::max_depth_and_last_bits(bits);

        let mut n = self;
        let mut depth = start_depth;
        loop {
            if depth == last {
                return n.insert_prefix(
                    art::pfx_to_idx(octs[depth], last_bits),
                    val,
                );
            }
            let octet = octs[depth];

            enum Slot {
                Empty,
                Inner,
                LeafHit,
                LeafPush,
                FringeHit,
                FringePush,
            }
            let slot = match n.get_child(octet) {
                None => Slot::Empty,
                Some(Child::Node(_)) => Slot::Inner,
                Some(Child::Leaf(leaf)) => {
                    if leaf.prefix == *pfx {
                        Slot::LeafHit
                    } else {
                        Slot::LeafPush
                    }
                }
                Some(Child::Fringe(_)) => {
                    if art::is_fringe(depth, bits) {
                        Slot::FringeHit
                    } else {
                        Slot::FringePush
                    }
                }
            };

            match slot {
                Slot::Empty => {
                    // the suffix spans more than this stride: store it
                    // path compressed
                    let child = if art::is_fringe(depth, bits) {
                        Child::Fringe(Arc::new(FringeNode { value: val }))
                    } else {
                        Child::Leaf(Arc::new(LeafNode {
                            prefix: *pfx,
                            value: val,
                        }))
                    };
                    n.insert_child(octet, child);
                    return None;
                }
                Slot::LeafHit => {
                    let Some(Child::Leaf(leaf)) = n.get_child_mut(octet)
                    else {
                        unreachable!()
                    };
                    let leaf = Arc::make_mut(leaf);
                    return Some(mem::replace(&mut leaf.value, val));
                }
                Slot::FringeHit => {
                    let Some(Child::Fringe(fringe)) = n.get_child_mut(octet)
                    else {
                        unreachable!()
                    };
                    let fringe = Arc::make_mut(fringe);
                    return Some(mem::replace(&mut fringe.value, val));
                }
                Slot::LeafPush => {
                    // somebody else lives here: push the leaf one level
                    // down and descend into the new inner node
                    trace!("push down leaf at depth {}", depth);
                    let Some(Child::Leaf(leaf)) = n.remove_child(octet)
                    else {
                        unreachable!()
                    };
                    let LeafNode { prefix, value } =
                        Arc::unwrap_or_clone(leaf);
                    let mut inner = Self::default();
                    inner.insert_at_depth(&prefix, value, depth + 1);
                    n.insert_child(octet, Child::Node(Arc::new(inner)));
                }
                Slot::FringePush => {
                    // a pushed down fringe is the default route of the
                    // new inner node
                    trace!("push down fringe at depth {}", depth);
                    let Some(Child::Fringe(fringe)) = n.remove_child(octet)
                    else {
                        unreachable!()
                    };
                    let mut inner = Self::default();
                    inner.insert_prefix(1, Arc::unwrap_or_clone(fringe).value);
                    n.insert_child(octet, Child::Node(Arc::new(inner)));
                }
                Slot::Inner => {}
            }

            let Some(Child::Node(next)) = n.get_child_mut(octet) else {
                unreachable!()
            };
            n = Arc::make_mut(next);
            depth += 1;
        }
    }

    // Exact match lookup, no LPM.
    fn get_at(&self, pfx: &Prefix) -> Option<&V> {
        let bits = pfx.len();
        let (octs, _) = prefix::octets(&pfx.addr());
        let (last, last_bits) = art::max_depth_and_last_bits(bits);

        let mut n = self;
        let mut depth = 0;
        loop {
            if depth == last {
                return n
                    .get_prefix(art::pfx_to_idx(octs[depth], last_bits));
            }
            match n.get_child(octs[depth])? {
                Child::Node(next) => {
                    n = &**next;
                    depth += 1;
                }
                Child::Leaf(leaf) => {
                    return (leaf.prefix == *pfx).then(|| &leaf.value);
                }
                Child::Fringe(fringe) => {
                    return art::is_fringe(depth, bits)
                        .then(|| &fringe.value);
                }
            }
        }
    }

    // Remove pfx from the subtrie rooted at self at depth. On success
    // the unwind of the recursion re-collapses the path (see
    // compress_child), undoing what insertion's push down created.
    fn remove_at(
        &mut self,
        pfx: &Prefix,
        octs: &[u8; 16],
        is4: bool,
        depth: usize,
    ) -> Option<V> {
        let bits = pfx.len();
        let (last, last_bits) = art::max_depth_and_last_bits(bits);
        if depth == last {
            return self
                .remove_prefix(art::pfx_to_idx(octs[depth], last_bits));
        }
        let octet = octs[depth];

        enum Found {
            Nothing,
            Leaf,
            Fringe,
            Inner,
        }
        let found = match self.get_child(octet) {
            None => Found::Nothing,
            Some(Child::Leaf(leaf)) => {
                if leaf.prefix == *pfx {
                    Found::Leaf
                } else {
                    Found::Nothing
                }
            }
            Some(Child::Fringe(_)) => {
                if art::is_fringe(depth, bits) {
                    Found::Fringe
                } else {
                    Found::Nothing
                }
            }
            Some(Child::Node(_)) => Found::Inner,
        };

        match found {
            Found::Nothing => None,
            Found::Leaf => {
                let Some(Child::Leaf(leaf)) = self.remove_child(octet)
                else {
                    unreachable!()
                };
                Some(Arc::unwrap_or_clone(leaf).value)
            }
            Found::Fringe => {
                let Some(Child::Fringe(fringe)) = self.remove_child(octet)
                else {
                    unreachable!()
                };
                Some(Arc::unwrap_or_clone(fringe).value)
            }
            Found::Inner => {
                let val = {
                    let Some(Child::Node(next)) = self.get_child_mut(octet)
                    else {
                        unreachable!()
                    };
                    Arc::make_mut(next).remove_at(pfx, octs, is4, depth + 1)?
                };
                self.compress_child(octet, octs, is4, depth);
                Some(val)
            }
        }
    }

    // Purge-and-compress one edge: self sits at depth, the inner node in
    // slot octet at depth + 1 just lost an entry. An empty node is
    // detached; a node left with a single leaf, fringe or prefix is
    // detached and its survivor re-inserted at our depth, where it will
    // be stored path compressed again.
    fn compress_child(
        &mut self,
        octet: u8,
        octs: &[u8; 16],
        is4: bool,
        depth: usize,
    ) {
        let action = {
            let Some(Child::Node(m)) = self.get_child(octet) else {
                return;
            };
            match (m.prefix_count(), m.child_count()) {
                (0, 0) => PullUp::<V>::Gone,
                (0, 1) => {
                    let c_octet = m
                        .child_bits()
                        .first_set()
                        .expect("child count and bitset disagree");
                    match m.must_get_child(c_octet) {
                        // an intermediate path node, nothing to do
                        Child::Node(_) => return,
                        Child::Leaf(leaf) => PullUp::Leaf(Arc::clone(leaf)),
                        Child::Fringe(fringe) => {
                            PullUp::Fringe(c_octet, Arc::clone(fringe))
                        }
                    }
                }
                (1, 0) => {
                    let idx = m
                        .prefix_bits()
                        .first_set()
                        .expect("prefix count and bitset disagree");
                    PullUp::Pfx(idx, m.must_get_prefix(idx).clone())
                }
                _ => return,
            }
        };

        match action {
            PullUp::Gone => {
                trace!("purge empty node at depth {}", depth + 1);
                self.remove_child(octet);
            }
            PullUp::Leaf(leaf) => {
                trace!("collapse single leaf at depth {}", depth + 1);
                self.remove_child(octet);
                let LeafNode { prefix, value } = Arc::unwrap_or_clone(leaf);
                self.insert_at_depth(&prefix, value, depth);
            }
            PullUp::Fringe(c_octet, fringe) => {
                trace!("collapse single fringe at depth {}", depth + 1);
                self.remove_child(octet);
                let pfx =
                    prefix::cidr_for_fringe(octs, depth + 1, is4, c_octet);
                let FringeNode { value } = Arc::unwrap_or_clone(fringe);
                self.insert_at_depth(&pfx, value, depth);
            }
            PullUp::Pfx(idx, value) => {
                trace!("collapse single prefix at depth {}", depth + 1);
                self.remove_child(octet);
                let pfx = prefix::cidr_from_path(octs, depth + 1, is4, idx);
                self.insert_at_depth(&pfx, value, depth);
            }
        }
    }

    // The modify state machine: one traversal that turns the callback's
    // decision into an insert, update, removal or no-op.
    fn modify_at<F>(
        &mut self,
        pfx: &Prefix,
        octs: &[u8; 16],
        is4: bool,
        depth: usize,
        cb: F,
    ) -> ModifyResult<V>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let bits = pfx.len();
        let (last, last_bits) = art::max_depth_and_last_bits(bits);
        if depth == last {
            let idx = art::pfx_to_idx(octs[depth], last_bits);
            let existed = self.prefix_bits().test(idx);
            let new = cb(self.get_prefix(idx));
            return match (existed, new) {
                (false, None) => ModifyResult::Unchanged,
                (false, Some(val)) => {
                    self.insert_prefix(idx, val);
                    ModifyResult::Inserted
                }
                (true, Some(val)) => ModifyResult::Updated(
                    self.insert_prefix(idx, val)
                        .expect("prefix vanished during modify"),
                ),
                (true, None) => ModifyResult::Removed(
                    self.remove_prefix(idx)
                        .expect("prefix vanished during modify"),
                ),
            };
        }
        let octet = octs[depth];

        enum Found {
            Absent,
            Leaf,
            Fringe,
            Inner,
        }
        let found = match self.get_child(octet) {
            None => Found::Absent,
            Some(Child::Leaf(leaf)) => {
                if leaf.prefix == *pfx {
                    Found::Leaf
                } else {
                    Found::Absent
                }
            }
            Some(Child::Fringe(_)) => {
                if art::is_fringe(depth, bits) {
                    Found::Fringe
                } else {
                    Found::Absent
                }
            }
            Some(Child::Node(_)) => Found::Inner,
        };

        match found {
            Found::Absent => match cb(None) {
                // insertion restructures an occupied slot by itself
                Some(val) => {
                    let old = self.insert_at_depth(pfx, val, depth);
                    debug_assert!(old.is_none());
                    ModifyResult::Inserted
                }
                None => ModifyResult::Unchanged,
            },
            Found::Leaf => {
                let new = {
                    let Some(Child::Leaf(leaf)) = self.get_child(octet)
                    else {
                        unreachable!()
                    };
                    cb(Some(&leaf.value))
                };
                match new {
                    Some(val) => {
                        let Some(Child::Leaf(leaf)) =
                            self.get_child_mut(octet)
                        else {
                            unreachable!()
                        };
                        ModifyResult::Updated(mem::replace(
                            &mut Arc::make_mut(leaf).value,
                            val,
                        ))
                    }
                    None => {
                        let Some(Child::Leaf(leaf)) =
                            self.remove_child(octet)
                        else {
                            unreachable!()
                        };
                        ModifyResult::Removed(
                            Arc::unwrap_or_clone(leaf).value,
                        )
                    }
                }
            }
            Found::Fringe => {
                let new = {
                    let Some(Child::Fringe(fringe)) = self.get_child(octet)
                    else {
                        unreachable!()
                    };
                    cb(Some(&fringe.value))
                };
                match new {
                    Some(val) => {
                        let Some(Child::Fringe(fringe)) =
                            self.get_child_mut(octet)
                        else {
                            unreachable!()
                        };
                        ModifyResult::Updated(mem::replace(
                            &mut Arc::make_mut(fringe).value,
                            val,
                        ))
                    }
                    None => {
                        let Some(Child::Fringe(fringe)) =
                            self.remove_child(octet)
                        else {
                            unreachable!()
                        };
                        ModifyResult::Removed(
                            Arc::unwrap_or_clone(fringe).value,
                        )
                    }
                }
            }
            Found::Inner => {
                let res = {
                    let Some(Child::Node(next)) = self.get_child_mut(octet)
                    else {
                        unreachable!()
                    };
                    Arc::make_mut(next)
                        .modify_at(pfx, octs, is4, depth + 1, cb)
                };
                if matches!(res, ModifyResult::Removed(_)) {
                    self.compress_child(octet, octs, is4, depth);
                }
                res
            }
        }
    }

    // Merge the other subtrie into self; on collisions the other value
    // wins. Returns the number of collisions so that the caller can fix
    // up its size counter. Subtrees missing on our side are adopted by
    // reference and stay shared until a later mutation un-shares them.
    fn union_rec(&mut self, other: &Self, depth: usize) -> usize {
        let mut dups = 0;
        let mut buf = [0u8; 256];

        for &idx in other.prefix_bits().as_slice(&mut buf) {
            let val = other.must_get_prefix(idx).clone();
            if self.insert_prefix(idx, val).is_some() {
                dups += 1;
            }
        }

        for &octet in other.child_bits().as_slice(&mut buf) {
            let theirs = other.must_get_child(octet);
            if self.get_child(octet).is_none() {
                self.insert_child(octet, theirs.clone());
                continue;
            }
            dups += self.union_child(octet, theirs, depth);
        }
        dups
    }

    // Merge the other child into our occupied slot: 3x3 combinations of
    // inner node, leaf and fringe on either side.
    fn union_child(
        &mut self,
        octet: u8,
        theirs: &Child<V, Self>,
        depth: usize,
    ) -> usize {
        enum Ours {
            Inner,
            Leaf,
            LeafHit,
            Fringe,
        }
        let ours = match (self.must_get_child(octet), theirs) {
            (Child::Node(_), _) => Ours::Inner,
            (Child::Leaf(a), Child::Leaf(b)) if a.prefix == b.prefix => {
                Ours::LeafHit
            }
            (Child::Leaf(_), _) => Ours::Leaf,
            (Child::Fringe(_), _) => Ours::Fringe,
        };

        match ours {
            Ours::Inner => {
                let Some(Child::Node(next)) = self.get_child_mut(octet)
                else {
                    unreachable!()
                };
                let n = Arc::make_mut(next);
                match theirs {
                    Child::Node(o) => n.union_rec(o, depth + 1),
                    Child::Leaf(leaf) => usize::from(
                        n.insert_at_depth(
                            &leaf.prefix,
                            leaf.value.clone(),
                            depth + 1,
                        )
                        .is_some(),
                    ),
                    Child::Fringe(fringe) => usize::from(
                        n.insert_prefix(1, fringe.value.clone()).is_some(),
                    ),
                }
            }
            Ours::LeafHit => {
                // identical prefixes: the other value wins in place
                let Some(Child::Leaf(leaf)) = self.get_child_mut(octet)
                else {
                    unreachable!()
                };
                let Child::Leaf(other_leaf) = theirs else {
                    unreachable!()
                };
                Arc::make_mut(leaf).value = other_leaf.value.clone();
                1
            }
            Ours::Fringe if matches!(theirs, Child::Fringe(_)) => {
                let Some(Child::Fringe(fringe)) = self.get_child_mut(octet)
                else {
                    unreachable!()
                };
                let Child::Fringe(other_fringe) = theirs else {
                    unreachable!()
                };
                Arc::make_mut(fringe).value = other_fringe.value.clone();
                1
            }
            Ours::Leaf | Ours::Fringe => {
                // mixed kinds: push our terminal one level down and merge
                // theirs into the fresh inner node
                let mut inner = Self::default();
                match self.remove_child(octet) {
                    Some(Child::Leaf(leaf)) => {
                        let LeafNode { prefix, value } =
                            Arc::unwrap_or_clone(leaf);
                        inner.insert_at_depth(&prefix, value, depth + 1);
                    }
                    Some(Child::Fringe(fringe)) => {
                        inner.insert_prefix(
                            1,
                            Arc::unwrap_or_clone(fringe).value,
                        );
                    }
                    _ => unreachable!(),
                }
                let dups = match theirs {
                    Child::Node(o) => inner.union_rec(o, depth + 1),
                    Child::Leaf(leaf) => usize::from(
                        inner
                            .insert_at_depth(
                                &leaf.prefix,
                                leaf.value.clone(),
                                depth + 1,
                            )
                            .is_some(),
                    ),
                    Child::Fringe(fringe) => usize::from(
                        inner
                            .insert_prefix(1, fringe.value.clone())
                            .is_some(),
                    ),
                };
                self.insert_child(octet, Child::Node(Arc::new(inner)));
                dups
            }
        }
    }

    // Structural equality of two subtries.
    fn eq_rec(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        if self.prefix_bits() != other.prefix_bits()
            || self.child_bits() != other.child_bits()
        {
            return false;
        }
        let mut buf = [0u8; 256];
        for &idx in self.prefix_bits().as_slice(&mut buf) {
            if self.must_get_prefix(idx) != other.must_get_prefix(idx) {
                return false;
            }
        }
        for &octet in self.child_bits().as_slice(&mut buf) {
            let eq = match (
                self.must_get_child(octet),
                other.must_get_child(octet),
            ) {
                (Child::Node(a), Child::Node(b)) => {
                    Arc::ptr_eq(a, b) || a.eq_rec(b)
                }
                (Child::Leaf(a), Child::Leaf(b)) => {
                    a.prefix == b.prefix && a.value == b.value
                }
                (Child::Fringe(a), Child::Fringe(b)) => a.value == b.value,
                _ => false,
            };
            if !eq {
                return false;
            }
        }
        true
    }
}

impl<V: Clone, N: NodeOps<V>> TrieOps<V> for N {}

// The survivor pulled up by compress_child.
enum PullUp<V> {
    Gone,
    Leaf(Arc<LeafNode<V>>),
    Fringe(u8, Arc<FringeNode<V>>),
    Pfx(u8, V),
}

//------------ Address lookups ----------------------------------------------

// Is the address covered by any stored prefix? Forward tests only, no
// backtracking needed.
pub(crate) fn contains_addr<V, N>(root: &N, addr: &IpAddr) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    let (octs, n_octs) = prefix::octets(addr);
    let mut n = root;
    for &octet in &octs[..n_octs] {
        if n.prefix_count() != 0 && n.contains(art::octet_to_idx(octet)) {
            return true;
        }
        match n.get_child(octet) {
            None => return false,
            Some(Child::Node(next)) => n = &**next,
            // a fringe is the default route of everything below its slot
            Some(Child::Fringe(_)) => return true,
            Some(Child::Leaf(leaf)) => {
                return prefix::addr_in(&leaf.prefix, addr)
            }
        }
    }
    unreachable!("trie deeper than the address family")
}

// Longest prefix match by address. Walks down to the deepest node on the
// path, then backtracks over the recorded stack for the first (and
// thereby longest) in-node match.
pub(crate) fn lookup_addr<'a, V, N>(
    root: &'a N,
    addr: &IpAddr,
) -> Option<&'a V>
where
    V: Clone,
    N: NodeOps<V>,
{
    let (octs, _) = prefix::octets(addr);
    let mut stack: [&N; MAX_TREE_DEPTH] = [root; MAX_TREE_DEPTH];
    let mut n = root;
    let mut depth = 0;
    loop {
        stack[depth] = n;
        match n.get_child(octs[depth]) {
            None => break,
            Some(Child::Node(next)) => {
                n = &**next;
                depth += 1;
            }
            Some(Child::Fringe(fringe)) => return Some(&fringe.value),
            Some(Child::Leaf(leaf)) => {
                if prefix::addr_in(&leaf.prefix, addr) {
                    return Some(&leaf.value);
                }
                break;
            }
        }
    }
    loop {
        let n = stack[depth];
        if n.prefix_count() != 0 {
            if let Some(val) = n.lookup(art::octet_to_idx(octs[depth])) {
                return Some(val);
            }
        }
        if depth == 0 {
            return None;
        }
        depth -= 1;
    }
}

// Longest prefix match where the probe is itself a prefix. Returns the
// matched prefix along with the value. Probes with host bits set are
// fine; the walk never looks past the probe's own length.
pub(crate) fn lookup_pfx_lpm<'a, V, N>(
    root: &'a N,
    pfx: &Prefix,
) -> Option<(Prefix, &'a V)>
where
    V: Clone,
    N: NodeOps<V>,
{
    let addr = pfx.addr();
    let bits = pfx.len();
    let is4 = prefix::is_v4(&addr);
    let (octs, _) = prefix::octets(&addr);
    let (max_depth, last_bits) = art::max_depth_and_last_bits(bits);

    let mut stack: [&N; MAX_TREE_DEPTH] = [root; MAX_TREE_DEPTH];
    let mut n = root;
    let mut depth = 0;
    loop {
        stack[depth] = n;
        if depth == max_depth {
            break;
        }
        let octet = octs[depth];
        match n.get_child(octet) {
            None => break,
            Some(Child::Node(next)) => {
                n = &**next;
                depth += 1;
            }
            Some(Child::Fringe(fringe)) => {
                if ((depth + 1) << 3) as u8 <= bits {
                    return Some((
                        prefix::cidr_for_fringe(&octs, depth, is4, octet),
                        &fringe.value,
                    ));
                }
                break;
            }
            Some(Child::Leaf(leaf)) => {
                if leaf.prefix.len() <= bits
                    && prefix::addr_in(&leaf.prefix, &addr)
                {
                    return Some((leaf.prefix, &leaf.value));
                }
                break;
            }
        }
    }
    loop {
        let n = stack[depth];
        if n.prefix_count() != 0 {
            // only the stride holding the probe's tail uses the probe's
            // own length
            let idx = if depth == max_depth {
                art::pfx_to_idx(octs[depth], last_bits)
            } else {
                art::octet_to_idx(octs[depth])
            };
            if let Some((top, val)) = n.lookup_idx(idx) {
                return Some((
                    prefix::masked(&addr, art::pfx_bits(depth, top)),
                    val,
                ));
            }
        }
        if depth == 0 {
            return None;
        }
        depth -= 1;
    }
}
