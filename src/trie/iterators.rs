use inetnum::addr::Prefix;

use crate::art::{self, MAX_TREE_DEPTH};
use crate::bitset256::BitSet256;
use crate::node::{Child, NodeOps};
use crate::types::prefix;

//------------ Frame --------------------------------------------------------

// One level of a depth-first walk: the node, the path that led to it and
// the occupied slots of both tables, copied out of the bitsets into
// inline scratch. In sorted mode the prefix indices are re-ordered by
// (octet, length) rank so that interleaving them with the children by
// octet yields the CIDR order.

struct Frame<'a, N> {
    node: &'a N,
    path: [u8; 16],
    depth: usize,
    pfxs: [u8; 256],
    pfx_count: usize,
    pfx_cur: usize,
    kids: [u8; 256],
    kid_count: usize,
    kid_cur: usize,
}

enum Event {
    Pfx(u8),
    Kid(u8),
    Done,
}

impl<'a, N> Frame<'a, N> {
    fn new<V>(
        node: &'a N,
        path: [u8; 16],
        depth: usize,
        sorted: bool,
    ) -> Self
    where
        V: Clone,
        N: NodeOps<V>,
    {
        Self::filtered(node, path, depth, None, None, sorted)
    }

    // A frame over the slots selected by the masks (all slots if absent).
    fn filtered<V>(
        node: &'a N,
        path: [u8; 16],
        depth: usize,
        pfx_mask: Option<&BitSet256>,
        kid_mask: Option<&BitSet256>,
        sorted: bool,
    ) -> Self
    where
        V: Clone,
        N: NodeOps<V>,
    {
        let mut frame = Frame {
            node,
            path,
            depth,
            pfxs: [0; 256],
            pfx_count: 0,
            pfx_cur: 0,
            kids: [0; 256],
            kid_count: 0,
            kid_cur: 0,
        };
        let pfx_bits = match pfx_mask {
            Some(mask) => node.prefix_bits().intersection(mask),
            None => *node.prefix_bits(),
        };
        frame.pfx_count = pfx_bits.as_slice(&mut frame.pfxs).len();
        if sorted {
            frame.pfxs[..frame.pfx_count]
                .sort_unstable_by_key(|&idx| art::idx_to_pfx(idx));
        }
        let kid_bits = match kid_mask {
            Some(mask) => node.child_bits().intersection(mask),
            None => *node.child_bits(),
        };
        frame.kid_count = kid_bits.as_slice(&mut frame.kids).len();
        frame
    }

    fn advance(&mut self, sorted: bool) -> Event {
        let pfx_next = (self.pfx_cur < self.pfx_count)
            .then(|| self.pfxs[self.pfx_cur]);
        let kid_next = (self.kid_cur < self.kid_count)
            .then(|| self.kids[self.kid_cur]);
        match (pfx_next, kid_next) {
            (None, None) => Event::Done,
            (Some(idx), None) => {
                self.pfx_cur += 1;
                Event::Pfx(idx)
            }
            (None, Some(octet)) => {
                self.kid_cur += 1;
                Event::Kid(octet)
            }
            (Some(idx), Some(octet)) => {
                // on an octet tie the in-node prefix is the shorter one
                // and comes first
                if !sorted || art::idx_to_pfx(idx).0 <= octet {
                    self.pfx_cur += 1;
                    Event::Pfx(idx)
                } else {
                    self.kid_cur += 1;
                    Event::Kid(octet)
                }
            }
        }
    }
}

//------------ TreeIter -----------------------------------------------------

// Pull iterator over (prefix, value) pairs of one or two subtries, in
// CIDR order when sorted. The explicit frame stack is bounded by the
// stride depth; a pending item carries the single result of a subnet
// walk that ended in a leaf or fringe.
pub(crate) struct TreeIter<'a, V, N> {
    stack: Vec<Frame<'a, N>>,
    pending: Option<(Prefix, &'a V)>,
    next_root: Option<&'a N>,
    is4: bool,
    sorted: bool,
}

impl<'a, V: Clone, N: NodeOps<V>> TreeIter<'a, V, N> {
    pub(crate) fn empty() -> Self {
        TreeIter {
            stack: Vec::new(),
            pending: None,
            next_root: None,
            is4: true,
            sorted: false,
        }
    }

    pub(crate) fn single(pfx: Prefix, val: &'a V) -> Self {
        TreeIter {
            pending: Some((pfx, val)),
            ..Self::empty()
        }
    }

    pub(crate) fn new(root: &'a N, is4: bool, sorted: bool) -> Self {
        let mut stack = Vec::with_capacity(MAX_TREE_DEPTH);
        stack.push(Frame::new::<V>(root, [0; 16], 0, sorted));
        TreeIter {
            stack,
            pending: None,
            next_root: None,
            is4,
            sorted,
        }
    }

    // Both families, the v4 root first.
    pub(crate) fn new_both(
        root4: &'a N,
        root6: &'a N,
        sorted: bool,
    ) -> Self {
        let mut iter = Self::new(root4, true, sorted);
        iter.next_root = Some(root6);
        iter
    }
}

impl<'a, V: Clone, N: NodeOps<V>> Iterator for TreeIter<'a, V, N> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.take() {
            return Some(item);
        }
        loop {
            let Some(top) = self.stack.last_mut() else {
                let root = self.next_root.take()?;
                self.is4 = false;
                self.stack
                    .push(Frame::new::<V>(root, [0; 16], 0, self.sorted));
                continue;
            };
            let (node, path, depth) = (top.node, top.path, top.depth);
            match top.advance(self.sorted) {
                Event::Done => {
                    self.stack.pop();
                }
                Event::Pfx(idx) => {
                    return Some((
                        prefix::cidr_from_path(&path, depth, self.is4, idx),
                        node.must_get_prefix(idx),
                    ));
                }
                Event::Kid(octet) => match node.must_get_child(octet) {
                    Child::Leaf(leaf) => {
                        return Some((leaf.prefix, &leaf.value))
                    }
                    Child::Fringe(fringe) => {
                        return Some((
                            prefix::cidr_for_fringe(
                                &path, depth, self.is4, octet,
                            ),
                            &fringe.value,
                        ));
                    }
                    Child::Node(next) => {
                        let mut path = path;
                        path[depth] = octet;
                        self.stack.push(Frame::new::<V>(
                            next,
                            path,
                            depth + 1,
                            self.sorted,
                        ));
                    }
                },
            }
        }
    }
}

//------------ Subnets ------------------------------------------------------

// All stored prefixes covered by pfx, in ascending CIDR order. Descends
// to the stride holding the probe's tail and walks the subtree of its
// base index from there.
pub(crate) fn subnets_iter<'a, V, N>(
    root: &'a N,
    pfx: &Prefix,
) -> TreeIter<'a, V, N>
where
    V: Clone,
    N: NodeOps<V>,
{
    let bits = pfx.len();
    let addr = pfx.addr();
    let is4 = prefix::is_v4(&addr);
    let (octs, _) = prefix::octets(&addr);
    let (max_depth, last_bits) = art::max_depth_and_last_bits(bits);

    let mut n = root;
    let mut depth = 0;
    loop {
        if depth == max_depth {
            let idx = art::pfx_to_idx(octs[depth], last_bits);
            let frame = Frame::filtered::<V>(
                n,
                octs,
                depth,
                Some(art::pfx_routes(idx)),
                Some(art::fringe_routes(idx)),
                true,
            );
            let mut iter = TreeIter::empty();
            iter.sorted = true;
            iter.is4 = is4;
            iter.stack.push(frame);
            return iter;
        }
        let octet = octs[depth];
        match n.get_child(octet) {
            None => return TreeIter::empty(),
            Some(Child::Node(next)) => {
                n = &**next;
                depth += 1;
            }
            Some(Child::Leaf(leaf)) => {
                if prefix::pfx_contains(pfx, &leaf.prefix) {
                    return TreeIter::single(leaf.prefix, &leaf.value);
                }
                return TreeIter::empty();
            }
            Some(Child::Fringe(fringe)) => {
                let fp = prefix::cidr_for_fringe(&octs, depth, is4, octet);
                if prefix::pfx_contains(pfx, &fp) {
                    return TreeIter::single(fp, &fringe.value);
                }
                return TreeIter::empty();
            }
        }
    }
}

//------------ SupernetsIter ------------------------------------------------

// All stored prefixes covering pfx, longest first. The descent records
// the nodes on the path; unwinding emits every in-node match top-down,
// with a leaf or fringe hit below the deepest node going first.
pub(crate) struct SupernetsIter<'a, V, N> {
    pending: Option<(Prefix, &'a V)>,
    // (node, depth, probe idx), shallowest first; drained from the back
    stack: Vec<(&'a N, usize, u8)>,
    cur: Option<(&'a N, usize, BitSet256)>,
    octs: [u8; 16],
    is4: bool,
}

impl<'a, V: Clone, N: NodeOps<V>> Iterator for SupernetsIter<'a, V, N> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.take() {
            return Some(item);
        }
        loop {
            if let Some((node, depth, ref mut remaining)) = self.cur {
                if let Some(top) = remaining.last_set() {
                    remaining.clear(top);
                    return Some((
                        prefix::cidr_from_path(
                            &self.octs, depth, self.is4, top,
                        ),
                        node.must_get_prefix(top),
                    ));
                }
            }
            let (node, depth, probe) = self.stack.pop()?;
            let remaining =
                node.prefix_bits().intersection(art::lookup_tbl(probe));
            self.cur = Some((node, depth, remaining));
        }
    }
}

pub(crate) fn supernets_iter<'a, V, N>(
    root: &'a N,
    pfx: &Prefix,
) -> SupernetsIter<'a, V, N>
where
    V: Clone,
    N: NodeOps<V>,
{
    let bits = pfx.len();
    let addr = pfx.addr();
    let is4 = prefix::is_v4(&addr);
    let (octs, _) = prefix::octets(&addr);
    let (max_depth, last_bits) = art::max_depth_and_last_bits(bits);

    let mut iter = SupernetsIter {
        pending: None,
        stack: Vec::with_capacity(MAX_TREE_DEPTH),
        cur: None,
        octs,
        is4,
    };

    let mut n = root;
    let mut depth = 0;
    loop {
        let probe = if depth == max_depth {
            art::pfx_to_idx(octs[depth], last_bits)
        } else {
            art::octet_to_idx(octs[depth])
        };
        // nodes without prefixes have nothing to contribute on unwind
        if !n.prefix_bits().is_empty() {
            iter.stack.push((n, depth, probe));
        }
        if depth == max_depth {
            break;
        }
        match n.get_child(octs[depth]) {
            None => break,
            Some(Child::Node(next)) => {
                n = &**next;
                depth += 1;
            }
            Some(Child::Leaf(leaf)) => {
                if prefix::pfx_contains(&leaf.prefix, pfx) {
                    iter.pending = Some((leaf.prefix, &leaf.value));
                }
                break;
            }
            Some(Child::Fringe(fringe)) => {
                let fp =
                    prefix::cidr_for_fringe(&octs, depth, is4, octs[depth]);
                if fp.len() <= bits {
                    iter.pending = Some((fp, &fringe.value));
                }
                break;
            }
        }
    }
    iter
}
