use inetnum::addr::Prefix;

use crate::art;
use crate::bitset256::BitSet256;
use crate::node::{Child, NodeOps};
use crate::types::prefix;

//------------ Overlap tests ------------------------------------------------

// Bidirectional overlap of a subtrie with a single prefix. Walks the
// probe's octets; at every level any stored route covering the path so
// far is a hit (no best match needed), and at the tail stride the
// in-node test looks both ways.
pub(crate) fn overlaps_pfx<V, N>(root: &N, pfx: &Prefix, depth: usize) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    let bits = pfx.len();
    let (octs, _) = prefix::octets(&pfx.addr());
    let (max_depth, last_bits) = art::max_depth_and_last_bits(bits);

    let mut n = root;
    let mut depth = depth;
    loop {
        if depth == max_depth {
            return overlaps_idx(n, art::pfx_to_idx(octs[depth], last_bits));
        }
        let octet = octs[depth];
        if n.prefix_count() != 0 && n.contains(art::octet_to_idx(octet)) {
            return true;
        }
        match n.get_child(octet) {
            None => return false,
            Some(Child::Node(next)) => {
                n = &**next;
                depth += 1;
            }
            Some(Child::Fringe(_)) => return true,
            Some(Child::Leaf(leaf)) => {
                return prefix::pfx_overlaps(&leaf.prefix, pfx)
            }
        }
    }
}

// Does the node overlap with the prefix the base index encodes? Checks
// routes covering the index, routes covered by the index and children
// under covered octets, each as one bitset intersection.
fn overlaps_idx<V, N>(n: &N, idx: u8) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    n.contains(idx)
        || n.prefix_bits().intersects(art::pfx_routes(idx))
        || n.child_bits().intersects(art::fringe_routes(idx))
}

// Overlap of two subtries at the same depth: any prefix of one covered
// by the other, any child of one under a route of the other, then
// recursion into the child slots both sides occupy.
pub(crate) fn overlaps<V, N>(n: &N, o: &N, depth: usize) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    let n_pfx = n.prefix_count();
    let o_pfx = o.prefix_count();
    let n_child = n.child_count();
    let o_child = o.child_count();

    // 1. routes against routes
    if n_pfx > 0 && o_pfx > 0 && overlaps_routes(n, o) {
        return true;
    }

    // 2. routes against children, both ways
    if n_pfx > 0 && o_child > 0 && overlaps_children_in(n, o) {
        return true;
    }
    if o_pfx > 0 && n_child > 0 && overlaps_children_in(o, n) {
        return true;
    }

    // 3. children against children
    if n_child == 0 || o_child == 0 {
        return false;
    }
    if !n.child_bits().intersects(o.child_bits()) {
        return false;
    }
    overlaps_same_children(n, o, depth)
}

fn overlaps_routes<V, N>(n: &N, o: &N) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    // identical base indices on both sides, trivial overlap
    if n.prefix_bits().intersects(o.prefix_bits()) {
        return true;
    }
    for idx in n.prefix_bits().ones() {
        if o.contains(idx) {
            return true;
        }
    }
    for idx in o.prefix_bits().ones() {
        if n.contains(idx) {
            return true;
        }
    }
    false
}

// Does any route of n cover any child slot of o?
fn overlaps_children_in<V, N>(n: &N, o: &N) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    let pfx_count = n.prefix_count();
    let child_count = o.child_count();

    // with few children (or many routes) probing each octet is cheaper
    // than building the union of covered ranges
    if child_count < 16 || pfx_count > 16 {
        let mut buf = [0u8; 256];
        for &octet in o.child_bits().as_slice(&mut buf) {
            if n.contains(art::octet_to_idx(octet)) {
                return true;
            }
        }
        return false;
    }

    // otherwise union the covered octet ranges of all routes once and
    // intersect with the child occupancy
    let mut covered = BitSet256::default();
    for idx in n.prefix_bits().ones() {
        covered.union_with(art::fringe_routes(idx));
    }
    covered.intersects(o.child_bits())
}

fn overlaps_same_children<V, N>(n: &N, o: &N, depth: usize) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    let common = n.child_bits().intersection(o.child_bits());
    let mut buf = [0u8; 256];
    for &octet in common.as_slice(&mut buf) {
        if overlaps_two_children(
            n.must_get_child(octet),
            o.must_get_child(octet),
            depth + 1,
        ) {
            return true;
        }
    }
    false
}

fn overlaps_two_children<V, N>(
    a: &Child<V, N>,
    b: &Child<V, N>,
    depth: usize,
) -> bool
where
    V: Clone,
    N: NodeOps<V>,
{
    match (a, b) {
        // a fringe covers the entire slot on either side
        (Child::Fringe(_), _) | (_, Child::Fringe(_)) => true,
        (Child::Node(x), Child::Node(y)) => overlaps(&**x, &**y, depth),
        (Child::Node(x), Child::Leaf(leaf))
        | (Child::Leaf(leaf), Child::Node(x)) => {
            overlaps_pfx(&**x, &leaf.prefix, depth)
        }
        (Child::Leaf(a), Child::Leaf(b)) => {
            prefix::pfx_overlaps(&a.prefix, &b.prefix)
        }
    }
}
