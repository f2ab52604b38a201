use std::net::IpAddr;

use inetnum::addr::Prefix;

use crate::node::lite::LiteNode;
use crate::table::TableCore;
use crate::trie::iterators::{SupernetsIter, TreeIter};

//------------ LiteTable ----------------------------------------------------

/// A set of IPv4 and IPv6 prefixes without a payload.
///
/// Same trie, same semantics as [`Table`](crate::Table), minus the value
/// storage: the nodes keep nothing but their occupancy bitsets, so this
/// is the smallest possible representation for pure membership and
/// longest-prefix-match questions. All value positions disappear from
/// the signatures; `modify` is gone with them since its outcomes
/// collapse into [`insert`](Self::insert) and [`remove`](Self::remove).
#[derive(Clone, Debug, Default)]
pub struct LiteTable {
    core: TableCore<(), LiteNode>,
}

impl LiteTable {
    /// Creates an empty prefix set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of prefixes, over both families.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// The number of IPv4 prefixes.
    pub fn len4(&self) -> usize {
        self.core.len4()
    }

    /// The number of IPv6 prefixes.
    pub fn len6(&self) -> usize {
        self.core.len6()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.core.len() == 0
    }

    /// Inserts a prefix. Returns whether it was already present.
    pub fn insert(&mut self, pfx: Prefix) -> bool {
        self.core.insert(&pfx, ()).is_some()
    }

    /// Removes a prefix. Returns whether it was present.
    pub fn remove(&mut self, pfx: Prefix) -> bool {
        self.core.remove(&pfx).is_some()
    }

    /// Returns whether exactly this prefix is in the set.
    pub fn get(&self, pfx: Prefix) -> bool {
        self.core.get(&pfx).is_some()
    }

    /// Returns whether any stored prefix covers the address.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.core.contains(addr)
    }

    /// The longest stored prefix covering the address.
    pub fn lookup(&self, addr: &IpAddr) -> Option<Prefix> {
        // an address is its own host route prefix
        let bits = if addr.is_ipv4() { 32 } else { 128 };
        let probe = Prefix::new(*addr, bits).ok()?;
        self.core.lookup_prefix_lpm(&probe).map(|(pfx, _)| pfx)
    }

    /// Returns whether any stored prefix covers the probe prefix.
    pub fn lookup_prefix(&self, pfx: Prefix) -> bool {
        self.core.lookup_prefix(&pfx).is_some()
    }

    /// The longest stored prefix covering the probe prefix.
    pub fn lookup_prefix_lpm(&self, pfx: Prefix) -> Option<Prefix> {
        self.core.lookup_prefix_lpm(&pfx).map(|(pfx, _)| pfx)
    }

    /// Returns whether any stored prefix overlaps the given prefix.
    pub fn overlaps_prefix(&self, pfx: Prefix) -> bool {
        self.core.overlaps_prefix(&pfx)
    }

    /// Returns whether the two sets share any address space.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.core.overlaps(&other.core)
    }

    /// As [`overlaps`](Self::overlaps), for the IPv4 halves only.
    pub fn overlaps4(&self, other: &Self) -> bool {
        self.core.overlaps4(&other.core)
    }

    /// As [`overlaps`](Self::overlaps), for the IPv6 halves only.
    pub fn overlaps6(&self, other: &Self) -> bool {
        self.core.overlaps6(&other.core)
    }

    /// Merges the other set into this one.
    pub fn union(&mut self, other: &Self) {
        self.core.union_with(&other.core)
    }

    /// All prefixes, IPv4 before IPv6, unordered.
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.core.iter())
    }

    /// The IPv4 prefixes, unordered.
    pub fn iter4(&self) -> Iter<'_> {
        Iter(self.core.iter4())
    }

    /// The IPv6 prefixes, unordered.
    pub fn iter6(&self) -> Iter<'_> {
        Iter(self.core.iter6())
    }

    /// All prefixes in CIDR sort order.
    pub fn iter_sorted(&self) -> Iter<'_> {
        Iter(self.core.iter_sorted())
    }

    /// The IPv4 prefixes in CIDR sort order.
    pub fn iter_sorted4(&self) -> Iter<'_> {
        Iter(self.core.iter_sorted4())
    }

    /// The IPv6 prefixes in CIDR sort order.
    pub fn iter_sorted6(&self) -> Iter<'_> {
        Iter(self.core.iter_sorted6())
    }

    /// All stored prefixes covered by `pfx`, in ascending CIDR order.
    pub fn subnets(&self, pfx: Prefix) -> Iter<'_> {
        Iter(self.core.subnets(&pfx))
    }

    /// All stored prefixes covering `pfx`, longest prefix first.
    pub fn supernets(&self, pfx: Prefix) -> Supernets<'_> {
        Supernets(self.core.supernets(&pfx))
    }

    /// Persistent insert; the receiver stays untouched.
    pub fn insert_persist(&self, pfx: Prefix) -> Self {
        let mut set = self.clone();
        set.insert(pfx);
        set
    }

    /// Persistent remove; the receiver stays untouched.
    pub fn remove_persist(&self, pfx: Prefix) -> (Self, bool) {
        let mut set = self.clone();
        let existed = set.remove(pfx);
        (set, existed)
    }

    /// Persistent union; the receiver stays untouched.
    pub fn union_persist(&self, other: &Self) -> Self {
        let mut set = self.clone();
        set.union(other);
        set
    }
}

impl PartialEq for LiteTable {
    fn eq(&self, other: &Self) -> bool {
        self.core.eq_core(&other.core)
    }
}

impl Eq for LiteTable {}

impl FromIterator<Prefix> for LiteTable {
    fn from_iter<I: IntoIterator<Item = Prefix>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Prefix> for LiteTable {
    fn extend<I: IntoIterator<Item = Prefix>>(&mut self, iter: I) {
        for pfx in iter {
            self.insert(pfx);
        }
    }
}

impl<'a> IntoIterator for &'a LiteTable {
    type Item = Prefix;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//------------ Iterators over LiteTable -------------------------------------

/// Iterator over the prefixes of a [`LiteTable`].
pub struct Iter<'a>(TreeIter<'a, (), LiteNode>);

impl<'a> Iterator for Iter<'a> {
    type Item = Prefix;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(pfx, _)| pfx)
    }
}

/// Iterator over the covering prefixes of a probe, longest first.
pub struct Supernets<'a>(SupernetsIter<'a, (), LiteNode>);

impl<'a> Iterator for Supernets<'a> {
    type Item = Prefix;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(pfx, _)| pfx)
    }
}
