use std::net::IpAddr;

use inetnum::addr::Prefix;

use crate::node::fast::FastNode;
use crate::table::TableCore;
use crate::trie::iterators::{SupernetsIter, TreeIter};
use crate::types::ModifyResult;

//------------ FastTable ----------------------------------------------------

/// A routing table like [`Table`](crate::Table), tuned for lookups.
///
/// Nodes use fixed 256 slot arrays with ART allotment: every in-node
/// longest-prefix-match is a single indexed load instead of a bitset
/// walk. The price is a considerably larger memory footprint per node,
/// which is why this is the variant for lookup-heavy workloads with a
/// bounded number of routes, while [`Table`](crate::Table) is the one
/// for full routing tables.
///
/// The API and all semantics, including the `*_persist` family, are
/// identical to [`Table`](crate::Table).
#[derive(Clone, Debug)]
pub struct FastTable<V> {
    core: TableCore<V, FastNode<V>>,
}

impl<V: Clone> FastTable<V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        FastTable {
            core: TableCore::default(),
        }
    }

    /// The number of prefixes in the table, over both families.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// The number of IPv4 prefixes in the table.
    pub fn len4(&self) -> usize {
        self.core.len4()
    }

    /// The number of IPv6 prefixes in the table.
    pub fn len6(&self) -> usize {
        self.core.len6()
    }

    /// Returns whether the table holds no prefixes at all.
    pub fn is_empty(&self) -> bool {
        self.core.len() == 0
    }

    /// Inserts a prefix. An existing value for the same prefix is
    /// replaced and returned.
    pub fn insert(&mut self, pfx: Prefix, val: V) -> Option<V> {
        self.core.insert(&pfx, val)
    }

    /// Removes a prefix, returning its value.
    pub fn remove(&mut self, pfx: Prefix) -> Option<V> {
        self.core.remove(&pfx)
    }

    /// The value stored for exactly this prefix.
    pub fn get(&self, pfx: Prefix) -> Option<&V> {
        self.core.get(&pfx)
    }

    /// Inserts, updates, or removes the value for a prefix in a single
    /// traversal; see [`Table::modify`](crate::Table::modify).
    pub fn modify<F>(&mut self, pfx: Prefix, cb: F) -> ModifyResult<V>
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        self.core.modify(&pfx, cb)
    }

    /// Returns whether any stored prefix covers the address.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.core.contains(addr)
    }

    /// The value of the longest stored prefix covering the address.
    pub fn lookup(&self, addr: &IpAddr) -> Option<&V> {
        self.core.lookup(addr)
    }

    /// The value of the longest stored prefix covering the probe prefix.
    pub fn lookup_prefix(&self, pfx: Prefix) -> Option<&V> {
        self.core.lookup_prefix(&pfx)
    }

    /// As [`lookup_prefix`](Self::lookup_prefix), also returning the
    /// matched prefix itself.
    pub fn lookup_prefix_lpm(&self, pfx: Prefix) -> Option<(Prefix, &V)> {
        self.core.lookup_prefix_lpm(&pfx)
    }

    /// Returns whether any stored prefix overlaps the given prefix.
    pub fn overlaps_prefix(&self, pfx: Prefix) -> bool {
        self.core.overlaps_prefix(&pfx)
    }

    /// Returns whether any prefix of this table overlaps any prefix of
    /// the other table.
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

    /// Merges the other table into this one; the other table's value
    /// wins on prefixes present in both.
    pub fn union(&mut self, other: &Self) {
        self.core.union_with(&other.core)
    }

    /// All prefixes and values, IPv4 before IPv6, unordered.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter(self.core.iter())
    }

    /// The IPv4 prefixes, unordered.
    pub fn iter4(&self) -> Iter<'_, V> {
        Iter(self.core.iter4())
    }

    /// The IPv6 prefixes, unordered.
    pub fn iter6(&self) -> Iter<'_, V> {
        Iter(self.core.iter6())
    }

    /// All prefixes in CIDR sort order.
    pub fn iter_sorted(&self) -> Iter<'_, V> {
        Iter(self.core.iter_sorted())
    }

    /// The IPv4 prefixes in CIDR sort order.
    pub fn iter_sorted4(&self) -> Iter<'_, V> {
        Iter(self.core.iter_sorted4())
    }

    /// The IPv6 prefixes in CIDR sort order.
    pub fn iter_sorted6(&self) -> Iter<'_, V> {
        Iter(self.core.iter_sorted6())
    }

    /// All stored prefixes covered by `pfx`, in ascending CIDR order.
    pub fn subnets(&self, pfx: Prefix) -> Iter<'_, V> {
        Iter(self.core.subnets(&pfx))
    }

    /// All stored prefixes covering `pfx`, longest prefix first.
    pub fn supernets(&self, pfx: Prefix) -> Supernets<'_, V> {
        Supernets(self.core.supernets(&pfx))
    }

    /// Persistent insert; the receiver stays untouched.
    pub fn insert_persist(&self, pfx: Prefix, val: V) -> Self {
        let mut table = self.clone();
        table.insert(pfx, val);
        table
    }

    /// Persistent remove; the receiver stays untouched.
    pub fn remove_persist(&self, pfx: Prefix) -> (Self, Option<V>) {
        let mut table = self.clone();
        let old = table.remove(pfx);
        (table, old)
    }

    /// Persistent modify; the receiver stays untouched.
    pub fn modify_persist<F>(
        &self,
        pfx: Prefix,
        cb: F,
    ) -> (Self, ModifyResult<V>)
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let mut table = self.clone();
        let res = table.modify(pfx, cb);
        (table, res)
    }

    /// Persistent union; the receiver stays untouched.
    pub fn union_persist(&self, other: &Self) -> Self {
        let mut table = self.clone();
        table.union(other);
        table
    }
}

impl<V: Clone> Default for FastTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + PartialEq> PartialEq for FastTable<V> {
    fn eq(&self, other: &Self) -> bool {
        self.core.eq_core(&other.core)
    }
}

impl<V: Clone + Eq> Eq for FastTable<V> {}

impl<V: Clone> FromIterator<(Prefix, V)> for FastTable<V> {
    fn from_iter<I: IntoIterator<Item = (Prefix, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<V: Clone> Extend<(Prefix, V)> for FastTable<V> {
    fn extend<I: IntoIterator<Item = (Prefix, V)>>(&mut self, iter: I) {
        for (pfx, val) in iter {
            self.insert(pfx, val);
        }
    }
}

impl<'a, V: Clone> IntoIterator for &'a FastTable<V> {
    type Item = (Prefix, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//------------ Iterators over FastTable -------------------------------------

/// Iterator over the `(Prefix, &V)` pairs of a [`FastTable`].
pub struct Iter<'a, V>(TreeIter<'a, V, FastNode<V>>);

impl<'a, V: Clone> Iterator for Iter<'a, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

/// Iterator over the covering prefixes of a probe, longest first.
pub struct Supernets<'a, V>(SupernetsIter<'a, V, FastNode<V>>);

impl<'a, V: Clone> Iterator for Supernets<'a, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}
