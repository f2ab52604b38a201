//! A library for storing and retrieving IP prefixes in a multibit trie.
//!
//! The trie processes addresses one octet per level and stores the
//! prefixes of each stride in an ART style complete binary tree per
//! node, with path compression for sparsely populated branches. It
//! answers exact matches, longest-prefix-match by address or by prefix,
//! overlap questions, and enumerates subnets and supernets lazily.
//!
//! Three table types share the same semantics:
//!
//! - [`Table`]: popcount-compressed nodes, the memory-compact default
//!   that holds a full Internet routing table comfortably.
//! - [`FastTable`]: fixed-size nodes with precomputed allotment for
//!   O(1) in-node lookups, trading memory for speed.
//! - [`LiteTable`]: a prefix set without payload.
//!
//! Every mutating operation has a `*_persist` sibling that leaves the
//! receiver untouched and returns a new table sharing all unchanged
//! subtrees, so a single writer can publish immutable snapshots to any
//! number of concurrent readers (e.g. behind an atomic pointer swap).
//!
//! The public prefix type is [`inetnum::addr::Prefix`], re-exported
//! here for convenience. Prefixes with host bits set are masked on the
//! way in; parsing and validating textual prefixes is `inetnum`'s
//! business, not ours.

mod art;
mod bitset256;
mod node;
mod trie;
mod types;

pub mod table;

pub use inetnum::addr::Prefix;
pub use table::fast::FastTable;
pub use table::lite::LiteTable;
pub use table::Table;
pub use types::ModifyResult;
