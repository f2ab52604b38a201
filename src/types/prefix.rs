use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use inetnum::addr::Prefix;

use crate::art;

//------------ Prefix helpers -----------------------------------------------

// The trie works on the octets of the public Prefix type. All helpers in
// here are pure address arithmetic: canonicalization by masking (the
// public API accepts prefixes with host bits set), containment and
// overlap tests, the CIDR sort order, and the reconstruction of a prefix
// from a trie path.
//
// IPv4 and IPv6 never mix: a v4 probe against a v6 prefix is simply not
// contained. IPv4-mapped IPv6 addresses are not unmapped anywhere.

fn mask_v4(bits: u32, len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        bits & (u32::MAX << (32 - len as u32))
    }
}

fn mask_v6(bits: u128, len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        bits & (u128::MAX << (128 - len as u32))
    }
}

// Canonicalize a prefix by clearing its host bits. Idempotent.
//
// There is no reasonable way for the re-assembly to fail: the length
// comes from a valid prefix and the masked address has no host bits.
#[allow(clippy::unwrap_used)]
pub(crate) fn trim(pfx: &Prefix) -> Prefix {
    match pfx.addr() {
        IpAddr::V4(addr) => Prefix::new(
            Ipv4Addr::from(mask_v4(addr.into(), pfx.len())).into(),
            pfx.len(),
        )
        .unwrap(),
        IpAddr::V6(addr) => Prefix::new(
            Ipv6Addr::from(mask_v6(addr.into(), pfx.len())).into(),
            pfx.len(),
        )
        .unwrap(),
    }
}

// The address masked down to the given number of bits, as a canonical
// prefix. Used to reconstruct the matched prefix of an LPM probe.
#[allow(clippy::unwrap_used)]
pub(crate) fn masked(addr: &IpAddr, bits: u8) -> Prefix {
    match addr {
        IpAddr::V4(addr) => Prefix::new(
            Ipv4Addr::from(mask_v4((*addr).into(), bits)).into(),
            bits,
        )
        .unwrap(),
        IpAddr::V6(addr) => Prefix::new(
            Ipv6Addr::from(mask_v6((*addr).into(), bits)).into(),
            bits,
        )
        .unwrap(),
    }
}

pub(crate) fn is_v4(addr: &IpAddr) -> bool {
    matches!(addr, IpAddr::V4(_))
}

// The address as octets in a fixed 16 byte path buffer, plus the number
// of meaningful octets (4 or 16).
pub(crate) fn octets(addr: &IpAddr) -> ([u8; 16], usize) {
    let mut buf = [0u8; 16];
    match addr {
        IpAddr::V4(addr) => {
            buf[..4].copy_from_slice(&addr.octets());
            (buf, 4)
        }
        IpAddr::V6(addr) => {
            buf.copy_from_slice(&addr.octets());
            (buf, 16)
        }
    }
}

// Does the prefix cover the address? False on family mismatch.
pub(crate) fn addr_in(pfx: &Prefix, addr: &IpAddr) -> bool {
    match (pfx.addr(), addr) {
        (IpAddr::V4(p), IpAddr::V4(a)) => {
            mask_v4((*a).into(), pfx.len()) == u32::from(p)
        }
        (IpAddr::V6(p), IpAddr::V6(a)) => {
            mask_v6((*a).into(), pfx.len()) == u128::from(p)
        }
        _ => false,
    }
}

// Is sub entirely inside sup? Assumes both are canonical.
pub(crate) fn pfx_contains(sup: &Prefix, sub: &Prefix) -> bool {
    sup.len() <= sub.len() && addr_in(sup, &sub.addr())
}

pub(crate) fn pfx_overlaps(a: &Prefix, b: &Prefix) -> bool {
    pfx_contains(a, b) || pfx_contains(b, a)
}

//------------ Reconstruction -----------------------------------------------

#[allow(clippy::unwrap_used)]
fn assemble(bytes: [u8; 16], bits: u8, is4: bool) -> Prefix {
    let addr: IpAddr = if is4 {
        let v4: [u8; 4] = bytes[..4].try_into().unwrap();
        Ipv4Addr::from(v4).into()
    } else {
        Ipv6Addr::from(bytes).into()
    };
    // canonical by construction: everything after the reconstructed
    // octet is zero
    Prefix::new(addr, bits).unwrap()
}

// The prefix encoded by base index idx of the node reached over
// path[..depth].
pub(crate) fn cidr_from_path(
    path: &[u8; 16],
    depth: usize,
    is4: bool,
    idx: u8,
) -> Prefix {
    let (octet, _) = art::idx_to_pfx(idx);
    let mut bytes = [0u8; 16];
    bytes[..depth].copy_from_slice(&path[..depth]);
    bytes[depth] = octet;
    assemble(bytes, art::pfx_bits(depth, idx), is4)
}

// The stride aligned prefix of a fringe sitting in child slot last_octet
// of the node reached over path[..depth].
pub(crate) fn cidr_for_fringe(
    path: &[u8; 16],
    depth: usize,
    is4: bool,
    last_octet: u8,
) -> Prefix {
    let mut bytes = [0u8; 16];
    bytes[..depth].copy_from_slice(&path[..depth]);
    bytes[depth] = last_octet;
    assemble(bytes, ((depth + 1) << 3) as u8, is4)
}

//------------ Tests --------------------------------------------------------
