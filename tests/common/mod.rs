#![allow(dead_code)]

use std::cmp::Ordering;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use inetnum::addr::Prefix;
use rand::rngs::StdRng;
use rand::Rng;

pub fn init() {
    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

pub fn pfx(s: &str) -> Prefix {
    Prefix::from_str(s).unwrap()
}

pub fn addr(s: &str) -> IpAddr {
    IpAddr::from_str(s).unwrap()
}

fn mask4(bits: u32, len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        bits & (u32::MAX << (32 - len as u32))
    }
}

fn mask6(bits: u128, len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        bits & (u128::MAX << (128 - len as u32))
    }
}

pub fn mask_addr(a: &IpAddr, len: u8) -> IpAddr {
    match a {
        IpAddr::V4(a) => IpAddr::V4(Ipv4Addr::from(mask4((*a).into(), len))),
        IpAddr::V6(a) => IpAddr::V6(Ipv6Addr::from(mask6((*a).into(), len))),
    }
}

pub fn random_pfx4(rng: &mut StdRng) -> Prefix {
    let len = rng.gen_range(0..=32u8);
    let bits = mask4(rng.gen(), len);
    Prefix::new(Ipv4Addr::from(bits).into(), len).unwrap()
}

pub fn random_pfx6(rng: &mut StdRng) -> Prefix {
    let len = rng.gen_range(0..=128u8);
    let bits = mask6(rng.gen(), len);
    Prefix::new(Ipv6Addr::from(bits).into(), len).unwrap()
}

pub fn random_pfx(rng: &mut StdRng) -> Prefix {
    if rng.gen_bool(0.5) {
        random_pfx4(rng)
    } else {
        random_pfx6(rng)
    }
}

pub fn random_addr(rng: &mut StdRng) -> IpAddr {
    if rng.gen_bool(0.5) {
        IpAddr::V4(Ipv4Addr::from(rng.gen::<u32>()))
    } else {
        IpAddr::V6(Ipv6Addr::from(rng.gen::<u128>()))
    }
}

// Reference containment, independent of the trie.
pub fn covers(p: &Prefix, a: &IpAddr) -> bool {
    match (p.addr(), a) {
        (IpAddr::V4(net), IpAddr::V4(a)) => {
            mask4((*a).into(), p.len()) == u32::from(net)
        }
        (IpAddr::V6(net), IpAddr::V6(a)) => {
            mask6((*a).into(), p.len()) == u128::from(net)
        }
        _ => false,
    }
}

pub fn covers_pfx(sup: &Prefix, sub: &Prefix) -> bool {
    sup.len() <= sub.len() && covers(sup, &sub.addr())
}

// Reference CIDR order: v4 first, then bytewise address, then shorter
// prefix first.
pub fn cidr_cmp(a: &Prefix, b: &Prefix) -> Ordering {
    match (a.addr(), b.addr()) {
        (IpAddr::V4(x), IpAddr::V4(y)) => {
            x.cmp(&y).then_with(|| a.len().cmp(&b.len()))
        }
        (IpAddr::V6(x), IpAddr::V6(y)) => {
            x.cmp(&y).then_with(|| a.len().cmp(&b.len()))
        }
        (IpAddr::V4(_), IpAddr::V6(_)) => Ordering::Less,
        (IpAddr::V6(_), IpAddr::V4(_)) => Ordering::Greater,
    }
}
