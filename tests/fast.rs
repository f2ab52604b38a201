mod common;

use std::error::Error;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use art_store::{FastTable, ModifyResult, Prefix, Table};

use common::{addr, pfx, random_addr, random_pfx};

#[test]
fn lpm_v4() -> Result<(), Box<dyn Error>> {
    common::init();
    let mut table = FastTable::new();
    table.insert(pfx("10.0.0.0/8"), "a");
    table.insert(pfx("10.0.0.0/24"), "b");
    table.insert(pfx("10.0.1.0/24"), "c");
    table.insert(pfx("0.0.0.0/0"), "d");

    assert_eq!(table.lookup(&addr("10.0.0.5")), Some(&"b"));
    assert_eq!(table.lookup(&addr("10.0.1.5")), Some(&"c"));
    assert_eq!(table.lookup(&addr("10.1.0.5")), Some(&"a"));
    assert_eq!(table.lookup(&addr("11.0.0.1")), Some(&"d"));

    let probe = Prefix::new_relaxed(addr("10.20.30.40"), 25)?;
    assert_eq!(
        table.lookup_prefix_lpm(probe),
        Some((pfx("10.0.0.0/8"), &"a"))
    );

    assert_eq!(table.remove(pfx("10.0.0.0/24")), Some("b"));
    assert_eq!(table.lookup(&addr("10.0.0.5")), Some(&"a"));
    Ok(())
}

// The allotment machinery reshuffles value pointers on every insert,
// overwrite and remove within one node; hammer exactly that: many
// prefixes of different lengths in the same /16 so they all land in the
// same two strides.
#[test]
fn dense_sibling_routes() {
    common::init();
    let mut table = FastTable::new();
    for len in 9..=16u8 {
        let p =
            Prefix::new(addr("10.0.0.0"), len).unwrap();
        table.insert(p, len as u32);
    }
    // 10.0.x covered by all of them, the /16 wins
    assert_eq!(table.lookup(&addr("10.0.255.255")), Some(&16));
    // 10.1.x is outside the /16 but inside the /15
    assert_eq!(table.lookup(&addr("10.1.0.0")), Some(&15));
    // 10.64.x only the /9 covers
    assert_eq!(table.lookup(&addr("10.64.0.1")), Some(&9));
    assert_eq!(table.lookup(&addr("11.0.0.1")), None);

    // overwrite in the middle and check the allotted routes moved
    assert_eq!(
        table.insert(Prefix::new(addr("10.0.0.0"), 15).unwrap(), 150),
        Some(15)
    );
    assert_eq!(table.lookup(&addr("10.1.0.0")), Some(&150));

    // removal hands the range back to the next shorter route
    assert_eq!(
        table.remove(Prefix::new(addr("10.0.0.0"), 15).unwrap()),
        Some(150)
    );
    assert_eq!(table.lookup(&addr("10.1.0.0")), Some(&14));
    assert_eq!(table.len(), 7);
}

#[test]
fn modify_state_machine() {
    common::init();
    let mut table = FastTable::new();
    assert_eq!(
        table.modify(pfx("2001:db8::/32"), |_| None),
        ModifyResult::Unchanged
    );
    assert_eq!(
        table.modify(pfx("2001:db8::/32"), |_| Some(1)),
        ModifyResult::Inserted
    );
    assert_eq!(
        table.modify(pfx("2001:db8::/32"), |c| c.map(|v| v + 1)),
        ModifyResult::Updated(1)
    );
    assert_eq!(
        table.modify(pfx("2001:db8::/32"), |_| None),
        ModifyResult::Removed(2)
    );
    assert!(table.is_empty());
}

// The two representations must agree on everything; drive them through
// the same random workload and compare all observable behavior.
#[test]
fn agrees_with_compressed_table() {
    common::init();
    let mut rng = StdRng::seed_from_u64(1234);
    let mut fast = FastTable::new();
    let mut compressed = Table::new();

    let mut keys = Vec::new();
    for i in 0..1_500u32 {
        let p = random_pfx(&mut rng);
        assert_eq!(fast.insert(p, i), compressed.insert(p, i));
        keys.push(p);
    }
    // mixed removals, including misses
    keys.shuffle(&mut rng);
    for p in keys.iter().take(500) {
        assert_eq!(fast.remove(*p), compressed.remove(*p));
        assert_eq!(fast.remove(*p), compressed.remove(*p));
    }

    assert_eq!(fast.len(), compressed.len());
    assert_eq!(fast.len4(), compressed.len4());
    assert_eq!(fast.len6(), compressed.len6());

    for _ in 0..2_000 {
        let a = random_addr(&mut rng);
        assert_eq!(fast.contains(&a), compressed.contains(&a), "{}", a);
        assert_eq!(fast.lookup(&a), compressed.lookup(&a), "{}", a);
    }

    for _ in 0..500 {
        let q = random_pfx(&mut rng);
        assert_eq!(fast.get(q), compressed.get(q));
        assert_eq!(fast.lookup_prefix_lpm(q), compressed.lookup_prefix_lpm(q));
        assert_eq!(fast.overlaps_prefix(q), compressed.overlaps_prefix(q));
        assert_eq!(
            fast.subnets(q).collect::<Vec<_>>(),
            compressed.subnets(q).collect::<Vec<_>>()
        );
        assert_eq!(
            fast.supernets(q).collect::<Vec<_>>(),
            compressed.supernets(q).collect::<Vec<_>>()
        );
    }

    assert_eq!(
        fast.iter_sorted().collect::<Vec<_>>(),
        compressed.iter_sorted().collect::<Vec<_>>()
    );
}

#[test]
fn union_and_overlaps() {
    common::init();
    let mut rng = StdRng::seed_from_u64(77);

    let mut a = FastTable::new();
    let mut b = FastTable::new();
    let mut a_model = Table::new();
    let mut b_model = Table::new();
    for i in 0..300u32 {
        let p = random_pfx(&mut rng);
        if rng.gen_bool(0.5) {
            a.insert(p, i);
            a_model.insert(p, i);
        } else {
            b.insert(p, i);
            b_model.insert(p, i);
        }
    }

    assert_eq!(a.overlaps(&b), a_model.overlaps(&b_model));

    a.union(&b);
    a_model.union(&b_model);
    assert_eq!(a.len(), a_model.len());
    assert_eq!(
        a.iter_sorted().collect::<Vec<_>>(),
        a_model.iter_sorted().collect::<Vec<_>>()
    );
}

#[test]
fn structural_equality() {
    common::init();
    let mut a = FastTable::new();
    let mut b = FastTable::new();
    a.insert(pfx("10.0.0.0/8"), 1);
    a.insert(pfx("10.1.0.0/16"), 2);
    b.insert(pfx("10.1.0.0/16"), 2);
    b.insert(pfx("10.0.0.0/8"), 1);
    assert_eq!(a, b);

    b.insert(pfx("10.1.0.0/16"), 3);
    assert_ne!(a, b);
}
