mod common;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use art_store::{LiteTable, Table};

use common::{addr, pfx, random_addr, random_pfx};

#[test]
fn membership() {
    common::init();
    let mut set = LiteTable::new();
    assert!(!set.insert(pfx("10.0.0.0/8")));
    assert!(!set.insert(pfx("10.0.0.0/24")));
    assert!(!set.insert(pfx("::/0")));
    // re-insertion reports the prefix was already there
    assert!(set.insert(pfx("10.0.0.0/8")));
    assert_eq!(set.len(), 3);
    assert_eq!(set.len4(), 2);
    assert_eq!(set.len6(), 1);

    assert!(set.get(pfx("10.0.0.0/8")));
    assert!(!set.get(pfx("10.0.0.0/16")));

    assert!(set.remove(pfx("10.0.0.0/24")));
    assert!(!set.remove(pfx("10.0.0.0/24")));
    assert_eq!(set.len(), 2);
}

#[test]
fn lpm() {
    common::init();
    let mut set = LiteTable::new();
    set.insert(pfx("10.0.0.0/8"));
    set.insert(pfx("10.0.0.0/24"));

    assert!(set.contains(&addr("10.0.0.1")));
    assert!(set.contains(&addr("10.9.9.9")));
    assert!(!set.contains(&addr("11.0.0.1")));

    // lookup reports the matched prefix itself
    assert_eq!(set.lookup(&addr("10.0.0.1")), Some(pfx("10.0.0.0/24")));
    assert_eq!(set.lookup(&addr("10.9.9.9")), Some(pfx("10.0.0.0/8")));
    assert_eq!(set.lookup(&addr("11.0.0.1")), None);

    assert!(set.lookup_prefix(pfx("10.0.0.0/26")));
    assert_eq!(
        set.lookup_prefix_lpm(pfx("10.0.0.0/26")),
        Some(pfx("10.0.0.0/24"))
    );
    assert_eq!(
        set.lookup_prefix_lpm(pfx("10.128.0.0/9")),
        Some(pfx("10.0.0.0/8"))
    );
    assert!(!set.lookup_prefix(pfx("11.0.0.0/8")));
}

#[test]
fn iteration_and_sets() {
    common::init();
    let mut set = LiteTable::new();
    set.insert(pfx("10.0.0.0/8"));
    set.insert(pfx("9.0.0.0/8"));
    set.insert(pfx("10.0.0.0/16"));
    set.insert(pfx("2001:db8::/32"));

    let sorted: Vec<_> = set.iter_sorted().collect();
    assert_eq!(
        sorted,
        vec![
            pfx("9.0.0.0/8"),
            pfx("10.0.0.0/8"),
            pfx("10.0.0.0/16"),
            pfx("2001:db8::/32"),
        ]
    );
    assert_eq!(set.iter().count(), 4);

    let subs: Vec<_> = set.subnets(pfx("10.0.0.0/8")).collect();
    assert_eq!(subs, vec![pfx("10.0.0.0/8"), pfx("10.0.0.0/16")]);

    let sups: Vec<_> = set.supernets(pfx("10.0.0.0/16")).collect();
    assert_eq!(sups, vec![pfx("10.0.0.0/16"), pfx("10.0.0.0/8")]);

    assert!(set.overlaps_prefix(pfx("10.0.1.0/24")));
    assert!(!set.overlaps_prefix(pfx("11.0.0.0/8")));

    let mut other = LiteTable::new();
    other.insert(pfx("10.0.0.0/16"));
    other.insert(pfx("172.16.0.0/12"));
    assert!(set.overlaps(&other));
    set.union(&other);
    assert_eq!(set.len(), 5);
}

// The prefix set must behave exactly like a value table with the values
// ignored.
#[test]
fn agrees_with_table() {
    common::init();
    let mut rng = StdRng::seed_from_u64(99);
    let mut set = LiteTable::new();
    let mut table = Table::new();

    let mut keys = Vec::new();
    for _ in 0..1_000 {
        let p = random_pfx(&mut rng);
        assert_eq!(set.insert(p), table.insert(p, ()).is_some());
        keys.push(p);
    }
    keys.shuffle(&mut rng);
    for p in keys.iter().take(300) {
        assert_eq!(set.remove(*p), table.remove(*p).is_some());
    }

    assert_eq!(set.len(), table.len());
    for _ in 0..1_000 {
        let a = random_addr(&mut rng);
        assert_eq!(set.contains(&a), table.contains(&a));
    }
    for _ in 0..300 {
        let q = random_pfx(&mut rng);
        assert_eq!(set.get(q), table.get(q).is_some());
        assert_eq!(
            set.lookup_prefix_lpm(q),
            table.lookup_prefix_lpm(q).map(|(p, _)| p)
        );
        assert_eq!(set.overlaps_prefix(q), table.overlaps_prefix(q));
        assert_eq!(
            set.subnets(q).collect::<Vec<_>>(),
            table.subnets(q).map(|(p, _)| p).collect::<Vec<_>>()
        );
    }
    assert_eq!(
        set.iter_sorted().collect::<Vec<_>>(),
        table.iter_sorted().map(|(p, _)| p).collect::<Vec<_>>()
    );
}

#[test]
fn persist_variants() {
    common::init();
    let set = LiteTable::new();
    let set = set.insert_persist(pfx("10.0.0.0/8"));
    let set = set.insert_persist(pfx("10.0.0.0/16"));
    assert_eq!(set.len(), 2);

    let (smaller, existed) = set.remove_persist(pfx("10.0.0.0/16"));
    assert!(existed);
    assert_eq!(set.len(), 2);
    assert_eq!(smaller.len(), 1);
    assert!(set.get(pfx("10.0.0.0/16")));
    assert!(!smaller.get(pfx("10.0.0.0/16")));
}
