use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rank_forest::RankTree;

fn avl_height_bound(n: usize) -> i32 {
    (1.44 * ((n + 2) as f64).log2()).ceil() as i32
}

#[test]
fn weighted_fixture_sums_heights_and_ranks() {
    let mut tree = RankTree::new();

    let node = tree.insert(8, 10);
    assert_eq!(tree.root(), Some(node));
    assert_eq!(tree.min(), 8);
    assert_eq!(tree.max(), 8);
    assert_eq!(tree.sum(), 10);
    assert_eq!(tree.height(), 1);

    let node = tree.insert(9, 12);
    assert_eq!(tree.node(node).height, 1);
    assert_eq!(tree.sum(), 22);
    assert_eq!(tree.height(), 2);

    tree.insert(7, 5);
    assert_eq!(tree.sum(), 27);

    tree.insert(6, 5);
    assert_eq!(tree.sum(), 32);
    assert_eq!(tree.height(), 3);

    tree.insert(10, 6);
    assert_eq!(tree.sum(), 38);
    assert_eq!(tree.height(), 3);

    assert_eq!(tree.count_less_than(10), 32);
    assert_eq!(tree.count_less_than(9), 20);
    assert_eq!(tree.count_less_than(8), 10);
    assert_eq!(tree.count_less_than(7), 5);
    assert_eq!(tree.count_less_than(6), 0);

    assert!(tree.remove(7));
    assert_eq!(tree.sum(), 33);
    assert_eq!(tree.height(), 3);

    assert!(tree.remove(10));
    assert_eq!(tree.sum(), 27);
    assert_eq!(tree.height(), 2);

    assert!(tree.remove(8));
    assert_eq!(tree.sum(), 17);
    assert_eq!(tree.height(), 2);

    tree.assert_valid().unwrap();
}

#[test]
fn descending_inserts_stay_balanced() {
    let mut tree = RankTree::new();

    tree.insert_key(100);
    tree.insert_key(99);
    assert_eq!(tree.height(), 2);

    tree.insert_key(98);
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.node(tree.root().unwrap()).key, 99);

    tree.insert_key(97);
    tree.insert_key(96);
    assert_eq!(tree.height(), 3);

    tree.insert_key(95);
    assert_eq!(tree.height(), 3);
    assert_eq!(tree.node(tree.root().unwrap()).key, 97);

    tree.assert_valid().unwrap();
}

#[test]
fn min_tracks_removals() {
    let mut tree = RankTree::new();
    for key in [8, 6, 7, 5, 10] {
        tree.insert_key(key);
    }

    for expected in [5, 6, 7, 8, 10] {
        assert_eq!(tree.min(), expected);
        assert!(tree.remove(expected));
    }
    assert!(tree.is_empty());
}

#[test]
fn seeded_shuffle_keeps_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let src: Vec<isize> = (0..100).collect();

    let mut insert = src.clone();
    insert.shuffle(&mut rng);

    let mut tree = RankTree::new();
    for (i, key) in insert.iter().enumerate() {
        tree.insert_key(*key);
        assert_eq!(tree.sum(), (i + 1) as isize);
        assert!(tree.height() <= avl_height_bound(i + 1));
        tree.assert_valid().unwrap();
    }

    assert_eq!(tree.min(), 0);
    assert_eq!(tree.max(), 99);
    assert_eq!(tree.count_less_than(50), 50);

    let mut remove = src;
    remove.shuffle(&mut rng);
    for (i, key) in remove.iter().enumerate() {
        assert!(tree.remove(*key));
        let left = 100 - i - 1;
        assert_eq!(tree.sum(), left as isize);
        if left > 0 {
            assert!(tree.height() <= avl_height_bound(left));
        }
        tree.assert_valid().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn interleaved_weighted_operations_keep_sums() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut tree = RankTree::new();
    let mut live: Vec<(isize, isize)> = Vec::new();

    let mut keys: Vec<isize> = (0..64).collect();
    keys.shuffle(&mut rng);

    for (round, key) in keys.iter().enumerate() {
        let weight = (key % 7) + 1;
        tree.insert(*key, weight);
        live.push((*key, weight));

        if round % 3 == 2 {
            let victim = live.remove(round % live.len());
            assert!(tree.remove(victim.0));
        }

        let expected: isize = live.iter().map(|(_, w)| w).sum();
        assert_eq!(tree.sum(), expected);
        tree.assert_valid().unwrap();
    }

    let below: isize = live
        .iter()
        .filter(|(k, _)| *k < 32)
        .map(|(_, w)| w)
        .sum();
    assert_eq!(tree.count_less_than(32), below);
}
