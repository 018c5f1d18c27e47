//! # Round-Trip and Partial-Match Correctness
//!
//! End-to-end checks of the core query guarantees: an all-wildcard
//! select returns exactly the inserted multiset, and a partial-match
//! select returns exactly the tuples whose non-wildcard fields match,
//! no matter how many bucket splits happened along the way.

use linhash::{AccessMode, Pattern, Relation, Tuple};
use tempfile::tempdir;

fn rel_name(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn full_attr0_chvec() -> String {
    // bit i of the combined hash = bit i of hash(attribute 0)
    (0..32).map(|b| format!("0:{}", b)).collect::<Vec<_>>().join(",")
}

fn select_sorted(rel: &mut Relation, pattern: &str) -> Vec<String> {
    let pattern = Pattern::parse(rel.nattrs(), pattern).unwrap();
    let mut scan = rel.select(&pattern).unwrap();
    let mut out = Vec::new();
    while let Some(t) = scan.next_tuple().unwrap() {
        out.push(t.as_str().to_string());
    }
    out.sort();
    out
}

#[test]
fn single_bucket_relation_round_trips() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "pairs");
    Relation::create(&name, 2, 1, 0, &full_attr0_chvec()).unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    rel.insert(&Tuple::parse(2, "x,1").unwrap()).unwrap();
    rel.insert(&Tuple::parse(2, "y,2").unwrap()).unwrap();

    assert_eq!(select_sorted(&mut rel, "?,?"), vec!["x,1", "y,2"]);
    assert_eq!(select_sorted(&mut rel, "x,?"), vec!["x,1"]);
    assert_eq!(select_sorted(&mut rel, "y,?"), vec!["y,2"]);
    assert_eq!(select_sorted(&mut rel, "z,?"), Vec::<String>::new());
}

#[test]
fn all_wildcard_select_returns_the_inserted_multiset() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "emps");
    Relation::create(&name, 3, 1, 0, "0:0,1:0,2:0,0:1,1:1,2:1").unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    let mut inserted = Vec::new();
    for i in 0..250 {
        let raw = format!("{},name{},dept{}", 1000 + i, i, i % 7);
        rel.insert(&Tuple::parse(3, &raw).unwrap()).unwrap();
        inserted.push(raw);
    }
    inserted.sort();

    // 250 inserts cross several splits (capacity is 33 for 3 attributes)
    assert!(rel.depth() >= 2);
    assert_eq!(select_sorted(&mut rel, "?,?,?"), inserted);
}

#[test]
fn partial_match_is_sound_and_complete_across_splits() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "emps");
    Relation::create(&name, 3, 1, 0, "0:0,1:0,2:0,0:1,1:1,2:1").unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    let mut inserted = Vec::new();
    for i in 0..200 {
        let raw = format!("{},name{},dept{}", i, i % 11, i % 5);
        rel.insert(&Tuple::parse(3, &raw).unwrap()).unwrap();
        inserted.push(raw);
    }

    for pattern_str in ["?,name3,?", "?,?,dept0", "7,?,?", "?,name2,dept4", "7,name7,dept2"] {
        let pattern = Pattern::parse(3, pattern_str).unwrap();
        let mut expected: Vec<String> = inserted
            .iter()
            .filter(|t| pattern.matches(t))
            .cloned()
            .collect();
        expected.sort();
        assert_eq!(
            select_sorted(&mut rel, pattern_str),
            expected,
            "pattern {}",
            pattern_str
        );
    }
}

#[test]
fn duplicate_tuples_are_returned_once_per_insertion() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "dups");
    Relation::create(&name, 2, 1, 0, "0:0,1:0").unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    let tuple = Tuple::parse(2, "same,same").unwrap();
    for _ in 0..3 {
        rel.insert(&tuple).unwrap();
    }
    assert_eq!(
        select_sorted(&mut rel, "same,?"),
        vec!["same,same", "same,same", "same,same"]
    );
}

#[test]
fn fully_known_pattern_scans_a_single_bucket() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "emps");
    Relation::create(&name, 2, 1, 0, "0:0,1:0,0:1,1:1,0:2,1:2").unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    let mut inserted = Vec::new();
    for i in 0..150 {
        let raw = format!("k{},v{}", i, i);
        rel.insert(&Tuple::parse(2, &raw).unwrap()).unwrap();
        inserted.push(raw);
    }
    assert!(rel.page_count() > 1);

    for raw in &inserted {
        let pattern = Pattern::parse(2, raw).unwrap();
        let mut scan = rel.select(&pattern).unwrap();
        assert_eq!(scan.candidates().len(), 1, "pattern {}", raw);
        let found = scan.next_tuple().unwrap();
        assert_eq!(found.map(|t| t.as_str().to_string()), Some(raw.clone()));
    }
}

#[test]
fn scan_yields_buckets_in_ascending_order() {
    let dir = tempdir().unwrap();
    let name = rel_name(&dir, "emps");
    Relation::create(&name, 2, 1, 0, "0:0,1:0,0:1,1:1").unwrap();
    let mut rel = Relation::open(&name, AccessMode::ReadWrite).unwrap();

    for i in 0..120 {
        rel.insert(&Tuple::parse(2, &format!("a{},b{}", i, i)).unwrap())
            .unwrap();
    }

    let pattern = Pattern::parse(2, "?,?").unwrap();
    let mut results = Vec::new();
    {
        let mut scan = rel.select(&pattern).unwrap();
        let candidates: Vec<u32> = scan.candidates().to_vec();
        assert!(candidates.windows(2).all(|w| w[0] < w[1]));
        while let Some(t) = scan.next_tuple().unwrap() {
            results.push(t);
        }
    }

    // tuples come back bucket by bucket, in ascending bucket order
    let mut last_bucket = 0;
    for tuple in &results {
        let bucket = rel.bucket_of(rel.combined_hash(tuple));
        assert!(bucket >= last_bucket);
        last_bucket = bucket;
    }
}
