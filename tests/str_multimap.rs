use arena_strmap::{Arena, Error, Payload, StrMultiMap, TableOptions};
use std::collections::BTreeMap;

fn sorted_pairs(m: &StrMultiMap<'_>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut v: Vec<_> = m.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect();
    v.sort();
    v
}

fn assert_matches_model(m: &StrMultiMap<'_>, model: &BTreeMap<Vec<u8>, Vec<Vec<u8>>>) {
    assert_eq!(m.key_count(), model.len());
    assert_eq!(m.value_count(), model.values().map(Vec::len).sum::<usize>());
    for (k, vals) in model {
        let got: Vec<Vec<u8>> = m.values_for(k).map(<[u8]>::to_vec).collect();
        assert_eq!(&got, vals);
    }
}

#[test]
fn lifo_order_per_key() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    m.insert(Payload::Static(b"x"), Payload::Static(b"1")).unwrap();
    m.insert(Payload::Static(b"x"), Payload::Static(b"2")).unwrap();
    let mut c = m.value_cursor(b"x");
    assert_eq!(c.next(&m), Some(&b"2"[..]));
    assert_eq!(c.next(&m), Some(&b"1"[..]));
    assert_eq!(c.next(&m), None);
    assert_eq!(m.value_count_for(b"x"), 2);
}

#[test]
fn counts_track_keys_and_values() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    for (k, v) in [("a", "1"), ("a", "2"), ("b", "1"), ("c", "1"), ("c", "2"), ("c", "3")] {
        m.insert(Payload::Static(k.as_bytes()), Payload::Static(v.as_bytes()))
            .unwrap();
    }
    assert_eq!(m.key_count(), 3);
    assert_eq!(m.value_count(), 6);
    assert_eq!(m.value_count_for(b"c"), 3);
    assert_eq!(m.value_count_for(b"zzz"), 0);

    assert!(m.delete_value(b"c", b"2"));
    assert_eq!(m.value_count(), 5);
    assert_eq!(m.value_count_for(b"c"), 2);
    assert!(!m.contains_value(b"c", b"2"));
    assert!(!m.iter().any(|(k, v)| k == b"c" && v == b"2"));
}

/// Invariant: the full cursor visits every pair exactly once, walking one
/// key's list to the end before moving on.
#[test]
fn full_cursor_groups_values_by_key() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    for k in 0..10u8 {
        for v in 0..=k {
            m.insert(Payload::Transient(&[k]), Payload::Transient(&[v]))
                .unwrap();
        }
    }
    let pairs: Vec<(u8, u8)> = m.iter().map(|(k, v)| (k[0], v[0])).collect();
    assert_eq!(pairs.len(), 55);

    let mut finished = Vec::new();
    let mut current = None;
    for &(k, _) in &pairs {
        if current != Some(k) {
            assert!(!finished.contains(&k), "key {k} visited in two runs");
            if let Some(prev) = current {
                finished.push(prev);
            }
            current = Some(k);
        }
    }
    for k in 0..10u8 {
        let vals: Vec<u8> = pairs.iter().filter(|p| p.0 == k).map(|p| p.1).collect();
        let expected: Vec<u8> = (0..=k).rev().collect();
        assert_eq!(vals, expected);
    }
}

#[test]
fn delete_value_compares_full_bytes() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    m.insert(Payload::Static(b"k"), Payload::Static(b"prefix")).unwrap();
    m.insert(Payload::Static(b"k"), Payload::Static(b"prefix-longer"))
        .unwrap();
    assert!(!m.delete_value(b"k", b"pre"));
    assert!(m.delete_value(b"k", b"prefix"));
    let left: Vec<_> = m.values_for(b"k").collect();
    assert_eq!(left, [&b"prefix-longer"[..]]);
}

#[test]
fn emptied_key_disappears() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    m.insert(Payload::Static(b"k"), Payload::Static(b"1")).unwrap();
    m.insert(Payload::Static(b"k"), Payload::Static(b"2")).unwrap();
    assert!(m.delete_value(b"k", b"1"));
    assert!(m.delete_value(b"k", b"2"));
    assert!(!m.contains_key(b"k"));
    assert_eq!(m.get(b"k"), None);
    assert_eq!(m.key_count(), 0);
    assert!(m.iter().next().is_none());

    // The key can come back with fresh values.
    m.insert(Payload::Static(b"k"), Payload::Static(b"3")).unwrap();
    assert_eq!(m.values_for(b"k").collect::<Vec<_>>(), [&b"3"[..]]);
}

#[test]
fn transient_values_are_copied() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    let mut key = b"a key longer than sixteen bytes".to_vec();
    let mut v1 = b"inline".to_vec();
    let mut v2 = b"a value that needs the arena".to_vec();
    m.insert(Payload::Transient(&key), Payload::Transient(&v1)).unwrap();
    m.insert(Payload::Transient(&key), Payload::Transient(&v2)).unwrap();
    key.fill(0);
    v1.fill(0);
    v2.fill(0);
    let got: Vec<_> = m.values_for(b"a key longer than sixteen bytes").collect();
    assert_eq!(got, [&b"a value that needs the arena"[..], b"inline"]);
}

#[test]
fn cursors_invalidated_by_mutation() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    m.insert(Payload::Static(b"a"), Payload::Static(b"1")).unwrap();
    m.insert(Payload::Static(b"b"), Payload::Static(b"1")).unwrap();

    let mut full = m.cursor();
    let mut one = m.value_cursor(b"a");
    assert!(full.next(&m).is_some());
    assert!(m.delete_value(b"b", b"1"));
    assert!(full.next(&m).is_none());
    assert!(one.next(&m).is_none());

    let mut full = m.cursor();
    m.insert(Payload::Static(b"a"), Payload::Static(b"2")).unwrap();
    assert!(full.next(&m).is_none());

    let mut full = m.cursor();
    m.delete_key(b"a");
    assert!(full.next(&m).is_none());
}

#[test]
fn rehash_preserves_lists() {
    let arena = Arena::new();
    let opts = TableOptions::new().capacity(4).load_factor(0.5);
    let mut m = StrMultiMap::with_options(&arena, 9, opts).unwrap();
    let mut model: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();
    for i in 0..64u32 {
        let k = format!("key-{}", i % 40).into_bytes();
        let v = format!("value-{i}").into_bytes();
        m.insert(Payload::Transient(&k), Payload::Transient(&v)).unwrap();
        model.entry(k).or_default().insert(0, v);
    }
    assert_eq!(m.key_count(), 40);
    assert_eq!(m.value_count(), 64);
    for (k, vals) in &model {
        let got: Vec<Vec<u8>> = m.values_for(k).map(<[u8]>::to_vec).collect();
        assert_eq!(&got, vals);
    }
    assert_matches_model(&m, &model);
    let mut expected: Vec<(Vec<u8>, Vec<u8>)> = model
        .iter()
        .flat_map(|(k, vs)| vs.iter().map(move |v| (k.clone(), v.clone())))
        .collect();
    expected.sort();
    assert_eq!(sorted_pairs(&m), expected);
}

#[test]
fn clear_then_reuse() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    for i in 0..8u8 {
        m.insert(Payload::Transient(&[i % 3]), Payload::Transient(&[i]))
            .unwrap();
    }
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.free_value_nodes(), 8);
    m.insert(Payload::Static(b"k"), Payload::Static(b"v")).unwrap();
    assert_eq!(m.free_value_nodes(), 7);
    assert_eq!(sorted_pairs(&m), [(b"k".to_vec(), b"v".to_vec())]);
}

#[test]
fn keys_iterates_distinct_keys() {
    let arena = Arena::new();
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    for (k, v) in [("a", "1"), ("a", "2"), ("b", "1")] {
        m.insert(Payload::Static(k.as_bytes()), Payload::Static(v.as_bytes()))
            .unwrap();
    }
    let mut keys: Vec<_> = m.keys().collect();
    keys.sort();
    assert_eq!(keys, [&b"a"[..], b"b"]);
}

/// Invariant: an insert the arena cannot satisfy changes nothing, whether it
/// was adding a new key or appending to an existing one.
#[test]
fn arena_exhaustion_preserves_lists() {
    let arena = Arena::with_capacity(4096);
    let mut m = StrMultiMap::new(&arena, 9).unwrap();
    let mut model: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();

    let mut err = None;
    for i in 0..10_000u32 {
        let k = format!("a key long enough to need the arena {i}").into_bytes();
        let v = format!("a value long enough to need the arena {i}").into_bytes();
        match m.insert(Payload::Transient(&k), Payload::Transient(&v)) {
            Ok(()) => model.entry(k).or_default().insert(0, v),
            Err(e) => {
                assert!(!m.contains_key(&k));
                err = Some(e);
                break;
            }
        }
    }
    assert!(matches!(err, Some(Error::ArenaExhausted { .. })));
    assert!(!model.is_empty());
    assert_matches_model(&m, &model);

    let first = model.keys().next().cloned().unwrap();
    let mut err = None;
    for i in 0..10_000u32 {
        let v = format!("an appended value that also needs the arena {i}").into_bytes();
        match m.insert(Payload::Transient(&first), Payload::Transient(&v)) {
            Ok(()) => model.get_mut(&first).unwrap().insert(0, v),
            Err(e) => {
                assert!(!m.contains_value(&first, &v));
                err = Some(e);
                break;
            }
        }
    }
    assert!(matches!(err, Some(Error::ArenaExhausted { .. })));
    assert_matches_model(&m, &model);

    // Inline values need no arena memory, so appends still work.
    m.insert(Payload::Transient(&first), Payload::Transient(b"short"))
        .unwrap();
    assert_eq!(m.get(&first), Some(&b"short"[..]));
    assert_eq!(m.value_count_for(&first), model[&first].len() + 1);
}
