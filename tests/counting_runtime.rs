// Call-pattern tests through a recording runtime.
//
// `Recording` forwards every call to `Local` and logs it per thread. The
// tests check the round-trip shapes the container promises:
// - equality short-circuits on a size mismatch without reading content;
// - lookups compare keys only and never fetch values;
// - range erase, merge and erase_if enumerate everything before deleting;
// - clear always deletes the key currently at position 0;
// - drop frees owned handles only.
use info_hints::{erase_if, Info, InfoRuntime, Local, RawInfo};
use std::cell::RefCell;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Create,
    Duplicate,
    Free,
    Set(String),
    Delete(String),
    Get,
    ValueLen,
    KeyCount,
    Nth(usize),
}

thread_local! {
    static LOG: RefCell<Vec<(RawInfo, Call)>> = const { RefCell::new(Vec::new()) };
}

fn record(h: RawInfo, c: Call) {
    LOG.with(|l| l.borrow_mut().push((h, c)));
}

fn reset() {
    LOG.with(|l| l.borrow_mut().clear());
}

fn calls() -> Vec<(RawInfo, Call)> {
    LOG.with(|l| l.borrow().clone())
}

struct Recording;

impl InfoRuntime for Recording {
    type Handle = RawInfo;

    const MAX_KEY_LEN: usize = Local::MAX_KEY_LEN;
    const MAX_VALUE_LEN: usize = Local::MAX_VALUE_LEN;

    fn null_handle() -> RawInfo {
        Local::null_handle()
    }
    fn env_handle() -> RawInfo {
        Local::env_handle()
    }
    fn create() -> RawInfo {
        let h = Local::create();
        record(h, Call::Create);
        h
    }
    fn duplicate(handle: RawInfo) -> RawInfo {
        record(handle, Call::Duplicate);
        Local::duplicate(handle)
    }
    fn free(handle: RawInfo) {
        record(handle, Call::Free);
        Local::free(handle)
    }
    fn set(handle: RawInfo, key: &str, value: &str) {
        record(handle, Call::Set(key.to_owned()));
        Local::set(handle, key, value)
    }
    fn delete(handle: RawInfo, key: &str) {
        record(handle, Call::Delete(key.to_owned()));
        Local::delete(handle, key)
    }
    fn get(handle: RawInfo, key: &str) -> Option<String> {
        record(handle, Call::Get);
        Local::get(handle, key)
    }
    fn value_len(handle: RawInfo, key: &str) -> Option<usize> {
        record(handle, Call::ValueLen);
        Local::value_len(handle, key)
    }
    fn key_count(handle: RawInfo) -> usize {
        record(handle, Call::KeyCount);
        Local::key_count(handle)
    }
    fn nth_key(handle: RawInfo, n: usize) -> String {
        record(handle, Call::Nth(n));
        Local::nth_key(handle, n)
    }
}

type RInfo = Info<Recording>;

fn build(pairs: &[(&str, &str)]) -> RInfo {
    let mut info = RInfo::empty();
    info.insert_or_assign_all(pairs.iter().copied());
    info
}

fn index_of(log: &[(RawInfo, Call)], pred: impl Fn(&Call) -> bool) -> Vec<usize> {
    log.iter()
        .enumerate()
        .filter(|(_, (_, c))| pred(c))
        .map(|(i, _)| i)
        .collect()
}

// Test: equality short-circuit.
// Verifies: differing sizes return false after two key counts, no content reads.
#[test]
fn equality_short_circuits_on_size() {
    let a = build(&[("a", "1"), ("b", "2")]);
    let b = build(&[("a", "1")]);
    reset();
    assert!(a != b);
    let log = calls();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|(_, c)| *c == Call::KeyCount));
}

// Test: equality compares value lengths before contents.
// Verifies: a length mismatch answers false without fetching either value.
#[test]
fn equality_checks_length_before_content() {
    let a = build(&[("a", "short")]);
    let b = build(&[("a", "longer value")]);
    reset();
    assert!(a != b);
    assert!(index_of(&calls(), |c| *c == Call::Get).is_empty());
}

// Test: lookup is a key scan.
// Verifies: find/contains/position_of never fetch values.
#[test]
fn lookup_never_reads_values() {
    let info = build(&[("a", "1"), ("b", "2"), ("c", "3")]);
    reset();
    assert_eq!(info.find("c").map(|c| c.position()), Some(2));
    assert!(!info.contains("zz"));
    assert_eq!(info.count("b"), 1);
    let log = calls();
    assert!(index_of(&log, |c| *c == Call::Get).is_empty());
    assert!(!index_of(&log, |c| matches!(c, Call::Nth(_))).is_empty());
}

// Test: two-phase range erase.
// Verifies: every positional read precedes the first delete.
#[test]
fn erase_range_snapshots_before_deleting() {
    let mut info = build(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
    reset();
    info.erase_range(1..4);
    let log = calls();
    let nth = index_of(&log, |c| matches!(c, Call::Nth(_)));
    let del = index_of(&log, |c| matches!(c, Call::Delete(_)));
    assert_eq!(nth.len(), 3);
    assert_eq!(del.len(), 3);
    assert!(nth.iter().max() < del.iter().min());
    drop(log);
    assert_eq!(info.keys(), ["a"]);
}

// Test: clear deletes from the front.
// Verifies: every positional read during clear asks for position 0.
#[test]
fn clear_always_reads_position_zero() {
    let mut info = build(&[("a", "1"), ("b", "2"), ("c", "3")]);
    reset();
    info.clear();
    let log = calls();
    let positions: Vec<usize> = log
        .iter()
        .filter_map(|(_, c)| match c {
            Call::Nth(n) => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(positions, [0, 0, 0]);
    assert!(info.is_empty());
}

// Test: two-phase merge.
// Verifies: no delete on the source happens before the last set on the target.
#[test]
fn merge_copies_before_deleting_from_source() {
    let mut target = build(&[("a", "1")]);
    let mut source = build(&[("a", "x"), ("b", "2"), ("c", "3")]);
    let (t, s) = (target.as_raw(), source.as_raw());
    reset();
    target.merge(&mut source);
    let log = calls();
    let sets: Vec<usize> = log
        .iter()
        .enumerate()
        .filter(|(_, (h, c))| *h == t && matches!(c, Call::Set(_)))
        .map(|(i, _)| i)
        .collect();
    let deletes: Vec<usize> = log
        .iter()
        .enumerate()
        .filter(|(_, (h, c))| *h == s && matches!(c, Call::Delete(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(sets.len(), 2);
    assert_eq!(deletes.len(), 2);
    assert!(sets.iter().max() < deletes.iter().min());
    assert_eq!(source.keys(), ["a"]);
    assert_eq!(target.at("a").unwrap(), "1");
}

// Test: two-phase predicate erase.
// Verifies: the predicate pass finishes before the first delete.
#[test]
fn erase_if_snapshots_before_deleting() {
    let mut info = build(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
    reset();
    let removed = erase_if(&mut info, |_, v| v.parse::<u32>().unwrap() % 2 == 0);
    assert_eq!(removed, 2);
    let log = calls();
    let nth = index_of(&log, |c| matches!(c, Call::Nth(_)));
    let del = index_of(&log, |c| matches!(c, Call::Delete(_)));
    assert!(nth.iter().max() < del.iter().min());
    drop(log);
    assert_eq!(info.keys(), ["a", "c"]);
}

// Test: lifecycle calls.
// Verifies: clone duplicates, drop frees owned handles, wrapped handles are not freed,
// and take issues no runtime call at all.
#[test]
fn lifecycle_calls() {
    reset();
    let mut a = RInfo::empty();
    let b = a.clone();
    let moved = a.take();
    let log = calls();
    assert_eq!(
        log.iter().map(|(_, c)| c.clone()).collect::<Vec<_>>(),
        [Call::Create, Call::Duplicate]
    );

    reset();
    drop(moved);
    drop(b);
    drop(a);
    let frees = index_of(&calls(), |c| *c == Call::Free);
    assert_eq!(frees.len(), 2);

    let raw = Local::create();
    reset();
    drop(RInfo::from_raw(raw, false));
    assert!(index_of(&calls(), |c| *c == Call::Free).is_empty());
    Local::free(raw);
}
