//! Local: the in-process reference runtime.
//!
//! Objects live in one process-wide handle table. Handles are generational
//! slot keys, so a freed handle never aliases an object created later; using
//! one panics instead. The ambient-environment object is created on first
//! use and lives until the process exits.

use crate::ordered_store::OrderedStore;
use crate::raw::InfoRuntime;
use parking_lot::Mutex;
use slotmap::{DefaultKey, Key, SlotMap};
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Handle into the [`Local`] runtime's object table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RawInfo(DefaultKey);

impl RawInfo {
    /// The handle naming no object.
    pub fn null() -> Self {
        RawInfo(DefaultKey::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

struct Registry {
    objects: SlotMap<DefaultKey, OrderedStore>,
    env: DefaultKey,
}

impl Registry {
    fn new() -> Self {
        let mut objects = SlotMap::with_key();
        let mut store = OrderedStore::new();
        populate_env(&mut store);
        debug!(entries = store.len(), "initialised ambient environment info");
        let env = objects.insert(store);
        Self { objects, env }
    }

    fn object(&self, handle: RawInfo) -> &OrderedStore {
        match self.objects.get(handle.0) {
            Some(store) => store,
            None => panic!("invalid info handle: {:?}", handle),
        }
    }

    fn object_mut(&mut self, handle: RawInfo) -> &mut OrderedStore {
        match self.objects.get_mut(handle.0) {
            Some(store) => store,
            None => panic!("invalid info handle: {:?}", handle),
        }
    }
}

// Startup metadata describing how this process was launched.
fn populate_env(store: &mut OrderedStore) {
    let mut args = std::env::args();
    if let Some(command) = args.next() {
        store.set("command", &command);
    }
    let argv: Vec<String> = args.collect();
    if !argv.is_empty() {
        store.set("argv", &argv.join(" "));
    }
    store.set("maxprocs", "1");
    store.set("arch", std::env::consts::ARCH);
    if let Ok(dir) = std::env::current_dir() {
        store.set("wdir", &dir.to_string_lossy());
    }
    store.set("thread_level", "single");
}

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::new()));

/// In-process runtime backing [`Info`](crate::Info) by default.
///
/// The handle table is guarded by a single lock, so each operation is atomic
/// with respect to every other; sequences of operations are not.
#[derive(Copy, Clone, Debug, Default)]
pub struct Local;

impl Local {
    /// Whether `handle` names a live object.
    pub fn is_live(handle: RawInfo) -> bool {
        REGISTRY.lock().objects.contains_key(handle.0)
    }
}

impl InfoRuntime for Local {
    type Handle = RawInfo;

    const MAX_KEY_LEN: usize = 254;
    const MAX_VALUE_LEN: usize = 1023;

    fn null_handle() -> RawInfo {
        RawInfo::null()
    }

    fn env_handle() -> RawInfo {
        RawInfo(REGISTRY.lock().env)
    }

    fn create() -> RawInfo {
        let k = REGISTRY.lock().objects.insert(OrderedStore::new());
        trace!(handle = ?k, "created info object");
        RawInfo(k)
    }

    fn duplicate(handle: RawInfo) -> RawInfo {
        let mut reg = REGISTRY.lock();
        let copy = reg.object(handle).clone();
        let k = reg.objects.insert(copy);
        trace!(source = ?handle.0, handle = ?k, "duplicated info object");
        RawInfo(k)
    }

    fn free(handle: RawInfo) {
        assert!(!handle.is_null(), "the null info handle can't be freed");
        let mut reg = REGISTRY.lock();
        assert!(
            handle.0 != reg.env,
            "the ambient environment info object can't be freed"
        );
        if reg.objects.remove(handle.0).is_none() {
            panic!("invalid info handle: {:?}", handle);
        }
        trace!(handle = ?handle.0, "freed info object");
    }

    fn set(handle: RawInfo, key: &str, value: &str) {
        assert!(
            !key.is_empty() && key.len() <= Self::MAX_KEY_LEN,
            "info key length out of range: {}",
            key.len()
        );
        assert!(
            value.len() <= Self::MAX_VALUE_LEN,
            "info value too long: {}",
            value.len()
        );
        let added = REGISTRY.lock().object_mut(handle).set(key, value);
        trace!(handle = ?handle.0, key, added, "set info key");
    }

    fn delete(handle: RawInfo, key: &str) {
        let removed = REGISTRY.lock().object_mut(handle).remove(key).is_some();
        trace!(handle = ?handle.0, key, removed, "deleted info key");
    }

    fn get(handle: RawInfo, key: &str) -> Option<String> {
        REGISTRY.lock().object(handle).get(key).map(str::to_owned)
    }

    fn value_len(handle: RawInfo, key: &str) -> Option<usize> {
        REGISTRY.lock().object(handle).get(key).map(str::len)
    }

    fn key_count(handle: RawInfo) -> usize {
        REGISTRY.lock().object(handle).len()
    }

    fn nth_key(handle: RawInfo, n: usize) -> String {
        let reg = REGISTRY.lock();
        let store = reg.object(handle);
        match store.nth_key(n) {
            Some(key) => key.to_owned(),
            None => panic!(
                "info key position out of range: {} (key count {})",
                n,
                store.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: duplicate copies every entry; the copy is independent.
    #[test]
    fn duplicate_is_independent() {
        let a = Local::create();
        Local::set(a, "k", "v");
        let b = Local::duplicate(a);
        Local::set(b, "k", "w");
        Local::set(b, "k2", "x");
        assert_eq!(Local::get(a, "k").as_deref(), Some("v"));
        assert_eq!(Local::key_count(a), 1);
        assert_eq!(Local::key_count(b), 2);
        Local::free(a);
        Local::free(b);
    }

    /// Invariant: a freed handle is dead and is never reused for a new object.
    #[test]
    fn freed_handle_is_not_reused() {
        let a = Local::create();
        Local::free(a);
        assert!(!Local::is_live(a));
        let b = Local::create();
        assert_ne!(a, b);
        assert!(Local::is_live(b));
        Local::free(b);
    }

    /// Invariant: the null handle names no object and can't be freed.
    #[test]
    fn null_handle_is_not_freeable() {
        let null = Local::null_handle();
        assert!(null.is_null());
        assert!(!Local::is_live(null));
        let a = Local::create();
        assert!(!a.is_null());
        Local::free(a);
        let res = std::panic::catch_unwind(|| Local::free(null));
        assert!(res.is_err());
    }

    /// Invariant: using a freed handle panics.
    #[test]
    fn use_after_free_panics() {
        let a = Local::create();
        Local::free(a);
        let res = std::panic::catch_unwind(|| Local::key_count(a));
        assert!(res.is_err());
    }

    /// Invariant: the env object exists, carries startup metadata and can't be freed.
    #[test]
    fn env_is_populated_and_protected() {
        let env = Local::env_handle();
        assert!(Local::is_live(env));
        assert_eq!(Local::get(env, "maxprocs").as_deref(), Some("1"));
        assert_eq!(
            Local::get(env, "arch").as_deref(),
            Some(std::env::consts::ARCH)
        );
        let res = std::panic::catch_unwind(|| Local::free(env));
        assert!(res.is_err());
        assert!(Local::is_live(env));
    }

    /// Invariant: value_len agrees with get; both report absence alike.
    #[test]
    fn value_len_matches_get() {
        let a = Local::create();
        Local::set(a, "k", "hello");
        assert_eq!(Local::value_len(a, "k"), Some(5));
        assert_eq!(Local::value_len(a, "x"), None);
        assert_eq!(Local::get(a, "x"), None);
        Local::free(a);
    }

    /// Invariant: keys at the size limit are accepted; one byte more is rejected.
    #[test]
    fn key_length_limit() {
        let a = Local::create();
        let max = "k".repeat(Local::MAX_KEY_LEN);
        Local::set(a, &max, "v");
        assert!(Local::get(a, &max).is_some());
        let too_long = "k".repeat(Local::MAX_KEY_LEN + 1);
        let res = std::panic::catch_unwind(|| Local::set(a, &too_long, "v"));
        assert!(res.is_err());
        Local::free(a);
    }
}
