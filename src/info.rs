//! Info: an owning, map-like wrapper around one runtime key/value object.

use crate::assert::info_assert;
use crate::cursor::{read_entry, Cursor, CursorMut, Iter, IterMut};
use crate::error::InfoError;
use crate::local::Local;
use crate::proxy::ValueProxy;
use crate::raw::InfoRuntime;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Bound, RangeBounds};
use std::sync::OnceLock;
use tracing::trace;

/// Map-like container over a runtime key/value object.
///
/// Keys are unique, non-empty strings; every key has exactly one string
/// value. Enumeration order is whatever the runtime uses and is only stable
/// between mutations; lookups scan that order linearly (O(len) runtime round
/// trips), since the handle offers no keyed index beyond `get`.
///
/// An `Info` either owns its handle (`is_freeable() == true`, the handle is
/// freed on drop) or merely wraps one owned elsewhere. [`take`](Info::take)
/// leaves the source in the moved-from state: a null handle that only
/// supports lifecycle operations (drop, assignment, `take`, `swap`,
/// `is_null`).
///
/// Any mutation may renumber positions, invalidating every outstanding
/// [`Cursor`] and [`CursorMut`] into the object.
pub struct Info<R: InfoRuntime = Local> {
    raw: R::Handle,
    freeable: bool,
    _runtime: PhantomData<fn() -> R>,
}

impl Info<Local> {
    /// Create an empty, owned object in the [`Local`] runtime.
    pub fn new() -> Self {
        Self::empty()
    }

    /// The process-wide wrapper around the ambient-environment object.
    ///
    /// Non-freeable; the object it wraps is never released.
    pub fn env() -> &'static Info<Local> {
        static ENV: OnceLock<Info<Local>> = OnceLock::new();
        ENV.get_or_init(|| Info::from_raw(Local::env_handle(), false))
    }
}

impl<R: InfoRuntime> Info<R> {
    /// Create an empty, owned object in runtime `R`.
    pub fn empty() -> Self {
        Self {
            raw: R::create(),
            freeable: true,
            _runtime: PhantomData,
        }
    }

    /// Wrap an existing handle. With `freeable`, this wrapper releases the
    /// handle on drop; the null and ambient-environment handles must never
    /// be marked freeable.
    pub fn from_raw(raw: R::Handle, freeable: bool) -> Self {
        info_assert!(
            !(freeable && raw == R::null_handle()),
            "the null info handle can't be marked freeable"
        );
        info_assert!(
            !(freeable && raw == R::env_handle()),
            "the ambient environment info handle can't be marked freeable"
        );
        Self {
            raw,
            freeable,
            _runtime: PhantomData,
        }
    }

    /// Move the content out, leaving `self` in the moved-from state. No
    /// handle is created or released.
    pub fn take(&mut self) -> Self {
        let taken = Self {
            raw: self.raw,
            freeable: self.freeable,
            _runtime: PhantomData,
        };
        self.raw = R::null_handle();
        self.freeable = false;
        taken
    }

    /// Replace the content with `iter` (last duplicate wins). `self` ends up
    /// owning a fresh object; a previously owned one is released.
    pub fn assign<I, K, V>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.release();
        self.raw = R::create();
        self.freeable = true;
        self.insert_or_assign_all(iter);
    }

    fn release(&mut self) {
        if self.freeable && self.raw != R::null_handle() && self.raw != R::env_handle() {
            R::free(self.raw);
        } else {
            trace!(handle = ?self.raw, "not releasing non-owned info handle");
        }
        self.raw = R::null_handle();
        self.freeable = false;
    }

    /// The wrapped handle.
    pub fn as_raw(&self) -> R::Handle {
        self.raw
    }

    /// Whether this wrapper releases its handle on drop.
    pub fn is_freeable(&self) -> bool {
        self.freeable
    }

    /// True in the moved-from state.
    pub fn is_null(&self) -> bool {
        self.raw == R::null_handle()
    }

    fn check_live(&self) {
        info_assert!(!self.is_null(), "*this is in the moved-from state");
    }

    fn check_key(key: &str) {
        info_assert!(!key.is_empty(), "info keys must not be empty");
        info_assert!(
            key.len() <= R::MAX_KEY_LEN,
            "info key too long: max. size: {}, provided size: {}",
            R::MAX_KEY_LEN,
            key.len()
        );
    }

    fn check_value(value: &str) {
        info_assert!(
            value.len() <= R::MAX_VALUE_LEN,
            "info value too long: max. size: {}, provided size: {}",
            R::MAX_VALUE_LEN,
            value.len()
        );
    }

    fn check_position(&self, pos: usize, len: usize) {
        info_assert!(
            pos < len,
            "out-of-bounds access: legal interval [0, {}), requested position {}",
            len,
            pos
        );
    }

    // Position of `key` in the current enumeration order, or `len`.
    fn find_pos(&self, key: &str, len: usize) -> usize {
        (0..len)
            .find(|&i| R::nth_key(self.raw, i) == key)
            .unwrap_or(len)
    }

    fn key_exists(&self, key: &str) -> bool {
        R::value_len(self.raw, key).is_some()
    }

    // ---- iteration ----

    /// Cursor at the first position.
    pub fn cursor_front(&self) -> Cursor<'_, R> {
        self.check_live();
        Cursor::new(self.raw, 0)
    }

    /// Cursor one past the last position.
    pub fn cursor_end(&self) -> Cursor<'_, R> {
        self.check_live();
        Cursor::new(self.raw, self.len())
    }

    /// Mutable cursor at the first position.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, R> {
        self.check_live();
        CursorMut::new(self.raw, 0)
    }

    /// Mutable cursor one past the last position.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, R> {
        self.check_live();
        let len = self.len();
        CursorMut::new(self.raw, len)
    }

    /// Iterate `(key, value)` pairs in enumeration order.
    pub fn iter(&self) -> Iter<'_, R> {
        self.check_live();
        Iter::new(self.raw, self.len())
    }

    /// Iterate `(key, ValueProxy)` pairs in enumeration order.
    pub fn iter_mut(&mut self) -> IterMut<'_, R> {
        self.check_live();
        let len = self.len();
        IterMut::new(self.raw, len)
    }

    /// Snapshot of all keys; index `i` pairs with index `i` of [`values`].
    ///
    /// [`values`]: Info::values
    pub fn keys(&self) -> Vec<String> {
        self.check_live();
        (0..self.len()).map(|i| R::nth_key(self.raw, i)).collect()
    }

    /// Snapshot of all values, in the same order as [`keys`](Info::keys).
    pub fn values(&self) -> Vec<String> {
        self.iter().map(|(_, v)| v).collect()
    }

    // ---- capacity ----

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.check_live();
        R::key_count(self.raw)
    }

    /// Upper bound on the number of entries, imposed by signed positions.
    pub fn max_size(&self) -> usize {
        isize::MAX as usize
    }

    // ---- element access ----

    /// Accessor for an existing key.
    pub fn at_mut(&mut self, key: &str) -> Result<ValueProxy<'_, R>, InfoError> {
        self.check_live();
        Self::check_key(key);
        if !self.key_exists(key) {
            return Err(InfoError::key_not_found(key));
        }
        Ok(ValueProxy::new(self.raw, key.to_owned()))
    }

    /// Copy of the value stored under `key`.
    pub fn at(&self, key: &str) -> Result<String, InfoError> {
        self.get(key).ok_or_else(|| InfoError::key_not_found(key))
    }

    /// Copy of the value stored under `key`, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.check_live();
        Self::check_key(key);
        R::get(self.raw, key)
    }

    /// Accessor for `key`, whether present or not. Reading through it
    /// inserts the placeholder value for an absent key.
    pub fn proxy(&mut self, key: &str) -> ValueProxy<'_, R> {
        self.check_live();
        Self::check_key(key);
        ValueProxy::new(self.raw, key.to_owned())
    }

    // ---- modifiers ----

    /// Insert `key` unless it already exists (the existing value is kept).
    /// Returns a cursor at the key and whether an insertion took place.
    pub fn insert(&mut self, key: &str, value: &str) -> (CursorMut<'_, R>, bool) {
        self.check_live();
        Self::check_key(key);
        Self::check_value(value);
        let existed = self.key_exists(key);
        if !existed {
            R::set(self.raw, key, value);
        }
        let pos = self.find_pos(key, self.len());
        (CursorMut::new(self.raw, pos), !existed)
    }

    /// Insert every pair in order; the first occurrence of a key wins.
    pub fn insert_all<I, K, V>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.check_live();
        for (key, value) in iter {
            let (key, value) = (key.as_ref(), value.as_ref());
            Self::check_key(key);
            Self::check_value(value);
            if !self.key_exists(key) {
                R::set(self.raw, key, value);
            }
        }
    }

    /// Write `key` unconditionally. Returns a cursor at the key and whether
    /// it was absent before.
    pub fn insert_or_assign(&mut self, key: &str, value: &str) -> (CursorMut<'_, R>, bool) {
        self.check_live();
        Self::check_key(key);
        Self::check_value(value);
        let existed = self.key_exists(key);
        R::set(self.raw, key, value);
        let pos = self.find_pos(key, self.len());
        (CursorMut::new(self.raw, pos), !existed)
    }

    /// Write every pair in order; the last occurrence of a key wins.
    pub fn insert_or_assign_all<I, K, V>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.check_live();
        for (key, value) in iter {
            let (key, value) = (key.as_ref(), value.as_ref());
            Self::check_key(key);
            Self::check_value(value);
            R::set(self.raw, key, value);
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        // Deleting renumbers the rest, so always delete whatever is first.
        let len = self.len();
        for _ in 0..len {
            let key = R::nth_key(self.raw, 0);
            R::delete(self.raw, &key);
        }
    }

    /// Remove the entry at `pos`. The returned cursor sits at the same
    /// position, which now holds the next surviving entry (or the end).
    pub fn erase_at(&mut self, pos: usize) -> CursorMut<'_, R> {
        self.check_live();
        self.check_position(pos, self.len());
        let key = R::nth_key(self.raw, pos);
        R::delete(self.raw, &key);
        CursorMut::new(self.raw, pos)
    }

    /// Remove every entry whose position lies in `range`. Returns a cursor
    /// at the range's start.
    pub fn erase_range(&mut self, range: impl RangeBounds<usize>) -> CursorMut<'_, R> {
        self.check_live();
        let len = self.len();
        let (first, last) = resolve_range(&range, len);
        info_assert!(
            first <= last,
            "'first' must be less or equal than 'last': {} > {}",
            first,
            last
        );
        info_assert!(
            last <= len,
            "'last' requested an out-of-bounds access: legal interval [0, {}], requested position {}",
            len,
            last
        );
        // Snapshot first: each delete shifts the positions not yet visited.
        let doomed: Vec<String> = (first..last).map(|i| R::nth_key(self.raw, i)).collect();
        trace!(count = doomed.len(), "erasing info range");
        for key in &doomed {
            R::delete(self.raw, key);
        }
        CursorMut::new(self.raw, first)
    }

    /// Remove `key` if present; returns the number of removed entries.
    pub fn erase(&mut self, key: &str) -> usize {
        self.check_live();
        Self::check_key(key);
        if self.key_exists(key) {
            R::delete(self.raw, key);
            1
        } else {
            0
        }
    }

    /// Exchange handles and ownership with `other`.
    pub fn swap(&mut self, other: &mut Info<R>) {
        core::mem::swap(&mut self.raw, &mut other.raw);
        core::mem::swap(&mut self.freeable, &mut other.freeable);
    }

    /// Remove and return the entry at `pos`.
    pub fn extract_at(&mut self, pos: usize) -> (String, String) {
        self.check_live();
        self.check_position(pos, self.len());
        let (key, value) = read_entry::<R>(self.raw, pos);
        R::delete(self.raw, &key);
        (key, value)
    }

    /// Remove and return the entry for `key`, if present.
    pub fn extract(&mut self, key: &str) -> Option<(String, String)> {
        self.check_live();
        Self::check_key(key);
        let value = R::get(self.raw, key)?;
        R::delete(self.raw, key);
        Some((key.to_owned(), value))
    }

    /// Move every entry of `source` whose key is absent here into `self`.
    /// Entries whose key already exists here stay in `source`.
    pub fn merge(&mut self, source: &mut Info<R>) {
        self.check_live();
        info_assert!(!source.is_null(), "source is in the moved-from state");
        if self.raw == source.raw {
            return;
        }
        // Copy in one pass over `source`, delete from it afterwards.
        let mut moved = Vec::new();
        for i in 0..source.len() {
            let key = R::nth_key(source.raw, i);
            if !self.key_exists(&key) {
                let value = R::get(source.raw, &key).expect("enumerated key must have a value");
                R::set(self.raw, &key, &value);
                moved.push(key);
            }
        }
        trace!(count = moved.len(), "merged info entries");
        for key in &moved {
            R::delete(source.raw, key);
        }
    }

    // ---- lookup ----

    /// 1 if `key` is present, else 0.
    pub fn count(&self, key: &str) -> usize {
        usize::from(self.contains(key))
    }

    /// Position of `key` in the current enumeration order (linear scan).
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.check_live();
        Self::check_key(key);
        let len = self.len();
        let pos = self.find_pos(key, len);
        (pos != len).then_some(pos)
    }

    /// Cursor at `key`, if present.
    pub fn find(&self, key: &str) -> Option<Cursor<'_, R>> {
        self.position_of(key).map(|pos| Cursor::new(self.raw, pos))
    }

    /// Mutable cursor at `key`, if present.
    pub fn find_mut(&mut self, key: &str) -> Option<CursorMut<'_, R>> {
        self.position_of(key).map(|pos| CursorMut::new(self.raw, pos))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position_of(key).is_some()
    }

    /// The range of entries matching `key`: one element or empty (both at
    /// the end).
    pub fn equal_range(&self, key: &str) -> (Cursor<'_, R>, Cursor<'_, R>) {
        self.check_live();
        Self::check_key(key);
        let len = self.len();
        let pos = self.find_pos(key, len);
        let last = if pos == len { len } else { pos + 1 };
        (Cursor::new(self.raw, pos), Cursor::new(self.raw, last))
    }

    /// Mutable variant of [`equal_range`](Info::equal_range).
    pub fn equal_range_mut(&mut self, key: &str) -> (CursorMut<'_, R>, CursorMut<'_, R>) {
        self.check_live();
        Self::check_key(key);
        let len = self.len();
        let pos = self.find_pos(key, len);
        let last = if pos == len { len } else { pos + 1 };
        (CursorMut::new(self.raw, pos), CursorMut::new(self.raw, last))
    }
}

fn resolve_range(range: &impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let first = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n + 1,
        Bound::Unbounded => 0,
    };
    let last = match range.end_bound() {
        Bound::Included(&n) => n + 1,
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    (first, last)
}

/// Exchange the contents (handles and ownership) of two wrappers.
pub fn swap<R: InfoRuntime>(lhs: &mut Info<R>, rhs: &mut Info<R>) {
    lhs.swap(rhs);
}

/// Remove every entry for which `pred(key, value)` holds; returns how many
/// were removed.
pub fn erase_if<R, F>(info: &mut Info<R>, mut pred: F) -> usize
where
    R: InfoRuntime,
    F: FnMut(&str, &str) -> bool,
{
    info.check_live();
    // Evaluate the predicate over stable positions, then delete.
    let doomed: Vec<String> = info
        .iter()
        .filter(|(key, value)| pred(key.as_str(), value.as_str()))
        .map(|(key, _)| key)
        .collect();
    trace!(count = doomed.len(), "erasing info entries by predicate");
    for key in &doomed {
        R::delete(info.raw, key);
    }
    doomed.len()
}

impl<R: InfoRuntime> Default for Info<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: InfoRuntime> Clone for Info<R> {
    /// Deep copy into a new, always freeable object.
    fn clone(&self) -> Self {
        info_assert!(!self.is_null(), "the source is in the moved-from state");
        Self {
            raw: R::duplicate(self.raw),
            freeable: true,
            _runtime: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        info_assert!(!source.is_null(), "the source is in the moved-from state");
        // `source` may wrap the handle `self` is about to release.
        let copy = R::duplicate(source.raw);
        self.release();
        self.raw = copy;
        self.freeable = true;
    }
}

impl<R: InfoRuntime> Drop for Info<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: InfoRuntime> PartialEq for Info<R> {
    /// Same key set with byte-identical values; order is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        info_assert!(!self.is_null(), "lhs is in the moved-from state");
        info_assert!(!other.is_null(), "rhs is in the moved-from state");
        let len = self.len();
        if len != other.len() {
            return false;
        }
        (0..len).all(|i| {
            let key = R::nth_key(self.raw, i);
            let Some(rhs_len) = R::value_len(other.raw, &key) else {
                return false;
            };
            if R::value_len(self.raw, &key) != Some(rhs_len) {
                return false;
            }
            R::get(self.raw, &key) == R::get(other.raw, &key)
        })
    }
}

impl<R: InfoRuntime> Eq for Info<R> {}

impl<R: InfoRuntime> fmt::Debug for Info<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Info(<moved-from>)");
        }
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<R, K, V> FromIterator<(K, V)> for Info<R>
where
    R: InfoRuntime,
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// Builds with insert-or-assign semantics: the last duplicate wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut info = Info::empty();
        info.insert_or_assign_all(iter);
        info
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Info<Local>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<R, K, V> Extend<(K, V)> for Info<R>
where
    R: InfoRuntime,
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_or_assign_all(iter);
    }
}

impl<'a, R: InfoRuntime> IntoIterator for &'a Info<R> {
    type Item = (String, String);
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Iter<'a, R> {
        self.iter()
    }
}

impl<'a, R: InfoRuntime> IntoIterator for &'a mut Info<R> {
    type Item = (String, ValueProxy<'a, R>);
    type IntoIter = IterMut<'a, R>;

    fn into_iter(self) -> IterMut<'a, R> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a new object is empty and owned.
    #[test]
    fn new_is_empty_and_freeable() {
        let info = Info::new();
        assert!(info.is_empty());
        assert_eq!(info.len(), 0);
        assert!(info.is_freeable());
        assert!(!info.is_null());
        assert!(info.cursor_front() == info.cursor_end());
    }

    /// Invariant: drop releases an owned handle and leaves a wrapped one alive.
    #[test]
    fn drop_releases_only_owned_handles() {
        let owned = Info::new();
        let raw = owned.as_raw();
        assert!(Local::is_live(raw));
        drop(owned);
        assert!(!Local::is_live(raw));

        let raw = Local::create();
        let wrapped = Info::<Local>::from_raw(raw, false);
        drop(wrapped);
        assert!(Local::is_live(raw));
        Local::free(raw);
    }

    /// Invariant: take leaves a null, non-freeable source and releases nothing.
    #[test]
    fn take_leaves_moved_from_state() {
        let mut a = Info::from([("k", "v")]);
        let raw = a.as_raw();
        let b = a.take();
        assert!(a.is_null());
        assert!(!a.is_freeable());
        assert_eq!(b.as_raw(), raw);
        assert_eq!(b.at("k").unwrap(), "v");
        drop(a);
        assert!(Local::is_live(raw));
    }

    /// Invariant: clone_from releases the old owned handle and duplicates.
    #[test]
    fn clone_from_replaces_owned_handle() {
        let src = Info::from([("a", "1")]);
        let mut dst = Info::from([("b", "2")]);
        let old = dst.as_raw();
        dst.clone_from(&src);
        assert!(!Local::is_live(old));
        assert_eq!(dst, src);
        assert_ne!(dst.as_raw(), src.as_raw());
        assert!(dst.is_freeable());
    }

    /// Invariant: assign replaces content and yields an owned object.
    #[test]
    fn assign_replaces_content() {
        let raw = Local::create();
        Local::set(raw, "old", "x");
        let mut info = Info::<Local>::from_raw(raw, false);
        info.assign([("a", "1"), ("a", "2")]);
        assert!(info.is_freeable());
        assert_eq!(info.len(), 1);
        assert_eq!(info.at("a").unwrap(), "2");
        // The wrapped, non-owned object survives untouched.
        assert_eq!(Local::get(raw, "old").as_deref(), Some("x"));
        Local::free(raw);
    }

    /// Invariant: the range erase deletes exactly the keys at the requested
    /// positions despite renumbering during deletion.
    #[test]
    fn erase_range_uses_snapshot() {
        let mut info = Info::from([("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
        let pos = info.erase_range(1..3).position();
        assert_eq!(pos, 1);
        assert_eq!(info.keys(), ["a", "d"]);
        info.erase_range(..);
        assert!(info.is_empty());
    }

    /// Invariant: resolve_range maps every bound kind to a half-open range.
    #[test]
    fn resolve_range_bounds() {
        assert_eq!(resolve_range(&(1..3), 5), (1, 3));
        assert_eq!(resolve_range(&(1..=3), 5), (1, 4));
        assert_eq!(resolve_range(&(..), 5), (0, 5));
        assert_eq!(resolve_range(&(2..), 5), (2, 5));
        assert_eq!(
            resolve_range(&(Bound::Excluded(0), Bound::Unbounded), 5),
            (1, 5)
        );
    }

    /// Invariant: find scans positions; position_of matches the key order.
    #[test]
    fn find_matches_position() {
        let info = Info::from([("x", "1"), ("y", "2")]);
        assert_eq!(info.position_of("y"), Some(1));
        assert_eq!(info.find("y").unwrap().position(), 1);
        assert!(info.find("z").is_none());
    }

    /// Invariant: the env wrapper is shared, non-freeable and never released.
    #[test]
    fn env_is_non_freeable_singleton() {
        let env = Info::env();
        assert!(!env.is_freeable());
        assert!(std::ptr::eq(env, Info::env()));
        assert!(env.contains("arch"));
        assert!(Local::is_live(env.as_raw()));
    }

    /// Invariant (checks enabled): marking a sentinel handle freeable panics.
    #[cfg(debug_assertions)]
    #[test]
    fn freeable_sentinels_rejected() {
        let res = std::panic::catch_unwind(|| {
            let info = Info::<Local>::from_raw(crate::local::RawInfo::null(), true);
            core::mem::forget(info);
        });
        assert!(res.is_err());
        let res = std::panic::catch_unwind(|| {
            let info = Info::<Local>::from_raw(Local::env_handle(), true);
            core::mem::forget(info);
        });
        assert!(res.is_err());
    }
}
