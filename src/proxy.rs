//! ValueProxy: deferred read/write access to the value of one key.

use crate::assert::info_assert;
use crate::info::Info;
use crate::local::Local;
use crate::raw::InfoRuntime;
use core::fmt;
use core::marker::PhantomData;

/// Value written by a read through a proxy whose key does not exist yet.
///
/// Not every runtime can store an empty value, so a single space stands in
/// for "present but empty".
pub const PLACEHOLDER_VALUE: &str = " ";

/// Accessor bound to one key of an [`Info`].
///
/// Both directions hit the underlying object immediately: [`set`] writes
/// the key, [`get`] reads it. Reading a key that does not exist inserts
/// [`PLACEHOLDER_VALUE`] under it as a side effect and returns that.
///
/// The proxy borrows the container mutably, so it can't outlive the
/// expression (or loop body) that produced it.
///
/// [`set`]: ValueProxy::set
/// [`get`]: ValueProxy::get
pub struct ValueProxy<'a, R: InfoRuntime = Local> {
    raw: R::Handle,
    key: String,
    _info: PhantomData<&'a mut Info<R>>,
}

impl<'a, R: InfoRuntime> ValueProxy<'a, R> {
    pub(crate) fn new(raw: R::Handle, key: String) -> Self {
        Self {
            raw,
            key,
            _info: PhantomData,
        }
    }

    /// The key this proxy is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current value, inserting [`PLACEHOLDER_VALUE`] if the key is
    /// absent.
    pub fn get(&self) -> String {
        match R::get(self.raw, &self.key) {
            Some(value) => value,
            None => {
                R::set(self.raw, &self.key, PLACEHOLDER_VALUE);
                PLACEHOLDER_VALUE.to_owned()
            }
        }
    }

    /// Create or overwrite the bound key with `value`.
    pub fn set(&mut self, value: impl AsRef<str>) {
        let value = value.as_ref();
        info_assert!(
            value.len() <= R::MAX_VALUE_LEN,
            "info value too long: max. size: {}, provided size: {}",
            R::MAX_VALUE_LEN,
            value.len()
        );
        R::set(self.raw, &self.key, value);
    }
}

impl<R: InfoRuntime> fmt::Display for ValueProxy<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get())
    }
}

impl<R: InfoRuntime> fmt::Debug for ValueProxy<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug output must not insert the placeholder.
        f.debug_struct("ValueProxy")
            .field("key", &self.key)
            .field("value", &R::get(self.raw, &self.key))
            .finish()
    }
}

impl<R: InfoRuntime> From<ValueProxy<'_, R>> for String {
    fn from(proxy: ValueProxy<'_, R>) -> String {
        proxy.get()
    }
}

impl<R: InfoRuntime> PartialEq<str> for ValueProxy<'_, R> {
    fn eq(&self, other: &str) -> bool {
        self.get() == other
    }
}

impl<R: InfoRuntime> PartialEq<&str> for ValueProxy<'_, R> {
    fn eq(&self, other: &&str) -> bool {
        self.get() == *other
    }
}
