//! The handle interface consumed by [`Info`](crate::Info).
//!
//! A runtime owns key/value objects and hands out opaque, copyable handles
//! to them. Every operation is synchronous and logically atomic. Positions
//! passed to [`InfoRuntime::nth_key`] index the object's *current*
//! enumeration order, which any `set` or `delete` may renumber.
//!
//! All methods are associated functions: handles are global to the runtime,
//! the same way handles of a C-style process runtime are.

use core::fmt::Debug;
use core::hash::Hash;

/// Operations a key/value metadata runtime must provide.
pub trait InfoRuntime {
    /// Opaque handle naming one object.
    type Handle: Copy + Eq + Hash + Debug;

    /// Longest accepted key, in bytes of content.
    const MAX_KEY_LEN: usize;
    /// Longest accepted value, in bytes of content.
    const MAX_VALUE_LEN: usize;

    /// The handle that names no object.
    fn null_handle() -> Self::Handle;

    /// The process-wide ambient-environment object. Never freed.
    fn env_handle() -> Self::Handle;

    /// Create a new, empty object.
    fn create() -> Self::Handle;

    /// Create a new object holding a copy of every entry of `handle`.
    fn duplicate(handle: Self::Handle) -> Self::Handle;

    /// Release the object. The handle must not be used afterwards.
    fn free(handle: Self::Handle);

    /// Create or overwrite `key`.
    fn set(handle: Self::Handle, key: &str, value: &str);

    /// Remove `key` if present.
    fn delete(handle: Self::Handle, key: &str);

    /// The value stored under `key`, if any.
    fn get(handle: Self::Handle, key: &str) -> Option<String>;

    /// Length of the value stored under `key`, if any.
    fn value_len(handle: Self::Handle, key: &str) -> Option<usize>;

    /// Number of keys currently stored.
    fn key_count(handle: Self::Handle) -> usize;

    /// The key at position `n` of the current enumeration order.
    /// `n` must be less than [`key_count`](InfoRuntime::key_count).
    fn nth_key(handle: Self::Handle, n: usize) -> String;
}
