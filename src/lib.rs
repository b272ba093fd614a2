//! info-hints: a map-like, ownership-safe facade over handle-based
//! key/value hint objects (runtime, spawn and file-access hints passed
//! between a process-group runtime and its implementation).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: offer a standard-container interface (`insert`, `erase`,
//!   `find`, `merge`, iteration, equality) on top of an API that only
//!   knows single-key `set`/`delete`/`get`, "key at position n" and
//!   "number of keys", with explicit create/duplicate/free lifecycle.
//! - Layers:
//!   - `InfoRuntime`: the handle interface. Associated functions only;
//!     handles are opaque, copyable and global to the runtime.
//!   - `Local`: the in-process runtime. A process-wide handle table of
//!     `OrderedStore`s keyed by generational slot keys, plus the
//!     ambient-environment object.
//!   - `Info<R>`: the container. Owns (or wraps) one handle, tracks
//!     whether it must free it, and expresses every multi-key operation
//!     as a sequence of single-key runtime calls.
//!   - `Cursor`/`CursorMut`/`Iter`/`IterMut`/`ValueProxy`: positional
//!     views and a deferred accessor; none of them caches data.
//!
//! Constraints
//! - Positions are unstable: any `set`/`delete` may renumber every
//!   position of the object. Cursors are a weak view; re-acquire them
//!   after mutating.
//! - Multi-key operations that walk positions while deleting (range
//!   erase, merge, `erase_if`) snapshot the affected keys first and only
//!   then delete by key. `clear` always deletes the current first key.
//! - Lookup is a linear scan over positions comparing keys. The handle
//!   offers no keyed index besides `get`, and the container keeps the
//!   runtime's enumeration order as its only order.
//! - Keys are unique and non-empty. Value presence is binary; a read
//!   through a `ValueProxy` of an absent key inserts a single space.
//!
//! Ownership
//! - `Info::empty`/`Info::new` and `Clone` always produce an owned
//!   (freeable) object; cloning never copies the freeable flag.
//! - `Info::from_raw(handle, freeable)` wraps a foreign handle; the null
//!   and ambient-environment handles can't be marked freeable.
//! - `Info::take` transfers the handle and leaves the source in the
//!   moved-from state (null handle, not freeable).
//! - Drop frees the handle iff it is owned, non-null and not the
//!   ambient environment.
//! - `Info::env()` is the one process-wide, non-owning wrapper around
//!   the ambient environment.
//!
//! Errors
//! - Absence on checked access is a recoverable `InfoError`.
//! - Contract violations (moved-from use, out-of-bounds positions,
//!   cursors of different objects, empty/oversized keys, oversized
//!   values) panic when precondition checks are enabled
//!   (`debug_assertions` or the `strict-preconditions` feature).
//!
//! Concurrency
//! - Fully synchronous. This crate adds no locking of its own; `Local`
//!   serialises individual runtime calls, nothing more.

mod assert;
pub mod cursor;
mod error;
mod info;
pub mod local;
mod ordered_store;
mod ordered_store_proptest;
pub mod proxy;
pub mod raw;

// Public surface
pub use assert::preconditions_enabled;
pub use cursor::{Cursor, CursorMut, Iter, IterMut};
pub use error::InfoError;
pub use info::{erase_if, swap, Info};
pub use local::{Local, RawInfo};
pub use proxy::{ValueProxy, PLACEHOLDER_VALUE};
pub use raw::InfoRuntime;
