//! Positional cursors and iterators over an [`Info`].
//!
//! A cursor is nothing more than `(handle, position)`. Moving it is pure
//! integer arithmetic; dereferencing asks the runtime for the key at the
//! position *at that moment*, so the result follows the live state of the
//! object, not the state when the cursor was created.
//!
//! Invalidation: any mutation of the object (`set` or `delete` on any key)
//! may renumber every position. Treat all cursors into an object as stale
//! after mutating it and re-acquire them.
//!
//! [`Cursor`] reads `(key, value)` pairs. [`CursorMut`] reads
//! `(key, ValueProxy)` pairs and converts into a [`Cursor`], never the
//! other way round. [`Iter`] and [`IterMut`] wrap the same representation
//! as double-ended, exact-size iterators; `iter().rev()` walks the object
//! back to front.

use crate::assert::info_assert;
use crate::info::Info;
use crate::local::Local;
use crate::proxy::ValueProxy;
use crate::raw::InfoRuntime;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// Representation shared by both cursor flavors. `raw == None` is the
/// singular (default-constructed) state.
struct Position<R: InfoRuntime> {
    raw: Option<R::Handle>,
    pos: isize,
}

impl<R: InfoRuntime> Clone for Position<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: InfoRuntime> Copy for Position<R> {}

impl<R: InfoRuntime> Position<R> {
    fn new(raw: R::Handle, pos: usize) -> Self {
        Self {
            raw: Some(raw),
            pos: pos as isize,
        }
    }

    fn singular() -> Self {
        Self { raw: None, pos: 0 }
    }

    fn same_object(&self, other: &Position<R>) -> bool {
        info_assert!(
            self.raw.is_some() && other.raw.is_some(),
            "comparing a singular cursor"
        );
        info_assert!(
            self.raw == other.raw,
            "the two cursors don't refer to the same info object"
        );
        self.raw.is_some() && self.raw == other.raw
    }

    fn eq(&self, other: &Position<R>) -> bool {
        self.same_object(other) && self.pos == other.pos
    }

    fn partial_cmp(&self, other: &Position<R>) -> Option<Ordering> {
        if self.same_object(other) {
            Some(self.pos.cmp(&other.pos))
        } else {
            None
        }
    }

    fn distance(&self, other: &Position<R>) -> isize {
        info_assert!(
            self.raw == other.raw,
            "the two cursors don't refer to the same info object"
        );
        self.pos - other.pos
    }

    /// Handle and key at `pos + n`, fetched now.
    fn key_at(&self, n: isize) -> (R::Handle, String) {
        let raw = match self.raw {
            Some(raw) => raw,
            None => panic!("dereferencing a singular cursor"),
        };
        info_assert!(
            raw != R::null_handle(),
            "accessing an element of a moved-from info object"
        );
        let target = self.pos + n;
        let len = R::key_count(raw);
        info_assert!(
            target >= 0 && (target as usize) < len,
            "out-of-bounds access: legal interval [0, {}), requested position {}",
            len,
            target
        );
        (raw, R::nth_key(raw, target as usize))
    }
}

pub(crate) fn read_entry<R: InfoRuntime>(raw: R::Handle, pos: usize) -> (String, String) {
    let key = R::nth_key(raw, pos);
    let value = R::get(raw, &key).expect("enumerated key must have a value");
    (key, value)
}

/// Read-only positional cursor.
pub struct Cursor<'a, R: InfoRuntime = Local> {
    at: Position<R>,
    _info: PhantomData<&'a Info<R>>,
}

/// Positional cursor whose values are [`ValueProxy`] accessors.
pub struct CursorMut<'a, R: InfoRuntime = Local> {
    at: Position<R>,
    _info: PhantomData<&'a mut Info<R>>,
}

impl<'a, R: InfoRuntime> Cursor<'a, R> {
    pub(crate) fn new(raw: R::Handle, pos: usize) -> Self {
        Self {
            at: Position::new(raw, pos),
            _info: PhantomData,
        }
    }

    /// The `(key, value)` pair at the current position.
    pub fn get(&self) -> (String, String) {
        self.peek(0)
    }

    /// The `(key, value)` pair `n` positions away from the current one.
    pub fn peek(&self, n: isize) -> (String, String) {
        let (raw, key) = self.at.key_at(n);
        let value = R::get(raw, &key).expect("enumerated key must have a value");
        (key, value)
    }

    /// The key at the current position.
    pub fn key(&self) -> String {
        self.at.key_at(0).1
    }
}

impl<'a, R: InfoRuntime> CursorMut<'a, R> {
    pub(crate) fn new(raw: R::Handle, pos: usize) -> Self {
        Self {
            at: Position::new(raw, pos),
            _info: PhantomData,
        }
    }

    /// The key at the current position and an accessor for its value.
    pub fn get(&self) -> (String, ValueProxy<'a, R>) {
        self.peek(0)
    }

    /// Like [`get`](CursorMut::get), `n` positions away.
    pub fn peek(&self, n: isize) -> (String, ValueProxy<'a, R>) {
        let (raw, key) = self.at.key_at(n);
        let proxy = ValueProxy::new(raw, key.clone());
        (key, proxy)
    }

    /// The key at the current position.
    pub fn key(&self) -> String {
        self.at.key_at(0).1
    }
}

impl<'a, R: InfoRuntime> From<CursorMut<'a, R>> for Cursor<'a, R> {
    fn from(c: CursorMut<'a, R>) -> Self {
        Cursor {
            at: c.at,
            _info: PhantomData,
        }
    }
}

macro_rules! position_ops {
    ($cursor:ident) => {
        impl<'a, R: InfoRuntime> $cursor<'a, R> {
            /// Current position.
            pub fn position(&self) -> isize {
                self.at.pos
            }

            /// True for a default-constructed cursor bound to no object.
            pub fn is_singular(&self) -> bool {
                self.at.raw.is_none()
            }

            /// Advance one position.
            pub fn move_next(&mut self) {
                self.at.pos += 1;
            }

            /// Step back one position.
            pub fn move_prev(&mut self) {
                self.at.pos -= 1;
            }
        }

        impl<R: InfoRuntime> Default for $cursor<'_, R> {
            fn default() -> Self {
                Self {
                    at: Position::singular(),
                    _info: PhantomData,
                }
            }
        }

        impl<R: InfoRuntime> Clone for $cursor<'_, R> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<R: InfoRuntime> Copy for $cursor<'_, R> {}

        impl<R: InfoRuntime> fmt::Debug for $cursor<'_, R> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($cursor))
                    .field("info", &self.at.raw)
                    .field("pos", &self.at.pos)
                    .finish()
            }
        }

        impl<R: InfoRuntime> AddAssign<isize> for $cursor<'_, R> {
            fn add_assign(&mut self, n: isize) {
                self.at.pos += n;
            }
        }

        impl<R: InfoRuntime> SubAssign<isize> for $cursor<'_, R> {
            fn sub_assign(&mut self, n: isize) {
                self.at.pos -= n;
            }
        }

        impl<R: InfoRuntime> Add<isize> for $cursor<'_, R> {
            type Output = Self;
            fn add(mut self, n: isize) -> Self {
                self += n;
                self
            }
        }

        impl<'a, R: InfoRuntime> Add<$cursor<'a, R>> for isize {
            type Output = $cursor<'a, R>;
            fn add(self, c: $cursor<'a, R>) -> $cursor<'a, R> {
                c + self
            }
        }

        impl<R: InfoRuntime> Sub<isize> for $cursor<'_, R> {
            type Output = Self;
            fn sub(mut self, n: isize) -> Self {
                self -= n;
                self
            }
        }
    };
}

position_ops!(Cursor);
position_ops!(CursorMut);

macro_rules! position_cmp {
    ($lhs:ident, $rhs:ident) => {
        impl<'a, 'b, R: InfoRuntime> PartialEq<$rhs<'b, R>> for $lhs<'a, R> {
            fn eq(&self, other: &$rhs<'b, R>) -> bool {
                self.at.eq(&other.at)
            }
        }

        impl<'a, 'b, R: InfoRuntime> PartialOrd<$rhs<'b, R>> for $lhs<'a, R> {
            fn partial_cmp(&self, other: &$rhs<'b, R>) -> Option<Ordering> {
                self.at.partial_cmp(&other.at)
            }
        }

        /// Signed number of positions from `other` to `self`.
        impl<'a, 'b, R: InfoRuntime> Sub<$rhs<'b, R>> for $lhs<'a, R> {
            type Output = isize;
            fn sub(self, other: $rhs<'b, R>) -> isize {
                self.at.distance(&other.at)
            }
        }
    };
}

position_cmp!(Cursor, Cursor);
position_cmp!(Cursor, CursorMut);
position_cmp!(CursorMut, Cursor);
position_cmp!(CursorMut, CursorMut);

/// Iterator over `(key, value)` pairs, front to back.
pub struct Iter<'a, R: InfoRuntime = Local> {
    raw: R::Handle,
    front: usize,
    back: usize,
    _info: PhantomData<&'a Info<R>>,
}

impl<'a, R: InfoRuntime> Iter<'a, R> {
    pub(crate) fn new(raw: R::Handle, len: usize) -> Self {
        Self {
            raw,
            front: 0,
            back: len,
            _info: PhantomData,
        }
    }
}

impl<R: InfoRuntime> Iterator for Iter<'_, R> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = read_entry::<R>(self.raw, self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<R: InfoRuntime> DoubleEndedIterator for Iter<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(read_entry::<R>(self.raw, self.back))
    }
}

impl<R: InfoRuntime> ExactSizeIterator for Iter<'_, R> {}
impl<R: InfoRuntime> FusedIterator for Iter<'_, R> {}

/// Iterator over `(key, ValueProxy)` pairs, front to back.
///
/// Writing through the yielded proxies overwrites existing keys and does
/// not disturb the iteration.
pub struct IterMut<'a, R: InfoRuntime = Local> {
    raw: R::Handle,
    front: usize,
    back: usize,
    _info: PhantomData<&'a mut Info<R>>,
}

impl<'a, R: InfoRuntime> IterMut<'a, R> {
    pub(crate) fn new(raw: R::Handle, len: usize) -> Self {
        Self {
            raw,
            front: 0,
            back: len,
            _info: PhantomData,
        }
    }

    fn entry(&self, pos: usize) -> (String, ValueProxy<'a, R>) {
        let key = R::nth_key(self.raw, pos);
        let proxy = ValueProxy::new(self.raw, key.clone());
        (key, proxy)
    }
}

impl<'a, R: InfoRuntime> Iterator for IterMut<'a, R> {
    type Item = (String, ValueProxy<'a, R>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.entry(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<R: InfoRuntime> DoubleEndedIterator for IterMut<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.entry(self.back))
    }
}

impl<R: InfoRuntime> ExactSizeIterator for IterMut<'_, R> {}
impl<R: InfoRuntime> FusedIterator for IterMut<'_, R> {}
