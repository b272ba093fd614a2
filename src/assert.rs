//! Precondition checks.
//!
//! Misuse of the container (moved-from access, out-of-bounds positions,
//! cursors from another object, oversized keys or values) is a programming
//! error, not a runtime failure. These checks panic in debug builds or when
//! the `strict-preconditions` feature is enabled, and compile to nothing
//! otherwise. The runtime's own validation still rejects invalid handles and
//! positions, so a disabled check never turns into memory unsafety.

/// Panic with a formatted message if `cond` does not hold, when precondition
/// checking is enabled.
macro_rules! info_assert {
    ($cond:expr, $($arg:tt)+) => {
        if cfg!(any(debug_assertions, feature = "strict-preconditions")) {
            assert!($cond, $($arg)+);
        }
    };
}

pub(crate) use info_assert;

/// Whether precondition checks are compiled in.
#[inline]
pub const fn preconditions_enabled() -> bool {
    cfg!(any(debug_assertions, feature = "strict-preconditions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_check_is_silent() {
        info_assert!(1 + 1 == 2, "arithmetic is broken");
    }

    #[test]
    fn failing_check_panics_when_enabled() {
        let res = std::panic::catch_unwind(|| {
            info_assert!(false, "expected failure: {}", 42);
        });
        assert_eq!(res.is_err(), preconditions_enabled());
    }
}
