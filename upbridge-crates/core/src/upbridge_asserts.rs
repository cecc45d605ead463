//! Assertion levels for internal invariants.
//!
//! Every check is tagged with the level from which it becomes active; the level compiled into the
//! crate decides which checks run. The `debug-checks` feature raises the level to
//! [`UPBRIDGE_ASSERT_ADVANCED`].

#[cfg(not(feature = "debug-checks"))]
pub const UPBRIDGE_ASSERT_LEVEL_DEFINITION: u8 = UPBRIDGE_ASSERT_SIMPLE;
#[cfg(feature = "debug-checks")]
pub const UPBRIDGE_ASSERT_LEVEL_DEFINITION: u8 = UPBRIDGE_ASSERT_ADVANCED;

pub const UPBRIDGE_ASSERT_SIMPLE: u8 = 1;
pub const UPBRIDGE_ASSERT_MODERATE: u8 = 2;
pub const UPBRIDGE_ASSERT_ADVANCED: u8 = 3;

#[doc(hidden)]
#[macro_export]
macro_rules! upbridge_assert_simple {
    ($($arg:tt)*) => {
        if $crate::upbridge_asserts::UPBRIDGE_ASSERT_LEVEL_DEFINITION >= $crate::upbridge_asserts::UPBRIDGE_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! upbridge_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::upbridge_asserts::UPBRIDGE_ASSERT_LEVEL_DEFINITION >= $crate::upbridge_asserts::UPBRIDGE_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! upbridge_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::upbridge_asserts::UPBRIDGE_ASSERT_LEVEL_DEFINITION >= $crate::upbridge_asserts::UPBRIDGE_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! upbridge_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::upbridge_asserts::UPBRIDGE_ASSERT_LEVEL_DEFINITION >= $crate::upbridge_asserts::UPBRIDGE_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}
