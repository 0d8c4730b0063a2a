//! Invariant validation shared across model-weld structures.

use crate::model_error::ModelWeldError;

/// Trait for validating data structure invariants.
///
/// Implementors expose a fallible [`validate_invariants`](Self::validate_invariants)
/// that reports the first violation found, plus a
/// [`debug_assert_invariants`](Self::debug_assert_invariants) that panics on
/// violation in debug builds or when the `check-invariants` feature is enabled.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), ModelWeldError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! weld_debug_assert_ok {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
