//! Constant-time comparison shared by every verifier.

use subtle::ConstantTimeEq;

#[cfg(test)]
thread_local! {
    /// Number of comparisons performed on this thread.
    pub(crate) static COMPARISONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Compare two byte slices without an early exit on the first mismatch.
///
/// Slices of different lengths compare unequal; only the length is leaked.
#[inline]
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    #[cfg(test)]
    COMPARISONS.with(|c| c.set(c.get() + 1));

    a.ct_eq(b).into()
}

/// Reset the per-thread comparison counter and return its previous value.
#[cfg(test)]
pub(crate) fn take_comparisons() -> usize {
    COMPARISONS.with(|c| c.replace(0))
}
