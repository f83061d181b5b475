//! Cross-process scan coordination.
//!
//! Before a full scan the [`Scanner`](crate::Scanner) polls its
//! [`ScanHandler`]. A handler reporting [`Scanned::is_scanned`] means some
//! other party already produced a fresh cache, so the scanner restores from
//! it instead of scanning.

/// Outcome of polling a [`ScanHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scanned {
    is_scanned: bool,
}

impl Scanned {
    /// Creates an outcome.
    #[inline]
    #[must_use]
    pub const fn new(is_scanned: bool) -> Self {
        Self { is_scanned }
    }

    /// A scan was already performed elsewhere.
    #[inline]
    #[must_use]
    pub const fn done() -> Self {
        Self::new(true)
    }

    /// No scan has been performed; the caller must scan.
    #[inline]
    #[must_use]
    pub const fn pending() -> Self {
        Self::new(false)
    }

    /// Returns `true` if the cache is known to be fresh.
    #[inline]
    #[must_use]
    pub const fn is_scanned(&self) -> bool {
        self.is_scanned
    }
}

/// Single-flight hook consulted before every full scan.
///
/// Closures returning [`Scanned`] implement this trait:
///
/// ```
/// use ds_scanner::{ScanHandler, Scanned};
///
/// let mut polls = 0;
/// let mut handler = || {
///     polls += 1;
///     Scanned::pending()
/// };
/// assert!(!handler.scan().is_scanned());
/// ```
pub trait ScanHandler {
    /// Reports whether a scan has already been performed.
    fn scan(&mut self) -> Scanned;
}

/// A handler that never reports a completed scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScanHandler;

impl ScanHandler for NullScanHandler {
    #[inline]
    fn scan(&mut self) -> Scanned {
        Scanned::pending()
    }
}

impl<F> ScanHandler for F
where
    F: FnMut() -> Scanned,
{
    #[inline]
    fn scan(&mut self) -> Scanned {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handler_never_scanned() {
        let mut handler = NullScanHandler;
        assert!(!handler.scan().is_scanned());
        assert!(!handler.scan().is_scanned());
    }

    #[test]
    fn test_closure_handler() {
        let mut calls = 0;
        let mut handler = || {
            calls += 1;
            Scanned::new(calls > 1)
        };
        assert!(!handler.scan().is_scanned());
        assert!(handler.scan().is_scanned());
    }

    #[test]
    fn test_scanned_default_is_pending() {
        assert_eq!(Scanned::default(), Scanned::pending());
        assert!(Scanned::done().is_scanned());
    }
}
