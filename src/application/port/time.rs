// SPDX-License-Identifier: MPL-2.0
//! Wall-clock port definition.

/// Source of wall-clock time in seconds.
///
/// Only differences between readings matter; implementations should be
/// monotonic or close to it.
pub trait TimeSource {
    /// Current wall-clock time in seconds since an arbitrary epoch.
    fn now(&self) -> f64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
