//! Lock and load-once primitives used by the registries and caches.
//!
//! With the `std` feature these are thin wrappers around [`std::sync`], so
//! contended waiters park. Without it they fall back to [`spin`], which keeps
//! the crate usable in `no_std` environments.

#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// The lazily initialised static used for the builtin classes.
#[cfg(feature = "std")]
pub(crate) type Lazy<T> = std::sync::LazyLock<T>;

#[cfg(not(feature = "std"))]
pub(crate) type Lazy<T> = spin::Lazy<T>;

#[repr(transparent)]
pub(crate) struct RwLock<T>(impl_::RwLock<T>);

#[repr(transparent)]
pub(crate) struct RwLockReadGuard<'a, T>(impl_::RwLockReadGuard<'a, T>);

#[repr(transparent)]
pub(crate) struct RwLockWriteGuard<'a, T>(impl_::RwLockWriteGuard<'a, T>);

impl<T> RwLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self.0.read().expect("Unable to acquire registry lock");

        RwLockReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self.0.write().expect("Unable to acquire registry lock");

        RwLockWriteGuard(guard)
    }
}

impl<T> core::ops::Deref for RwLockReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::Deref for RwLockWriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for RwLockWriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[repr(transparent)]
pub(crate) struct Mutex<T>(impl_::Mutex<T>);

#[repr(transparent)]
pub(crate) struct MutexGuard<'a, T>(impl_::MutexGuard<'a, T>);

impl<T> Mutex<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::Mutex::new(value))
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.lock();

        #[cfg(feature = "std")]
        let guard = self.0.lock().expect("Unable to acquire interning lock");

        MutexGuard(guard)
    }
}

impl<T> core::ops::Deref for MutexGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for MutexGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// A cell that is written at most once.
///
/// Concurrent callers of [`get_or_init`](Self::get_or_init) on an empty cell
/// race for the right to run their initializer; exactly one of them runs it
/// and every other caller waits for its result.
#[repr(transparent)]
pub(crate) struct LoadOnce<T>(
    #[cfg(feature = "std")] std::sync::OnceLock<T>,
    #[cfg(not(feature = "std"))] spin::Once<T>,
);

impl<T> LoadOnce<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        #[cfg(feature = "std")]
        let cell = std::sync::OnceLock::new();

        #[cfg(not(feature = "std"))]
        let cell = spin::Once::new();

        Self(cell)
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.get()
    }

    #[inline]
    pub(crate) fn get_or_init<F>(&self, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        #[cfg(feature = "std")]
        let value = self.0.get_or_init(init);

        #[cfg(not(feature = "std"))]
        let value = self.0.call_once(init);

        value
    }
}
