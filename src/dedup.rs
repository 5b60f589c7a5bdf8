//! Canonicalization of resolved values.
//!
//! Mappers pass every freshly resolved value through an
//! [`OutputDeduplicator`] before caching it. The default,
//! [`NoDeduplication`], keeps values as they are. [`Interning`] makes equal
//! values resolved for different types share one canonical instance, which
//! matters when values are reference-counted handles:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use typemapper::{TypeMapper, dedup, descriptor::builtins};
//!
//! let mapper = TypeMapper::<Arc<str>>::builder()
//!     .with_output_deduplication(dedup::interning(64))
//!     .add_hierarchy_fn(builtins::number(), |_| Ok(Some(Arc::from("numeric"))))
//!     .build();
//!
//! let integer = mapper.get_class(builtins::integer()).into_value().unwrap();
//! let long = mapper.get_class(builtins::long()).into_value().unwrap();
//! assert!(Arc::ptr_eq(&integer, &long));
//! ```

use core::{fmt, hash::Hash, num::NonZeroUsize};

use lru::LruCache;
use rustc_hash::FxBuildHasher;

use crate::sync::Mutex;

/// Maps a freshly resolved value to its canonical instance.
pub trait OutputDeduplicator<O>: Send + Sync + 'static {
    /// Returns the canonical instance equal to `output`.
    fn deduplicate(&self, output: O) -> O;
}

/// Keeps every value as it was resolved.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDeduplication;

impl<O> OutputDeduplicator<O> for NoDeduplication {
    #[inline]
    fn deduplicate(&self, output: O) -> O {
        output
    }
}

/// Interns values in a bounded table.
///
/// The first value seen becomes canonical and later equal values are
/// replaced by it. When the table is full the least recently used entry is
/// forgotten, after which an equal value becomes canonical anew.
pub struct Interning<O> {
    table: Mutex<LruCache<O, O, FxBuildHasher>>,
}

impl<O> Interning<O>
where
    O: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates an interning table holding up to `capacity` values.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            table: Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)),
        }
    }

    /// Returns the number of interned values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Returns `true` if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

impl<O> OutputDeduplicator<O> for Interning<O>
where
    O: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn deduplicate(&self, output: O) -> O {
        let mut table = self.table.lock();
        if let Some(canonical) = table.get(&output) {
            return canonical.clone();
        }
        table.put(output.clone(), output.clone());
        output
    }
}

impl<O: Eq + Hash> fmt::Debug for Interning<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interning")
            .field("len", &self.table.lock().len())
            .finish()
    }
}

/// Returns the deduplicator that keeps values as they are.
#[must_use]
pub fn none() -> NoDeduplication {
    NoDeduplication
}

/// Returns an interning deduplicator holding up to `capacity` values.
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn interning<O>(capacity: usize) -> Interning<O>
where
    O: Eq + Hash + Clone + Send + Sync + 'static,
{
    Interning::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
}

#[cfg(test)]
mod tests {
    use alloc::{format, sync::Arc};

    use super::*;

    static_assertions::assert_impl_all!(Interning<Arc<str>>: Send, Sync);

    #[test]
    fn test_no_deduplication() {
        let first: Arc<str> = Arc::from("x");
        let second: Arc<str> = Arc::from("x");
        let kept = OutputDeduplicator::deduplicate(&none(), second.clone());
        assert!(Arc::ptr_eq(&kept, &second));
        assert!(!Arc::ptr_eq(&kept, &first));
    }

    #[test]
    fn test_interning_returns_first_instance() {
        let interning = interning(4);
        let first: Arc<str> = Arc::from("x");
        let second: Arc<str> = Arc::from("x");
        let other: Arc<str> = Arc::from("y");

        assert!(Arc::ptr_eq(&interning.deduplicate(first.clone()), &first));
        assert!(Arc::ptr_eq(&interning.deduplicate(second), &first));
        assert!(Arc::ptr_eq(&interning.deduplicate(other.clone()), &other));
        assert_eq!(interning.len(), 2);
    }

    #[test]
    fn test_interning_forgets_least_recently_used() {
        let interning = interning(1);
        let first: Arc<str> = Arc::from("x");
        interning.deduplicate(first.clone());
        interning.deduplicate(Arc::from("y"));

        let again: Arc<str> = Arc::from("x");
        assert!(Arc::ptr_eq(&interning.deduplicate(again.clone()), &again));
        assert_eq!(interning.len(), 1);
    }

    #[test]
    fn test_interning_debug() {
        let interning = interning::<u32>(4);
        interning.deduplicate(1);
        interning.deduplicate(2);
        assert_eq!(format!("{interning:?}"), "Interning { len: 2 }");
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let interning = interning::<u32>(0);
        assert_eq!(interning.deduplicate(3), 3);
        assert_eq!(interning.len(), 1);
    }
}
