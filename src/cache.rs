//! Memoization of lookups by type descriptor.
//!
//! Each cached type owns a [`LoadOnce`] slot. The slot is created under a
//! short write lock and filled outside of it, so resolvers may recursively
//! look up other types while the first lookup is still computing, and
//! concurrent lookups of the same type wait for a single computation.

use alloc::{boxed::Box, vec::Vec};
use core::{hash::BuildHasher, num::NonZeroUsize};

use lru::LruCache;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use crate::{
    descriptor::TypeDescriptor,
    mapped::Mapped,
    sync::{LoadOnce, RwLock},
};

const SHARDS: usize = 16;

type Slot<O> = Arc<LoadOnce<Mapped<O>>>;
type Shard<O> = RwLock<LruCache<TypeDescriptor, Slot<O>, FxBuildHasher>>;

/// A cache of lookup results.
///
/// Unbounded caches are split into shards to keep lock contention low. A
/// bounded cache is a single shard evicting entries in insertion order:
/// lookups of a cached type never promote it, so the oldest entry goes
/// first. An evicted type is resolved again when it is next looked up.
pub(crate) struct MemoCache<O> {
    shards: Box<[Shard<O>]>,
}

impl<O: Clone> MemoCache<O> {
    /// Creates a cache holding at most `max_size` entries, or any number of
    /// entries when `max_size` is zero.
    pub(crate) fn new(max_size: usize) -> Self {
        let shards: Vec<Shard<O>> = match NonZeroUsize::new(max_size) {
            None => (0..SHARDS)
                .map(|_| RwLock::new(LruCache::unbounded_with_hasher(FxBuildHasher)))
                .collect(),
            Some(capacity) => {
                let mut shards = Vec::with_capacity(1);
                shards.push(RwLock::new(LruCache::with_hasher(capacity, FxBuildHasher)));
                shards
            }
        };
        Self {
            shards: shards.into_boxed_slice(),
        }
    }

    /// Returns the cached result for `key`, computing it with `compute` if
    /// it is not cached yet.
    pub(crate) fn get_or_compute<F>(&self, key: &TypeDescriptor, compute: F) -> Mapped<O>
    where
        F: FnOnce() -> Mapped<O>,
    {
        let slot = self.slot(key);
        slot.get_or_init(compute).clone()
    }

    /// Returns the cached result for `key` if it has been computed.
    pub(crate) fn peek(&self, key: &TypeDescriptor) -> Option<Mapped<O>> {
        let shard = self.shard(key).read();
        shard.peek(key).and_then(|slot| slot.get()).cloned()
    }

    /// Returns the number of cached types.
    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    fn slot(&self, key: &TypeDescriptor) -> Slot<O> {
        let shard = self.shard(key);
        if let Some(slot) = shard.read().peek(key) {
            return slot.clone();
        }

        let mut shard = shard.write();
        if let Some(slot) = shard.peek(key) {
            return slot.clone();
        }
        trace_event!(ty = %key, "cache miss");
        let slot = Arc::new(LoadOnce::new());
        shard.put(key.clone(), slot.clone());
        slot
    }

    fn shard(&self, key: &TypeDescriptor) -> &Shard<O> {
        if self.shards.len() == 1 {
            return &self.shards[0];
        }
        let index = FxBuildHasher.hash_one(key) as usize % self.shards.len();
        &self.shards[index]
    }
}
