use alloc::{boxed::Box, vec::Vec};
use core::fmt;

use rootcause::Report;

use super::{ErrorStrategy, MutableTypeMapper, TypeMapper, shared};
use crate::{
    dedup::{NoDeduplication, OutputDeduplicator},
    descriptor::{Class, TypeDescriptor},
    registry::{BindingScope, PendingBinding},
    resolver::{self, Encounter, Resolver, SharedResolver},
};

/// Builder for a [`TypeMapper`].
///
/// Defaults to [`ErrorStrategy::Continue`], an unbounded cache and no
/// output deduplication.
///
/// ```rust
/// use typemapper::{ErrorStrategy, TypeMapper, descriptor::builtins};
///
/// let mapper = TypeMapper::<u32>::builder()
///     .with_error_strategy(ErrorStrategy::Break)
///     .with_caching(128)
///     .add_hierarchy_fn(builtins::number(), |_| Ok(Some(8)))
///     .build();
///
/// assert_eq!(mapper.error_strategy(), ErrorStrategy::Break);
/// assert_eq!(mapper.get_class(builtins::double()).into_value(), Some(8));
/// ```
#[must_use]
pub struct TypeMapperBuilder<O> {
    strategy: ErrorStrategy,
    max_size: usize,
    deduplicator: Box<dyn OutputDeduplicator<O>>,
    annotation_resolvers: Vec<SharedResolver<O>>,
    bindings: Vec<PendingBinding<O>>,
}

impl<O> TypeMapperBuilder<O>
where
    O: Clone + Send + Sync + 'static,
{
    pub(super) fn new() -> Self {
        Self {
            strategy: ErrorStrategy::default(),
            max_size: 0,
            deduplicator: Box::new(NoDeduplication),
            annotation_resolvers: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Sets the strategy applied when a resolver fails.
    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bounds the cache to `max_size` entries. Zero means unbounded.
    pub fn with_caching(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets how resolved values are canonicalized before they are cached.
    pub fn with_output_deduplication(mut self, deduplicator: impl OutputDeduplicator<O>) -> Self {
        self.deduplicator = Box::new(deduplicator);
        self
    }

    /// Maps exactly `ty` to `value`.
    #[track_caller]
    pub fn add_specific(mut self, ty: &TypeDescriptor, value: O) -> Self {
        self.bindings.push(PendingBinding::new(
            ty.class(),
            shared(resolver::specific(ty.clone(), value)),
            BindingScope::Exact,
        ));
        self
    }

    /// Binds a resolver to `class` and all of its subtypes.
    #[track_caller]
    pub fn add_hierarchy_resolver(mut self, class: &Class, resolver: impl Resolver<O>) -> Self {
        self.bindings.push(PendingBinding::new(
            class,
            shared(resolver),
            BindingScope::Hierarchy,
        ));
        self
    }

    /// Binds a closure to `class` and all of its subtypes.
    #[track_caller]
    pub fn add_hierarchy_fn<F>(self, class: &Class, f: F) -> Self
    where
        F: Fn(&Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
    {
        self.add_hierarchy_resolver(class, resolver::from_fn(f))
    }

    /// Adds a resolver consulted for every type before the hierarchy.
    pub fn add_annotation_resolver(mut self, resolver: impl Resolver<O>) -> Self {
        self.annotation_resolvers.push(shared(resolver));
        self
    }

    /// Builds the mapper.
    pub fn build(self) -> TypeMapper<O> {
        TypeMapper::new(
            self.strategy,
            self.max_size,
            self.deduplicator,
            self.annotation_resolvers,
            self.bindings,
        )
    }

    /// Builds a mapper that accepts further registrations.
    pub fn build_mutable(self) -> MutableTypeMapper<O> {
        MutableTypeMapper::new(self.build())
    }
}

impl<O> fmt::Debug for TypeMapperBuilder<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapperBuilder")
            .field("strategy", &self.strategy)
            .field("max_size", &self.max_size)
            .field("annotation_resolvers", &self.annotation_resolvers.len())
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}
