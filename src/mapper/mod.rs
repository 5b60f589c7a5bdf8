//! The type mapper: cached, hierarchy-aware resolution of values by type.
//!
//! A [`TypeMapper`] resolves a type by trying, in order:
//!
//! 1. Every annotation resolver, in registration order.
//! 2. The hierarchy resolvers bound to the type's class or one of its
//!    supertypes, most specific first.
//!
//! The first value produced wins. Errors raised on the way are collected
//! into the result; whether they stop the search depends on the
//! [`ErrorStrategy`]. Results, absent ones included, are cached per type.
//!
//! ```rust
//! use typemapper::{
//!     TypeMapper,
//!     descriptor::{TypeDescriptor, builtins},
//! };
//!
//! let mapper = TypeMapper::<&'static str>::builder()
//!     .add_hierarchy_fn(builtins::number(), |_| Ok(Some("number")))
//!     .add_specific(&TypeDescriptor::of(builtins::integer()), "integer")
//!     .build();
//!
//! assert_eq!(mapper.get_class(builtins::integer()).into_value(), Some("integer"));
//! assert_eq!(mapper.get_class(builtins::long()).into_value(), Some("number"));
//! assert!(mapper.get_class(builtins::string()).is_absent());
//! ```

mod builder;
mod mutable;

use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{fmt, str::FromStr};

use rootcause::report_collection::ReportCollection;

pub use self::{builder::TypeMapperBuilder, mutable::MutableTypeMapper};
use crate::{
    cache::MemoCache,
    dedup::OutputDeduplicator,
    descriptor::{Class, TypeDescriptor},
    mapped::Mapped,
    registry::{BindingScope, HierarchyRegistry, PendingBinding},
    resolver::{self, Encounter, Lookup, Resolver, SharedResolver},
    sync::RwLock,
};

/// What a mapper does when a resolver fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorStrategy {
    /// Stop at the first failure. The result is absent and carries that
    /// single error.
    Break,
    /// Record the failure and keep trying the remaining resolvers.
    #[default]
    Continue,
}

impl ErrorStrategy {
    /// The lowercase name of the strategy, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorStrategy::Break => "break",
            ErrorStrategy::Continue => "continue",
        }
    }
}

impl fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`ErrorStrategy`] fails.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseErrorStrategyError;

impl fmt::Display for ParseErrorStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected `break` or `continue`")
    }
}

impl core::error::Error for ParseErrorStrategyError {}

impl FromStr for ErrorStrategy {
    type Err = ParseErrorStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("break") {
            Ok(ErrorStrategy::Break)
        } else if s.eq_ignore_ascii_case("continue") {
            Ok(ErrorStrategy::Continue)
        } else {
            Err(ParseErrorStrategyError)
        }
    }
}

/// Resolves values of type `O` for type descriptors.
///
/// Built with [`TypeMapper::builder`]. Lookups take `&self` and may run
/// concurrently; each type is resolved at most once.
pub struct TypeMapper<O> {
    annotation_resolvers: RwLock<Arc<[SharedResolver<O>]>>,
    registry: HierarchyRegistry<O>,
    strategy: ErrorStrategy,
    deduplicator: Box<dyn OutputDeduplicator<O>>,
    cache: MemoCache<O>,
}

impl<O> TypeMapper<O>
where
    O: Clone + Send + Sync + 'static,
{
    /// Returns a builder for a new mapper.
    pub fn builder() -> TypeMapperBuilder<O> {
        TypeMapperBuilder::new()
    }

    pub(crate) fn new(
        strategy: ErrorStrategy,
        max_size: usize,
        deduplicator: Box<dyn OutputDeduplicator<O>>,
        annotation_resolvers: Vec<SharedResolver<O>>,
        bindings: Vec<PendingBinding<O>>,
    ) -> Self {
        let registry = HierarchyRegistry::new();
        for binding in bindings {
            binding.apply(&registry);
        }
        Self {
            annotation_resolvers: RwLock::new(Arc::from(annotation_resolvers)),
            registry,
            strategy,
            deduplicator,
            cache: MemoCache::new(max_size),
        }
    }

    /// Resolves `ty`, consulting the cache first.
    pub fn get(&self, ty: &TypeDescriptor) -> Mapped<O> {
        self.cache.get_or_compute(ty, || self.compute(ty))
    }

    /// Returns the cached result for `ty`, computing it with `compute` on a
    /// miss. Lets specialized lookups share this mapper's cache.
    pub(crate) fn get_or_compute<F>(&self, ty: &TypeDescriptor, compute: F) -> Mapped<O>
    where
        F: FnOnce() -> Mapped<O>,
    {
        self.cache.get_or_compute(ty, compute)
    }

    /// Resolves the erased type of `class`.
    pub fn get_class(&self, class: &Class) -> Mapped<O> {
        self.get(&TypeDescriptor::of(class))
    }

    /// Returns the cached result for `ty` without resolving it.
    #[must_use]
    pub fn cached(&self, ty: &TypeDescriptor) -> Option<Mapped<O>> {
        self.cache.peek(ty)
    }

    /// Returns the number of types with a cached result.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// The strategy applied when a resolver fails.
    #[must_use]
    pub fn error_strategy(&self) -> ErrorStrategy {
        self.strategy
    }

    /// The hierarchy resolvers of this mapper.
    #[must_use]
    pub fn registry(&self) -> &HierarchyRegistry<O> {
        &self.registry
    }

    fn compute(&self, ty: &TypeDescriptor) -> Mapped<O> {
        let annotation_resolvers = self.annotation_resolvers.read().clone();
        let hierarchy = self.registry.query(ty.class());
        trace_event!(
            ty = %ty,
            annotation_resolvers = annotation_resolvers.len(),
            hierarchy_resolvers = hierarchy.len(),
            "resolving type"
        );

        let encounter = Encounter::new(ty, self);
        self.try_candidates(&encounter, annotation_resolvers.iter().chain(hierarchy.iter()))
    }

    /// Tries `candidates` in order under this mapper's error strategy. The
    /// first value produced is deduplicated and returned with the errors
    /// raised before it.
    pub(crate) fn try_candidates<'r>(
        &self,
        encounter: &Encounter<'_, O>,
        candidates: impl IntoIterator<Item = &'r SharedResolver<O>>,
    ) -> Mapped<O> {
        let ty = encounter.ty();
        let mut errors = ReportCollection::new();
        for resolver in candidates {
            match resolver.resolve(encounter) {
                Ok(Some(value)) => {
                    let value = self.deduplicator.deduplicate(value);
                    return Mapped::present(ty.clone(), value, errors);
                }
                Ok(None) => {}
                Err(report) => {
                    errors.push(report.into_cloneable());
                    if self.strategy == ErrorStrategy::Break {
                        break;
                    }
                }
            }
        }
        Mapped::absent(ty.clone(), errors)
    }

    #[track_caller]
    fn add_specific(&self, ty: &TypeDescriptor, value: O) {
        self.registry
            .bind_exact(ty.class(), resolver::specific(ty.clone(), value));
    }

    #[track_caller]
    fn add_hierarchy_resolver(&self, class: &Class, resolver: SharedResolver<O>) {
        self.registry
            .bind_shared(class, resolver, BindingScope::Hierarchy);
    }

    fn add_annotation_resolver(&self, resolver: SharedResolver<O>) {
        let mut annotation_resolvers = self.annotation_resolvers.write();
        let mut updated = Vec::with_capacity(annotation_resolvers.len() + 1);
        updated.extend(annotation_resolvers.iter().cloned());
        updated.push(resolver);
        *annotation_resolvers = Arc::from(updated);
        debug_event!(
            annotation_resolvers = annotation_resolvers.len(),
            "added annotation resolver"
        );
    }
}

impl<O> Lookup<O> for TypeMapper<O>
where
    O: Clone + Send + Sync + 'static,
{
    fn lookup(&self, ty: &TypeDescriptor) -> Mapped<O> {
        self.get(ty)
    }
}

impl<O> fmt::Debug for TypeMapper<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapper")
            .field("strategy", &self.strategy)
            .field(
                "annotation_resolvers",
                &self.annotation_resolvers.read().len(),
            )
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn shared<O, R: Resolver<O>>(resolver: R) -> SharedResolver<O> {
    Arc::new(resolver)
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString};
    use core::sync::atomic::{AtomicUsize, Ordering};

    use rootcause::{Report, report};

    use super::*;
    use crate::{
        descriptor::builtins,
        resolver::{Encounter, from_fn},
    };

    static_assertions::assert_impl_all!(TypeMapper<u32>: Send, Sync);
    static_assertions::assert_impl_all!(ErrorStrategy: Send, Sync, Copy, Default);

    fn failing(message: &'static str) -> impl Resolver<&'static str> {
        from_fn(move |_: &Encounter<'_, &'static str>| -> Result<Option<&'static str>, Report> {
            Err(report!("{message}"))
        })
    }

    #[test]
    fn test_error_strategy_text() {
        assert_eq!(ErrorStrategy::default(), ErrorStrategy::Continue);
        assert_eq!("break".parse::<ErrorStrategy>(), Ok(ErrorStrategy::Break));
        assert_eq!("Continue".parse::<ErrorStrategy>(), Ok(ErrorStrategy::Continue));
        assert_eq!("stop".parse::<ErrorStrategy>(), Err(ParseErrorStrategyError));
        assert_eq!(ErrorStrategy::Break.to_string(), "break");
    }

    #[test]
    fn test_annotation_resolvers_come_first() {
        #[derive(Debug, PartialEq, Eq, Hash)]
        struct Override;

        let mapper = TypeMapper::builder()
            .add_specific(&TypeDescriptor::of(builtins::string()), "specific")
            .add_annotation_resolver(resolver::for_annotation(|_: &Override, _| Ok(Some("override"))))
            .build();

        let plain = TypeDescriptor::of(builtins::string());
        assert_eq!(mapper.get(&plain).into_value(), Some("specific"));
        assert_eq!(
            mapper.get(&plain.with_annotation(Override)).into_value(),
            Some("override")
        );
    }

    #[test]
    fn test_continue_collects_errors() {
        let mapper = TypeMapper::builder()
            .with_error_strategy(ErrorStrategy::Continue)
            .add_hierarchy_resolver(builtins::integer(), failing("integer failed"))
            .add_hierarchy_resolver(builtins::number(), failing("number failed"))
            .add_hierarchy_fn(builtins::object(), |_| Ok(Some("object")))
            .build();

        let mapped = mapper.get_class(builtins::integer());
        assert_eq!(mapped.value(), Some(&"object"));
        let messages: alloc::vec::Vec<_> = mapped
            .errors()
            .iter()
            .map(|error| format!("{}", error.format_current_context()))
            .collect();
        assert_eq!(messages, ["integer failed", "number failed"]);
    }

    #[test]
    fn test_break_stops_at_first_error() {
        let mapper = TypeMapper::builder()
            .with_error_strategy(ErrorStrategy::Break)
            .add_hierarchy_resolver(builtins::integer(), failing("integer failed"))
            .add_hierarchy_resolver(builtins::number(), failing("number failed"))
            .add_hierarchy_fn(builtins::object(), |_| Ok(Some("object")))
            .build();

        let mapped = mapper.get_class(builtins::integer());
        assert!(mapped.is_absent());
        assert_eq!(mapped.errors().len(), 1);
        assert_eq!(mapped.as_option().unwrap_err().children().len(), 1);
    }

    #[test]
    fn test_results_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mapper = TypeMapper::builder()
            .add_hierarchy_fn(builtins::object(), move |_| {
                counted.fetch_add(1, Ordering::Relaxed);
                Ok(Some(1_u32))
            })
            .build();

        let ty = TypeDescriptor::of(builtins::string());
        assert!(mapper.cached(&ty).is_none());
        mapper.get(&ty);
        mapper.get(&ty);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(mapper.cached_len(), 1);
        assert_eq!(mapper.cached(&ty).and_then(Mapped::into_value), Some(1));
    }

    #[test]
    fn test_absent_results_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mapper = TypeMapper::<u32>::builder()
            .add_hierarchy_fn(builtins::object(), move |_| {
                counted.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            })
            .build();

        assert!(mapper.get_class(builtins::string()).is_absent());
        assert!(mapper.get_class(builtins::string()).is_absent());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_nested_lookups() {
        let list = Class::interface("List").build();
        let mapper = TypeMapper::<alloc::string::String>::builder()
            .add_hierarchy_fn(builtins::object(), |encounter| {
                Ok(Some(encounter.ty().to_string()))
            })
            .add_hierarchy_fn(&list, |encounter| {
                let element = encounter
                    .ty()
                    .parameter(0)
                    .map(|parameter| encounter.resolve(parameter));
                Ok(element
                    .and_then(Mapped::into_value)
                    .map(|element| format!("list of {element}")))
            })
            .build();

        let strings = TypeDescriptor::parameterized(&list, [TypeDescriptor::of(builtins::string())]);
        assert_eq!(
            mapper.get(&strings).into_value().as_deref(),
            Some("list of String")
        );
        assert!(mapper.cached(&TypeDescriptor::of(builtins::string())).is_some());
    }

    #[test]
    fn test_unbounded_cache_keeps_everything() {
        let mapper = TypeMapper::builder()
            .add_hierarchy_fn(builtins::object(), |_| Ok(Some(0_u8)))
            .build();
        for class in [builtins::string(), builtins::integer(), builtins::long()] {
            mapper.get_class(class);
        }
        assert_eq!(mapper.cached_len(), 3);
    }

    #[test]
    fn test_bounded_cache() {
        let mapper = TypeMapper::builder()
            .with_caching(1)
            .add_hierarchy_fn(builtins::object(), |_| Ok(Some(0_u8)))
            .build();
        mapper.get_class(builtins::string());
        mapper.get_class(builtins::integer());
        assert_eq!(mapper.cached_len(), 1);
    }
}
