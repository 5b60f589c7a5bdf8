//! A registry of serializers with array support and per-use overrides.
//!
//! [`SerializerRegistry`] is a specialization of the type mapper for
//! serializers. It resolves a type by trying, in order:
//!
//! 1. A [`SerializeWith`] annotation on the type, which names the
//!    serializer directly.
//! 2. For array types, the array resolver, which derives a serializer from
//!    the serializer of the element type. Arrays never fall through to the
//!    hierarchy.
//! 3. The serializers bound to the type's class or one of its supertypes,
//!    most specific first.
//!
//! Primitive types are looked up as their boxed counterparts, so `int` and
//! `Integer` share a serializer and a cache entry.
//!
//! ```rust
//! use typemapper::{
//!     SerializerRegistry,
//!     descriptor::{Primitive, TypeDescriptor, builtins},
//! };
//!
//! let registry = SerializerRegistry::<String>::builder()
//!     .arrays(|_, element| Ok(format!("list({element})")))
//!     .build();
//! registry.register(builtins::number(), String::from("number"));
//! registry.register(builtins::string(), String::from("string"));
//!
//! let ints = TypeDescriptor::array_of(&TypeDescriptor::of(Primitive::Int.class()));
//! assert_eq!(registry.get(&ints).into_value().as_deref(), Some("list(number)"));
//! ```

mod array;

use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::fmt;

use rootcause::Report;

pub use self::array::{ArrayResolver, MissingElementSerializer};
use crate::{
    ErrorStrategy, TypeMapper,
    dedup::{NoDeduplication, OutputDeduplicator},
    descriptor::{Class, TypeDescriptor},
    mapped::Mapped,
    registry::{BindingScope, HierarchyRegistry, PendingBinding},
    resolver::{self, Encounter, Lookup, Resolver, ResolverChain, SharedResolver},
};

/// Annotation selecting the serializer for one use of a type.
///
/// A type descriptor carrying this annotation resolves to the wrapped
/// serializer, regardless of what is registered for its class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerializeWith<S>(pub S);

/// Serializers of type `S` resolved for type descriptors.
///
/// Built on a [`TypeMapper`] that stops at the first failing serializer;
/// the mapper provides the bindings, the cache and deduplication.
pub struct SerializerRegistry<S> {
    mapper: TypeMapper<S>,
    array_resolver: Option<SharedResolver<S>>,
}

impl<S> SerializerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Returns a builder for a new registry.
    pub fn builder() -> SerializerRegistryBuilder<S> {
        SerializerRegistryBuilder {
            array_resolver: None,
            max_size: 0,
            deduplicator: Box::new(NoDeduplication),
            bindings: Vec::new(),
        }
    }

    /// Creates a registry without array support or cache bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Resolves the serializer for `ty`.
    pub fn get(&self, ty: &TypeDescriptor) -> Mapped<S> {
        let key = ty.boxed();
        self.mapper.get_or_compute(&key, || self.compute(&key))
    }

    /// Resolves the serializer for the erased type of `class`.
    pub fn get_class(&self, class: &Class) -> Mapped<S> {
        self.get(&TypeDescriptor::of(class))
    }

    /// Registers `serializer` for `class` and all of its subtypes.
    ///
    /// Registrations must happen before the first lookup of any type they
    /// could affect.
    #[track_caller]
    pub fn register(&self, class: &Class, serializer: S) {
        self.mapper.registry().bind(class, resolver::constant(serializer));
    }

    /// Registers `serializer` for exactly `ty`.
    #[track_caller]
    pub fn register_exact(&self, ty: &TypeDescriptor, serializer: S) {
        let ty = ty.boxed();
        self.mapper
            .registry()
            .bind_exact(ty.class(), resolver::specific(ty.clone(), serializer));
    }

    /// Registers a resolver for `class` and all of its subtypes.
    #[track_caller]
    pub fn register_resolver(&self, class: &Class, resolver: impl Resolver<S>) {
        self.mapper.registry().bind(class, resolver);
    }

    /// Registers a closure for `class` and all of its subtypes.
    #[track_caller]
    pub fn register_fn<F>(&self, class: &Class, f: F)
    where
        F: Fn(&Encounter<'_, S>) -> Result<Option<S>, Report> + Send + Sync + 'static,
    {
        self.mapper.registry().bind(class, resolver::from_fn(f));
    }

    /// Returns `true` if array types can be resolved.
    #[must_use]
    pub fn supports_arrays(&self) -> bool {
        self.array_resolver.is_some()
    }

    /// The hierarchy serializers of this registry.
    #[must_use]
    pub fn registry(&self) -> &HierarchyRegistry<S> {
        self.mapper.registry()
    }

    /// Returns the number of types with a cached serializer.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.mapper.cached_len()
    }

    fn compute(&self, ty: &TypeDescriptor) -> Mapped<S> {
        let encounter = Encounter::new(ty, self);
        if let Some(SerializeWith(serializer)) = ty.annotation::<SerializeWith<S>>() {
            trace_event!(ty = %ty, "serializer selected by annotation");
            let directive: SharedResolver<S> = Arc::new(resolver::constant(serializer.clone()));
            return self.mapper.try_candidates(&encounter, [&directive]);
        }

        if ty.is_array() {
            return self.mapper.try_candidates(&encounter, &self.array_resolver);
        }

        let candidates = self.mapper.registry().query(ty.class());
        trace_event!(ty = %ty, candidates = candidates.len(), "resolving serializer");
        if candidates.len() > 1 {
            let chain: SharedResolver<S> = Arc::new(ResolverChain::new(candidates.iter().cloned()));
            self.mapper.try_candidates(&encounter, [&chain])
        } else {
            self.mapper.try_candidates(&encounter, candidates.iter())
        }
    }
}

impl<S> Default for SerializerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Lookup<S> for SerializerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn lookup(&self, ty: &TypeDescriptor) -> Mapped<S> {
        self.get(ty)
    }
}

impl<S> fmt::Debug for SerializerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("supports_arrays", &self.array_resolver.is_some())
            .field("registry", self.mapper.registry())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`SerializerRegistry`].
#[must_use]
pub struct SerializerRegistryBuilder<S> {
    array_resolver: Option<SharedResolver<S>>,
    max_size: usize,
    deduplicator: Box<dyn OutputDeduplicator<S>>,
    bindings: Vec<PendingBinding<S>>,
}

impl<S> SerializerRegistryBuilder<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Supports arrays by combining the element type and the serializer of
    /// the element type into a serializer for the array.
    pub fn arrays<F>(self, combine: F) -> Self
    where
        F: Fn(&TypeDescriptor, S) -> Result<S, Report> + Send + Sync + 'static,
    {
        self.array_resolver(ArrayResolver::new(combine))
    }

    /// Supports arrays through a custom resolver.
    pub fn array_resolver(mut self, resolver: impl Resolver<S>) -> Self {
        self.array_resolver = Some(Arc::new(resolver));
        self
    }

    /// Bounds the cache to `max_size` entries. Zero means unbounded.
    pub fn with_caching(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets how resolved serializers are canonicalized before they are
    /// cached.
    pub fn with_output_deduplication(mut self, deduplicator: impl OutputDeduplicator<S>) -> Self {
        self.deduplicator = Box::new(deduplicator);
        self
    }

    /// Registers `serializer` for `class` and all of its subtypes.
    #[track_caller]
    pub fn register(mut self, class: &Class, serializer: S) -> Self {
        self.bindings.push(PendingBinding::new(
            class,
            Arc::new(resolver::constant(serializer)),
            BindingScope::Hierarchy,
        ));
        self
    }

    /// Registers a resolver for `class` and all of its subtypes.
    #[track_caller]
    pub fn register_resolver(mut self, class: &Class, resolver: impl Resolver<S>) -> Self {
        self.bindings.push(PendingBinding::new(
            class,
            Arc::new(resolver),
            BindingScope::Hierarchy,
        ));
        self
    }

    /// Builds the registry.
    pub fn build(self) -> SerializerRegistry<S> {
        SerializerRegistry {
            mapper: TypeMapper::new(
                ErrorStrategy::Break,
                self.max_size,
                self.deduplicator,
                Vec::new(),
                self.bindings,
            ),
            array_resolver: self.array_resolver,
        }
    }
}

impl<S> fmt::Debug for SerializerRegistryBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistryBuilder")
            .field("supports_arrays", &self.array_resolver.is_some())
            .field("max_size", &self.max_size)
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        format,
        string::{String, ToString},
    };

    use core::sync::atomic::{AtomicUsize, Ordering};

    use rootcause::report;

    use super::*;
    use crate::descriptor::{Primitive, builtins};

    static_assertions::assert_impl_all!(SerializerRegistry<String>: Send, Sync);

    fn registry() -> SerializerRegistry<String> {
        let registry = SerializerRegistry::builder()
            .arrays(|element, serializer| Ok(format!("{serializer}[] of {element}")))
            .build();
        registry.register(builtins::number(), "number".to_string());
        registry.register(builtins::string(), "string".to_string());
        registry
    }

    #[test]
    fn test_hierarchy_lookup() {
        let registry = registry();
        assert_eq!(registry.get_class(builtins::long()).into_value().as_deref(), Some("number"));
        assert_eq!(registry.get_class(builtins::string()).into_value().as_deref(), Some("string"));
        assert!(registry.get_class(builtins::boolean()).is_absent());
    }

    #[test]
    fn test_primitives_share_the_boxed_entry() {
        let registry = registry();
        let int = registry.get(&TypeDescriptor::of(Primitive::Int.class()));
        let integer = registry.get_class(builtins::integer());
        assert_eq!(int.value(), integer.value());
        assert_eq!(int.ty().class(), builtins::integer());
        assert_eq!(registry.cached_len(), 1);
    }

    #[test]
    fn test_arrays() {
        let registry = registry();
        let ints = TypeDescriptor::array_of(&TypeDescriptor::of(Primitive::Int.class()));
        let strings = TypeDescriptor::array_of(&TypeDescriptor::of(builtins::string()));
        let booleans = TypeDescriptor::array_of(&TypeDescriptor::of(builtins::boolean()));

        assert_eq!(registry.get(&ints).into_value().as_deref(), Some("number[] of int"));
        assert_eq!(registry.get(&strings).into_value().as_deref(), Some("string[] of String"));
        let missing = registry.get(&booleans);
        assert!(missing.is_absent());
        assert!(!missing.has_errors());
    }

    #[test]
    fn test_arrays_do_not_use_the_hierarchy() {
        let registry = SerializerRegistry::<String>::new();
        registry.register(builtins::object(), "object".to_string());
        let strings = TypeDescriptor::array_of(&TypeDescriptor::of(builtins::string()));

        assert!(!registry.supports_arrays());
        assert!(registry.get(&strings).is_absent());
        assert!(registry.get_class(builtins::string()).is_present());
    }

    #[test]
    fn test_annotation_overrides_everything() {
        let registry = registry();
        let custom = TypeDescriptor::of(builtins::string())
            .with_annotation(SerializeWith("custom".to_string()));
        assert_eq!(registry.get(&custom).into_value().as_deref(), Some("custom"));

        let custom_array = TypeDescriptor::array_of(&TypeDescriptor::of(builtins::string()))
            .with_annotation(SerializeWith("packed".to_string()));
        assert_eq!(registry.get(&custom_array).into_value().as_deref(), Some("packed"));
    }

    #[test]
    fn test_several_candidates_form_a_chain() {
        let registry = SerializerRegistry::<String>::new();
        registry.register_fn(builtins::integer(), |_| Ok(None));
        registry.register(builtins::number(), "number".to_string());
        registry.register(builtins::object(), "object".to_string());

        assert_eq!(registry.get_class(builtins::integer()).into_value().as_deref(), Some("number"));
    }

    #[test]
    fn test_failure_is_recorded() {
        let registry = SerializerRegistry::<String>::new();
        registry.register_fn(builtins::integer(), |_| Err(report!("no integers")));
        registry.register(builtins::number(), "number".to_string());

        let mapped = registry.get_class(builtins::integer());
        assert!(mapped.is_absent());
        assert_eq!(mapped.errors().len(), 1);
        assert!(mapped.as_option().is_err());
    }

    #[test]
    fn test_failures_are_cached_with_the_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = SerializerRegistry::<String>::new();
        let counter = calls.clone();
        registry.register_fn(builtins::string(), move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Err(report!("unsupported"))
        });

        for _ in 0..2 {
            let mapped = registry.get_class(builtins::string());
            assert!(mapped.is_absent());
            assert_eq!(mapped.errors().len(), 1);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(registry.cached_len(), 1);
    }

    #[test]
    fn test_register_exact() {
        let registry = registry();
        registry.register_exact(&TypeDescriptor::of(Primitive::Long.class()), "long".to_string());

        assert_eq!(registry.get_class(builtins::long()).into_value().as_deref(), Some("long"));
        assert_eq!(registry.get_class(builtins::double()).into_value().as_deref(), Some("number"));
    }

    #[test]
    fn test_builder_registrations() {
        let registry = SerializerRegistry::builder()
            .register(builtins::number(), 1_u8)
            .register_resolver(builtins::string(), resolver::constant(2))
            .build();
        assert_eq!(registry.get_class(builtins::integer()).into_value(), Some(1));
        assert_eq!(registry.get_class(builtins::string()).into_value(), Some(2));
        assert_eq!(registry.registry().len(), 2);
    }
}
