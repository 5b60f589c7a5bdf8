//! Resolvers: the pluggable units that turn a type into a value.
//!
//! A [`Resolver`] is handed an [`Encounter`] for the type being resolved and
//! answers with one of three outcomes:
//!
//! - `Ok(Some(value))`: the resolver handles the type.
//! - `Ok(None)`: the resolver does not apply; the next candidate is tried.
//! - `Err(report)`: the resolver applies but failed. The report is collected
//!   into the eventual [`Mapped`] result.
//!
//! Resolvers that need the values of other types (element types, type
//! parameters) request them through [`Encounter::resolve`], which goes back
//! through the owning mapper and its cache.
//!
//! Most resolvers are built from closures:
//!
//! ```rust
//! use typemapper::{
//!     TypeMapper,
//!     descriptor::{TypeDescriptor, builtins},
//!     resolver,
//! };
//!
//! let mapper = TypeMapper::<String>::builder()
//!     .add_hierarchy_resolver(
//!         builtins::number(),
//!         resolver::from_fn(|encounter| Ok(Some(format!("number: {}", encounter.ty())))),
//!     )
//!     .build();
//!
//! let mapped = mapper.get(&TypeDescriptor::of(builtins::long()));
//! assert_eq!(mapped.value().map(String::as_str), Some("number: Long"));
//! ```

mod chain;

use alloc::sync::Arc;
use core::{any::TypeId, fmt, marker::PhantomData};

use rootcause::Report;

pub use self::chain::ResolverChain;
use crate::{
    descriptor::{Class, TypeDescriptor},
    mapped::Mapped,
};

/// A unit of resolution logic producing values of type `O`.
pub trait Resolver<O>: Send + Sync + 'static {
    /// Attempts to produce a value for the encountered type.
    ///
    /// # Errors
    ///
    /// Returns a report when the resolver applies to the type but could not
    /// produce a value for it.
    fn resolve(&self, encounter: &Encounter<'_, O>) -> Result<Option<O>, Report>;

    /// Annotation types this resolver reacts to.
    ///
    /// Hints are advisory metadata for tooling; they never affect the
    /// outcome of resolution.
    fn hints(&self) -> &[TypeId] {
        &[]
    }
}

/// A resolver shared between registries, chains and caches.
pub type SharedResolver<O> = Arc<dyn Resolver<O>>;

/// Something that maps types to [`Mapped`] values.
///
/// Implemented by [`TypeMapper`](crate::TypeMapper) and
/// [`SerializerRegistry`](crate::SerializerRegistry). Resolvers only ever see
/// their owner through this trait.
pub trait Lookup<O> {
    /// Resolves a type, consulting the cache first.
    fn lookup(&self, ty: &TypeDescriptor) -> Mapped<O>;
}

/// The type being resolved together with the lookup that is resolving it.
pub struct Encounter<'a, O> {
    ty: &'a TypeDescriptor,
    lookup: &'a dyn Lookup<O>,
}

impl<'a, O> Encounter<'a, O> {
    /// Creates an encounter of `ty` on behalf of `lookup`.
    pub fn new(ty: &'a TypeDescriptor, lookup: &'a dyn Lookup<O>) -> Self {
        Self { ty, lookup }
    }

    /// The type being resolved.
    #[must_use]
    pub fn ty(&self) -> &'a TypeDescriptor {
        self.ty
    }

    /// The class of the type being resolved.
    #[must_use]
    pub fn class(&self) -> &'a Class {
        self.ty.class()
    }

    /// The lookup that owns this resolution.
    #[must_use]
    pub fn lookup(&self) -> &'a dyn Lookup<O> {
        self.lookup
    }

    /// Resolves another type through the owning lookup.
    ///
    /// A resolver must not request the type it is currently resolving.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Mapped<O> {
        self.lookup.lookup(ty)
    }
}

impl<O> fmt::Debug for Encounter<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter").field("ty", self.ty).finish()
    }
}

/// Resolver returned by [`from_fn`].
pub struct FromFn<F, O> {
    f: F,
    _output: PhantomData<fn() -> O>,
}

/// Creates a resolver from a closure.
pub fn from_fn<O, F>(f: F) -> FromFn<F, O>
where
    F: Fn(&Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
{
    FromFn {
        f,
        _output: PhantomData,
    }
}

impl<O, F> Resolver<O> for FromFn<F, O>
where
    O: 'static,
    F: Fn(&Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
{
    fn resolve(&self, encounter: &Encounter<'_, O>) -> Result<Option<O>, Report> {
        (self.f)(encounter)
    }
}

impl<F, O> fmt::Debug for FromFn<F, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

/// Resolver returned by [`for_annotation`].
pub struct ForAnnotation<A, F, O> {
    f: F,
    hints: [TypeId; 1],
    _marker: PhantomData<fn(&A) -> O>,
}

/// Creates a resolver that applies only to types carrying an annotation of
/// type `A`.
///
/// The closure receives the annotation and the encounter. Types without the
/// annotation are passed over, and `A` is reported through
/// [`Resolver::hints`].
///
/// ```rust
/// use typemapper::{
///     TypeMapper,
///     descriptor::{TypeDescriptor, builtins},
///     resolver,
/// };
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Setting(&'static str);
///
/// let mapper = TypeMapper::<String>::builder()
///     .add_annotation_resolver(resolver::for_annotation(|setting: &Setting, _| {
///         Ok(Some(format!("setting {}", setting.0)))
///     }))
///     .build();
///
/// let annotated = TypeDescriptor::of(builtins::string()).with_annotation(Setting("port"));
/// assert_eq!(mapper.get(&annotated).into_value().as_deref(), Some("setting port"));
/// assert!(mapper.get(&TypeDescriptor::of(builtins::string())).is_absent());
/// ```
pub fn for_annotation<A, O, F>(f: F) -> ForAnnotation<A, F, O>
where
    A: 'static,
    F: Fn(&A, &Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
{
    ForAnnotation {
        f,
        hints: [TypeId::of::<A>()],
        _marker: PhantomData,
    }
}

impl<A, O, F> Resolver<O> for ForAnnotation<A, F, O>
where
    A: 'static,
    O: 'static,
    F: Fn(&A, &Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
{
    fn resolve(&self, encounter: &Encounter<'_, O>) -> Result<Option<O>, Report> {
        match encounter.ty().annotation::<A>() {
            Some(annotation) => (self.f)(annotation, encounter),
            None => Ok(None),
        }
    }

    fn hints(&self) -> &[TypeId] {
        &self.hints
    }
}

impl<A, F, O> fmt::Debug for ForAnnotation<A, F, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForAnnotation")
            .field("annotation", &core::any::type_name::<A>())
            .finish_non_exhaustive()
    }
}

/// Resolver returned by [`specific`]: yields a value for one exact type.
#[derive(Clone, Debug)]
pub struct Specific<O> {
    ty: TypeDescriptor,
    value: O,
}

/// Creates a resolver producing `value` for `ty` and nothing else.
///
/// The match is on the whole descriptor, so `List<String>` and
/// `List<Integer>` are told apart.
pub fn specific<O>(ty: TypeDescriptor, value: O) -> Specific<O>
where
    O: Clone + Send + Sync + 'static,
{
    Specific { ty, value }
}

impl<O> Specific<O> {
    /// The type this resolver answers for.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }
}

impl<O> Resolver<O> for Specific<O>
where
    O: Clone + Send + Sync + 'static,
{
    fn resolve(&self, encounter: &Encounter<'_, O>) -> Result<Option<O>, Report> {
        if *encounter.ty() == self.ty {
            Ok(Some(self.value.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Resolver returned by [`constant`]: yields the same value for every type
/// it is asked about.
#[derive(Clone, Debug)]
pub struct Constant<O>(O);

/// Creates a resolver that always produces `value`.
///
/// Bound to a class in a hierarchy registry, this hands the value to the
/// class and every subtype of it.
pub fn constant<O>(value: O) -> Constant<O>
where
    O: Clone + Send + Sync + 'static,
{
    Constant(value)
}

impl<O> Resolver<O> for Constant<O>
where
    O: Clone + Send + Sync + 'static,
{
    fn resolve(&self, _encounter: &Encounter<'_, O>) -> Result<Option<O>, Report> {
        Ok(Some(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String};

    use rootcause::report;

    use super::*;
    use crate::descriptor::builtins;

    static_assertions::assert_obj_safe!(Resolver<u32>);
    static_assertions::assert_impl_all!(SharedResolver<String>: Send, Sync);

    struct NoLookup;

    impl<O> Lookup<O> for NoLookup {
        fn lookup(&self, ty: &TypeDescriptor) -> Mapped<O> {
            Mapped::not_found(ty.clone())
        }
    }

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Label(&'static str);

    #[test]
    fn test_from_fn() {
        let resolver = from_fn(|encounter: &Encounter<'_, String>| {
            if encounter.class().is_assignable_to(builtins::number()) {
                Ok(Some(format!("numeric {}", encounter.ty())))
            } else {
                Ok(None)
            }
        });

        let integer = TypeDescriptor::of(builtins::integer());
        let string = TypeDescriptor::of(builtins::string());
        assert_eq!(
            resolver.resolve(&Encounter::new(&integer, &NoLookup)).unwrap(),
            Some(String::from("numeric Integer"))
        );
        assert_eq!(resolver.resolve(&Encounter::new(&string, &NoLookup)).unwrap(), None);
        assert!(resolver.hints().is_empty());
    }

    #[test]
    fn test_from_fn_error() {
        let resolver = from_fn(|_: &Encounter<'_, u32>| Err(report!("no luck")));
        let string = TypeDescriptor::of(builtins::string());
        let error = resolver
            .resolve(&Encounter::new(&string, &NoLookup))
            .unwrap_err();
        assert_eq!(format!("{}", error.format_current_context()), "no luck");
    }

    #[test]
    fn test_for_annotation() {
        let resolver = for_annotation(|label: &Label, _: &Encounter<'_, &'static str>| {
            Ok(Some(label.0))
        });
        assert_eq!(resolver.hints(), &[TypeId::of::<Label>()]);

        let plain = TypeDescriptor::of(builtins::string());
        let labelled = plain.with_annotation(Label("name"));
        assert_eq!(resolver.resolve(&Encounter::new(&plain, &NoLookup)).unwrap(), None);
        assert_eq!(
            resolver.resolve(&Encounter::new(&labelled, &NoLookup)).unwrap(),
            Some("name")
        );
    }

    #[test]
    fn test_specific_matches_whole_descriptor() {
        let list = Class::interface("List").build();
        let strings = TypeDescriptor::parameterized(&list, [TypeDescriptor::of(builtins::string())]);
        let integers =
            TypeDescriptor::parameterized(&list, [TypeDescriptor::of(builtins::integer())]);

        let resolver = specific(strings.clone(), 1_u32);
        assert_eq!(resolver.resolve(&Encounter::new(&strings, &NoLookup)).unwrap(), Some(1));
        assert_eq!(resolver.resolve(&Encounter::new(&integers, &NoLookup)).unwrap(), None);
    }

    #[test]
    fn test_constant() {
        let resolver = constant(5_u8);
        let string = TypeDescriptor::of(builtins::string());
        assert_eq!(resolver.resolve(&Encounter::new(&string, &NoLookup)).unwrap(), Some(5));
    }

    #[test]
    fn test_encounter_delegates_to_lookup() {
        let string = TypeDescriptor::of(builtins::string());
        let encounter = Encounter::<u32>::new(&string, &NoLookup);
        let nested = encounter.resolve(&TypeDescriptor::of(builtins::integer()));
        assert!(nested.is_absent());
        assert_eq!(nested.ty().class(), builtins::integer());
    }
}
