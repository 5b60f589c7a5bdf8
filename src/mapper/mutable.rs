use core::{fmt, ops::Deref};

use rootcause::Report;

use super::{TypeMapper, shared};
use crate::{
    descriptor::{Class, TypeDescriptor},
    resolver::{self, Encounter, Resolver},
};

/// A [`TypeMapper`] that accepts registrations after it has been built.
///
/// Registrations take `&self`, so a mutable mapper can be shared. Results
/// that are already cached are not recomputed, so every registration must
/// happen before the first lookup of any type it could affect.
///
/// ```rust
/// use typemapper::{TypeMapper, descriptor::builtins};
///
/// let mapper = TypeMapper::<&'static str>::builder().build_mutable();
/// mapper.add_hierarchy_fn(builtins::number(), |_| Ok(Some("number")));
///
/// assert_eq!(mapper.get_class(builtins::long()).into_value(), Some("number"));
/// ```
pub struct MutableTypeMapper<O>(TypeMapper<O>);

impl<O> MutableTypeMapper<O>
where
    O: Clone + Send + Sync + 'static,
{
    pub(super) fn new(mapper: TypeMapper<O>) -> Self {
        Self(mapper)
    }

    /// Maps exactly `ty` to `value`.
    #[track_caller]
    pub fn add_specific(&self, ty: &TypeDescriptor, value: O) {
        self.0.add_specific(ty, value);
    }

    /// Binds a resolver to `class` and all of its subtypes.
    #[track_caller]
    pub fn add_hierarchy_resolver(&self, class: &Class, resolver: impl Resolver<O>) {
        self.0.add_hierarchy_resolver(class, shared(resolver));
    }

    /// Binds a closure to `class` and all of its subtypes.
    #[track_caller]
    pub fn add_hierarchy_fn<F>(&self, class: &Class, f: F)
    where
        F: Fn(&Encounter<'_, O>) -> Result<Option<O>, Report> + Send + Sync + 'static,
    {
        self.add_hierarchy_resolver(class, resolver::from_fn(f));
    }

    /// Adds a resolver consulted for every type before the hierarchy.
    pub fn add_annotation_resolver(&self, resolver: impl Resolver<O>) {
        self.0.add_annotation_resolver(shared(resolver));
    }

    /// Stops accepting registrations.
    #[must_use]
    pub fn freeze(self) -> TypeMapper<O> {
        self.0
    }
}

impl<O> Deref for MutableTypeMapper<O> {
    type Target = TypeMapper<O>;

    fn deref(&self) -> &TypeMapper<O> {
        &self.0
    }
}

impl<O> fmt::Debug for MutableTypeMapper<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableTypeMapper").field(&self.0).finish()
    }
}
