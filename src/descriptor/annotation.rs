//! Annotations attached to classes and type descriptors.
//!
//! Any `Eq + Hash + Debug + Send + Sync + 'static` value can be used as an
//! annotation; there is nothing to implement by hand. Annotations take part in
//! the structural equality of [`TypeDescriptor`](super::TypeDescriptor), so two
//! descriptors that differ only by an annotation are different cache keys.
//!
//! ```rust
//! use typemapper::descriptor::{AnnotationRef, Class};
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Comment(&'static str);
//!
//! let class = Class::builder("Settings")
//!     .annotated(Comment("top-level settings"))
//!     .build();
//!
//! assert_eq!(class.annotation::<Comment>(), Some(&Comment("top-level settings")));
//! assert_eq!(AnnotationRef::new(Comment("a")), AnnotationRef::new(Comment("a")));
//! ```

use core::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use triomphe::Arc;
use unsize::CoerceUnsize;

/// A value that can be attached to a class or a type descriptor.
///
/// This trait is implemented automatically for every type that is
/// `Eq + Hash + Debug + Send + Sync + 'static`.
pub trait Annotation: Any + Send + Sync + fmt::Debug {
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn dyn_eq(&self, other: &dyn Annotation) -> bool;

    #[doc(hidden)]
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<A> Annotation for A
where
    A: Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Annotation) -> bool {
        other
            .as_any()
            .downcast_ref::<A>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<A>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// A shared, type-erased annotation.
#[derive(Clone)]
pub struct AnnotationRef(Arc<dyn Annotation>);

impl AnnotationRef {
    /// Erases the type of `annotation`.
    #[must_use]
    pub fn new<A: Annotation>(annotation: A) -> Self {
        let annotation: Arc<A> = Arc::new(annotation);
        Self(annotation.unsize(unsize::Coercion!(to dyn Annotation)))
    }

    /// The [`TypeId`] of the annotation value.
    #[must_use]
    pub fn annotation_type(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    /// Returns `true` if the annotation is of type `A`.
    #[must_use]
    pub fn is<A: 'static>(&self) -> bool {
        self.annotation_type() == TypeId::of::<A>()
    }

    /// Downcasts the annotation to a concrete type.
    #[must_use]
    pub fn downcast_ref<A: 'static>(&self) -> Option<&A> {
        self.0.as_any().downcast_ref::<A>()
    }
}

impl PartialEq for AnnotationRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(&*other.0)
    }
}

impl Eq for AnnotationRef {}

impl Hash for AnnotationRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:?}", &*self.0)
    }
}
