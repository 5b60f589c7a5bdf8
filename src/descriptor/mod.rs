//! Type descriptors: the keys every lookup is made with.
//!
//! A [`TypeDescriptor`] is an erased [`Class`] plus generic parameters and
//! annotations. Descriptors are immutable, cheap to clone and compared by
//! structure, which makes them suitable as cache keys.
//!
//! Descriptors are expected to be computed by the caller. This crate does not
//! discover types on its own; the [`Class`] model only describes the is-a
//! relationships the registries need for matching.
//!
//! ```rust
//! use typemapper::descriptor::{Class, TypeDescriptor, builtins};
//!
//! let list = Class::interface("List").build();
//! let strings = TypeDescriptor::parameterized(&list, [TypeDescriptor::of(builtins::string())]);
//!
//! assert_eq!(strings.to_string(), "List<String>");
//! assert_eq!(strings.erased(), TypeDescriptor::of(&list));
//! assert_ne!(strings, TypeDescriptor::of(&list));
//! ```

mod annotation;
pub mod builtins;
mod class;

use alloc::vec::Vec;
use core::{
    fmt,
    hash::{Hash, Hasher},
};

use triomphe::Arc;

pub use self::{
    annotation::{Annotation, AnnotationRef},
    class::{Class, ClassBuilder, ClassKind, Primitive, Specificity},
};

/// A reified type: an erased class, its generic parameters and annotations.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<DescriptorData>);

#[derive(PartialEq, Eq, Hash)]
struct DescriptorData {
    class: Class,
    parameters: Vec<TypeDescriptor>,
    annotations: Vec<AnnotationRef>,
}

impl TypeDescriptor {
    /// The erased descriptor of `class`: no parameters, no annotations.
    #[must_use]
    pub fn of(class: &Class) -> Self {
        Self::from_parts(class.clone(), Vec::new(), Vec::new())
    }

    /// A descriptor of `class` with the given generic parameters.
    #[must_use]
    pub fn parameterized(class: &Class, parameters: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::from_parts(class.clone(), parameters.into_iter().collect(), Vec::new())
    }

    /// The descriptor of an array of `component`.
    ///
    /// The component descriptor is kept as the single parameter only when it
    /// carries information beyond its class, so `array_of(&of(int))` equals
    /// `of(&Class::array_of(int))`.
    #[must_use]
    pub fn array_of(component: &TypeDescriptor) -> Self {
        let class = Class::array_of(component.class());
        let parameters = if component.is_erased() {
            Vec::new()
        } else {
            alloc::vec![component.clone()]
        };
        Self::from_parts(class, parameters, Vec::new())
    }

    fn from_parts(class: Class, parameters: Vec<TypeDescriptor>, annotations: Vec<AnnotationRef>) -> Self {
        Self(Arc::new(DescriptorData {
            class,
            parameters,
            annotations,
        }))
    }

    /// Returns a copy of this descriptor with one more annotation.
    #[must_use]
    pub fn with_annotation<A: Annotation>(&self, annotation: A) -> Self {
        let mut annotations = self.0.annotations.clone();
        annotations.push(AnnotationRef::new(annotation));
        Self::from_parts(self.0.class.clone(), self.0.parameters.clone(), annotations)
    }

    /// The erased class.
    #[must_use]
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// The generic parameters, in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.0.parameters
    }

    /// The generic parameter at `index`.
    #[must_use]
    pub fn parameter(&self, index: usize) -> Option<&TypeDescriptor> {
        self.0.parameters.get(index)
    }

    /// The annotations on this use of the type. Annotations declared on the
    /// class are available through [`Class::annotations`].
    #[must_use]
    pub fn annotations(&self) -> &[AnnotationRef] {
        &self.0.annotations
    }

    /// The first annotation of type `A`, looking at this descriptor first and
    /// at the declaring class second.
    #[must_use]
    pub fn annotation<A: 'static>(&self) -> Option<&A> {
        self.0
            .annotations
            .iter()
            .find_map(|annotation| annotation.downcast_ref::<A>())
            .or_else(|| self.0.class.annotation::<A>())
    }

    /// Returns `true` if the descriptor has no parameters and no annotations.
    #[must_use]
    pub fn is_erased(&self) -> bool {
        self.0.parameters.is_empty() && self.0.annotations.is_empty()
    }

    /// This descriptor without parameters and annotations.
    #[must_use]
    pub fn erased(&self) -> Self {
        if self.is_erased() {
            self.clone()
        } else {
            Self::of(&self.0.class)
        }
    }

    /// Returns `true` if the class is an array class.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.class.is_array()
    }

    /// Returns `true` if the class is a primitive class.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.0.class.is_primitive()
    }

    /// The component type of an array descriptor.
    #[must_use]
    pub fn component(&self) -> Option<TypeDescriptor> {
        let component = self.0.class.component()?;
        Some(match self.0.parameters.first() {
            Some(parameter) => parameter.clone(),
            None => Self::of(component),
        })
    }

    /// The descriptor with a primitive class replaced by its boxed class.
    /// Parameters and annotations are kept.
    #[must_use]
    pub fn boxed(&self) -> Self {
        match self.0.class.primitive() {
            Some(primitive) => Self::from_parts(
                primitive.boxed().clone(),
                self.0.parameters.clone(),
                self.0.annotations.clone(),
            ),
            None => self.clone(),
        }
    }
}

impl From<&Class> for TypeDescriptor {
    fn from(class: &Class) -> Self {
        Self::of(class)
    }
}

impl From<Class> for TypeDescriptor {
    fn from(class: Class) -> Self {
        Self::from_parts(class, Vec::new(), Vec::new())
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for annotation in &self.0.annotations {
            write!(f, "{annotation} ")?;
        }
        if let Some(component) = self.0.parameters.first().filter(|_| self.is_array()) {
            return write!(f, "{component}[]");
        }
        write!(f, "{}", self.0.class)?;
        if let Some((first, rest)) = self.0.parameters.split_first() {
            write!(f, "<{first}")?;
            for parameter in rest {
                write!(f, ", {parameter}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}
