use core::{fmt, marker::PhantomData};

use rootcause::Report;

use crate::{
    descriptor::TypeDescriptor,
    resolver::{Encounter, Resolver},
};

/// Resolves array types from the serializer of their element type.
///
/// The element type is looked up through the owning registry, so it is
/// cached and subject to the same rules as any other lookup. An element type
/// without a serializer leaves the array without one; an element type that
/// failed to resolve makes the array fail with a [`MissingElementSerializer`]
/// report carrying the element's errors.
pub struct ArrayResolver<F, S> {
    combine: F,
    _output: PhantomData<fn() -> S>,
}

impl<F, S> ArrayResolver<F, S>
where
    F: Fn(&TypeDescriptor, S) -> Result<S, Report> + Send + Sync + 'static,
{
    /// Creates an array resolver from a function receiving the element type
    /// and its serializer.
    pub fn new(combine: F) -> Self {
        Self {
            combine,
            _output: PhantomData,
        }
    }
}

impl<F, S> Resolver<S> for ArrayResolver<F, S>
where
    F: Fn(&TypeDescriptor, S) -> Result<S, Report> + Send + Sync + 'static,
    S: Clone + 'static,
{
    fn resolve(&self, encounter: &Encounter<'_, S>) -> Result<Option<S>, Report> {
        let Some(element) = encounter.ty().component() else {
            return Ok(None);
        };
        let mapped = encounter.resolve(&element);
        let serializer = mapped
            .as_option_with(|| MissingElementSerializer {
                array: encounter.ty().clone(),
                element: element.clone(),
            })
            .map_err(|report| report.into_dynamic())?;
        match serializer {
            Some(serializer) => Ok(Some((self.combine)(&element, serializer.clone())?)),
            None => Ok(None),
        }
    }
}

impl<F, S> fmt::Debug for ArrayResolver<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayResolver").finish_non_exhaustive()
    }
}

/// Report context for an array whose element type failed to resolve.
#[derive(Clone, Debug)]
pub struct MissingElementSerializer {
    array: TypeDescriptor,
    element: TypeDescriptor,
}

impl MissingElementSerializer {
    /// The array type.
    #[must_use]
    pub fn array(&self) -> &TypeDescriptor {
        &self.array
    }

    /// The element type that failed to resolve.
    #[must_use]
    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }
}

impl fmt::Display for MissingElementSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot serialize {} because its element type {} failed to resolve",
            self.array, self.element
        )
    }
}

impl core::error::Error for MissingElementSerializer {}
