//! The result envelope returned by every lookup.
//!
//! A [`Mapped`] is either a resolved value or the absence of one, together
//! with every error raised by resolvers along the way. Errors are kept even
//! when a later resolver succeeds, so diagnostics are never lost:
//!
//! ```rust
//! use typemapper::{
//!     ErrorStrategy, TypeMapper,
//!     descriptor::builtins,
//!     rootcause::{Report, report},
//! };
//!
//! let mapper = TypeMapper::<&'static str>::builder()
//!     .with_error_strategy(ErrorStrategy::Continue)
//!     .add_hierarchy_fn(builtins::integer(), |_| -> Result<Option<&'static str>, Report> {
//!         Err(report!("integer support is broken"))
//!     })
//!     .add_hierarchy_fn(builtins::number(), |_| Ok(Some("number")))
//!     .build();
//!
//! let mapped = mapper.get_class(builtins::integer());
//! assert_eq!(mapped.get().ok(), Some(&"number"));
//! assert!(mapped.has_errors());
//! assert_eq!(mapped.errors().len(), 1);
//! ```

use core::fmt;

use rootcause::{Report, report_collection::ReportCollection};

use crate::descriptor::TypeDescriptor;

/// The outcome of resolving a type: a present value or an absence, plus the
/// errors accumulated while resolving it.
#[derive(Clone, Debug)]
pub struct Mapped<O> {
    ty: TypeDescriptor,
    value: Option<O>,
    errors: ReportCollection,
}

impl<O> Mapped<O> {
    pub(crate) fn present(ty: TypeDescriptor, value: O, errors: ReportCollection) -> Self {
        Self {
            ty,
            value: Some(value),
            errors,
        }
    }

    pub(crate) fn absent(ty: TypeDescriptor, errors: ReportCollection) -> Self {
        Self {
            ty,
            value: None,
            errors,
        }
    }

    pub(crate) fn not_found(ty: TypeDescriptor) -> Self {
        Self::absent(ty, ReportCollection::new())
    }

    /// The type this result was resolved for.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Returns `true` if a value was resolved.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if no value was resolved.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// The resolved value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&O> {
        self.value.as_ref()
    }

    /// Consumes the result, returning the resolved value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<O> {
        self.value
    }

    /// The resolved value.
    ///
    /// # Errors
    ///
    /// Returns a [`NotPresent`] report when no value was resolved. Any errors
    /// raised by resolvers are attached to it as children.
    #[track_caller]
    pub fn get(&self) -> Result<&O, Report<NotPresent>> {
        match &self.value {
            Some(value) => Ok(value),
            None => Err(self.errors.clone().context(NotPresent {
                ty: self.ty.clone(),
            })),
        }
    }

    /// Returns `true` if any resolver raised an error, whether or not a value
    /// was eventually resolved.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The errors raised by resolvers, in the order they were raised.
    #[must_use]
    pub fn errors(&self) -> &ReportCollection {
        &self.errors
    }

    /// Converts the result into an option.
    ///
    /// A present value is returned even if errors were raised before it was
    /// resolved. An absence without errors is a plain `None`.
    ///
    /// # Errors
    ///
    /// An absence with errors becomes a [`ResolutionFailed`] report carrying
    /// every accumulated error as a child.
    #[track_caller]
    pub fn as_option(&self) -> Result<Option<&O>, Report<ResolutionFailed>> {
        self.as_option_with(|| ResolutionFailed {
            ty: self.ty.clone(),
        })
    }

    /// Like [`as_option`](Self::as_option), but the caller chooses the
    /// context of the returned report.
    ///
    /// # Errors
    ///
    /// An absence with errors becomes a report with the context returned by
    /// `context`, carrying every accumulated error as a child.
    #[track_caller]
    pub fn as_option_with<D, F>(&self, context: F) -> Result<Option<&O>, Report<D>>
    where
        D: fmt::Display + fmt::Debug + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match &self.value {
            Some(value) => Ok(Some(value)),
            None if self.errors.is_empty() => Ok(None),
            None => Err(self.errors.clone().context(context())),
        }
    }

    /// Maps the resolved value, keeping the type and errors.
    #[must_use]
    pub fn map<P, F>(self, f: F) -> Mapped<P>
    where
        F: FnOnce(O) -> P,
    {
        Mapped {
            ty: self.ty,
            value: self.value.map(f),
            errors: self.errors,
        }
    }
}

/// Report context returned by [`Mapped::get`] when no value was resolved.
#[derive(Clone, Debug)]
pub struct NotPresent {
    ty: TypeDescriptor,
}

impl NotPresent {
    /// The type that has no value.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }
}

impl fmt::Display for NotPresent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value was resolved for type {}", self.ty)
    }
}

impl core::error::Error for NotPresent {}

/// Report context returned by [`Mapped::as_option`] when resolvers failed and
/// none succeeded.
#[derive(Clone, Debug)]
pub struct ResolutionFailed {
    ty: TypeDescriptor,
}

impl ResolutionFailed {
    /// The type that failed to resolve.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }
}

impl fmt::Display for ResolutionFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to resolve type {}", self.ty)
    }
}

impl core::error::Error for ResolutionFailed {}
