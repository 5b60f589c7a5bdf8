#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Hierarchy-aware, cached resolution of handlers from type descriptors.
//!
//! ## Overview
//!
//! Serialization frameworks, configuration loaders and dependency injectors
//! all face the same question: given a description of a type, which handler
//! applies to it? This crate answers it with a [`TypeMapper`]: a collection
//! of pluggable [resolvers](resolver::Resolver) bound to classes, consulted
//! from the most specific binding to the least specific one, with every
//! answer cached.
//!
//! ## Quick Example
//!
//! ```
//! use typemapper::{
//!     TypeMapper,
//!     descriptor::{TypeDescriptor, builtins},
//! };
//!
//! let mapper = TypeMapper::<&'static str>::builder()
//!     .add_hierarchy_fn(builtins::object(), |_| Ok(Some("anything")))
//!     .add_hierarchy_fn(builtins::number(), |_| Ok(Some("a number")))
//!     .add_specific(&TypeDescriptor::of(builtins::integer()), "an integer")
//!     .build();
//!
//! assert_eq!(mapper.get_class(builtins::integer()).into_value(), Some("an integer"));
//! assert_eq!(mapper.get_class(builtins::long()).into_value(), Some("a number"));
//! assert_eq!(mapper.get_class(builtins::string()).into_value(), Some("anything"));
//! ```
//!
//! ## Core Concepts
//!
//! - A [`Class`](descriptor::Class) is a node of a type universe: a class,
//!   an interface, a primitive or an array, with its supertypes. The
//!   [`builtins`](descriptor::builtins) module provides the universal root
//!   and the usual boxed primitives.
//! - A [`TypeDescriptor`](descriptor::TypeDescriptor) is one use of a
//!   class, with generic parameters and annotations. Descriptors are the
//!   cache keys.
//! - A [`Resolver`](resolver::Resolver) turns a descriptor into a value, or
//!   declines, or fails with a [`Report`](rootcause::Report).
//! - A [`Mapped`] is the result of a lookup: a value or an absence, plus
//!   every error raised along the way.
//!
//! ## Resolution Order
//!
//! 1. Annotation resolvers, in registration order.
//! 2. Resolvers bound to the class itself.
//! 3. Resolvers bound to superclasses, nearest first.
//! 4. Resolvers bound to interfaces, nearest first.
//! 5. Resolvers bound to the root class.
//!
//! The first value produced wins. A failing resolver either stops the
//! search or is recorded and skipped, depending on the [`ErrorStrategy`].
//!
//! ## Serializers
//!
//! [`SerializerRegistry`] specializes the mapper for serializers: it honours
//! a [`SerializeWith`] annotation, derives array serializers from element
//! serializers, and looks primitives up as their boxed classes.
//!
//! ## Features
//!
//! - `std`: use the standard library's locks instead of spin locks.
//! - `tracing`: emit `debug` events for registrations and `trace` events for
//!   cache misses through the [`tracing`](https://docs.rs/tracing) crate.
//!   Resolver failures are never logged; they are returned in [`Mapped`].

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod macros;

pub mod dedup;
pub mod descriptor;
pub mod mapped;
pub mod mapper;
pub mod prelude;
pub mod registry;
pub mod resolver;
pub mod serializer;

mod cache;
mod sync;

pub use rootcause;

pub use self::{
    mapped::Mapped,
    mapper::{ErrorStrategy, MutableTypeMapper, TypeMapper},
    serializer::{SerializeWith, SerializerRegistry},
};
