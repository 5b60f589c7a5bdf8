//! Commonly used items for convenient importing.
//!
//! ```rust
//! use typemapper::prelude::*;
//!
//! let mapper = TypeMapper::<u8>::builder()
//!     .add_hierarchy_fn(builtins::number(), |_: &Encounter<'_, u8>| -> Result<Option<u8>, Report> {
//!         Ok(Some(1))
//!     })
//!     .build();
//!
//! assert!(mapper.get(&TypeDescriptor::of(builtins::integer())).is_present());
//! ```

pub use rootcause::{Report, bail, report};

pub use crate::{
    ErrorStrategy, Mapped, MutableTypeMapper, SerializeWith, SerializerRegistry, TypeMapper,
    descriptor::{Class, Primitive, TypeDescriptor, builtins},
    resolver::{self, Encounter, Lookup, Resolver},
};
