//! Well-known classes shared by every type universe.
//!
//! The universal root type, [`object`], is the implicit supertype of every
//! class, interface, array and primitive. The boxed primitive classes extend
//! [`number`] where that makes sense, and every boxed class implements
//! [`comparable`].

use super::class::{Class, Primitive};
use crate::sync::Lazy;

pub(crate) const ROOT_NAME: &str = "Object";

static OBJECT: Lazy<Class> = Lazy::new(Class::root);
static COMPARABLE: Lazy<Class> = Lazy::new(|| Class::interface("Comparable").build());
static CHAR_SEQUENCE: Lazy<Class> = Lazy::new(|| Class::interface("CharSequence").build());
static NUMBER: Lazy<Class> = Lazy::new(|| Class::builder("Number").build());
static STRING: Lazy<Class> = Lazy::new(|| {
    Class::builder("String")
        .implements(&CHAR_SEQUENCE)
        .implements(&COMPARABLE)
        .build()
});
static PRIMITIVES: Lazy<[Class; 8]> = Lazy::new(|| Primitive::ALL.map(Class::new_primitive));
static BOXED: Lazy<[Class; 8]> = Lazy::new(|| {
    Primitive::ALL.map(|primitive| {
        let builder = Class::builder(primitive.boxed_name());
        let builder = if primitive.is_numeric() {
            builder.extends(&NUMBER)
        } else {
            builder
        };
        builder.implements(&COMPARABLE).build()
    })
});

fn index(primitive: Primitive) -> usize {
    primitive as usize
}

/// The universal root type. Every class is assignable to it.
#[must_use]
pub fn object() -> &'static Class {
    &OBJECT
}

/// The `Comparable` interface.
#[must_use]
pub fn comparable() -> &'static Class {
    &COMPARABLE
}

/// The `CharSequence` interface.
#[must_use]
pub fn char_sequence() -> &'static Class {
    &CHAR_SEQUENCE
}

/// The abstract `Number` class, superclass of the numeric boxed classes.
#[must_use]
pub fn number() -> &'static Class {
    &NUMBER
}

/// The `String` class.
#[must_use]
pub fn string() -> &'static Class {
    &STRING
}

/// The primitive class for `primitive`, e.g. `int`.
#[must_use]
pub fn primitive(primitive: Primitive) -> &'static Class {
    &PRIMITIVES[index(primitive)]
}

/// The boxed class for `primitive`, e.g. `Integer`.
#[must_use]
pub fn boxed(primitive: Primitive) -> &'static Class {
    &BOXED[index(primitive)]
}

/// The `Boolean` class.
#[must_use]
pub fn boolean() -> &'static Class {
    boxed(Primitive::Boolean)
}

/// The `Character` class.
#[must_use]
pub fn character() -> &'static Class {
    boxed(Primitive::Char)
}

/// The `Integer` class.
#[must_use]
pub fn integer() -> &'static Class {
    boxed(Primitive::Int)
}

/// The `Long` class.
#[must_use]
pub fn long() -> &'static Class {
    boxed(Primitive::Long)
}

/// The `Double` class.
#[must_use]
pub fn double() -> &'static Class {
    boxed(Primitive::Double)
}
