//! The class model: classes, interfaces, primitives and arrays.
//!
//! A [`Class`] is an immutable node in an is-a graph. Every class records its
//! superclass and the interfaces it implements, and computes its complete,
//! specificity-ordered ancestry once, when it is built. The registry never has
//! to walk the graph at lookup time.
//!
//! ```rust
//! use typemapper::descriptor::{Class, Specificity, builtins};
//!
//! let shape = Class::interface("Shape").build();
//! let polygon = Class::builder("Polygon").implements(&shape).build();
//! let square = Class::builder("Square").extends(&polygon).build();
//!
//! let ancestry: Vec<_> = square
//!     .ancestry()
//!     .map(|(class, specificity)| (class.name().to_owned(), specificity))
//!     .collect();
//!
//! assert_eq!(
//!     ancestry,
//!     [
//!         ("Square".to_owned(), Specificity::Exact),
//!         ("Polygon".to_owned(), Specificity::Superclass(1)),
//!         ("Shape".to_owned(), Specificity::Interface(2)),
//!         ("Object".to_owned(), Specificity::Root),
//!     ]
//! );
//! assert!(square.is_assignable_to(&shape));
//! assert!(square.is_assignable_to(builtins::object()));
//! ```

use alloc::{borrow::Cow, format, vec::Vec};
use core::{
    fmt,
    hash::{Hash, Hasher},
};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;

use super::{
    annotation::{Annotation, AnnotationRef},
    builtins,
};

/// The primitive value types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    Char,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl Primitive {
    /// Every primitive type, in declaration order.
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Char,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    /// The name of the primitive class, e.g. `int`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// The name of the boxed class, e.g. `Integer`.
    #[must_use]
    pub const fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Char => "Character",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }

    /// Returns `true` for the primitives whose boxed class extends `Number`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Char)
    }

    /// The primitive class, e.g. `int`.
    #[must_use]
    pub fn class(self) -> &'static Class {
        builtins::primitive(self)
    }

    /// The boxed class, e.g. `Integer`.
    #[must_use]
    pub fn boxed(self) -> &'static Class {
        builtins::boxed(self)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What kind of type a [`Class`] describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// A concrete or abstract class.
    Class,
    /// An interface. Interfaces have no superclass; their parents are
    /// super-interfaces.
    Interface,
    /// A primitive value type.
    Primitive(Primitive),
    /// An array of some component class.
    Array,
}

/// How closely an ancestor matches a class.
///
/// The derived ordering sorts the most specific ancestor first: the class
/// itself, then superclasses nearest-first, then interfaces by is-a distance,
/// and finally the universal root type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// The class itself.
    Exact,
    /// A superclass, `n` inheritance steps away.
    Superclass(u32),
    /// An interface reachable in `n` is-a steps.
    Interface(u32),
    /// The universal root type.
    Root,
}

impl Specificity {
    fn distance(self) -> u32 {
        match self {
            Specificity::Exact => 0,
            Specificity::Superclass(distance) | Specificity::Interface(distance) => distance,
            Specificity::Root => u32::MAX,
        }
    }
}

/// A named node in the is-a graph.
///
/// Classes are cheap to clone. Two classes are equal when their names are
/// equal; a name identifies a class within one type universe.
#[derive(Clone)]
pub struct Class(Arc<ClassData>);

struct ClassData {
    name: Cow<'static, str>,
    kind: ClassKind,
    superclass: Option<Class>,
    interfaces: Vec<Class>,
    component: Option<Class>,
    annotations: Vec<AnnotationRef>,
    /// Every proper ancestor, most specific first. The class itself is not
    /// stored here to avoid a reference cycle.
    ancestry: Vec<(Class, Specificity)>,
}

impl Class {
    /// Starts building a class.
    #[must_use]
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ClassBuilder {
        ClassBuilder::new(name.into(), ClassKind::Class)
    }

    /// Starts building an interface.
    #[must_use]
    pub fn interface(name: impl Into<Cow<'static, str>>) -> ClassBuilder {
        ClassBuilder::new(name.into(), ClassKind::Interface)
    }

    /// The array class whose elements are `component`.
    ///
    /// Array classes are not interned; equality is by name, so calling this
    /// twice with the same component yields equal classes.
    #[must_use]
    pub fn array_of(component: &Class) -> Class {
        Class(Arc::new(ClassData {
            name: Cow::Owned(format!("{}[]", component.name())),
            kind: ClassKind::Array,
            superclass: None,
            interfaces: Vec::new(),
            component: Some(component.clone()),
            annotations: Vec::new(),
            ancestry: root_only(),
        }))
    }

    pub(crate) fn root() -> Class {
        Class(Arc::new(ClassData {
            name: Cow::Borrowed(builtins::ROOT_NAME),
            kind: ClassKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            component: None,
            annotations: Vec::new(),
            ancestry: Vec::new(),
        }))
    }

    pub(crate) fn new_primitive(primitive: Primitive) -> Class {
        Class(Arc::new(ClassData {
            name: Cow::Borrowed(primitive.name()),
            kind: ClassKind::Primitive(primitive),
            superclass: None,
            interfaces: Vec::new(),
            component: None,
            annotations: Vec::new(),
            ancestry: root_only(),
        }))
    }

    /// The fully-qualified name of the class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The kind of the class.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    /// Returns `true` if this is the universal root type.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.kind == ClassKind::Class && self.0.ancestry.is_empty()
    }

    /// Returns `true` if this is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.0.kind == ClassKind::Interface
    }

    /// Returns `true` if this is an array class.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.kind == ClassKind::Array
    }

    /// The primitive this class describes, if it is a primitive class.
    #[must_use]
    pub fn primitive(&self) -> Option<Primitive> {
        match self.0.kind {
            ClassKind::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    /// Returns `true` if this is a primitive class.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.primitive().is_some()
    }

    /// The boxed form of a primitive class; any other class is returned
    /// unchanged.
    #[must_use]
    pub fn boxed(&self) -> Class {
        match self.primitive() {
            Some(primitive) => primitive.boxed().clone(),
            None => self.clone(),
        }
    }

    /// The direct superclass. The universal root type is not reported here.
    #[must_use]
    pub fn superclass(&self) -> Option<&Class> {
        self.0.superclass.as_ref()
    }

    /// The interfaces this class directly implements (or, for an interface,
    /// directly extends).
    #[must_use]
    pub fn interfaces(&self) -> &[Class] {
        &self.0.interfaces
    }

    /// The component class of an array class.
    #[must_use]
    pub fn component(&self) -> Option<&Class> {
        self.0.component.as_ref()
    }

    /// The annotations declared on this class.
    #[must_use]
    pub fn annotations(&self) -> &[AnnotationRef] {
        &self.0.annotations
    }

    /// The first annotation of type `A` declared on this class.
    #[must_use]
    pub fn annotation<A: 'static>(&self) -> Option<&A> {
        self.0
            .annotations
            .iter()
            .find_map(|annotation| annotation.downcast_ref::<A>())
    }

    /// Every class this class is assignable to, most specific first,
    /// starting with the class itself.
    pub fn ancestry(&self) -> impl Iterator<Item = (&Class, Specificity)> + '_ {
        core::iter::once((self, Specificity::Exact)).chain(
            self.0
                .ancestry
                .iter()
                .map(|(class, specificity)| (class, *specificity)),
        )
    }

    /// How specifically this class matches `target`, or `None` if it is not
    /// assignable to it.
    #[must_use]
    pub fn specificity_to(&self, target: &Class) -> Option<Specificity> {
        self.ancestry()
            .find(|(class, _)| *class == target)
            .map(|(_, specificity)| specificity)
    }

    /// Returns `true` if a value of this class is also a `target`.
    #[must_use]
    pub fn is_assignable_to(&self, target: &Class) -> bool {
        self.specificity_to(target).is_some()
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Class").field(&&*self.0.name).finish()
    }
}

fn root_only() -> Vec<(Class, Specificity)> {
    alloc::vec![(builtins::object().clone(), Specificity::Root)]
}

/// Builder for [`Class`], obtained from [`Class::builder`] or
/// [`Class::interface`].
#[derive(Debug)]
#[must_use]
pub struct ClassBuilder {
    name: Cow<'static, str>,
    kind: ClassKind,
    superclass: Option<Class>,
    interfaces: Vec<Class>,
    annotations: Vec<AnnotationRef>,
}

impl ClassBuilder {
    fn new(name: Cow<'static, str>, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Sets the superclass.
    ///
    /// When the class being built is an interface, or `parent` is one,
    /// `parent` is recorded as an implemented (super-)interface instead.
    /// Extending the universal root type explicitly is a no-op, as every class
    /// already extends it.
    pub fn extends(mut self, parent: &Class) -> Self {
        if parent.is_root() {
            return self;
        }
        if self.kind == ClassKind::Interface || parent.is_interface() {
            self.interfaces.push(parent.clone());
        } else {
            self.superclass = Some(parent.clone());
        }
        self
    }

    /// Adds an implemented interface. The universal root type is ignored.
    pub fn implements(mut self, interface: &Class) -> Self {
        if interface.is_root() {
            return self;
        }
        self.interfaces.push(interface.clone());
        self
    }

    /// Declares an annotation on the class.
    pub fn annotated<A: Annotation>(mut self, annotation: A) -> Self {
        self.annotations.push(AnnotationRef::new(annotation));
        self
    }

    /// Builds the class and computes its ancestry.
    #[must_use]
    pub fn build(self) -> Class {
        let ancestry = compute_ancestry(self.superclass.as_ref(), &self.interfaces);
        Class(Arc::new(ClassData {
            name: self.name,
            kind: self.kind,
            superclass: self.superclass,
            interfaces: self.interfaces,
            component: None,
            annotations: self.annotations,
            ancestry,
        }))
    }
}

/// Derives the proper ancestors of a new class from the already computed
/// ancestry of its direct supertypes.
fn compute_ancestry(superclass: Option<&Class>, interfaces: &[Class]) -> Vec<(Class, Specificity)> {
    let mut ancestry = Vec::new();

    let mut depth = 0;
    let mut current = superclass;
    while let Some(class) = current {
        depth += 1;
        ancestry.push((class.clone(), Specificity::Superclass(depth)));
        current = class.superclass();
    }

    // Shortest is-a distance per interface, in discovery order.
    let mut reachable: IndexMap<Class, u32, FxBuildHasher> = IndexMap::default();
    let mut relax = |class: &Class, distance: u32| {
        reachable
            .entry(class.clone())
            .and_modify(|known| *known = (*known).min(distance))
            .or_insert(distance);
    };
    for interface in interfaces {
        relax(interface, 1);
    }
    for parent in superclass.into_iter().chain(interfaces) {
        for (ancestor, specificity) in &parent.0.ancestry {
            if ancestor.is_interface() {
                relax(ancestor, specificity.distance() + 1);
            }
        }
    }

    let mut reachable: Vec<(Class, u32)> = reachable.into_iter().collect();
    reachable.sort_by_key(|(_, distance)| *distance);
    ancestry.extend(
        reachable
            .into_iter()
            .map(|(class, distance)| (class, Specificity::Interface(distance))),
    );

    ancestry.push((builtins::object().clone(), Specificity::Root));
    ancestry
}
