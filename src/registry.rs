//! Class-keyed resolver bindings with specificity-ordered queries.
//!
//! A [`HierarchyRegistry`] binds resolvers to classes. Querying it for a
//! concrete class returns every resolver bound to that class or one of its
//! supertypes, most specific first:
//!
//! 1. Bindings on the class itself.
//! 2. Bindings on superclasses, nearest first.
//! 3. Bindings on interfaces, by shortest is-a distance.
//! 4. Bindings on the root class.
//!
//! Bindings at the same distance keep registration order. Exact-scope
//! bindings only ever match their own class.
//!
//! ```rust
//! use typemapper::{
//!     descriptor::builtins,
//!     registry::HierarchyRegistry,
//!     resolver,
//! };
//!
//! let registry = HierarchyRegistry::<&'static str>::new();
//! registry.bind(builtins::object(), resolver::constant("object"));
//! registry.bind(builtins::number(), resolver::constant("number"));
//! registry.bind(builtins::comparable(), resolver::constant("comparable"));
//!
//! // Integer extends Number and implements Comparable.
//! assert_eq!(registry.query(builtins::integer()).len(), 3);
//! assert_eq!(registry.query(builtins::string()).len(), 2);
//! ```

use alloc::{sync::Arc, vec::Vec};
use core::{fmt, panic::Location};

use hashbrown::HashMap;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::{
    descriptor::{Class, Specificity},
    resolver::{Resolver, SharedResolver},
    sync::RwLock,
};

/// The resolvers matching a class, most specific first.
pub type Candidates<O> = Arc<[SharedResolver<O>]>;

/// Which classes a binding applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingScope {
    /// The bound class and all of its subtypes.
    Hierarchy,
    /// The bound class only.
    Exact,
}

struct Binding<O> {
    resolver: SharedResolver<O>,
    scope: BindingScope,
    sequence: u64,
    added_at: &'static Location<'static>,
}

impl<O> fmt::Debug for Binding<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.scope {
            BindingScope::Hierarchy => "hierarchy",
            BindingScope::Exact => "exact",
        };
        write!(
            f,
            "{scope} binding #{} registered at {}:{}",
            self.sequence,
            self.added_at.file(),
            self.added_at.line()
        )
    }
}

struct Bindings<O> {
    by_class: IndexMap<Class, Vec<Binding<O>>, FxBuildHasher>,
    next_sequence: u64,
    generation: u64,
}

struct Matches<O> {
    generation: u64,
    by_class: HashMap<Class, Candidates<O>, FxBuildHasher>,
}

/// Resolvers bound to classes, queried by concrete class.
///
/// Query results are memoized per class and recomputed after any new
/// binding.
pub struct HierarchyRegistry<O> {
    bindings: RwLock<Bindings<O>>,
    matches: RwLock<Matches<O>>,
}

/// A binding recorded by a builder, applied once the registry exists.
pub(crate) struct PendingBinding<O> {
    class: Class,
    resolver: SharedResolver<O>,
    scope: BindingScope,
    added_at: &'static Location<'static>,
}

impl<O: 'static> PendingBinding<O> {
    #[track_caller]
    pub(crate) fn new(class: &Class, resolver: SharedResolver<O>, scope: BindingScope) -> Self {
        Self {
            class: class.clone(),
            resolver,
            scope,
            added_at: Location::caller(),
        }
    }

    pub(crate) fn apply(self, registry: &HierarchyRegistry<O>) {
        registry.bind_at(&self.class, self.resolver, self.scope, self.added_at);
    }
}

impl<O: 'static> HierarchyRegistry<O> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(Bindings {
                by_class: IndexMap::default(),
                next_sequence: 0,
                generation: 0,
            }),
            matches: RwLock::new(Matches {
                generation: 0,
                by_class: HashMap::default(),
            }),
        }
    }

    /// Binds a resolver to `class` and all of its subtypes.
    #[track_caller]
    pub fn bind(&self, class: &Class, resolver: impl Resolver<O>) {
        self.bind_shared(class, Arc::new(resolver), BindingScope::Hierarchy);
    }

    /// Binds a resolver to `class` only.
    #[track_caller]
    pub fn bind_exact(&self, class: &Class, resolver: impl Resolver<O>) {
        self.bind_shared(class, Arc::new(resolver), BindingScope::Exact);
    }

    /// Binds an already shared resolver with the given scope.
    #[track_caller]
    pub fn bind_shared(&self, class: &Class, resolver: SharedResolver<O>, scope: BindingScope) {
        self.bind_at(class, resolver, scope, Location::caller());
    }

    fn bind_at(
        &self,
        class: &Class,
        resolver: SharedResolver<O>,
        scope: BindingScope,
        added_at: &'static Location<'static>,
    ) {
        let mut bindings = self.bindings.write();
        let sequence = bindings.next_sequence;
        bindings.next_sequence += 1;
        bindings.generation += 1;
        bindings
            .by_class
            .entry(class.clone())
            .or_default()
            .push(Binding {
                resolver,
                scope,
                sequence,
                added_at,
            });
        debug_event!(
            class = %class,
            scope = ?scope,
            sequence,
            location = %added_at,
            "bound resolver"
        );
    }

    /// Returns the resolvers applying to `class`, most specific first.
    #[must_use]
    pub fn query(&self, class: &Class) -> Candidates<O> {
        let bindings = self.bindings.read();
        {
            let matches = self.matches.read();
            if matches.generation == bindings.generation
                && let Some(candidates) = matches.by_class.get(class)
            {
                return candidates.clone();
            }
        }

        let candidates = Self::collect(&bindings, class);
        let mut matches = self.matches.write();
        if matches.generation != bindings.generation {
            matches.by_class.clear();
            matches.generation = bindings.generation;
        }
        matches.by_class.insert(class.clone(), candidates.clone());
        candidates
    }

    fn collect(bindings: &Bindings<O>, class: &Class) -> Candidates<O> {
        let mut found: Vec<(Specificity, u64, &SharedResolver<O>)> = Vec::new();
        for (ancestor, specificity) in class.ancestry() {
            let Some(bound) = bindings.by_class.get(ancestor) else {
                continue;
            };
            for binding in bound {
                if binding.scope == BindingScope::Exact && specificity != Specificity::Exact {
                    continue;
                }
                found.push((specificity, binding.sequence, &binding.resolver));
            }
        }
        found.sort_by_key(|&(specificity, sequence, _)| (specificity, sequence));
        found
            .into_iter()
            .map(|(_, _, resolver)| resolver.clone())
            .collect()
    }

    /// Returns `true` if any resolver is bound directly to `class`.
    #[must_use]
    pub fn is_bound(&self, class: &Class) -> bool {
        self.bindings.read().by_class.contains_key(class)
    }

    /// Returns the total number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.read().by_class.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.read().by_class.is_empty()
    }
}

impl<O: 'static> Default for HierarchyRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for HierarchyRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.read();
        f.debug_map().entries(bindings.by_class.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec, vec::Vec};

    use super::*;
    use crate::{
        descriptor::{TypeDescriptor, builtins},
        mapped::Mapped,
        resolver::{self, Encounter, Lookup},
    };

    static_assertions::assert_impl_all!(HierarchyRegistry<u32>: Send, Sync);

    struct NoLookup;

    impl<O> Lookup<O> for NoLookup {
        fn lookup(&self, ty: &TypeDescriptor) -> Mapped<O> {
            Mapped::not_found(ty.clone())
        }
    }

    fn labels(registry: &HierarchyRegistry<&'static str>, class: &Class) -> Vec<&'static str> {
        let ty = TypeDescriptor::of(class);
        let encounter = Encounter::new(&ty, &NoLookup);
        registry
            .query(class)
            .iter()
            .filter_map(|resolver| resolver.resolve(&encounter).ok().flatten())
            .collect()
    }

    #[test]
    fn test_specificity_order() {
        let registry = HierarchyRegistry::new();
        registry.bind(builtins::object(), resolver::constant("object"));
        registry.bind(builtins::comparable(), resolver::constant("comparable"));
        registry.bind(builtins::number(), resolver::constant("number"));
        registry.bind(builtins::integer(), resolver::constant("integer"));

        assert_eq!(
            labels(&registry, builtins::integer()),
            vec!["integer", "number", "comparable", "object"]
        );
        assert_eq!(labels(&registry, builtins::long()), vec!["number", "comparable", "object"]);
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let registry = HierarchyRegistry::new();
        registry.bind(builtins::number(), resolver::constant("first"));
        registry.bind(builtins::number(), resolver::constant("second"));
        registry.bind(builtins::char_sequence(), resolver::constant("chars"));
        registry.bind(builtins::comparable(), resolver::constant("comparable"));

        assert_eq!(labels(&registry, builtins::double()), vec!["first", "second", "comparable"]);
        // Both interfaces are direct, so registration order decides.
        assert_eq!(labels(&registry, builtins::string()), vec!["chars", "comparable"]);
    }

    #[test]
    fn test_interface_ties_follow_registration_not_declaration() {
        let registry = HierarchyRegistry::new();
        registry.bind(builtins::comparable(), resolver::constant("comparable"));
        registry.bind(builtins::char_sequence(), resolver::constant("chars"));

        // String declares CharSequence before Comparable.
        assert_eq!(labels(&registry, builtins::string()), vec!["comparable", "chars"]);
    }

    #[test]
    fn test_root_binding_is_queried_once() {
        let named = Class::interface("Named").extends(builtins::object()).build();
        let registry = HierarchyRegistry::new();
        registry.bind(builtins::object(), resolver::constant("object"));

        assert_eq!(registry.query(&named).len(), 1);
        assert_eq!(labels(&registry, &named), vec!["object"]);
    }

    #[test]
    fn test_nearer_interfaces_first() {
        let iterable = Class::interface("Iterable").build();
        let collection = Class::interface("Collection").extends(&iterable).build();
        let list = Class::interface("List").extends(&collection).build();
        let array_list = Class::builder("ArrayList").implements(&list).build();

        let registry = HierarchyRegistry::new();
        registry.bind(&iterable, resolver::constant("iterable"));
        registry.bind(&list, resolver::constant("list"));
        registry.bind(&collection, resolver::constant("collection"));

        assert_eq!(labels(&registry, &array_list), vec!["list", "collection", "iterable"]);
    }

    #[test]
    fn test_exact_bindings_do_not_propagate() {
        let registry = HierarchyRegistry::new();
        registry.bind_exact(builtins::number(), resolver::constant("exactly number"));
        registry.bind(builtins::number(), resolver::constant("number"));

        assert_eq!(labels(&registry, builtins::number()), vec!["exactly number", "number"]);
        assert_eq!(labels(&registry, builtins::integer()), vec!["number"]);
    }

    #[test]
    fn test_query_sees_later_bindings() {
        let registry = HierarchyRegistry::new();
        registry.bind(builtins::number(), resolver::constant("number"));
        assert_eq!(labels(&registry, builtins::integer()), vec!["number"]);

        registry.bind(builtins::integer(), resolver::constant("integer"));
        assert_eq!(labels(&registry, builtins::integer()), vec!["integer", "number"]);
    }

    #[test]
    fn test_memoized_queries_are_shared() {
        let registry = HierarchyRegistry::<u32>::new();
        registry.bind(builtins::number(), resolver::constant(1));
        let first = registry.query(builtins::integer());
        let second = registry.query(builtins::integer());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unbound() {
        let registry = HierarchyRegistry::<u32>::new();
        assert!(registry.is_empty());
        assert!(registry.query(builtins::string()).is_empty());

        registry.bind(builtins::string(), resolver::constant(1));
        registry.bind_exact(builtins::string(), resolver::constant(2));
        assert_eq!(registry.len(), 2);
        assert!(registry.is_bound(builtins::string()));
        assert!(!registry.is_bound(builtins::object()));
    }

    #[test]
    fn test_debug_lists_locations() {
        let registry = HierarchyRegistry::<u32>::new();
        registry.bind(builtins::string(), resolver::constant(1));
        let debug = format!("{registry:?}");
        assert!(debug.contains("Class(\"String\")"), "{debug}");
        assert!(debug.contains("hierarchy binding #0 registered at"), "{debug}");
        assert!(debug.contains(file!()), "{debug}");
    }
}
