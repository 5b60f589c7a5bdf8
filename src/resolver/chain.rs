use alloc::vec::Vec;
use core::{any::TypeId, fmt};

use rootcause::Report;

use super::{Encounter, Resolver, SharedResolver};

/// An ordered group of resolvers acting as one.
///
/// Members are tried in order; the first one to produce a value wins. A
/// failing member stops the chain and its error is returned. The hints of a
/// chain are the union of its members' hints, each listed once in order of
/// first appearance.
pub struct ResolverChain<O> {
    members: Vec<SharedResolver<O>>,
    hints: Vec<TypeId>,
}

impl<O: 'static> ResolverChain<O> {
    /// Creates a chain from its members, in priority order.
    pub fn new(members: impl IntoIterator<Item = SharedResolver<O>>) -> Self {
        let members: Vec<_> = members.into_iter().collect();
        let mut hints = Vec::new();
        for hint in members.iter().flat_map(|member| member.hints()) {
            if !hints.contains(hint) {
                hints.push(*hint);
            }
        }
        Self { members, hints }
    }

    /// The members of the chain, in priority order.
    #[must_use]
    pub fn members(&self) -> &[SharedResolver<O>] {
        &self.members
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the chain has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<O: 'static> Resolver<O> for ResolverChain<O> {
    fn resolve(&self, encounter: &Encounter<'_, O>) -> Result<Option<O>, Report> {
        for member in &self.members {
            if let Some(value) = member.resolve(encounter)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn hints(&self) -> &[TypeId] {
        &self.hints
    }
}

impl<O> fmt::Debug for ResolverChain<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("members", &self.members.len())
            .field("hints", &self.hints)
            .finish()
    }
}
