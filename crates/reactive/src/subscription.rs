//! The subscription capability.
//!
//! A `Subscription` is a declaration: which server subscription to open,
//! with which variables, and how its payloads update the store.

use alloc::string::String;
use alloc::vec::Vec;
use tessera_core::{Error, FragmentId, Object, Result};
use tessera_query::{QueryNode, UpdateConfig};

/// A declared subscription.
pub trait Subscription {
    /// Name used in diagnostics and errors.
    fn name(&self) -> &str;

    /// The subscription AST, as made by `SubscriptionNode::declare`.
    fn subscription(&self) -> QueryNode;

    /// How payloads update the store.
    fn configs(&self) -> Vec<UpdateConfig>;

    /// The `input` variables, without `clientSubscriptionId`.
    fn variables(&self) -> Object;

    /// Named fragments whose data the subscription reads from its props.
    ///
    /// Implementations may build fresh nodes on every call; callers go
    /// through `declared_fragments` or `fragment`, which key each fragment
    /// by subscription and prop name.
    fn fragments(&self) -> Vec<(String, QueryNode)> {
        Vec::new()
    }

    /// `fragments`, with each fragment carrying its declared identity.
    fn declared_fragments(&self) -> Vec<(String, QueryNode)> {
        self.fragments()
            .into_iter()
            .map(|(prop, node)| {
                let id = FragmentId::declared(self.name(), &prop);
                let node = node.with_fragment_id(id);
                (prop, node)
            })
            .collect()
    }

    /// Looks up a declared fragment by name. Pointers created against the
    /// returned fragment resolve in `resolve_props`.
    fn fragment(&self, name: &str) -> Result<QueryNode> {
        let fragments = self.declared_fragments();
        if let Some((_, fragment)) = fragments.iter().find(|(declared, _)| declared == name) {
            return Ok(fragment.clone());
        }
        Err(Error::unknown_fragment(
            self.name(),
            name,
            fragments.iter().map(|(declared, _)| declared.as_str()),
        ))
    }
}
