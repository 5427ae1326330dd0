//! Query tree editing.
//!
//! Pure rewriting primitives over immutable query trees. A rewrite clones
//! only the nodes on the path to a changed field; every untouched subtree is
//! returned as the same `Rc`, so sharing between parents survives.

use crate::node::{NodeKind, QueryNode};
use alloc::vec::Vec;
use tessera_core::{Error, Result};

/// Applies `transform` to every field reachable from `node` through
/// fragments.
///
/// Fields are handed to `transform` as-is; the traversal does not descend
/// into a field's own children. Fragments are rebuilt only when one of their
/// children changed. Any other node kind is a contract violation.
pub fn map_fields<F>(node: &QueryNode, transform: &mut F) -> Result<QueryNode>
where
    F: FnMut(&QueryNode) -> Result<QueryNode>,
{
    match node {
        QueryNode::Field(_) => transform(node),
        QueryNode::Fragment(fragment) => {
            let children = map_children(fragment.children(), transform)?;
            if same_nodes(fragment.children(), &children) {
                return Ok(node.clone());
            }
            let rebuilt = node.clone_with_children(children);
            expect_kind(&rebuilt, NodeKind::Fragment, "map_fields")?;
            Ok(rebuilt)
        }
        other => Err(Error::unexpected_node(
            "map_fields",
            "field or a fragment",
            other.kind().as_str(),
        )),
    }
}

/// Runs `map_fields` over each node of a child list.
pub fn map_children<F>(children: &[QueryNode], transform: &mut F) -> Result<Vec<QueryNode>>
where
    F: FnMut(&QueryNode) -> Result<QueryNode>,
{
    let mut mapped = Vec::with_capacity(children.len());
    for child in children {
        mapped.push(map_fields(child, transform)?);
    }
    Ok(mapped)
}

/// Returns a copy of `parent` with `child` appended to its children.
pub fn add_child_field(parent: &QueryNode, child: QueryNode) -> Result<QueryNode> {
    let mut children = parent.children().to_vec();
    children.push(child);
    let field = parent.clone_with_children(children);
    expect_kind(&field, NodeKind::Field, "add_child_field")?;
    Ok(field)
}

/// Returns true if `children` directly contains a field named `schema_name`.
pub fn has_direct_field(children: &[QueryNode], schema_name: &str) -> bool {
    children
        .iter()
        .any(|child| child.schema_name() == Some(schema_name))
}

/// Returns true if a field named `schema_name` is reachable from `children`
/// through fragments.
pub fn contains_field(children: &[QueryNode], schema_name: &str) -> bool {
    children.iter().any(|child| match child {
        QueryNode::Field(field) => field.schema_name() == schema_name,
        QueryNode::Fragment(fragment) => contains_field(fragment.children(), schema_name),
        _ => false,
    })
}

/// Fails unless `node` is of the `expected` kind.
pub(crate) fn expect_kind(node: &QueryNode, expected: NodeKind, context: &str) -> Result<()> {
    if node.kind() == expected {
        Ok(())
    } else {
        Err(Error::unexpected_node(
            context,
            expected.as_str(),
            node.kind().as_str(),
        ))
    }
}

fn same_nodes(a: &[QueryNode], b: &[QueryNode]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FieldBuilder, RootNode, SubscriptionNode};
    use alloc::string::ToString;
    use alloc::vec;

    fn typename() -> QueryNode {
        FieldBuilder::new("__typename").type_name("String").build()
    }

    #[test]
    fn test_map_fields_untouched_tree_is_shared() {
        let id = QueryNode::field("id", "ID", vec![]);
        let fragment = QueryNode::fragment("Payload", "AddTodoPayload", vec![id]);

        let mapped = map_fields(&fragment, &mut |field| Ok(field.clone())).unwrap();
        assert!(mapped.ptr_eq(&fragment));
    }

    #[test]
    fn test_map_fields_walks_through_fragments() {
        let edge = QueryNode::field("todoEdge", "TodoEdge", vec![]);
        let inner = QueryNode::fragment("Inner", "AddTodoPayload", vec![edge]);
        let other = QueryNode::field("viewer", "User", vec![]);
        let outer = QueryNode::fragment("Outer", "AddTodoPayload", vec![other.clone(), inner]);

        let mut seen = Vec::new();
        let mapped = map_fields(&outer, &mut |field| {
            seen.push(field.schema_name().unwrap_or_default().to_string());
            if field.schema_name() == Some("todoEdge") {
                add_child_field(field, typename())
            } else {
                Ok(field.clone())
            }
        })
        .unwrap();

        assert_eq!(seen, vec!["viewer", "todoEdge"]);
        assert!(!mapped.ptr_eq(&outer));
        // The unchanged sibling is shared, not copied.
        assert!(mapped.children()[0].ptr_eq(&other));
        let edge = &mapped.children()[1].children()[0];
        assert!(has_direct_field(edge.children(), "__typename"));
        // The original tree still has no type discriminator.
        assert!(!has_direct_field(outer.children()[1].children()[0].children(), "__typename"));
    }

    #[test]
    fn test_map_fields_keeps_fragment_identity() {
        let fragment = QueryNode::fragment("F", "T", vec![QueryNode::field("a", "String", vec![])]);
        let mapped = map_fields(&fragment, &mut |field| add_child_field(field, typename())).unwrap();
        assert_eq!(
            mapped.as_fragment().unwrap().id(),
            fragment.as_fragment().unwrap().id()
        );
    }

    #[test]
    fn test_map_fields_rejects_other_nodes() {
        let root: QueryNode = RootNode::new("Q", "viewer", None, vec![]).into();
        let err = map_fields(&root, &mut |field| Ok(field.clone())).unwrap_err();
        assert!(err.to_string().contains("Expected a field or a fragment"));
    }

    #[test]
    fn test_add_child_field_appends() {
        let parent = QueryNode::field("todoEdge", "TodoEdge", vec![QueryNode::field("cursor", "String", vec![])]);
        let updated = add_child_field(&parent, typename()).unwrap();

        assert_eq!(parent.children().len(), 1);
        assert_eq!(updated.children().len(), 2);
        assert_eq!(updated.children()[1].schema_name(), Some("__typename"));
    }

    #[test]
    fn test_add_child_field_requires_field() {
        let fragment = QueryNode::fragment("F", "T", vec![]);
        let err = add_child_field(&fragment, typename()).unwrap_err();
        assert_eq!(
            err,
            Error::unexpected_node("add_child_field", "field", "fragment")
        );

        let subscription = SubscriptionNode::declare("S", "s", "SInput", vec![]);
        assert!(add_child_field(&subscription, typename()).is_err());
    }

    #[test]
    fn test_contains_field() {
        let tree = vec![QueryNode::fragment(
            "F",
            "T",
            vec![QueryNode::field("todoEdge", "TodoEdge", vec![])],
        )];
        assert!(contains_field(&tree, "todoEdge"));
        assert!(!has_direct_field(&tree, "todoEdge"));
        assert!(!contains_field(&tree, "viewer"));
    }
}
