//! Subscription query building.
//!
//! Turns a declared subscription into the wire query: binds the route and
//! `{input: ...}` variables, selects the client subscription id, and adds
//! the fields each update config needs to be applied to the store.
//!
//! Subscriptions are pushed once per event, so the store cannot infer the
//! response shape from a tracked query the way it does for mutations. Every
//! field a config reads has to be selected explicitly.

use crate::config::UpdateConfig;
use crate::editor::{add_child_field, expect_kind, has_direct_field, map_children};
use crate::node::{FieldBuilder, NodeKind, QueryNode, SubscriptionNode};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use tessera_core::{Diagnostic, DiagnosticKind, Error, Object, Result};
use tracing::{debug, warn};

/// Names used by the builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Field and input variable carrying the client subscription id
    /// (default: `clientSubscriptionId`).
    pub client_subscription_id_field: String,
    /// Type discriminator added to range-add edges (default: `__typename`).
    pub typename_field: String,
    /// Route the subscription query is built for
    /// (default: `$SubscriptionObserver`).
    pub route_name: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            client_subscription_id_field: "clientSubscriptionId".to_string(),
            typename_field: "__typename".to_string(),
            route_name: "$SubscriptionObserver".to_string(),
        }
    }
}

/// A built wire query and the advisories raised while building it.
#[derive(Clone, Debug)]
pub struct BuiltSubscription {
    /// The wire query; always a subscription node.
    pub query: QueryNode,
    /// Non-fatal advisories, in config order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds wire queries for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionQueryBuilder {
    config: BuilderConfig,
}

impl SubscriptionQueryBuilder {
    /// Creates a builder with the default names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with custom names.
    pub fn with_config(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Returns the builder's names.
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Builds the wire query for the declared subscription `ast`.
    ///
    /// `input` becomes the `input` variable. Configs are applied in order.
    pub fn build(
        &self,
        ast: &QueryNode,
        input: &Object,
        configs: &[UpdateConfig],
    ) -> Result<BuiltSubscription> {
        let declared = ast.as_subscription().ok_or_else(|| {
            Error::unexpected_node(
                "SubscriptionQueryBuilder",
                NodeKind::Subscription.as_str(),
                ast.kind().as_str(),
            )
        })?;

        let mut variables = Object::new();
        variables.insert("input", input.clone());
        let base = QueryNode::Subscription(Rc::new(SubscriptionNode::create(
            declared,
            self.config.route_name.as_str(),
            variables,
        )));

        let mut children = base.children().to_vec();
        let id_field = self.config.client_subscription_id_field.as_str();
        if !has_direct_field(&children, id_field) {
            children.push(
                FieldBuilder::new(id_field)
                    .type_name("String")
                    .requisite()
                    .generated()
                    .build(),
            );
        }

        let mut diagnostics = Vec::new();
        for config in configs {
            match config {
                UpdateConfig::RangeAdd { edge_name, .. } => {
                    children = self.add_edge_typename(&children, edge_name)?;
                }
                UpdateConfig::RangeDelete {
                    deleted_id_field_name,
                    ..
                }
                | UpdateConfig::NodeDelete {
                    deleted_id_field_name,
                    ..
                } => {
                    if deleted_id_field_name.is_empty() {
                        return Err(Error::missing_deleted_id(
                            config.kind().as_str(),
                            deleted_id_field_name.as_str(),
                        ));
                    }
                    if !has_direct_field(&children, deleted_id_field_name) {
                        children.push(
                            FieldBuilder::new(deleted_id_field_name.as_str())
                                .type_name("String")
                                .generated()
                                .build(),
                        );
                    }
                }
                UpdateConfig::RequiredChildren { .. } => {
                    warn!(
                        config = %config.kind(),
                        "subscription.builder.config_ignored"
                    );
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ConfigIgnored,
                        "`REQUIRED_CHILDREN` is not applicable to subscriptions, place any \
                         required children in the subscription query itself.",
                    ));
                }
                UpdateConfig::FieldsChange { .. } => {
                    warn!(
                        config = %config.kind(),
                        "subscription.builder.config_ignored"
                    );
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ConfigIgnored,
                        "`FIELDS_CHANGE` is not applicable to subscriptions, any fields \
                         present in the subscription query will be changed.",
                    ));
                }
            }
        }

        let query = base.clone_with_children(children);
        expect_kind(&query, NodeKind::Subscription, "SubscriptionQueryBuilder")?;

        debug!(
            call = query.call_name().unwrap_or_default(),
            configs = configs.len(),
            fields = query.children().len(),
            "subscription.builder.built"
        );
        Ok(BuiltSubscription { query, diagnostics })
    }

    /// Adds the type discriminator to every field named `edge_name`
    /// reachable through fragments.
    fn add_edge_typename(&self, children: &[QueryNode], edge_name: &str) -> Result<Vec<QueryNode>> {
        let typename = self.config.typename_field.as_str();
        let mut found = false;
        let mapped = map_children(children, &mut |field| {
            if field.schema_name() != Some(edge_name) {
                return Ok(field.clone());
            }
            found = true;
            if has_direct_field(field.children(), typename) {
                return Ok(field.clone());
            }
            add_child_field(
                field,
                FieldBuilder::new(typename)
                    .type_name("String")
                    .generated()
                    .build(),
            )
        })?;

        if !found {
            return Err(Error::missing_edge_field(edge_name));
        }
        Ok(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{range_behavior, RangeOperation};
    use crate::editor::contains_field;
    use crate::node::RootNode;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use tessera_core::Value;

    fn todo_edge() -> QueryNode {
        QueryNode::field(
            "todoEdge",
            "TodoEdge",
            vec![
                QueryNode::field("cursor", "String", vec![]),
                QueryNode::field("node", "Todo", vec![QueryNode::field("text", "String", vec![])]),
            ],
        )
    }

    fn add_todo(children: Vec<QueryNode>) -> QueryNode {
        SubscriptionNode::declare("AddTodoSubscription", "addTodoSubscribe", "AddTodoSubscribeInput", children)
    }

    fn range_add(edge: &str) -> UpdateConfig {
        UpdateConfig::range_add(
            "viewer",
            "viewer:1",
            "todos",
            edge,
            range_behavior("", RangeOperation::Append),
        )
    }

    fn input() -> Object {
        Object::from_iter([("clientSubscriptionId", Value::from("0"))])
    }

    fn count_direct(children: &[QueryNode], name: &str) -> usize {
        children
            .iter()
            .filter(|child| child.schema_name() == Some(name))
            .count()
    }

    #[test]
    fn test_build_binds_route_and_input() {
        let built = SubscriptionQueryBuilder::new()
            .build(&add_todo(vec![]), &input(), &[])
            .unwrap();

        let subscription = built.query.as_subscription().unwrap();
        assert_eq!(subscription.route(), "$SubscriptionObserver");
        assert_eq!(
            subscription.variables().get("input"),
            Some(&Value::Object(input()))
        );
        assert!(built.diagnostics.is_empty());
    }

    #[test]
    fn test_client_subscription_id_always_selected_once() {
        let builder = SubscriptionQueryBuilder::new();
        let ast = add_todo(vec![todo_edge()]);

        let built = builder.build(&ast, &input(), &[]).unwrap();
        assert_eq!(count_direct(built.query.children(), "clientSubscriptionId"), 1);
        let id = built.query.children().last().and_then(QueryNode::as_field).unwrap();
        assert!(id.is_requisite());
        assert_eq!(id.type_name(), "String");

        let configs = vec![range_add("todoEdge"), range_add("todoEdge")];
        let built = builder.build(&ast, &input(), &configs).unwrap();
        assert_eq!(count_direct(built.query.children(), "clientSubscriptionId"), 1);
    }

    #[test]
    fn test_explicit_client_subscription_id_not_duplicated() {
        let ast = add_todo(vec![QueryNode::field("clientSubscriptionId", "String", vec![])]);
        let built = SubscriptionQueryBuilder::new().build(&ast, &input(), &[]).unwrap();
        assert_eq!(built.query.children().len(), 1);
    }

    #[test]
    fn test_range_add_inserts_typename_on_edge() {
        let ast = add_todo(vec![todo_edge()]);
        let built = SubscriptionQueryBuilder::new()
            .build(&ast, &input(), &[range_add("todoEdge")])
            .unwrap();

        let edge = &built.query.children()[0];
        assert_eq!(edge.schema_name(), Some("todoEdge"));
        assert_eq!(count_direct(edge.children(), "__typename"), 1);
        // The declared tree is untouched.
        assert_eq!(count_direct(ast.children()[0].children(), "__typename"), 0);
        // Siblings of the rewritten path stay shared.
        assert!(edge.children()[1].ptr_eq(&ast.children()[0].children()[1]));
    }

    #[test]
    fn test_range_add_finds_edge_inside_fragment() {
        let ast = add_todo(vec![QueryNode::fragment(
            "Payload",
            "AddTodoSubscribePayload",
            vec![todo_edge()],
        )]);
        let built = SubscriptionQueryBuilder::new()
            .build(&ast, &input(), &[range_add("todoEdge")])
            .unwrap();

        let edge = &built.query.children()[0].children()[0];
        assert!(has_direct_field(edge.children(), "__typename"));
    }

    #[test]
    fn test_range_add_missing_edge_fails() {
        let ast = add_todo(vec![QueryNode::field("viewer", "User", vec![])]);
        let err = SubscriptionQueryBuilder::new()
            .build(&ast, &input(), &[range_add("todoEdge")])
            .unwrap_err();
        assert_eq!(err, Error::missing_edge_field("todoEdge"));
    }

    #[test]
    fn test_delete_configs_select_deleted_id() {
        let ast = add_todo(vec![]);
        let configs = vec![
            UpdateConfig::node_delete("viewer", "viewer:1", "todos", "deletedTodoId"),
            UpdateConfig::range_delete(
                "viewer",
                "viewer:1",
                "todos",
                "deletedTodoId",
                vec!["todos".to_string()],
            ),
        ];
        let built = SubscriptionQueryBuilder::new()
            .build(&ast, &input(), &configs)
            .unwrap();

        assert_eq!(count_direct(built.query.children(), "deletedTodoId"), 1);
        assert!(contains_field(built.query.children(), "clientSubscriptionId"));
    }

    #[test]
    fn test_delete_config_without_field_name_fails() {
        let config = UpdateConfig::node_delete("viewer", "viewer:1", "todos", "");
        let err = SubscriptionQueryBuilder::new()
            .build(&add_todo(vec![]), &input(), &[config])
            .unwrap_err();
        assert!(matches!(err, Error::MissingDeletedId { config: "NODE_DELETE", .. }));
    }

    #[test]
    fn test_inapplicable_configs_warn() {
        let ast = add_todo(vec![todo_edge()]);
        let configs = vec![
            UpdateConfig::RequiredChildren { children: vec![] },
            UpdateConfig::FieldsChange {
                field_ids: BTreeMap::new(),
            },
        ];
        let built = SubscriptionQueryBuilder::new()
            .build(&ast, &input(), &configs)
            .unwrap();

        assert_eq!(built.diagnostics.len(), 2);
        assert!(built
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::ConfigIgnored));
        assert!(built.diagnostics[0].message.contains("REQUIRED_CHILDREN"));
        // Only the client subscription id was added.
        assert_eq!(built.query.children().len(), 2);
    }

    #[test]
    fn test_non_subscription_ast_fails() {
        let root: QueryNode = RootNode::new("Q", "viewer", None, vec![]).into();
        let err = SubscriptionQueryBuilder::new()
            .build(&root, &input(), &[])
            .unwrap_err();
        assert_eq!(
            err,
            Error::unexpected_node("SubscriptionQueryBuilder", "subscription", "root")
        );
    }

    #[test]
    fn test_custom_names() {
        let builder = SubscriptionQueryBuilder::with_config(BuilderConfig {
            client_subscription_id_field: "subscriptionId".to_string(),
            typename_field: "kind".to_string(),
            route_name: "$Tests".to_string(),
        });
        let built = builder
            .build(&add_todo(vec![todo_edge()]), &input(), &[range_add("todoEdge")])
            .unwrap();

        assert!(has_direct_field(built.query.children(), "subscriptionId"));
        assert!(has_direct_field(built.query.children()[0].children(), "kind"));
        assert_eq!(built.query.as_subscription().unwrap().route(), "$Tests");
    }
}
