//! Wire query printing.
//!
//! Renders a built subscription as compact GraphQL text:
//!
//! ```text
//! subscription AddTodo($input:AddTodoInput!){addTodoSubscribe(input:$input){todoEdge{__typename},clientSubscriptionId}}
//! ```

use crate::node::{NodeKind, QueryNode};
use alloc::string::String;
use core::fmt::Write;
use tessera_core::{Error, Result};

/// Prints a subscription node as GraphQL text.
pub fn print_subscription(query: &QueryNode) -> Result<String> {
    let subscription = query.as_subscription().ok_or_else(|| {
        Error::unexpected_node(
            "print_subscription",
            NodeKind::Subscription.as_str(),
            query.kind().as_str(),
        )
    })?;
    let mut out = String::new();
    let _ = write!(
        out,
        "subscription {}($input:{}!){{{}(input:$input)",
        subscription.name(),
        subscription.input_type(),
        subscription.call_name()
    );
    print_selections(&mut out, subscription.children());
    out.push('}');
    Ok(out)
}

fn print_selections(out: &mut String, children: &[QueryNode]) {
    if children.is_empty() {
        return;
    }
    out.push('{');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        print_node(out, child);
    }
    out.push('}');
}

fn print_node(out: &mut String, node: &QueryNode) {
    match node {
        QueryNode::Field(field) => {
            if let Some(alias) = field.alias() {
                let _ = write!(out, "{}:", alias);
            }
            out.push_str(field.schema_name());
            if !field.calls().is_empty() {
                out.push('(');
                for (i, call) in field.calls().iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}", call);
                }
                out.push(')');
            }
            print_selections(out, field.children());
        }
        QueryNode::Fragment(fragment) => {
            let _ = write!(out, "... on {}", fragment.type_name());
            print_selections(out, fragment.children());
        }
        QueryNode::Root(_) | QueryNode::Subscription(_) => {}
    }
}
