//! Tessera Query - Query trees and subscription query building.
//!
//! This crate provides:
//!
//! - `node`: immutable, structurally shared query tree nodes
//! - `editor`: pure rewriting primitives over query trees
//! - `config`: update configs declared by subscriptions
//! - `builder`: turns a declared subscription into its wire query
//! - `print`: GraphQL text for wire queries
//!
//! # Example
//!
//! ```rust
//! use tessera_core::Object;
//! use tessera_query::{
//!     range_behavior, QueryNode, RangeOperation, SubscriptionNode, SubscriptionQueryBuilder,
//!     UpdateConfig,
//! };
//!
//! let ast = SubscriptionNode::declare(
//!     "AddTodoSubscription",
//!     "addTodoSubscribe",
//!     "AddTodoSubscribeInput",
//!     vec![QueryNode::field("todoEdge", "TodoEdge", vec![])],
//! );
//! let configs = vec![UpdateConfig::range_add(
//!     "viewer",
//!     "viewer:1",
//!     "todos",
//!     "todoEdge",
//!     range_behavior("", RangeOperation::Append),
//! )];
//!
//! let built = SubscriptionQueryBuilder::new()
//!     .build(&ast, &Object::new(), &configs)
//!     .unwrap();
//! let edge = &built.query.children()[0];
//! assert_eq!(edge.children()[0].schema_name(), Some("__typename"));
//! ```

#![no_std]

extern crate alloc;

pub mod builder;
pub mod config;
pub mod editor;
pub mod node;
pub mod print;

pub use builder::{BuilderConfig, BuiltSubscription, SubscriptionQueryBuilder};
pub use config::{range_behavior, ConfigKind, RangeBehaviors, RangeOperation, UpdateConfig};
pub use node::{
    BatchCall, Call, CallValue, FieldBuilder, FieldMetadata, FieldNode, FragmentNode, NodeKind,
    QueryNode, RootNode, SubscriptionNode,
};
pub use print::print_subscription;
