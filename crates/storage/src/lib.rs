//! Tessera Storage - Record store layer for Tessera.
//!
//! This crate provides the storage layer including:
//!
//! - `RecordStore`: the normalized cache contract subscriptions write into
//! - `MemoryStore`: an in-memory `RecordStore`
//! - `fragment_pointer`: pointers from fragments to the records they read
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{Object, Value};
//! use tessera_query::{QueryNode, RootNode};
//! use tessera_storage::{fragment_pointer, MemoryStore, RecordStore};
//!
//! let mut store = MemoryStore::new();
//! store.put_record("123", Object::from_iter([("name", "Ada")]));
//!
//! let fragment = QueryNode::fragment("UserName", "User", vec![QueryNode::field("name", "String", vec![])]);
//! let root: QueryNode = RootNode::new("UserQuery", "node", Some(Value::from("123")), vec![fragment.clone()]).into();
//!
//! let pointer = fragment_pointer::create_for_root(&store, &root).unwrap().unwrap();
//! let fragment = fragment.as_fragment().unwrap();
//! let id = fragment_pointer::data_id(&pointer, fragment).unwrap().unwrap();
//! let data = store.read(fragment, &id).unwrap();
//! assert_eq!(data.get("name"), Some(&Value::from("Ada")));
//! ```

#![no_std]

extern crate alloc;

pub mod cache;
pub mod fragment_pointer;
pub mod store;

pub use cache::MemoryStore;
pub use fragment_pointer::{DATA_ID_KEY, FRAGMENTS_KEY};
pub use store::{RecordStore, RootCall, UpdateOptions};
