//! Tessera Core - Core types for the Tessera subscription client.
//!
//! This crate provides the foundational types shared by every Tessera crate:
//!
//! - `Value` / `Object`: the data model for variables, payloads and records
//! - `DataId`, `FragmentId`, `ClientSubscriptionId`: identifiers
//! - `IdSource`: injectable source of client subscription ids
//! - `Diagnostic`: non-fatal advisories
//! - `Error`: contract violations
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{IdSource, Object, SequentialIdSource, Value};
//!
//! let ids = SequentialIdSource::starting_at(61);
//! assert_eq!(ids.next_id().as_str(), "Z");
//!
//! let mut input = Object::new();
//! input.insert("text", "buy milk");
//! input.insert("clientSubscriptionId", ids.next_id().as_str());
//! assert_eq!(input.get("clientSubscriptionId"), Some(&Value::from("10")));
//! ```

#![no_std]

extern crate alloc;

mod diagnostic;
mod error;
mod id;
mod value;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use id::{
    base62, next_client_subscription_id, ClientSubscriptionId, DataId, FragmentId,
    GlobalIdSource, IdSource, SequentialIdSource,
};
pub use value::{Object, Value};
