//! Tessera Reactive - Live subscriptions for Tessera.
//!
//! This crate connects declared subscriptions to a record store and a
//! network transport:
//!
//! - `Subscription`: the declaration a subscription implements
//! - `SubscriptionActivator`: builds, sends and tracks subscriptions
//! - `SubscriptionObserver`: writes each response into the store
//! - `ObserverLifecycle`: termination and resource release rules
//! - `resolve_props`: reads fragment data for a subscription's props
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tessera_core::{Object, SequentialIdSource};
//! use tessera_query::{QueryNode, SubscriptionNode, UpdateConfig};
//! use tessera_reactive::{
//!     Disposable, Subscription, SubscriptionActivator, SubscriptionCallbacks,
//!     SubscriptionRequest, Transport, TransportError,
//! };
//! use tessera_storage::MemoryStore;
//!
//! struct Ticker;
//!
//! impl Subscription for Ticker {
//!     fn name(&self) -> &str { "TickerSubscription" }
//!     fn subscription(&self) -> QueryNode {
//!         SubscriptionNode::declare("TickerSubscription", "tick", "TickInput", vec![])
//!     }
//!     fn configs(&self) -> Vec<UpdateConfig> { Vec::new() }
//!     fn variables(&self) -> Object { Object::new() }
//! }
//!
//! struct Offline;
//!
//! impl Transport for Offline {
//!     fn send_subscription(
//!         &self,
//!         _request: SubscriptionRequest,
//!     ) -> Result<Box<dyn Disposable>, TransportError> {
//!         Ok(Box::new(|| {}))
//!     }
//! }
//!
//! let store = Rc::new(RefCell::new(MemoryStore::new()));
//! let activator = SubscriptionActivator::new(store, Offline)
//!     .with_id_source(SequentialIdSource::starting_at(0));
//! let handle = activator
//!     .activate(Rc::new(Ticker), SubscriptionCallbacks::new())
//!     .unwrap();
//! assert_eq!(handle.client_subscription_id().as_str(), "0");
//! handle.dispose();
//! assert!(handle.is_disposed());
//! ```

#![no_std]

extern crate alloc;

pub mod activate;
pub mod lifecycle;
pub mod observer;
pub mod props;
pub mod subscription;
pub mod transport;

pub use activate::{SubscriptionActivator, SubscriptionHandle};
pub use lifecycle::{ObserverHandler, ObserverLifecycle};
pub use observer::{SubscriptionCallbacks, SubscriptionObserver};
pub use props::{resolve_props, ResolvedProps};
pub use subscription::Subscription;
pub use transport::{
    Disposable, EventSink, SubscriptionRequest, SubscriptionSink, Transport, TransportError,
};
