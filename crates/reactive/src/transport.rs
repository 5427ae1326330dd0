//! The network layer contract.
//!
//! A `Transport` sends a subscription request and hands back a
//! `Disposable` that tears the subscription down. Responses flow back
//! through the request's `SubscriptionSink`.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use tessera_core::{Object, Result, Value};
use tessera_query::{print_subscription, QueryNode};
use thiserror::Error;

/// A resource released by `dispose`.
///
/// Implementations must tolerate repeated calls.
pub trait Disposable {
    /// Releases the resource.
    fn dispose(&mut self);
}

impl<F: FnMut()> Disposable for F {
    fn dispose(&mut self) {
        self()
    }
}

/// A delivery-time failure reported by the transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Receives the events of one subscription.
pub trait EventSink {
    /// Delivers a response.
    fn on_next(&self, response: Value) -> Result<()>;
    /// Delivers a terminal error.
    fn on_error(&self, error: TransportError) -> Result<()>;
    /// Delivers terminal completion.
    fn on_completed(&self) -> Result<()>;
}

/// Cloneable handle to an `EventSink`, given to the transport.
#[derive(Clone)]
pub struct SubscriptionSink(Rc<dyn EventSink>);

impl SubscriptionSink {
    /// Wraps a sink.
    pub fn new(sink: Rc<dyn EventSink>) -> Self {
        Self(sink)
    }

    #[inline]
    pub fn on_next(&self, response: Value) -> Result<()> {
        self.0.on_next(response)
    }

    #[inline]
    pub fn on_error(&self, error: TransportError) -> Result<()> {
        self.0.on_error(error)
    }

    #[inline]
    pub fn on_completed(&self) -> Result<()> {
        self.0.on_completed()
    }
}

impl fmt::Debug for SubscriptionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSink").finish_non_exhaustive()
    }
}

/// A subscription ready to be sent.
#[derive(Clone, Debug)]
pub struct SubscriptionRequest {
    query: QueryNode,
    variables: Object,
    sink: SubscriptionSink,
}

impl SubscriptionRequest {
    /// Creates a request.
    pub fn new(query: QueryNode, variables: Object, sink: SubscriptionSink) -> Self {
        Self {
            query,
            variables,
            sink,
        }
    }

    /// The wire query.
    pub fn query(&self) -> &QueryNode {
        &self.query
    }

    /// The query's `input` variables.
    pub fn variables(&self) -> &Object {
        &self.variables
    }

    /// Where responses go.
    pub fn sink(&self) -> &SubscriptionSink {
        &self.sink
    }

    /// Renders the wire query as GraphQL text.
    pub fn query_text(&self) -> Result<String> {
        print_subscription(&self.query)
    }
}

/// Sends subscriptions to a server.
pub trait Transport {
    /// Sends `request`, returning the handle that tears it down.
    fn send_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> core::result::Result<Box<dyn Disposable>, TransportError>;
}
