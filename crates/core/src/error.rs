//! Error types for Tessera.
//!
//! Every variant is a contract violation: a programmer error in how a
//! subscription, query or store was declared or wired together. These are
//! returned to the caller and never retried. Delivery-time failures coming
//! from a transport have their own type in `tessera-reactive`.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// Result type alias for Tessera operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Contract violations raised by Tessera.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A query node was not of the kind an operation requires.
    #[error("{context}: Expected a {expected}, got a {found}.")]
    UnexpectedNode {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A root query selected a field next to its fragment.
    #[error(
        "Queries supplied at the root should contain exactly one fragment and no fields. \
         Query `{query}` contains a field, `{field}`. If you need to fetch fields, \
         declare them in a fragment."
    )]
    RootField { query: String, field: String },
    /// A root query did not select exactly one fragment.
    #[error(
        "Queries supplied at the root should contain exactly one fragment. \
         Query `{query}` contains {}.",
        describe_fragment_count(.count)
    )]
    RootFragmentCount { query: String, count: usize },
    /// A root query depends on a batch (ref) call variable.
    #[error(
        "Queries supplied at the root cannot have batch call variables. \
         Query `{query}` has a batch call variable, `{variable}`."
    )]
    BatchCallVariable { query: String, variable: String },
    /// A `RANGE_ADD` config names an edge the subscription never selects.
    #[error("Subscription query does not contain edge `{edge}`.")]
    MissingEdgeField { edge: String },
    /// A delete config names no deleted-id field, or the payload lacks it.
    #[error("{config}: deleted id field `{field}` is missing.")]
    MissingDeletedId { config: &'static str, field: String },
    /// A `RANGE_ADD` config has no behavior for the connection's calls.
    #[error("RANGE_ADD: no range behavior for `{connection}` with calls `{calls}`.")]
    MissingRangeBehavior { connection: String, calls: String },
    /// `set_disposable` was called more than once on one observer.
    #[error("{observer}: attempting to set disposable more than once.")]
    DisposableAlreadySet { observer: String },
    /// An event was delivered to an observer while it was handling another.
    #[error("{observer}: re-entrant event delivery.")]
    ReentrantDelivery { observer: String },
    /// A prop handed to a subscription does not match its fragment.
    #[error("Invalid prop `{prop}` supplied to `{subscription}`, {reason}.")]
    InvalidProp {
        subscription: String,
        prop: String,
        reason: String,
    },
    /// A fragment was requested by a name the subscription does not declare.
    #[error(
        "{subscription}.fragment(): `{fragment}` is not a valid fragment name. \
         Available fragments names: {available}"
    )]
    UnknownFragment {
        subscription: String,
        fragment: String,
        available: String,
    },
    /// A fragment pointer entry has the wrong shape for its fragment.
    #[error("Fragment pointer for `{fragment}` is invalid: {reason}.")]
    InvalidPointer { fragment: String, reason: String },
    /// The record store rejected an update.
    #[error("Store update failed: {message}")]
    Store { message: String },
    /// A user callback reported a failure.
    #[error("Callback failed: {message}")]
    Callback { message: String },
}

fn describe_fragment_count(count: &usize) -> &'static str {
    if *count == 0 {
        "no fragment"
    } else {
        "more than one fragment"
    }
}

impl Error {
    /// Creates an unexpected node error.
    pub fn unexpected_node(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Error::UnexpectedNode {
            context: context.into(),
            expected,
            found,
        }
    }

    /// Creates a root field error.
    pub fn root_field(query: impl Into<String>, field: impl Into<String>) -> Self {
        Error::RootField {
            query: query.into(),
            field: field.into(),
        }
    }

    /// Creates a root fragment count error.
    pub fn root_fragment_count(query: impl Into<String>, count: usize) -> Self {
        Error::RootFragmentCount {
            query: query.into(),
            count,
        }
    }

    /// Creates a batch call variable error.
    pub fn batch_call_variable(query: impl Into<String>, variable: impl Into<String>) -> Self {
        Error::BatchCallVariable {
            query: query.into(),
            variable: variable.into(),
        }
    }

    /// Creates a missing edge field error.
    pub fn missing_edge_field(edge: impl Into<String>) -> Self {
        Error::MissingEdgeField { edge: edge.into() }
    }

    /// Creates a missing deleted-id error.
    pub fn missing_deleted_id(config: &'static str, field: impl Into<String>) -> Self {
        Error::MissingDeletedId {
            config,
            field: field.into(),
        }
    }

    /// Creates a missing range behavior error.
    pub fn missing_range_behavior(connection: impl Into<String>, calls: impl Into<String>) -> Self {
        Error::MissingRangeBehavior {
            connection: connection.into(),
            calls: calls.into(),
        }
    }

    /// Creates a disposable already set error.
    pub fn disposable_already_set(observer: impl Into<String>) -> Self {
        Error::DisposableAlreadySet {
            observer: observer.into(),
        }
    }

    /// Creates a re-entrant delivery error.
    pub fn reentrant_delivery(observer: impl Into<String>) -> Self {
        Error::ReentrantDelivery {
            observer: observer.into(),
        }
    }

    /// Creates an invalid prop error.
    pub fn invalid_prop(
        subscription: impl Into<String>,
        prop: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidProp {
            subscription: subscription.into(),
            prop: prop.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown fragment error.
    pub fn unknown_fragment<'a>(
        subscription: impl Into<String>,
        fragment: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let available = available
            .into_iter()
            .map(|name| format!("`{}`", name))
            .collect::<Vec<_>>()
            .join(", ");
        Error::UnknownFragment {
            subscription: subscription.into(),
            fragment: fragment.into(),
            available,
        }
    }

    /// Creates an invalid pointer error.
    pub fn invalid_pointer(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPointer {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
        }
    }

    /// Creates a callback error.
    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback {
            message: message.into(),
        }
    }
}
