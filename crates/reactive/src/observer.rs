//! Subscription observer.
//!
//! `SubscriptionObserver` is the `ObserverHandler` for one activated
//! subscription. Each response is written to the store before the user's
//! callback sees it, so the callback always observes the updated records.

use crate::lifecycle::ObserverHandler;
use crate::subscription::Subscription;
use crate::transport::TransportError;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{OnceCell, RefCell};
use core::fmt;
use tessera_core::{ClientSubscriptionId, Diagnostic, Error, Object, Result, Value};
use tessera_query::{BuiltSubscription, QueryNode, SubscriptionQueryBuilder, UpdateConfig};
use tessera_storage::{RecordStore, UpdateOptions};
use tracing::debug;

type NextCallback = Box<dyn FnMut(&Value) -> Result<()>>;
type ErrorCallback = Box<dyn FnMut(&TransportError) -> Result<()>>;
type CompletedCallback = Box<dyn FnMut() -> Result<()>>;

/// User callbacks of a subscription. All optional.
#[derive(Default)]
pub struct SubscriptionCallbacks {
    on_next: Option<NextCallback>,
    on_error: Option<ErrorCallback>,
    on_completed: Option<CompletedCallback>,
}

impl SubscriptionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with each payload (the response entry under the call name),
    /// after the store was updated.
    pub fn on_next<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Value) -> Result<()> + 'static,
    {
        self.on_next = Some(Box::new(callback));
        self
    }

    /// Called with a terminal transport error.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&TransportError) -> Result<()> + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Called on terminal completion.
    pub fn on_completed<F>(mut self, callback: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.on_completed = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SubscriptionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionCallbacks")
            .field("on_next", &self.on_next.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_completed", &self.on_completed.is_some())
            .finish()
    }
}

/// Writes one subscription's responses into a shared store.
pub struct SubscriptionObserver<S> {
    subscription: Rc<dyn Subscription>,
    store: Rc<RefCell<S>>,
    builder: SubscriptionQueryBuilder,
    client_subscription_id: ClientSubscriptionId,
    callbacks: SubscriptionCallbacks,
    variables: OnceCell<Object>,
    built: OnceCell<BuiltSubscription>,
    configs: OnceCell<Vec<UpdateConfig>>,
}

impl<S: RecordStore> SubscriptionObserver<S> {
    pub fn new(
        subscription: Rc<dyn Subscription>,
        store: Rc<RefCell<S>>,
        builder: SubscriptionQueryBuilder,
        client_subscription_id: ClientSubscriptionId,
        callbacks: SubscriptionCallbacks,
    ) -> Self {
        Self {
            subscription,
            store,
            builder,
            client_subscription_id,
            callbacks,
            variables: OnceCell::new(),
            built: OnceCell::new(),
            configs: OnceCell::new(),
        }
    }

    #[inline]
    pub fn client_subscription_id(&self) -> &ClientSubscriptionId {
        &self.client_subscription_id
    }

    #[inline]
    pub fn subscription(&self) -> &Rc<dyn Subscription> {
        &self.subscription
    }

    /// The `input` variables: the subscription's own plus the client
    /// subscription id.
    pub fn variables(&self) -> &Object {
        self.variables.get_or_init(|| {
            let mut variables = self.subscription.variables();
            variables.insert(
                self.builder.config().client_subscription_id_field.as_str(),
                self.client_subscription_id.as_str(),
            );
            variables
        })
    }

    pub fn configs(&self) -> &[UpdateConfig] {
        self.configs.get_or_init(|| self.subscription.configs())
    }

    /// The wire query, built on first use.
    pub fn query(&self) -> Result<&QueryNode> {
        Ok(&self.built()?.query)
    }

    /// Advisories raised while building the query. Empty until built.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.built
            .get()
            .map(|built| built.diagnostics.as_slice())
            .unwrap_or_default()
    }

    fn built(&self) -> Result<&BuiltSubscription> {
        if let Some(built) = self.built.get() {
            return Ok(built);
        }
        let built = self.builder.build(
            &self.subscription.subscription(),
            self.variables(),
            self.configs(),
        )?;
        Ok(self.built.get_or_init(|| built))
    }
}

impl<S: RecordStore> ObserverHandler for SubscriptionObserver<S> {
    type Item = Value;
    type Error = TransportError;

    fn next(&mut self, response: Value) -> Result<()> {
        let query = self.query()?.clone();
        let call_name = query.call_name().unwrap_or_default();
        let payload = response.get(call_name).cloned().unwrap_or_default();
        {
            let mut store = self
                .store
                .try_borrow_mut()
                .map_err(|_| Error::store("record store is already borrowed"))?;
            store.apply_update(
                &query,
                &payload,
                &UpdateOptions {
                    configs: self.configs(),
                    is_optimistic: false,
                },
            )?;
        }
        debug!(
            subscription = %self.subscription.name(),
            client_subscription_id = %self.client_subscription_id,
            "subscription.observer.next"
        );

        match self.callbacks.on_next.as_mut() {
            Some(callback) => callback(&payload),
            None => Ok(()),
        }
    }

    fn error(&mut self, error: TransportError) -> Result<()> {
        debug!(
            subscription = %self.subscription.name(),
            client_subscription_id = %self.client_subscription_id,
            error = %error,
            "subscription.observer.error"
        );
        match self.callbacks.on_error.as_mut() {
            Some(callback) => callback(&error),
            None => Ok(()),
        }
    }

    fn completed(&mut self) -> Result<()> {
        debug!(
            subscription = %self.subscription.name(),
            client_subscription_id = %self.client_subscription_id,
            "subscription.observer.completed"
        );
        match self.callbacks.on_completed.as_mut() {
            Some(callback) => callback(),
            None => Ok(()),
        }
    }
}
