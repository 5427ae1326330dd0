//! Subscription activation.
//!
//! `SubscriptionActivator` wires a declared subscription to the shared
//! store and the transport: it builds the observer and its wire query,
//! sends the request, and hands back a handle that tears everything down.

use crate::lifecycle::ObserverLifecycle;
use crate::observer::{SubscriptionCallbacks, SubscriptionObserver};
use crate::subscription::Subscription;
use crate::transport::{EventSink, SubscriptionRequest, SubscriptionSink, Transport};
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use tessera_core::{ClientSubscriptionId, Diagnostic, GlobalIdSource, IdSource, Result};
use tessera_query::{BuilderConfig, SubscriptionQueryBuilder};
use tessera_storage::RecordStore;
use tracing::{debug, warn};

/// Type-erased teardown of an activated observer.
trait Teardown {
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

impl<S: RecordStore> Teardown for ObserverLifecycle<SubscriptionObserver<S>> {
    fn dispose(&self) {
        ObserverLifecycle::dispose(self)
    }

    fn is_disposed(&self) -> bool {
        ObserverLifecycle::is_disposed(self)
    }
}

/// Handle to an active subscription.
pub struct SubscriptionHandle {
    client_subscription_id: ClientSubscriptionId,
    diagnostics: Vec<Diagnostic>,
    observer: Rc<dyn Teardown>,
}

impl SubscriptionHandle {
    /// Stops the subscription and releases the transport resource.
    /// Idempotent.
    pub fn dispose(&self) {
        self.observer.dispose();
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.observer.is_disposed()
    }

    #[inline]
    pub fn client_subscription_id(&self) -> &ClientSubscriptionId {
        &self.client_subscription_id
    }

    /// Advisories raised while building the wire query.
    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("client_subscription_id", &self.client_subscription_id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Activates subscriptions against a shared store and a transport.
pub struct SubscriptionActivator<S, T> {
    store: Rc<RefCell<S>>,
    transport: T,
    config: BuilderConfig,
    ids: Box<dyn IdSource>,
}

impl<S, T> SubscriptionActivator<S, T>
where
    S: RecordStore + 'static,
    T: Transport,
{
    /// Creates an activator using the default builder names and the
    /// process-wide id counter.
    pub fn new(store: Rc<RefCell<S>>, transport: T) -> Self {
        Self {
            store,
            transport,
            config: BuilderConfig::default(),
            ids: Box::new(GlobalIdSource),
        }
    }

    /// Uses custom builder names.
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom source of client subscription ids.
    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn store(&self) -> &Rc<RefCell<S>> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Activates `subscription`.
    ///
    /// Fails if the wire query cannot be built. A transport that refuses the
    /// request reports through `callbacks`' error path instead, and the
    /// returned handle is already terminated.
    pub fn activate(
        &self,
        subscription: Rc<dyn Subscription>,
        callbacks: SubscriptionCallbacks,
    ) -> Result<SubscriptionHandle> {
        let client_subscription_id = self.ids.next_id();
        let observer = SubscriptionObserver::new(
            subscription.clone(),
            self.store.clone(),
            SubscriptionQueryBuilder::with_config(self.config.clone()),
            client_subscription_id.clone(),
            callbacks,
        );
        let query = observer.query()?.clone();
        let variables = observer.variables().clone();
        let diagnostics = observer.diagnostics().to_vec();

        let lifecycle = Rc::new(ObserverLifecycle::new(
            client_subscription_id.as_str(),
            observer,
        ));
        let sink: Rc<dyn EventSink> = lifecycle.clone();
        let request = SubscriptionRequest::new(query, variables, SubscriptionSink::new(sink));

        match self.transport.send_subscription(request) {
            Ok(disposable) => {
                lifecycle.set_disposable(disposable)?;
                debug!(
                    subscription = %subscription.name(),
                    client_subscription_id = %client_subscription_id,
                    "subscription.activate.sent"
                );
            }
            Err(error) => {
                warn!(
                    subscription = %subscription.name(),
                    client_subscription_id = %client_subscription_id,
                    error = %error,
                    "subscription.activate.send_failed"
                );
                if let Err(callback_error) = lifecycle.on_error(error) {
                    warn!(
                        client_subscription_id = %client_subscription_id,
                        error = %callback_error,
                        "subscription.activate.error_callback_failed"
                    );
                }
            }
        }

        Ok(SubscriptionHandle {
            client_subscription_id,
            diagnostics,
            observer: lifecycle,
        })
    }
}
