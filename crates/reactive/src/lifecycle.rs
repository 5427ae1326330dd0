//! Observer lifecycle.
//!
//! `ObserverLifecycle` drives an `ObserverHandler` through one
//! subscription's events. It owns the termination state and the transport
//! resource, so a handler only has to say what each event means:
//!
//! - events after termination are dropped;
//! - a terminal event or `dispose` ends the subscription exactly once;
//! - the attached `Disposable` is released exactly once, even when disposal
//!   is requested before the resource arrives.

use crate::transport::{Disposable, EventSink, TransportError};
use alloc::boxed::Box;
use alloc::string::String;
use core::cell::{Cell, RefCell, RefMut};
use tessera_core::{Error, Result, Value};
use tracing::trace;

/// What an observer does with each event.
pub trait ObserverHandler {
    /// Payload type of `next`.
    type Item;
    /// Error type of `error`.
    type Error;

    fn next(&mut self, item: Self::Item) -> Result<()>;
    fn error(&mut self, error: Self::Error) -> Result<()>;
    fn completed(&mut self) -> Result<()>;
}

/// Termination and resource state around an `ObserverHandler`.
pub struct ObserverLifecycle<H> {
    name: String,
    handler: RefCell<H>,
    active: Cell<bool>,
    disposed: Cell<bool>,
    disposable_set: Cell<bool>,
    disposable: RefCell<Option<Box<dyn Disposable>>>,
}

impl<H: ObserverHandler> ObserverLifecycle<H> {
    /// Creates an active lifecycle. `name` identifies it in errors.
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            handler: RefCell::new(handler),
            active: Cell::new(true),
            disposed: Cell::new(false),
            disposable_set: Cell::new(false),
            disposable: RefCell::new(None),
        }
    }

    /// Returns the lifecycle's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until the first terminal event or disposal.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns true once disposed.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Delivers a value. A handler failure disposes the observer and is
    /// returned; a panicking handler disposes it while unwinding.
    pub fn on_next(&self, item: H::Item) -> Result<()> {
        if !self.is_active() {
            trace!(observer = %self.name, "observer.next.dropped");
            return Ok(());
        }
        let mut handler = self.handler_mut()?;
        let guard = DisposeGuard::new(self);
        let result = handler.next(item);
        drop(handler);
        if result.is_ok() {
            guard.disarm();
        }
        result
    }

    /// Delivers a terminal error. The observer is disposed afterwards, even
    /// if the handler fails or panics.
    pub fn on_error(&self, error: H::Error) -> Result<()> {
        if !self.is_active() {
            trace!(observer = %self.name, "observer.error.dropped");
            return Ok(());
        }
        self.active.set(false);
        let _guard = DisposeGuard::new(self);
        let mut handler = self.handler_mut()?;
        handler.error(error)
    }

    /// Delivers terminal completion. The observer is disposed afterwards,
    /// even if the handler fails or panics.
    pub fn on_completed(&self) -> Result<()> {
        if !self.is_active() {
            trace!(observer = %self.name, "observer.completed.dropped");
            return Ok(());
        }
        self.active.set(false);
        let _guard = DisposeGuard::new(self);
        let mut handler = self.handler_mut()?;
        handler.completed()
    }

    /// Attaches the resource released on disposal. Releases it right away
    /// if the observer is already disposed.
    pub fn set_disposable(&self, mut disposable: Box<dyn Disposable>) -> Result<()> {
        if self.disposable_set.replace(true) {
            return Err(Error::disposable_already_set(self.name.as_str()));
        }
        if self.is_disposed() {
            trace!(observer = %self.name, "observer.disposable.released_on_attach");
            disposable.dispose();
        } else {
            *self.disposable.borrow_mut() = Some(disposable);
        }
        Ok(())
    }

    /// Terminates the observer and releases the attached resource.
    /// Idempotent.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.active.set(false);
        let disposable = self.disposable.borrow_mut().take();
        if let Some(mut disposable) = disposable {
            disposable.dispose();
        }
        trace!(observer = %self.name, "observer.disposed");
    }

    fn handler_mut(&self) -> Result<RefMut<'_, H>> {
        self.handler
            .try_borrow_mut()
            .map_err(|_| Error::reentrant_delivery(self.name.as_str()))
    }
}

/// Disposes its lifecycle when dropped, unless disarmed.
struct DisposeGuard<'a, H: ObserverHandler> {
    lifecycle: &'a ObserverLifecycle<H>,
    armed: bool,
}

impl<'a, H: ObserverHandler> DisposeGuard<'a, H> {
    fn new(lifecycle: &'a ObserverLifecycle<H>) -> Self {
        Self {
            lifecycle,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<H: ObserverHandler> Drop for DisposeGuard<'_, H> {
    fn drop(&mut self) {
        if self.armed {
            self.lifecycle.dispose();
        }
    }
}

impl<H> EventSink for ObserverLifecycle<H>
where
    H: ObserverHandler<Item = Value, Error = TransportError>,
{
    fn on_next(&self, response: Value) -> Result<()> {
        ObserverLifecycle::on_next(self, response)
    }

    fn on_error(&self, error: TransportError) -> Result<()> {
        ObserverLifecycle::on_error(self, error)
    }

    fn on_completed(&self) -> Result<()> {
        ObserverLifecycle::on_completed(self)
    }
}
