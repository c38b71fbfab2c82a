//! Subscriber bindings for response events.
//!
//! A client owns one [`BindingsContainer`] with three channels: functions
//! bound to errors, to successes, and to all responses. Binding returns an
//! [`Unbind`] guard that removes exactly the bound occurrence; the
//! all-responses channel is notified once per request regardless of outcome,
//! before the outcome-specific channel.
//!
//! Handlers are held behind `Arc`, so identity is pointer identity. A
//! handler can additionally carry a registered name; names are what survive
//! a trip through the store bridge, where pointer identity may be lost (see
//! [`crate::store`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::response::ResponseRecord;

/// The callable shape of a bound handler.
pub type Handler = Arc<dyn Fn(&ResponseRecord) + Send + Sync>;

/// The three event channels.
///
/// Serialized forms are the container's slot names, which is how channels
/// appear in actions crossing a store boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Channel {
    /// Notified on failed responses (HTTP or transport failures).
    #[serde(rename = "boundToError")]
    Error,
    /// Notified on successful responses.
    #[serde(rename = "boundToSuccess")]
    Success,
    /// Notified on every response, before the outcome channel.
    #[serde(rename = "boundToResponse")]
    Response,
}

impl Channel {
    /// The channel's slot name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Error => "boundToError",
            Channel::Success => "boundToSuccess",
            Channel::Response => "boundToResponse",
        }
    }
}

/// A bound handler: an `Arc` callback plus an optional registered name.
#[derive(Clone)]
pub struct BoundFn {
    name: Option<Arc<str>>,
    func: Handler,
}

impl BoundFn {
    /// An anonymous handler, identified by pointer identity only.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&ResponseRecord) + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }

    /// A named handler. The name is a stable identifier that survives where
    /// pointer identity cannot (actions replayed through a store).
    pub fn named<N, F>(name: N, func: F) -> Self
    where
        N: Into<String>,
        F: Fn(&ResponseRecord) + Send + Sync + 'static,
    {
        Self {
            name: Some(Arc::from(name.into())),
            func: Arc::new(func),
        }
    }

    /// The registered name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Invoke the handler.
    pub(crate) fn call(&self, record: &ResponseRecord) {
        (self.func)(record);
    }

    /// Pointer identity with another handler.
    pub(crate) fn ptr_eq(&self, other: &BoundFn) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    /// Equivalence used by reducer-driven unbinds: pointer identity, or
    /// matching registered names. A `bound `-style wrapper prefix on this
    /// handler's name is stripped before comparison, so a wrapped copy still
    /// matches its original.
    pub(crate) fn matches(&self, target: &BoundFn) -> bool {
        if self.ptr_eq(target) {
            return true;
        }
        match (self.name(), target.name()) {
            (Some(own), Some(other)) => own.strip_prefix("bound ").unwrap_or(own) == other,
            _ => false,
        }
    }
}

impl std::fmt::Debug for BoundFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The three ordered subscriber sequences.
#[derive(Clone, Debug, Default)]
pub struct BindingsContainer {
    /// Functions called on failed responses.
    pub bound_to_error: Vec<BoundFn>,
    /// Functions called on successful responses.
    pub bound_to_success: Vec<BoundFn>,
    /// Functions called on every response.
    pub bound_to_response: Vec<BoundFn>,
}

impl BindingsContainer {
    /// The sequence for a channel.
    pub fn channel(&self, channel: Channel) -> &Vec<BoundFn> {
        match channel {
            Channel::Error => &self.bound_to_error,
            Channel::Success => &self.bound_to_success,
            Channel::Response => &self.bound_to_response,
        }
    }

    /// The mutable sequence for a channel.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut Vec<BoundFn> {
        match channel {
            Channel::Error => &mut self.bound_to_error,
            Channel::Success => &mut self.bound_to_success,
            Channel::Response => &mut self.bound_to_response,
        }
    }
}

/// A client's shareable handle to its bindings.
///
/// The store bridge holds the same handle, which is how store-dispatched
/// bind/unbind actions stay live for notification.
pub type SharedBindings = Arc<Mutex<BindingsContainer>>;

/// Lock the container, recovering from a poisoned lock (a panicking
/// subscriber must not disable the registry).
pub(crate) fn lock(bindings: &Mutex<BindingsContainer>) -> MutexGuard<'_, BindingsContainer> {
    bindings.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Append a handler to a channel and return its unbind guard.
pub(crate) fn bind(bindings: &SharedBindings, channel: Channel, func: BoundFn) -> Unbind {
    let index = {
        let mut container = lock(bindings);
        let sequence = container.channel_mut(channel);
        sequence.push(func.clone());
        sequence.len() - 1
    };
    Unbind {
        bindings: Arc::downgrade(bindings),
        channel,
        index,
        func,
    }
}

/// Notify a request's channels: all-responses first, then the outcome
/// channel. Handlers run synchronously in registration order, outside the
/// registry lock so they may bind or unbind freely.
pub(crate) fn notify(bindings: &SharedBindings, outcome: Channel, record: &ResponseRecord) {
    let (response_fns, outcome_fns) = {
        let container = lock(bindings);
        (
            container.bound_to_response.clone(),
            container.channel(outcome).clone(),
        )
    };
    for func in response_fns.iter().chain(outcome_fns.iter()) {
        func.call(record);
    }
}

/// Guard returned by a bind; removes exactly the bound occurrence.
#[derive(Debug)]
pub struct Unbind {
    bindings: Weak<Mutex<BindingsContainer>>,
    channel: Channel,
    index: usize,
    func: BoundFn,
}

impl Unbind {
    /// Remove the bound handler.
    ///
    /// The recorded position is checked first; if concurrent unbinds moved
    /// the handler, the whole sequence is scanned by pointer identity.
    /// Returns `false` (with a diagnostic in debug builds) when the handler
    /// is no longer bound.
    pub fn unbind(&self) -> bool {
        if let Some(bindings) = self.bindings.upgrade() {
            let mut container = lock(&bindings);
            let sequence = container.channel_mut(self.channel);

            if sequence
                .get(self.index)
                .is_some_and(|candidate| candidate.ptr_eq(&self.func))
            {
                sequence.remove(self.index);
                return true;
            }
            if let Some(position) = sequence
                .iter()
                .position(|candidate| candidate.ptr_eq(&self.func))
            {
                sequence.remove(position);
                return true;
            }
        }

        if cfg!(debug_assertions) {
            tracing::warn!(
                channel = self.channel.as_str(),
                "tried to unbind a function that was not bound"
            );
        }
        false
    }
}
