//! Bridge to an external unidirectional-state-update store.
//!
//! The registry stays the single source of truth; this module projects it
//! into an action/reducer protocol so bindings can be driven through a
//! store instead of (or alongside) direct subscription. The store itself is
//! an external collaborator — [`BindingsStore`] documents the minimal
//! contract this bridge needs from it.
//!
//! Synchronization works the way the bindings are shared: an
//! `InitBindings` action hands the store the client's live container handle
//! ([`SharedBindings`]), so bind/unbind actions replayed through
//! [`bindings_reducer`] mutate the same channels the dispatcher notifies.

use crate::bindings::{self, BoundFn, Channel, SharedBindings};
use crate::client::FetchClient;

/// Store-integration failures.
///
/// These are fatal wiring mistakes (unlike per-request errors): the caller
/// must fix the store setup before bindings can work.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A bind or unbind action arrived before any `InitBindings`.
    #[error(
        "bindings are not initialized: run sync_bindings_with_store(<client>, <store>) \
         before dispatching bind or unbind actions"
    )]
    BindingsNotInitialized,

    /// The store exposes no bindings slice at all.
    #[error(
        "expected the bindings state to be available on the store; ensure bindings_reducer \
         is mounted into the store's reducers before calling sync_bindings_with_store"
    )]
    ReducerNotMounted,

    /// The store's own dispatch failed.
    #[error("store dispatch failed: {0}")]
    Dispatch(String),
}

/// Actions understood by [`bindings_reducer`].
#[derive(Clone, Debug)]
pub enum BindingsAction {
    /// Adopt a client's live bindings container.
    InitBindings {
        /// The client's container handle.
        bindings: SharedBindings,
    },
    /// Append a handler to a channel.
    BindFunc {
        /// Target channel.
        channel: Channel,
        /// Handler to append.
        func: BoundFn,
    },
    /// Remove every handler equivalent to the given one from a channel.
    ///
    /// Equivalence is pointer identity or registered-name equality — a
    /// handler dispatched through a store may be a copy rather than the
    /// original, so handlers meant to be unbound this way should be
    /// registered with [`BoundFn::named`].
    UnbindFunc {
        /// Target channel.
        channel: Channel,
        /// Handler to match against.
        func: BoundFn,
    },
}

/// The store's bindings slice: empty until an `InitBindings` runs.
#[derive(Clone, Debug, Default)]
pub struct BindingsState {
    container: Option<SharedBindings>,
}

impl BindingsState {
    /// A slice that has never been initialized.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Whether an `InitBindings` has run.
    pub fn is_initialized(&self) -> bool {
        self.container.is_some()
    }

    /// The adopted container handle, once initialized.
    pub fn container(&self) -> Option<&SharedBindings> {
        self.container.as_ref()
    }
}

/// Pure projection of bindings actions onto the shared registry.
///
/// `InitBindings` adopts the action's container handle (reference
/// semantics: the returned state holds the same `Arc`). Bind and unbind
/// actions mutate the adopted registry in place and return the state
/// unchanged. Dispatching bind or unbind before any init is a fatal
/// [`StoreError::BindingsNotInitialized`].
pub fn bindings_reducer(
    state: &BindingsState,
    action: &BindingsAction,
) -> Result<BindingsState, StoreError> {
    match action {
        BindingsAction::InitBindings { bindings: handle } => Ok(BindingsState {
            container: Some(handle.clone()),
        }),
        BindingsAction::BindFunc { channel, func } => {
            let container = state
                .container()
                .ok_or(StoreError::BindingsNotInitialized)?;
            bindings::lock(container)
                .channel_mut(*channel)
                .push(func.clone());
            Ok(state.clone())
        }
        BindingsAction::UnbindFunc { channel, func } => {
            let container = state
                .container()
                .ok_or(StoreError::BindingsNotInitialized)?;
            bindings::lock(container)
                .channel_mut(*channel)
                .retain(|candidate| !candidate.matches(func));
            Ok(state.clone())
        }
    }
}

/// The contract an external store must offer for synchronization.
pub trait BindingsStore {
    /// The current bindings slice, or `None` when [`bindings_reducer`] is
    /// not mounted at all.
    fn bindings_state(&self) -> Option<BindingsState>;

    /// Dispatch one action through the store's reducers.
    fn dispatch(&mut self, action: BindingsAction) -> Result<(), StoreError>;
}

/// Hand a client's bindings to a store.
///
/// # Errors
///
/// Fails with [`StoreError::ReducerNotMounted`] when the store exposes no
/// bindings slice — mount [`bindings_reducer`] into the store first.
pub fn sync_bindings_with_store<S: BindingsStore>(
    client: &FetchClient,
    store: &mut S,
) -> Result<(), StoreError> {
    if store.bindings_state().is_none() {
        return Err(StoreError::ReducerNotMounted);
    }
    store.dispatch(BindingsAction::InitBindings {
        bindings: client.bindings_handle(),
    })
}

/// Action creator: bind to the error channel.
pub fn bind_to_error_action(func: BoundFn) -> BindingsAction {
    BindingsAction::BindFunc {
        channel: Channel::Error,
        func,
    }
}

/// Action creator: bind to the success channel.
pub fn bind_to_success_action(func: BoundFn) -> BindingsAction {
    BindingsAction::BindFunc {
        channel: Channel::Success,
        func,
    }
}

/// Action creator: bind to the all-responses channel.
pub fn bind_to_response_action(func: BoundFn) -> BindingsAction {
    BindingsAction::BindFunc {
        channel: Channel::Response,
        func,
    }
}

/// Action creator: unbind from the error channel.
pub fn unbind_from_error_action(func: BoundFn) -> BindingsAction {
    BindingsAction::UnbindFunc {
        channel: Channel::Error,
        func,
    }
}

/// Action creator: unbind from the success channel.
pub fn unbind_from_success_action(func: BoundFn) -> BindingsAction {
    BindingsAction::UnbindFunc {
        channel: Channel::Success,
        func,
    }
}

/// Action creator: unbind from the all-responses channel.
pub fn unbind_from_response_action(func: BoundFn) -> BindingsAction {
    BindingsAction::UnbindFunc {
        channel: Channel::Response,
        func,
    }
}

/// A value dispatched through the thunk interceptor: either a plain action
/// or a thunk invoked with the client.
pub enum Dispatchable {
    /// A plain action, forwarded unchanged.
    Action(BindingsAction),
    /// A thunk; the interceptor calls it with the client and forwards the
    /// resulting action.
    Thunk(Box<dyn FnOnce(&FetchClient) -> BindingsAction + Send>),
}

impl Dispatchable {
    /// Wrap a thunk.
    pub fn thunk<F>(func: F) -> Self
    where
        F: FnOnce(&FetchClient) -> BindingsAction + Send + 'static,
    {
        Dispatchable::Thunk(Box::new(func))
    }
}

impl From<BindingsAction> for Dispatchable {
    fn from(action: BindingsAction) -> Self {
        Dispatchable::Action(action)
    }
}

impl std::fmt::Debug for Dispatchable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatchable::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Dispatchable::Thunk(_) => f.debug_tuple("Thunk").finish_non_exhaustive(),
        }
    }
}

/// Middleware-shaped thunk interceptor.
///
/// Wraps a `next` stage: dispatched thunks are invoked with the client and
/// their result forwarded; plain actions pass through unchanged.
///
/// # Example
///
/// ```ignore
/// use unifetch::store::{bind_to_error_action, thunk_middleware, Dispatchable};
/// use unifetch::BoundFn;
///
/// let mut dispatch = thunk_middleware(client.clone(), move |action| {
///     store.dispatch(action)
/// });
///
/// // A plain action passes through:
/// dispatch(bind_to_error_action(BoundFn::named("log", |r| eprintln!("{:?}", r.status))).into())?;
///
/// // A thunk gets the client first:
/// dispatch(Dispatchable::thunk(|client| {
///     bind_to_error_action(BoundFn::named("base", {
///         let base = client.base_url();
///         move |_| eprintln!("failed against {base}")
///     }))
/// }))?;
/// ```
pub fn thunk_middleware<N, R>(client: FetchClient, mut next: N) -> impl FnMut(Dispatchable) -> R
where
    N: FnMut(BindingsAction) -> R,
{
    move |dispatchable| match dispatchable {
        Dispatchable::Action(action) => next(action),
        Dispatchable::Thunk(thunk) => next(thunk(&client)),
    }
}
