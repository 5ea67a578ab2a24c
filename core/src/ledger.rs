//! The request ledger.
//!
//! A [`Ledger`] dispatches requests through a [`Transport`] under caller-chosen
//! or generated identifiers and keeps each terminal outcome until the caller
//! collects it.
//!
//! # Lifecycle of an identifier
//!
//! ```text
//! Absent ──dispatch──▶ InFlight ──transport settles──▶ Completed(outcome)
//!   ▲                                                      │
//!   └──────── response() on Success / error() on Failure ──┘
//! ```
//!
//! Every dispatched request runs on its own Tokio task and always reaches
//! `Completed`. There is no way to abort one: dropping or timing out the
//! [`Completion`] only stops waiting for it.
//!
//! Reading the *other* side of a completed outcome (`response` on a failure,
//! `error` on a success) returns `None` and leaves the entry in place, so a
//! caller who checks the payload first does not lose the error.
//!
//! # Example
//!
//! ```ignore
//! let ledger = Ledger::new(transport);
//! let id = ledger.create_unique_id("users");
//!
//! ledger.get("https://api.example.com/users", &id, params!["page", 1]).await?;
//!
//! if let Some(response) = ledger.response(&id)? {
//!     println!("{response:?}");
//! } else if let Some(error) = ledger.error(&id)? {
//!     eprintln!("{error}");
//! }
//! ```

use crate::config::LedgerConfig;
use crate::environment::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::id::{IdGenerator, RequestId};
use crate::metrics::{
    OUTCOMES_RETRIEVED, REQUESTS_DISPATCHED, REQUESTS_FAILED, REQUESTS_IN_FLIGHT,
    REQUESTS_REJECTED, REQUESTS_SUCCEEDED,
};
use crate::options::{LedgerOptions, OptionsPatch};
use crate::params::ParamArgs;
use crate::transport::{Method, Transport, TransportRequest};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Handle on a dispatched request.
///
/// The request is already running on its own task when this is returned.
/// Awaiting it resolves to `Ok(())` once the outcome is stored, or to
/// `Err(LedgerError::Transport(_))` when the transport failed and
/// `throw_on_failure` is set. Dropping it detaches: the outcome is still
/// recorded under the identifier.
#[must_use = "the request runs regardless; await the completion to observe a rethrown failure"]
#[derive(Debug)]
pub struct Completion<E> {
    id: RequestId,
    handle: JoinHandle<Result<(), LedgerError<E>>>,
}

impl<E> Completion<E> {
    /// Identifier the request was dispatched under.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Check if the outcome has been stored.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<E> Future for Completion<E> {
    type Output = Result<(), LedgerError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => {
                tracing::error!(id = %this.id, error = %err, "Request task did not finish");
                Poll::Ready(Err(LedgerError::Abandoned(this.id.clone())))
            },
        }
    }
}

/// Terminal outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R, E> {
    /// The transport returned a payload
    Success(R),
    /// The transport reported a failure
    Failure(E),
}

impl<R, E> Outcome<R, E> {
    /// Check if this is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Extract the payload, or give the outcome back.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if this is a failure.
    pub fn into_success(self) -> Result<R, Self> {
        match self {
            Self::Success(payload) => Ok(payload),
            failure @ Self::Failure(_) => Err(failure),
        }
    }

    /// Extract the failure value, or give the outcome back.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if this is a success.
    pub fn into_failure(self) -> Result<E, Self> {
        match self {
            Self::Failure(error) => Ok(error),
            success @ Self::Success(_) => Err(success),
        }
    }

    /// Convert into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the failure value for `Outcome::Failure`.
    pub fn into_result(self) -> Result<R, E> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<R, E> From<Result<R, E>> for Outcome<R, E> {
    fn from(result: Result<R, E>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Where an identifier currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Dispatched, transport has not settled
    InFlight,
    /// Outcome stored, not yet consumed
    Completed,
    /// No record: never dispatched, or already consumed
    Absent,
}

enum Entry<R, E> {
    InFlight,
    Completed(Outcome<R, E>),
}

type Table<T> = HashMap<RequestId, Entry<<T as Transport>::Response, <T as Transport>::Error>>;

struct Inner<T: Transport> {
    transport: T,
    ids: IdGenerator,
    entries: Mutex<Table<T>>,
    options: Mutex<LedgerOptions>,
}

impl<T: Transport> Inner<T> {
    fn entries(&self) -> MutexGuard<'_, Table<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn options(&self) -> MutexGuard<'_, LedgerOptions> {
        self.options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove the entry for `id` if `select` accepts its outcome.
    ///
    /// The lookup, the decision and the removal happen under one lock.
    fn consume<V>(
        &self,
        id: &str,
        select: impl FnOnce(
            Outcome<T::Response, T::Error>,
        ) -> Result<V, Outcome<T::Response, T::Error>>,
    ) -> Result<Option<V>, LedgerError<T::Error>> {
        let mut entries = self.entries();
        match entries.remove_entry(id) {
            None => Err(LedgerError::InvalidRequest(RequestId::from(id))),
            Some((key, Entry::InFlight)) => {
                let err = LedgerError::RequestNotComplete(key.clone());
                entries.insert(key, Entry::InFlight);
                Err(err)
            },
            Some((key, Entry::Completed(outcome))) => match select(outcome) {
                Ok(value) => {
                    metrics::counter!(OUTCOMES_RETRIEVED).increment(1);
                    tracing::debug!(id = %key, "Outcome retrieved");
                    Ok(Some(value))
                },
                Err(outcome) => {
                    entries.insert(key, Entry::Completed(outcome));
                    Ok(None)
                },
            },
        }
    }
}

/// In-flight registration for one identifier.
///
/// Created by the check-and-insert under the table lock. Settling replaces the
/// marker with the outcome. The request task owns the registration and is
/// never aborted, so an unsettled drop only happens when the transport panics
/// or the runtime shuts down; the marker is then removed so the id is not
/// stuck in flight forever.
struct InFlight<T: Transport> {
    inner: Arc<Inner<T>>,
    id: Option<RequestId>,
}

impl<T: Transport> InFlight<T> {
    fn register(inner: &Arc<Inner<T>>, id: RequestId) -> Result<Self, LedgerError<T::Error>> {
        {
            let mut entries = inner.entries();
            if entries.contains_key(&id) {
                return Err(LedgerError::IdInUse(id));
            }
            entries.insert(id.clone(), Entry::InFlight);
        }
        metrics::gauge!(REQUESTS_IN_FLIGHT).increment(1.0);

        Ok(Self {
            inner: Arc::clone(inner),
            id: Some(id),
        })
    }

    fn settle(mut self, outcome: Outcome<T::Response, T::Error>) {
        if let Some(id) = self.id.take() {
            self.inner
                .entries()
                .insert(id, Entry::Completed(outcome));
            metrics::gauge!(REQUESTS_IN_FLIGHT).decrement(1.0);
        }
    }
}

impl<T: Transport> Drop for InFlight<T> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let mut entries = self.inner.entries();
            if matches!(entries.get(&id), Some(Entry::InFlight)) {
                entries.remove(&id);
            }
            drop(entries);
            metrics::gauge!(REQUESTS_IN_FLIGHT).decrement(1.0);
            tracing::error!(%id, "Request task ended before the transport settled");
        }
    }
}

/// Identifier-keyed request/response ledger.
///
/// Cloning is cheap and every clone shares the same identifier table, serial
/// counter and options. Independent ledgers have independent namespaces.
///
/// # Type Parameters
///
/// - `T`: The transport performing requests
pub struct Ledger<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Ledger<T> {
    /// Create a ledger with default options and the system clock.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_clock(transport, Arc::new(SystemClock))
    }

    /// Create a ledger with default options and a custom clock.
    #[must_use]
    pub fn with_clock(transport: T, clock: Arc<dyn Clock>) -> Self {
        Self::build(transport, clock, LedgerConfig::default())
    }

    /// Create a ledger from loaded configuration.
    #[must_use]
    pub fn with_config(transport: T, config: LedgerConfig) -> Self {
        Self::build(transport, Arc::new(SystemClock), config)
    }

    fn build(transport: T, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                ids: IdGenerator::new(clock),
                entries: Mutex::new(HashMap::new()),
                options: Mutex::new(config.options),
            }),
        }
    }

    /// Borrow the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Generate an identifier unique within this ledger.
    ///
    /// Format: `{prefix}#{serial}#{unix_millis}`.
    pub fn create_unique_id(&self, prefix: &str) -> RequestId {
        self.inner.ids.next_id(prefix)
    }

    /// Register a request and start it on a new Tokio task.
    ///
    /// Parameter normalization and the identifier check happen before this
    /// returns: once it returns `Ok`, `id` is in flight and the transport call
    /// is under way. The request runs to completion and its outcome is stored
    /// whether or not the returned [`Completion`] is awaited.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnbalancedParameters`] for an odd-length flat parameter list
    /// - [`LedgerError::IdInUse`] if `id` is in flight or holds an unretrieved outcome
    pub fn dispatch(
        &self,
        method: Method,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: Option<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<Completion<T::Error>, LedgerError<T::Error>> {
        let id = id.into();
        let url = url.into();
        let params = params.into().normalize().map_err(|err| {
            metrics::counter!(REQUESTS_REJECTED).increment(1);
            tracing::warn!(%id, %method, %url, count = err.count, "Rejected request: unbalanced parameters");
            LedgerError::from(err)
        })?;

        self.start(
            id,
            TransportRequest {
                method,
                url,
                body,
                params,
            },
        )
    }

    #[tracing::instrument(
        skip_all,
        name = "ledger_request",
        fields(id = %id, method = %request.method, url = %request.url)
    )]
    fn start(
        &self,
        id: RequestId,
        request: TransportRequest,
    ) -> Result<Completion<T::Error>, LedgerError<T::Error>> {
        let registration = InFlight::register(&self.inner, id.clone()).inspect_err(|_| {
            metrics::counter!(REQUESTS_REJECTED).increment(1);
            tracing::warn!("Rejected request: id already in use");
        })?;
        metrics::counter!(REQUESTS_DISPATCHED).increment(1);
        tracing::debug!("Request in flight");

        let inner = Arc::clone(&self.inner);
        let settlement = async move {
            let outcome = Outcome::from(inner.transport.send(request).await);
            let throw_on_failure = inner.options().throw_on_failure;

            let rethrow = match &outcome {
                Outcome::Success(_) => {
                    metrics::counter!(REQUESTS_SUCCEEDED).increment(1);
                    tracing::debug!("Request succeeded");
                    None
                },
                Outcome::Failure(error) => {
                    metrics::counter!(REQUESTS_FAILED).increment(1);
                    tracing::warn!(%error, "Request failed");
                    throw_on_failure.then(|| error.clone())
                },
            };

            registration.settle(outcome);
            rethrow.map_or(Ok(()), |error| Err(LedgerError::Transport(error)))
        };

        let handle = tokio::spawn(settlement.instrument(tracing::Span::current()));
        Ok(Completion { id, handle })
    }

    /// Dispatch a request and wait for it to settle.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnbalancedParameters`] for an odd-length flat parameter list
    /// - [`LedgerError::IdInUse`] if `id` is in flight or holds an unretrieved outcome
    /// - [`LedgerError::Transport`] if the transport failed and `throw_on_failure` is set
    pub async fn request(
        &self,
        method: Method,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: Option<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.dispatch(method, url, id, body, params)?.await
    }

    /// GET `url` under `id`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn get(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.request(Method::Get, url, id, None, params).await
    }

    /// DELETE `url` under `id`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn delete(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.request(Method::Delete, url, id, None, params).await
    }

    /// POST `body` to `url` under `id`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn post(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: impl Into<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.request(Method::Post, url, id, Some(body.into()), params)
            .await
    }

    /// PATCH `body` to `url` under `id`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn patch(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: impl Into<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.request(Method::Patch, url, id, Some(body.into()), params)
            .await
    }

    /// PUT `body` to `url` under `id`.
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn put(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: impl Into<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.request(Method::Put, url, id, Some(body.into()), params)
            .await
    }

    /// Alias for [`Ledger::put`].
    ///
    /// # Errors
    ///
    /// See [`Ledger::request`].
    pub async fn push(
        &self,
        url: impl Into<String>,
        id: impl Into<RequestId>,
        body: impl Into<serde_json::Value>,
        params: impl Into<ParamArgs>,
    ) -> Result<(), LedgerError<T::Error>> {
        self.put(url, id, body, params).await
    }

    /// Collect the success payload for `id`.
    ///
    /// Returns `Ok(Some(payload))` and forgets `id` if the request succeeded.
    /// Returns `Ok(None)` without forgetting anything if it failed; the failure
    /// is still waiting in [`Ledger::error`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RequestNotComplete`] while the request is in flight
    /// - [`LedgerError::InvalidRequest`] if `id` has no record
    pub fn response(
        &self,
        id: impl AsRef<str>,
    ) -> Result<Option<T::Response>, LedgerError<T::Error>> {
        self.inner.consume(id.as_ref(), Outcome::into_success)
    }

    /// Collect the failure value for `id`.
    ///
    /// Returns `Ok(Some(error))` and forgets `id` if the request failed.
    /// Returns `Ok(None)` without forgetting anything if it succeeded.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RequestNotComplete`] while the request is in flight
    /// - [`LedgerError::InvalidRequest`] if `id` has no record
    pub fn error(&self, id: impl AsRef<str>) -> Result<Option<T::Error>, LedgerError<T::Error>> {
        self.inner.consume(id.as_ref(), Outcome::into_failure)
    }

    /// Collect the outcome for `id`, whichever side it is on, and forget `id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RequestNotComplete`] while the request is in flight
    /// - [`LedgerError::InvalidRequest`] if `id` has no record
    pub fn take(
        &self,
        id: impl AsRef<str>,
    ) -> Result<Outcome<T::Response, T::Error>, LedgerError<T::Error>> {
        let id = id.as_ref();
        self.inner
            .consume(id, Ok)?
            .ok_or_else(|| LedgerError::InvalidRequest(RequestId::from(id)))
    }

    /// Where `id` currently stands. Does not consume anything.
    #[must_use]
    pub fn status(&self, id: impl AsRef<str>) -> RequestStatus {
        match self.inner.entries().get(id.as_ref()) {
            None => RequestStatus::Absent,
            Some(Entry::InFlight) => RequestStatus::InFlight,
            Some(Entry::Completed(_)) => RequestStatus::Completed,
        }
    }

    /// Number of requests awaiting the transport.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner
            .entries()
            .values()
            .filter(|entry| matches!(entry, Entry::InFlight))
            .count()
    }

    /// Number of stored outcomes not yet consumed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.inner
            .entries()
            .values()
            .filter(|entry| matches!(entry, Entry::Completed(_)))
            .count()
    }

    /// Update options and return the resulting set.
    ///
    /// - `None`: no change, acts as a getter
    /// - `Some(patch)` with nothing set: reset to defaults
    /// - `Some(patch)` otherwise: shallow merge
    pub fn set_options(&self, patch: Option<OptionsPatch>) -> LedgerOptions {
        let mut options = self.inner.options();
        if let Some(patch) = patch {
            options.apply(&patch);
            tracing::debug!(throw_on_failure = options.throw_on_failure, "Ledger options updated");
        }
        *options
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> LedgerOptions {
        *self.inner.options()
    }
}

impl<T: Transport> Clone for Ledger<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + Default> Default for Ledger<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Transport> fmt::Debug for Ledger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("in_flight", &self.in_flight())
            .field("completed", &self.completed())
            .field("options", &self.options())
            .field("ids", &self.inner.ids)
            .finish_non_exhaustive()
    }
}
