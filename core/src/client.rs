//! Typed, cancellable API client.
//!
//! # Design
//! `ApiClient` holds a base URL and an injected `Transport`, nothing else.
//! Every `send` resolves a `RequestSpec`, starts one transport operation and
//! returns an `InFlightCall`: a future that yields exactly one decoded value
//! or one `ApiError`.
//!
//! The transport's completion may run on any thread. It decodes the body
//! there and hands the outcome over a oneshot channel. A shared
//! `CallState` decides the race between completion and cancellation: once
//! `cancel` has been requested, nothing reaches the caller.

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::http::TransportResponse;
use crate::request::{ApiRequest, RequestSpec};
use crate::transport::{Completion, Transport, TransportTask};

/// Client for a JSON HTTP API rooted at one base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::with_base_url(config.base_url, transport)
    }

    pub fn with_base_url(base_url: Url, transport: impl Transport + 'static) -> Self {
        Self {
            base_url,
            transport: Arc::new(transport),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `spec`, dispatch it and decode the JSON body into `T`.
    ///
    /// Resolution failures are not returned directly: they come out of the
    /// returned call as `ApiError::MalformedUrl`, and the transport is never
    /// started.
    pub fn send<T>(&self, spec: &RequestSpec) -> InFlightCall<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = match spec.resolve(&self.base_url) {
            Ok(request) => request,
            Err(err) => return InFlightCall::ready(Err(err)),
        };

        let (tx, rx) = oneshot::channel();
        let state = Arc::new(CallState::new(TaskSlot::Starting));
        let completion_state = Arc::clone(&state);
        let completion: Completion = Box::new(move |outcome| {
            completion_state.finish();
            if completion_state.is_cancelled() {
                debug!("discarding outcome of cancelled call");
                return;
            }
            // The receiver is gone only if the call was dropped, which
            // cancels it; losing the outcome here is expected.
            let _ = tx.send(decode::<T>(outcome));
        });

        debug!(method = %request.method, url = %request.url, "dispatching request");
        let task = self.transport.start(request, completion);
        state.attach(task);

        InFlightCall {
            pending: Pending::Waiting(rx),
            state,
            finished: false,
        }
    }

    /// Send a typed request, decoding into its declared response type.
    pub fn call<R: ApiRequest>(&self, request: &R) -> InFlightCall<R::Response> {
        self.send(&request.spec())
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(
    outcome: Result<TransportResponse, TransportError>,
) -> Result<T, ApiError> {
    let response = outcome?;
    let body = response.body.unwrap_or_default();
    trace!(status = ?response.status, bytes = body.len(), "decoding response body");
    Ok(serde_json::from_slice(&body)?)
}

enum TaskSlot {
    /// `Transport::start` has not returned yet.
    Starting,
    Running(Box<dyn TransportTask>),
    Finished,
}

struct CallState {
    cancelled: AtomicBool,
    task: Mutex<TaskSlot>,
}

impl CallState {
    fn new(slot: TaskSlot) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            task: Mutex::new(slot),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Store the task handle unless the operation already completed.
    fn attach(&self, task: Box<dyn TransportTask>) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*slot, TaskSlot::Starting) {
            *slot = TaskSlot::Running(task);
        }
    }

    /// Release the task handle once the transport has reported.
    fn finish(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = TaskSlot::Finished;
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let previous = {
            let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
            mem::replace(&mut *slot, TaskSlot::Finished)
        };
        if let TaskSlot::Running(mut task) = previous {
            debug!("cancelling in-flight request");
            task.cancel();
        }
    }
}

enum Pending<T> {
    Ready(Option<Result<T, ApiError>>),
    Waiting(oneshot::Receiver<Result<T, ApiError>>),
}

/// One outstanding API call.
///
/// Resolves to the decoded value or an `ApiError`. Calling
/// [`cancel`](Self::cancel), or dropping the call before it resolves,
/// aborts the transport operation; a cancelled call never resolves.
#[must_use = "an InFlightCall is cancelled when dropped"]
pub struct InFlightCall<T> {
    pending: Pending<T>,
    state: Arc<CallState>,
    finished: bool,
}

// No field is ever pinned structurally.
impl<T> Unpin for InFlightCall<T> {}

impl<T> InFlightCall<T> {
    fn ready(outcome: Result<T, ApiError>) -> Self {
        Self {
            pending: Pending::Ready(Some(outcome)),
            state: Arc::new(CallState::new(TaskSlot::Finished)),
            finished: false,
        }
    }

    /// Abort the call. Idempotent; does nothing once the call has resolved.
    pub fn cancel(&self) {
        if !self.finished {
            self.state.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Whether the call has already yielded its outcome.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T> Future for InFlightCall<T> {
    type Output = Result<T, ApiError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.finished || this.state.is_cancelled() {
            return Poll::Pending;
        }

        let outcome = match &mut this.pending {
            Pending::Ready(outcome) => outcome.take(),
            Pending::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(outcome)) => Some(outcome),
                Poll::Ready(Err(oneshot::Canceled)) => {
                    // A cancel may have raced the completion that dropped
                    // the sender.
                    if this.state.is_cancelled() {
                        return Poll::Pending;
                    }
                    Some(Err(ApiError::Transport(TransportError::Abandoned)))
                }
            },
        };

        match outcome {
            Some(outcome) => {
                this.finished = true;
                Poll::Ready(outcome)
            }
            None => Poll::Pending,
        }
    }
}

impl<T> Drop for InFlightCall<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> fmt::Debug for InFlightCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightCall")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.finished)
            .finish()
    }
}
