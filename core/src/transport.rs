//! Transport abstraction and the `ureq`-backed implementation.
//!
//! # Design
//! A transport starts one network operation per `ResolvedRequest` and
//! reports back through a completion callback, possibly on another thread.
//! The returned `TransportTask` is the only way to abort the operation.
//! `ApiClient` receives its transport at construction; there is no default
//! global instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{ResolvedRequest, TransportResponse};

/// Callback invoked at most once with the outcome of a transport operation.
pub type Completion = Box<dyn FnOnce(Result<TransportResponse, TransportError>) + Send + 'static>;

/// Executes resolved requests.
pub trait Transport: Send + Sync {
    /// Start `request` and arrange for `completion` to be called when it
    /// finishes. Implementations may call `completion` before returning.
    fn start(&self, request: ResolvedRequest, completion: Completion) -> Box<dyn TransportTask>;
}

/// Handle to one operation started by a `Transport`.
pub trait TransportTask: Send {
    /// Abort the operation. Best-effort: the server may still see the
    /// request. Calling this after completion has no effect.
    fn cancel(&mut self);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn start(&self, request: ResolvedRequest, completion: Completion) -> Box<dyn TransportTask> {
        (**self).start(request, completion)
    }
}

/// A [`Transport`] backed by [`ureq`], running each request on its own
/// worker thread.
///
/// HTTP status codes are reported as data, never as transport errors.
///
/// Cancelling does not free the worker: a blocked request holds its thread
/// until the response arrives or the timeout expires. Keep the timeout
/// short when calls are cancelled often, e.g. search-as-you-type.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn start(&self, request: ResolvedRequest, completion: Completion) -> Box<dyn TransportTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let agent = self.agent.clone();
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || {
            if flag.load(Ordering::Acquire) {
                return;
            }
            let result = execute(&agent, request);
            // The socket cannot be interrupted mid-read; a cancel that
            // lands while blocked only suppresses the callback.
            if !flag.load(Ordering::Acquire) {
                completion(result);
            }
        });

        Box::new(UreqTask { cancelled })
    }
}

struct UreqTask {
    cancelled: Arc<AtomicBool>,
}

impl TransportTask for UreqTask {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

fn execute(
    agent: &ureq::Agent,
    request: ResolvedRequest,
) -> Result<TransportResponse, TransportError> {
    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let req = builder
        .body(())
        .map_err(|e| TransportError::Other(Box::new(e)))?;

    match agent.run(req) {
        Ok(response) => convert_response(response),
        Err(ureq::Error::Timeout(_)) => Err(TransportError::Timeout),
        Err(ureq::Error::HostNotFound) => {
            Err(TransportError::Connection("host not found".to_owned()))
        }
        Err(ureq::Error::Io(e)) => Err(TransportError::Connection(e.to_string())),
        Err(e) => Err(TransportError::Other(Box::new(e))),
    }
}

fn convert_response(
    response: ureq::http::Response<ureq::Body>,
) -> Result<TransportResponse, TransportError> {
    let (parts, mut body) = response.into_parts();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let bytes = body
        .read_to_vec()
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    Ok(TransportResponse {
        status: Some(parts.status.as_u16()),
        headers,
        body: Some(bytes),
    })
}
