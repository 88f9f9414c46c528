//! Cancellation and delivery guarantees of `InFlightCall`, driven by a
//! transport double that completes only when told to.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use futures::executor::block_on;
use futures::FutureExt;
use unisearch_core::{
    ApiClient, ApiError, Completion, ResolvedRequest, Transport, TransportError,
    TransportResponse, TransportTask, University,
};
use url::Url;

const MIT: &str = r#"[{"name":"Massachusetts Institute of Technology","web_pages":["http://web.mit.edu/"],"country":"United States"}]"#;

/// Holds every completion until the test releases it.
#[derive(Default)]
struct ManualTransport {
    pending: Mutex<Vec<Completion>>,
    cancels: Arc<AtomicUsize>,
}

impl ManualTransport {
    fn complete_all(&self, body: &str) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        for completion in pending {
            completion(Ok(TransportResponse::with_body(body)));
        }
    }

    fn fail_all(&self) {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        for completion in pending {
            completion(Err(TransportError::Connection("reset by peer".to_string())));
        }
    }

    fn abandon_all(&self) {
        self.pending.lock().unwrap().clear();
    }

    fn take_one(&self) -> Completion {
        self.pending.lock().unwrap().remove(0)
    }

    fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

struct ManualTask {
    cancels: Arc<AtomicUsize>,
}

impl TransportTask for ManualTask {
    fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for ManualTransport {
    fn start(&self, _request: ResolvedRequest, completion: Completion) -> Box<dyn TransportTask> {
        self.pending.lock().unwrap().push(completion);
        Box::new(ManualTask {
            cancels: Arc::clone(&self.cancels),
        })
    }
}

fn setup() -> (Arc<ManualTransport>, ApiClient) {
    let transport = Arc::new(ManualTransport::default());
    let client = ApiClient::with_base_url(
        Url::parse("http://universities.hipolabs.com/").unwrap(),
        Arc::clone(&transport),
    );
    (transport, client)
}

#[test]
fn completion_delivers_one_value() {
    let (transport, client) = setup();
    let mut call = client.search_universities("mit");
    assert!((&mut call).now_or_never().is_none(), "nothing before completion");

    transport.complete_all(MIT);
    let found = block_on(&mut call).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Massachusetts Institute of Technology");
    assert!(call.is_finished());
    assert!((&mut call).now_or_never().is_none(), "no second outcome");
    assert_eq!(transport.cancels(), 0);
}

#[test]
fn cancel_before_completion_suppresses_value() {
    let (transport, client) = setup();
    let mut call = client.search_universities("mit");

    call.cancel();
    assert_eq!(transport.cancels(), 1, "transport saw the cancel");

    transport.complete_all(MIT);
    assert!((&mut call).now_or_never().is_none());
}

#[test]
fn cancel_before_failure_suppresses_error() {
    let (transport, client) = setup();
    let mut call = client.search_universities("mit");

    call.cancel();
    transport.fail_all();
    assert!((&mut call).now_or_never().is_none());
}

#[test]
fn cancel_after_completion_before_poll_suppresses_value() {
    let (transport, client) = setup();
    let mut call = client.search_universities("mit");

    transport.complete_all(MIT);
    call.cancel();
    assert!(call.is_cancelled());
    assert_eq!(transport.cancels(), 0, "task already released");
    assert!((&mut call).now_or_never().is_none());
}

#[test]
fn cancel_is_idempotent() {
    let (transport, client) = setup();
    let call = client.search_universities("mit");

    call.cancel();
    call.cancel();
    drop(call);
    assert_eq!(transport.cancels(), 1);
}

#[test]
fn dropping_unfinished_call_cancels() {
    let (transport, client) = setup();
    drop(client.search_universities("mit"));
    assert_eq!(transport.cancels(), 1);

    // The late completion goes nowhere.
    transport.complete_all(MIT);
}

#[test]
fn dropping_finished_call_does_not_cancel() {
    let (transport, client) = setup();
    let call = client.search_universities("mit");
    transport.complete_all(MIT);
    block_on(call).unwrap();
    assert_eq!(transport.cancels(), 0);
}

#[test]
fn transport_failure_delivers_error() {
    let (transport, client) = setup();
    let call = client.search_universities("mit");
    transport.fail_all();

    let err = block_on(call).unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Connection(_))));
}

#[test]
fn abandoned_completion_delivers_error() {
    let (transport, client) = setup();
    let call = client.search_universities("mit");
    transport.abandon_all();

    let err = block_on(call).unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Abandoned)));
}

#[test]
fn completion_on_worker_thread() {
    let (transport, client) = setup();
    let call = client.search_universities("mit");
    let completion = transport.take_one();

    let worker = thread::spawn(move || {
        completion(Ok(TransportResponse::with_body(MIT)));
    });
    let found: Vec<University> = block_on(call).unwrap();
    worker.join().unwrap();

    assert_eq!(found[0].country, "United States");
}

#[test]
fn concurrent_calls_are_independent() {
    let (transport, client) = setup();
    let mut first = client.search_universities("mit");
    let second = client.search_universities("oxford");

    first.cancel();
    transport.complete_all("[]");

    assert!((&mut first).now_or_never().is_none());
    assert!(block_on(second).unwrap().is_empty());
    assert_eq!(transport.cancels(), 1);
}
