use {
    futures::{
        FutureExt,
        future::{BoxFuture, Shared, WeakShared},
    },
    prometheus::{IntCounterVec, IntGaugeVec},
    std::{
        collections::HashMap,
        future::Future,
        hash::Hash,
        sync::Mutex,
    },
};

/// Share an expensive to compute response with multiple requests that occur
/// while one of them is already in flight.
///
/// Only pending futures are shared. Once a future completed, the next call for
/// the same request starts a new future, even if earlier callers still hold
/// the finished one. Only weak handles are stored, so entries nobody holds
/// anymore get dropped on the next miss.
pub struct RequestSharing<Request, Fut: Future> {
    in_flight: Mutex<HashMap<Request, WeakShared<Fut>>>,
    request_label: String,
}

/// Request sharing for boxed futures.
pub type BoxRequestSharing<Request, Response> =
    RequestSharing<Request, BoxFuture<'static, Response>>;

/// A boxed shared future.
pub type BoxShared<T> = Shared<BoxFuture<'static, T>>;

impl<Request, Fut: Future> RequestSharing<Request, Fut> {
    pub fn labelled(request_label: impl Into<String>) -> Self {
        Self {
            in_flight: Default::default(),
            request_label: request_label.into(),
        }
    }
}

/// Returns a shallow copy (without any pending requests)
impl<Request, Fut: Future> Clone for RequestSharing<Request, Fut> {
    fn clone(&self) -> Self {
        Self::labelled(self.request_label.clone())
    }
}

impl<Request, Fut> RequestSharing<Request, Fut>
where
    Request: Eq + Hash,
    Fut: Future,
    Fut::Output: Clone,
{
    /// Returns an existing in flight future or creates and uses a new future
    /// from the specified closure.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers for
    /// the same request never create two futures. A future that already
    /// produced its output is never handed out again.
    pub fn shared_or_else<F>(&self, request: Request, future: F) -> Shared<Fut>
    where
        F: FnOnce(&Request) -> Fut,
    {
        let mut in_flight = self.in_flight.lock().unwrap();

        let existing = in_flight
            .get(&request)
            .and_then(WeakShared::upgrade)
            .filter(|shared| shared.peek().is_none());

        if let Some(existing) = existing {
            Metrics::get()
                .request_sharing_access
                .with_label_values(&[&self.request_label, "hits"])
                .inc();
            return existing;
        }

        Metrics::get()
            .request_sharing_access
            .with_label_values(&[&self.request_label, "misses"])
            .inc();

        // Forget requests that finished or that nobody holds anymore.
        in_flight.retain(|_, weak| {
            weak.upgrade()
                .is_some_and(|shared| shared.peek().is_none())
        });

        let shared = future(&request).shared();
        // unwrap because downgrade only returns None if the Shared has already
        // completed which cannot be the case because we haven't polled it yet.
        in_flight.insert(request, shared.downgrade().unwrap());
        Metrics::get()
            .request_sharing_cached_items
            .with_label_values(&[&self.request_label])
            .set(i64::try_from(in_flight.len()).unwrap_or(i64::MAX));
        shared
    }

    /// Whether a future for this request exists and has not produced its
    /// output yet.
    pub fn is_in_flight(&self, request: &Request) -> bool {
        let in_flight = self.in_flight.lock().unwrap();
        in_flight
            .get(request)
            .and_then(WeakShared::upgrade)
            .is_some_and(|shared| shared.peek().is_none())
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
struct Metrics {
    /// Request sharing hits & misses
    #[metric(labels("request_label", "result"))]
    request_sharing_access: IntCounterVec,

    /// Number of requests currently in flight
    #[metric(labels("request_label"))]
    request_sharing_cached_items: IntGaugeVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}
