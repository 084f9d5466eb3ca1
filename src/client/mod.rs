//! The evaluation client the UI layer talks to.
//!
//! `evaluate` always settles to a boolean for a non-empty flag name: the
//! outbound call is bounded by a timeout, and every runtime failure is turned
//! into a fallback value and reported on the failure sink.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

mod cache;

pub use cache::{CacheEntry, FlagCache};

use crate::error::{ClientError, EvaluationError};
use crate::evaluation::{FlagEvaluator, FlagName};
use crate::observability::{FailureRecord, FailureSink, FallbackSource, TracingSink};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Upper bound for one outbound evaluation.
    pub timeout: Duration,
    /// Freshness window. `None` disables caching.
    pub cache_ttl: Option<Duration>,
    /// On failure, answer with the last known value if one is cached.
    pub serve_stale: bool,
    /// Share one outbound call between concurrent callers of the same flag.
    pub coalesce: bool,
    /// Value used when a flag cannot be decided.
    pub default_value: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: None,
            serve_stale: true,
            coalesce: true,
            default_value: false,
        }
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_serve_stale(mut self, serve_stale: bool) -> Self {
        self.serve_stale = serve_stale;
        self
    }

    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn with_default_value(mut self, default_value: bool) -> Self {
        self.default_value = default_value;
        self
    }
}

type Pending = Shared<BoxFuture<'static, Result<bool, EvaluationError>>>;

struct Inner {
    evaluator: Arc<dyn FlagEvaluator>,
    sink: Arc<dyn FailureSink>,
    options: ClientOptions,
    cache: FlagCache,
    in_flight: DashMap<FlagName, Pending>,
}

impl Inner {
    /// One outbound evaluation, settled to the value callers receive.
    async fn resolve(&self, flag: &FlagName) -> bool {
        let sent_at = Instant::now();
        let call = AssertUnwindSafe(self.evaluator.evaluate_flag(flag)).catch_unwind();

        let outcome = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(payload)) => Err(EvaluationError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(EvaluationError::Timeout(self.options.timeout)),
        };

        match outcome {
            Ok(enabled) => {
                if self.options.cache_ttl.is_some() {
                    self.cache.store(flag, enabled, sent_at);
                }
                debug!(flag = %flag, enabled, "Flag resolved by evaluator");
                enabled
            }
            Err(cause) => {
                let (fallback, source) = self.fallback_for(flag);
                self.sink
                    .report(&FailureRecord::new(flag.clone(), cause, fallback, source));
                fallback
            }
        }
    }

    fn fallback_for(&self, flag: &FlagName) -> (bool, FallbackSource) {
        if self.options.cache_ttl.is_some() && self.options.serve_stale {
            if let Some(stale) = self.cache.last_known(flag) {
                return (stale, FallbackSource::Stale);
            }
        }
        (self.options.default_value, FallbackSource::Default)
    }
}

/// Frees a flag's in-flight slot when the outbound task settles or is dropped.
struct InFlightSlot {
    inner: Arc<Inner>,
    flag: FlagName,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.flag);
    }
}

/// Settles one outbound task. Fields drop in declaration order, so a task
/// dropped before it settles frees its slot before its callers wake.
struct Settle {
    slot: Option<InFlightSlot>,
    tx: oneshot::Sender<bool>,
}

impl Settle {
    fn finish(self, enabled: bool) {
        drop(self.slot);
        let _ = self.tx.send(enabled);
    }
}

/// Client wrapper around a [`FlagEvaluator`]. Cheap to clone; clones share
/// the cache and in-flight calls.
#[derive(Clone)]
pub struct FlagEvaluationClient {
    inner: Arc<Inner>,
}

impl FlagEvaluationClient {
    pub fn new<E>(evaluator: E, options: ClientOptions) -> Self
    where
        E: FlagEvaluator + 'static,
    {
        Self::with_sink(evaluator, options, Arc::new(TracingSink))
    }

    pub fn with_sink<E>(evaluator: E, options: ClientOptions, sink: Arc<dyn FailureSink>) -> Self
    where
        E: FlagEvaluator + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                evaluator: Arc::new(evaluator),
                sink,
                options,
                cache: FlagCache::new(),
                in_flight: DashMap::new(),
            }),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Cached entry for a flag, fresh or not.
    pub fn cached(&self, flag_name: &str) -> Option<CacheEntry> {
        let flag = FlagName::new(flag_name).ok()?;
        self.inner.cache.get(&flag)
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Decide whether `flag_name` is enabled.
    ///
    /// Only an empty name is an error. Timeouts, transport failures, bad
    /// responses and evaluator panics resolve to the fallback value. Dropping
    /// the returned future is safe; the outbound call finishes on its own task.
    pub async fn evaluate(&self, flag_name: &str) -> Result<bool, ClientError> {
        let flag = FlagName::new(flag_name)?;

        if let Some(ttl) = self.inner.options.cache_ttl {
            if let Some(enabled) = self.inner.cache.fresh(&flag, ttl) {
                debug!(flag = %flag, enabled, "Serving flag from cache");
                return Ok(enabled);
            }
        }

        match self.pending(&flag).await {
            Ok(enabled) => Ok(enabled),
            Err(_) => {
                debug!(flag = %flag, "Flag evaluation cancelled, using default");
                Ok(self.inner.options.default_value)
            }
        }
    }

    fn pending(&self, flag: &FlagName) -> Pending {
        if !self.inner.options.coalesce {
            let (pending, task) = self.prepare(flag.clone(), false);
            tokio::spawn(task);
            return pending;
        }

        let (pending, task) = match self.inner.in_flight.entry(flag.clone()) {
            Entry::Occupied(entry) => {
                debug!(flag = %flag, "Joining in-flight evaluation");
                return entry.get().clone();
            }
            Entry::Vacant(entry) => {
                let (pending, task) = self.prepare(flag.clone(), true);
                entry.insert(pending.clone());
                (pending, task)
            }
        };

        // Spawned outside the map lock; a task dropped unpolled frees its slot
        tokio::spawn(task);
        pending
    }

    /// Build the outbound task and the shared handle its callers await. The
    /// handle only errors if the task is dropped before it settles.
    fn prepare(&self, flag: FlagName, tracked: bool) -> (Pending, BoxFuture<'static, ()>) {
        let inner = Arc::clone(&self.inner);
        let slot = tracked.then(|| InFlightSlot {
            inner: Arc::clone(&inner),
            flag: flag.clone(),
        });
        let (tx, rx) = oneshot::channel();
        let settle = Settle { slot, tx };

        let task = async move {
            let enabled = match AssertUnwindSafe(inner.resolve(&flag)).catch_unwind().await {
                Ok(enabled) => enabled,
                Err(payload) => {
                    let (fallback, source) = inner.fallback_for(&flag);
                    warn!(
                        flag = %flag,
                        error = %panic_message(payload.as_ref()),
                        fallback,
                        fallback_source = source.as_str(),
                        "Flag resolution panicked, using fallback"
                    );
                    fallback
                }
            };
            settle.finish(enabled);
        }
        .boxed();

        let pending = async move { rx.await.map_err(|_| EvaluationError::Cancelled) }
            .boxed()
            .shared();

        (pending, task)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked without a message".to_string()
    }
}
