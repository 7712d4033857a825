//! Keyed query cache with request deduplication and invalidation.
//!
//! Inspired by TanStack Query. Each distinct key owns one cache entry with
//! an idle/loading/success/error status; `ensure` starts a fetch only when
//! the entry has none in flight and no fresh data, so any number of callers
//! asking for the same key share one request.
//!
//! # Example
//!
//! ```ignore
//! let cache: QueryCache<TaskFilter, Page<Task>> = QueryCache::new();
//!
//! // In tick, with the current filter state
//! let snapshot = cache.ensure(filter.clone(), move || {
//!     let api = api.clone();
//!     async move { tasks::list(&api, &filter).await }
//! });
//!
//! // Drain completed fetches once per tick
//! if cache.poll() {
//!     // State changed, re-render
//! }
//!
//! // After a successful mutation
//! cache.invalidate();
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::ApiError;

/// The lifecycle state of a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
  /// Never fetched
  Idle,
  /// A fetch is in flight
  Loading,
  /// Last fetch landed with data
  Success,
  /// Last fetch failed
  Error(ApiError),
}

/// Point-in-time view of one entry, handed out by `ensure`.
///
/// `data` is populated independently of `status`: a refetching entry is
/// `Loading` while still exposing its previous data.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
}

impl<T> QuerySnapshot<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self.status, QueryStatus::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self.status, QueryStatus::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }
}

struct Entry<T> {
  status: QueryStatus,
  data: Option<Arc<T>>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
  fetched_at: Option<Instant>,
  stale: bool,
}

impl<T> Entry<T> {
  fn new() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      receiver: None,
      fetched_at: None,
      stale: true,
    }
  }

  fn snapshot(&self) -> QuerySnapshot<T> {
    QuerySnapshot {
      status: self.status.clone(),
      data: self.data.clone(),
    }
  }
}

/// Keyed cache of list results.
///
/// Cloning is cheap and every clone shares the same entries; inject a clone
/// wherever data access is needed instead of reaching for a global.
pub struct QueryCache<K, T> {
  entries: Arc<Mutex<HashMap<K, Entry<T>>>>,
  stale_time: Option<Duration>,
}

impl<K, T> Clone for QueryCache<K, T> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
      stale_time: self.stale_time,
    }
  }
}

impl<K, T> Default for QueryCache<K, T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K, T> QueryCache<K, T> {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      stale_time: None,
    }
  }

  /// Consider successful entries stale after this duration. Off by default;
  /// entries then live until invalidated or cleared.
  #[allow(dead_code)]
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = Some(duration);
    self
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<T>>> {
    // A poisoned lock only means another thread panicked mid-access;
    // the map itself is still usable.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<K, T> QueryCache<K, T>
where
  K: Eq + Hash + Clone,
  T: Send + 'static,
{
  /// Return the entry for `key`, starting a fetch if it needs one.
  ///
  /// No fetch is started when one is already in flight for this key (the
  /// pending request is shared) or when the entry holds fresh data. The
  /// fetcher closure is only called in the case that actually spawns.
  pub fn ensure<F, Fut>(&self, key: K, make_fetch: F) -> QuerySnapshot<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let mut entries = self.lock();
    let entry = entries.entry(key).or_insert_with(Entry::new);

    if entry.receiver.is_some() {
      return entry.snapshot();
    }

    let fresh = matches!(entry.status, QueryStatus::Success)
      && !entry.stale
      && match (self.stale_time, entry.fetched_at) {
        (Some(limit), Some(at)) => at.elapsed() <= limit,
        (Some(_), None) => false,
        (None, _) => true,
      };
    if fresh {
      return entry.snapshot();
    }

    let (tx, rx) = mpsc::unbounded_channel();
    entry.receiver = Some(rx);
    entry.status = QueryStatus::Loading;
    entry.stale = false;

    let future = make_fetch();
    tokio::spawn(async move {
      // Ignore send errors - the receiver is dropped when the fetch
      // was superseded, and its result must not land
      let _ = tx.send(future.await);
    });

    entry.snapshot()
  }

  /// Drain completed fetches into their entries.
  ///
  /// Returns `true` if any entry changed. Call once per event-loop tick.
  pub fn poll(&self) -> bool {
    let mut entries = self.lock();
    let mut changed = false;

    for entry in entries.values_mut() {
      let receiver = match &mut entry.receiver {
        Some(rx) => rx,
        None => continue,
      };

      match receiver.try_recv() {
        Ok(Ok(data)) => {
          entry.status = QueryStatus::Success;
          entry.data = Some(Arc::new(data));
          entry.fetched_at = Some(Instant::now());
          entry.receiver = None;
          changed = true;
        }
        Ok(Err(error)) => {
          entry.status = QueryStatus::Error(error);
          entry.data = None;
          entry.receiver = None;
          changed = true;
        }
        Err(mpsc::error::TryRecvError::Empty) => {}
        Err(mpsc::error::TryRecvError::Disconnected) => {
          // Sender dropped without sending
          entry.status = QueryStatus::Error(ApiError::Transport(
            "request was cancelled".to_string(),
          ));
          entry.data = None;
          entry.receiver = None;
          changed = true;
        }
      }
    }

    changed
  }

  /// Mark every entry stale and detach in-flight fetches.
  ///
  /// Detaching drops the receiver, so a fetch that was running commits
  /// nowhere when it completes; the next `ensure` per key starts over.
  /// Previous data stays visible until the refetch lands.
  pub fn invalidate(&self) {
    let mut entries = self.lock();
    for entry in entries.values_mut() {
      entry.stale = true;
      entry.receiver = None;
      if matches!(entry.status, QueryStatus::Loading) {
        entry.status = if entry.data.is_some() {
          QueryStatus::Success
        } else {
          QueryStatus::Idle
        };
      }
    }
  }

  /// Drop all entries (sign-out).
  pub fn clear(&self) {
    self.lock().clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn counting_fetcher(
    counter: &Arc<AtomicU32>,
    delay: Duration,
  ) -> impl Future<Output = Result<u32, ApiError>> + Send + 'static {
    let counter = counter.clone();
    async move {
      tokio::time::sleep(delay).await;
      Ok(counter.fetch_add(1, Ordering::SeqCst))
    }
  }

  #[tokio::test]
  async fn test_ensure_dedups_in_flight_fetches() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    let first = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::from_millis(20))
    });
    assert!(first.is_loading());

    // Second ensure for the same key joins the pending fetch
    let second = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::from_millis(20))
    });
    assert!(second.is_loading());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.poll());

    let done = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    assert_eq!(done.status, QueryStatus::Success);
    assert_eq!(done.data(), Some(&0));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_distinct_keys_fetch_independently() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    cache.ensure("b".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    assert_eq!(counter.load(Ordering::SeqCst), 2);

    let a = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    let b = cache.ensure("b".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    assert_eq!(a.status, QueryStatus::Success);
    assert_eq!(b.status, QueryStatus::Success);
    // No refetch happened for either key
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_fresh_success_is_not_refetched() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    for _ in 0..3 {
      cache.ensure("a".to_string(), || {
        counting_fetcher(&counter, Duration::ZERO)
      });
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_error_commits_and_clears_data() {
    let cache: QueryCache<String, u32> = QueryCache::new();

    cache.ensure("a".to_string(), || async {
      Err(ApiError::Server("boom".to_string()))
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.poll());

    let snapshot = cache.ensure("a".to_string(), || async {
      Err(ApiError::Server("boom".to_string()))
    });
    // The failed entry refetches on the next ensure, previous data stays gone
    assert!(snapshot.data().is_none());
    assert!(snapshot.is_loading());
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch_and_keeps_data() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    cache.invalidate();

    let refetching = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    // Old data is still visible while the refetch runs
    assert!(refetching.is_loading());
    assert_eq!(refetching.data(), Some(&0));

    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    let fresh = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    assert_eq!(fresh.data(), Some(&1));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidate_discards_in_flight_fetch() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    // Slow first fetch
    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::from_millis(30))
    });
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Invalidated mid-flight: the first result must never land
    cache.invalidate();
    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::from_millis(30))
    });

    tokio::time::sleep(Duration::from_millis(80)).await;
    cache.poll();

    let snapshot = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    // Both fetches ran, only the second one committed
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(snapshot.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_clear_drops_entries() {
    let cache: QueryCache<String, u32> = QueryCache::new();
    let counter = Arc::new(AtomicU32::new(0));

    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    cache.clear();

    let snapshot = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    assert!(snapshot.is_loading());
    assert!(snapshot.data().is_none());
  }

  #[tokio::test]
  async fn test_stale_time_expires_entries() {
    let cache: QueryCache<String, u32> =
      QueryCache::new().with_stale_time(Duration::ZERO);
    let counter = Arc::new(AtomicU32::new(0));

    cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.poll();

    // With zero stale time the entry refetches immediately
    let snapshot = cache.ensure("a".to_string(), || {
      counting_fetcher(&counter, Duration::ZERO)
    });
    assert!(snapshot.is_loading());
    assert_eq!(snapshot.data(), Some(&0));
  }
}
