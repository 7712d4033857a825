use std::future::Future;
use tokio::sync::mpsc;

use crate::api::ApiError;

/// A single-shot write operation running off the UI thread.
///
/// Dispatch spawns the future; the owning view polls once per tick and gets
/// the outcome exactly once. Dropping a mutation mid-flight discards its
/// result without cancelling the request itself.
#[derive(Debug)]
pub struct Mutation<T> {
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
}

impl<T: Send + 'static> Mutation<T> {
  /// An idle mutation that never yields anything.
  pub fn idle() -> Self {
    Self { receiver: None }
  }

  /// Spawn the operation and hand back its pending handle.
  pub fn dispatch<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
    Self { receiver: Some(rx) }
  }

  pub fn in_flight(&self) -> bool {
    self.receiver.is_some()
  }

  /// Take the outcome if the operation finished. Yields at most once.
  pub fn poll(&mut self) -> Option<Result<T, ApiError>> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        Some(Err(ApiError::Transport("request was cancelled".to_string())))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_outcome_is_delivered_exactly_once() {
    let mut mutation = Mutation::dispatch(async { Ok::<_, ApiError>(5) });
    assert!(mutation.in_flight());

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(mutation.poll(), Some(Ok(5)));
    assert!(!mutation.in_flight());
    assert_eq!(mutation.poll(), None);
  }

  #[tokio::test]
  async fn test_error_outcome() {
    let mut mutation: Mutation<u32> =
      Mutation::dispatch(async { Err(ApiError::NotFound) });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(mutation.poll(), Some(Err(ApiError::NotFound)));
  }

  #[tokio::test]
  async fn test_idle_never_yields() {
    let mut mutation: Mutation<u32> = Mutation::idle();
    assert!(!mutation.in_flight());
    assert_eq!(mutation.poll(), None);
  }

  #[tokio::test]
  async fn test_not_done_yet_yields_nothing() {
    let mut mutation = Mutation::dispatch(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, ApiError>(1)
    });

    assert_eq!(mutation.poll(), None);
    assert!(mutation.in_flight());
  }
}
