//! Tokio-backed task helpers.
//!
//! The engine's loop and the adapter's off-timers are the only background
//! work in the crate; both go through [`spawn`] so their handles can be
//! stored, aborted and awaited.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

/// Sleep for the specified duration.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Returns `true` when called from inside a tokio runtime.
pub fn has_runtime() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

/// Spawn a future as a background task.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    JoinHandle(tokio::spawn(future))
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wrapper around tokio's JoinHandle.
///
/// Awaiting yields `None` if the task was aborted.
#[derive(Debug)]
pub struct JoinHandle<T>(tokio::task::JoinHandle<T>);

impl<T> Future for JoinHandle<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.0).poll(cx) {
            Poll::Ready(Ok(v)) => Poll::Ready(Some(v)),
            Poll::Ready(Err(e)) => {
                // Task panicked - propagate panic
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> JoinHandle<T> {
    /// Abort the task.
    pub fn abort(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_spawn_and_join() {
        let handle = spawn(async {
            sleep(Duration::from_secs(5)).await;
            7
        });
        assert_eq!(handle.await, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_yields_none() {
        let handle = spawn(async {
            sleep(Duration::from_secs(60)).await;
        });
        handle.abort();
        assert_eq!(handle.await, None);
    }

    #[test]
    fn test_no_runtime_outside_tokio() {
        assert!(!has_runtime());
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = std::sync::Arc::new(Mutex::new(1));
        let poisoner = std::sync::Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert_eq!(*lock(&mutex), 1);
    }
}
