//! # Unit of work of an item.
//!
//! [`ItemWork`] is what an item process runs once it holds the processing slot.
//! [`WorkFn`] wraps a closure, [`SleepWork`] simulates a fixed amount of work.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use slotvisor::{BasicItem, Item, ItemError, WorkFn};
//!
//! let work: WorkFn<BasicItem, _> = WorkFn::new(|item: BasicItem, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(ItemError::Canceled);
//!     }
//!     println!("processing {}", item.id());
//!     Ok(())
//! });
//! # let _ = work;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ItemError;
use crate::protocol::Item;

/// # Work performed while an item holds the slot.
///
/// Implementations should watch `ctx` and return [`ItemError::Canceled`] promptly on shutdown.
#[async_trait]
pub trait ItemWork<T: Item>: Send + Sync + 'static {
    /// Processes one item snapshot (status is `Processing`).
    async fn process(&self, item: &T, ctx: CancellationToken) -> Result<(), ItemError>;
}

/// Closure-backed work.
///
/// Each call receives an owned snapshot of the item, so the future is `'static`.
pub struct WorkFn<T, F> {
    f: F,
    _item: PhantomData<fn(T)>,
}

impl<T, F> WorkFn<T, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> ItemWork<T> for WorkFn<T, F>
where
    T: Item,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ItemError>> + Send + 'static,
{
    async fn process(&self, item: &T, ctx: CancellationToken) -> Result<(), ItemError> {
        (self.f)(item.clone(), ctx).await
    }
}

/// Simulated work: waits for `duration` or until cancelled.
#[derive(Clone, Debug)]
pub struct SleepWork {
    pub duration: Duration,
}

impl SleepWork {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for SleepWork {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl<T: Item> ItemWork<T> for SleepWork {
    async fn process(&self, _item: &T, ctx: CancellationToken) -> Result<(), ItemError> {
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => Ok(()),
            _ = ctx.cancelled() => Err(ItemError::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BasicItem;

    #[tokio::test]
    async fn test_work_fn_sees_snapshot() {
        let work: WorkFn<BasicItem, _> = WorkFn::new(|item: BasicItem, _ctx: CancellationToken| async move {
            if item.name == "bad" {
                Err(ItemError::Work {
                    error: "bad item".into(),
                })
            } else {
                Ok(())
            }
        });

        let ctx = CancellationToken::new();
        assert!(work.process(&BasicItem::new("1", "ok"), ctx.clone()).await.is_ok());
        let err = work
            .process(&BasicItem::new("2", "bad"), ctx)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "item_work");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_work_honors_cancellation() {
        let ctx = CancellationToken::new();
        let item = BasicItem::new("1", "x");
        let work = SleepWork::default();

        assert!(ItemWork::<BasicItem>::process(&work, &item, ctx.clone()).await.is_ok());

        ctx.cancel();
        let res = ItemWork::<BasicItem>::process(&work, &item, ctx).await;
        assert!(matches!(res, Err(ItemError::Canceled)));
    }
}
