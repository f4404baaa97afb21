//! Internal disposal bag for managing cleanup hooks.

use std::future::Future;
use std::pin::Pin;

pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// One disposal hook, either sync or async, in the order it was registered.
pub(crate) enum Disposer {
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFutureUnit + Send>),
}

/// A single ordered list of disposal hooks, run LIFO by `dispose_all`.
///
/// Unlike splitting sync/async hooks into separate queues, keeping one
/// ordered list means disposal order always matches registration order
/// regardless of hook kind, matching "disposal order within one owner is
/// LIFO by creation time."
#[derive(Default)]
pub(crate) struct DisposeBag {
    disposers: Vec<Disposer>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.disposers.push(Disposer::Sync(f));
    }

    pub(crate) fn push_async(&mut self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.disposers.push(Disposer::Async(f));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }

    /// Runs every hook in reverse registration order. Async hooks are
    /// awaited in place; sync hooks run inline.
    pub(crate) async fn run_all_reverse(&mut self) {
        while let Some(disposer) = self.disposers.pop() {
            match disposer {
                Disposer::Sync(f) => f(),
                Disposer::Async(f) => f().await,
            }
        }
    }

    /// Runs only the sync hooks it can without blocking, in reverse order,
    /// for use from non-async `Drop` impls. Async hooks encountered along
    /// the way are dropped without running — callers that register async
    /// disposers must call `dispose_all` explicitly before the owner drops.
    pub(crate) fn run_sync_best_effort_reverse(&mut self) -> bool {
        let mut skipped_async = false;
        while let Some(disposer) = self.disposers.pop() {
            match disposer {
                Disposer::Sync(f) => f(),
                Disposer::Async(_) => skipped_async = true,
            }
        }
        skipped_async
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_sync_hooks_lifo() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let order = order.clone();
            bag.push_sync(Box::new(move || order.lock().unwrap().push(i)));
        }
        bag.run_sync_best_effort_reverse();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn interleaves_sync_and_async_in_registration_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        {
            let order = order.clone();
            bag.push_sync(Box::new(move || order.lock().unwrap().push("sync-0")));
        }
        {
            let order = order.clone();
            bag.push_async(Box::new(move || {
                Box::pin(async move { order.lock().unwrap().push("async-1") })
            }));
        }
        {
            let order = order.clone();
            bag.push_sync(Box::new(move || order.lock().unwrap().push("sync-2")));
        }
        bag.run_all_reverse().await;
        assert_eq!(*order.lock().unwrap(), vec!["sync-2", "async-1", "sync-0"]);
    }
}
