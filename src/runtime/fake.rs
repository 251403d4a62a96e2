//! Runtime support for generated fakes
//!
//! Generated test doubles are thin structs wiring these primitives together:
//! append-only logs, settable callback/override slots, and the two dispatch
//! helpers carrying the fake's behavioral contract — `simulate` for push
//! events and `dispatch_invoke` for invoke calls.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use thiserror::Error;

use super::channel::EventChannel;

/// Runtime failures surfaced by generated fakes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FakeError {
    /// A strict fake was invoked without a configured behavior.
    #[error("unsupported call to '{method}': no behavior configured on a strict fake")]
    UnsupportedCall { method: String },
}

/// Thread-safe append-only log of calls or records.
#[derive(Clone)]
pub struct CallLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> CallLog<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn append(&self, entry: T) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T: Clone> CallLog<T> {
    /// Snapshot of all entries in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> Default for CallLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CallLog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLog").field("len", &self.len()).finish()
    }
}

type Callback<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

/// Settable async callback slot on a push method. Dispatching with no
/// callback installed resolves immediately.
#[derive(Clone)]
pub struct CallbackSlot<A> {
    callback: Arc<Mutex<Option<Callback<A>>>>,
}

impl<A> CallbackSlot<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            callback: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set<F>(&self, callback: F)
    where
        F: Fn(A) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        *self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn clear(&self) {
        *self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invoke and await the installed callback, if any.
    pub async fn dispatch(&self, args: A) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(args).await;
        }
    }
}

impl<A> Default for CallbackSlot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for CallbackSlot<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

type Behavior<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, R> + Send + Sync>;

/// Overridable behavior delegate on a faked invoke method, preferred over
/// the default behavior when set.
#[derive(Clone)]
pub struct OverrideSlot<A, R> {
    behavior: Arc<Mutex<Option<Behavior<A, R>>>>,
}

impl<A, R> OverrideSlot<A, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set<F>(&self, behavior: F)
    where
        F: Fn(A) -> BoxFuture<'static, R> + Send + Sync + 'static,
    {
        *self
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(behavior));
    }

    pub fn clear(&self) {
        *self
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn get(&self) -> Option<Behavior<A, R>> {
        self.behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<A, R> Default for OverrideSlot<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> std::fmt::Debug for OverrideSlot<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Simulate a push event on a fake binding. Strictly in order: append to
/// the record log, publish to the event channel, then invoke and await the
/// callback if one is currently set.
pub async fn simulate<A>(
    records: &CallLog<A>,
    events: &EventChannel<A>,
    callback: &CallbackSlot<A>,
    value: A,
) where
    A: Clone + Send,
{
    records.append(value.clone());
    events.publish(value.clone());
    callback.dispatch(value).await;
}

/// Dispatch an invoke call on a fake binding: the call is recorded, the
/// override is preferred when set, and otherwise strict mode fails while
/// lenient mode resolves with the default result.
pub async fn dispatch_invoke<A, R>(
    calls: &CallLog<A>,
    behavior: &OverrideSlot<A, R>,
    strict: bool,
    method: &str,
    args: A,
) -> Result<R, FakeError>
where
    A: Clone + Send,
    R: Default,
{
    calls.append(args.clone());

    if let Some(behavior) = behavior.get() {
        tracing::trace!(method, "fake invoke dispatched to override");
        return Ok(behavior(args).await);
    }

    if strict {
        tracing::trace!(method, "strict fake invoke without override");
        return Err(FakeError::UnsupportedCall {
            method: method.to_string(),
        });
    }

    Ok(R::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_records_before_resolving() {
        let calls: CallLog<String> = CallLog::new();
        let behavior: OverrideSlot<String, ()> = OverrideSlot::new();

        let result = dispatch_invoke(&calls, &behavior, true, "Send", "hi".to_string()).await;

        assert_eq!(calls.snapshot(), ["hi"]);
        assert_eq!(
            result,
            Err(FakeError::UnsupportedCall {
                method: "Send".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_callback_slot_dispatch_without_callback_resolves() {
        let slot: CallbackSlot<u32> = CallbackSlot::new();
        slot.dispatch(1).await;
        assert!(!slot.is_set());
    }
}
