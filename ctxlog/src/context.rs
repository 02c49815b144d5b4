//! Execution contexts.
//!
//! A [`Context`] is an immutable, derive-only carrier of key/value bindings
//! plus cancellation and deadline signalling. Deriving a context never touches
//! the parent: each `with_*` call returns a new handle whose newest layer
//! points at the parent's layers, so any number of threads can read the same
//! context, or derive siblings from it, without locking.
//!
//! ```text
//! background ── trace_id=abc ── user_id=42      (request context)
//!                     └───────── user_id=7       (sibling, shares trace_id layer)
//! ```
//!
//! Lookup walks from the newest layer towards the root; the first binding
//! whose key matches wins.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a context is no longer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context, or one of its ancestors, was cancelled.
    #[error("context canceled")]
    Canceled,
    /// The context's deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Key of a context binding.
///
/// Keys match when they have the same concrete type and compare equal, so two
/// libraries using different key types can never read each other's bindings.
trait BindingKey: Any + Send + Sync {
    fn matches(&self, other: &dyn Any) -> bool;
}

impl<K> BindingKey for K
where
    K: Any + Eq + Send + Sync,
{
    fn matches(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<K>().is_some_and(|other| other == self)
    }
}

struct Layer {
    key: Box<dyn BindingKey>,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Self>>,
}

/// Immutable, hierarchically scoped execution context.
///
/// Cloning is cheap: a clone shares every layer with the original.
#[derive(Clone)]
pub struct Context {
    layers: Option<Arc<Layer>>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Returns an empty root context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            layers: None,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derives a context that additionally binds `key` to `value`.
    ///
    /// A later binding for an equal key shadows the earlier one for readers of
    /// the new context only.
    #[must_use]
    pub fn with_value<K, V>(&self, key: K, value: V) -> Self
    where
        K: Any + Eq + Send + Sync,
        V: Any + Send + Sync,
    {
        Self {
            layers: Some(Arc::new(Layer {
                key: Box::new(key),
                value: Arc::new(value),
                parent: self.layers.clone(),
            })),
            cancel: self.cancel.clone(),
            deadline: self.deadline,
        }
    }

    /// Looks up the value bound to `key` in this context or its ancestors.
    pub fn raw_value<K>(&self, key: &K) -> Option<&(dyn Any + Send + Sync)>
    where
        K: Any + Eq + Send + Sync,
    {
        let mut layer = self.layers.as_deref();
        while let Some(current) = layer {
            if current.key.matches(key) {
                return Some(current.value.as_ref());
            }
            layer = current.parent.as_deref();
        }
        None
    }

    /// Looks up the value bound to `key` and downcasts it to `V`.
    ///
    /// Returns `None` both when nothing is bound and when the newest binding
    /// holds a different type.
    pub fn value<K, V>(&self, key: &K) -> Option<&V>
    where
        K: Any + Eq + Send + Sync,
        V: Any,
    {
        self.raw_value(key)?.downcast_ref::<V>()
    }

    /// Number of bindings visible from this context, shadowed ones included.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.layers.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }

    /// Derives a cancellable context.
    ///
    /// Cancelling the returned token cancels the new context and everything
    /// derived from it. The parent is unaffected.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let token = self.cancel.child_token();
        let context = Self {
            layers: self.layers.clone(),
            cancel: token.clone(),
            deadline: self.deadline,
        };
        (context, token)
    }

    /// Derives a context that expires at `deadline`.
    ///
    /// A child never outlives its parent: an earlier inherited deadline wins.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            layers: self.layers.clone(),
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Derives a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or_else(|| self.clone(), |deadline| self.with_deadline(deadline))
    }

    /// Deadline of this context, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether this context or one of its ancestors was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Reports why the context is no longer live, or `None` while it is.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes once the context is cancelled.
    ///
    /// Deadlines are not timers: they are observed through [`Context::err`].
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
