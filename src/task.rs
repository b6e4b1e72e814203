//! Cancelable background enhancement.
//!
//! An [`EnhanceTask`] runs one pipeline invocation on its own thread. The
//! pipeline polls the task's [`CancelToken`] between steps and once per
//! convolution row; once the token is set, [`EnhanceTask::join`] reports
//! [`Error::Cancelled`] and any result the worker produced is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::EnhancementResult;
use crate::error::{Error, Result};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Irreversible.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running enhancement.
#[derive(Debug)]
pub struct EnhanceTask {
    token: CancelToken,
    handle: JoinHandle<Result<EnhancementResult>>,
}

impl EnhanceTask {
    pub(crate) fn spawn<F>(token: CancelToken, work: F) -> Self
    where
        F: FnOnce() -> Result<EnhancementResult> + Send + 'static,
    {
        Self {
            token,
            handle: thread::spawn(work),
        }
    }

    /// A handle that can cancel this task from elsewhere.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the worker thread has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if cancellation was requested at any
    /// point before this call returns, otherwise the pipeline's own result.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the worker thread.
    pub fn join(self) -> Result<EnhancementResult> {
        let result = match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        if self.token.is_cancelled() {
            log::debug!("Discarding result of cancelled enhancement");
            return Err(Error::Cancelled);
        }
        result
    }
}
