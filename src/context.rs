// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Execution context handed to external collaborators.
//!
//! An [`OperationContext`] carries a cancellation signal and an optional
//! deadline. The pipeline wraps every suspension point (embedding, transport)
//! in [`OperationContext::run`], which resolves to
//! [`QueryError::Cancelled`] or [`QueryError::DeadlineExceeded`] as soon as
//! either fires. Collaborators may also poll [`OperationContext::is_cancelled`].
//!
//! ```text
//! CancelHandle ──cancel()──► watch<bool> ──► OperationContext::run(phase, fut)
//!                                               ├─ fut completes   → Ok(T)
//!                                               ├─ cancelled       → Cancelled(phase)
//!                                               └─ deadline passes → DeadlineExceeded(phase)
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{QueryError, Result};

/// Cancellation signal and deadline for one logical operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    cancel_rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Triggers cancellation of every context cloned from its pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left
        self.tx.send_replace(true);
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::background()
    }
}

impl OperationContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self {
            cancel_rx: rx,
            deadline: None,
        }
    }

    /// A fresh context plus the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                cancel_rx: rx,
                deadline: None,
            },
            CancelHandle { tx },
        )
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        // Never extend a deadline inherited from a parent context
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Fail fast if the context is already done.
    pub fn check(&self, phase: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(QueryError::Cancelled(phase));
        }
        if matches!(self.deadline, Some(d) if d <= Instant::now()) {
            return Err(QueryError::DeadlineExceeded(phase));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first.
    pub async fn run<F, T>(&self, phase: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(phase)?;

        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            // A dropped handle can no longer cancel; park forever in that case
            let closed = cancel_rx.wait_for(|cancelled| *cancelled).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        };

        let guarded = async {
            tokio::select! {
                biased;
                _ = cancelled => Err(QueryError::Cancelled(phase)),
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(QueryError::DeadlineExceeded(phase))),
            None => guarded.await,
        }
    }
}
