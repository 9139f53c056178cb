//! Cancellation and cost-tracking, grounded on the teacher's `resource.rs`
//! (`ResourceTracker`, `ResourceError`, `NoLimitTracker`) but retargeted from
//! heap-allocation accounting to "basic operation" accounting (spec §4.4
//! "State tracking", §5 "Cancellation / timeouts").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CelError, ErrorKind};

/// A flag the embedder can flip from another thread to request early exit.
/// Polled by the interpreter every `interrupt_check_frequency` basic
/// operations; never relies on stack unwinding (spec §9 "Cancellation").
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts "cost units" (one per basic operation dispatched) against an
/// optional budget. Monomorphized into `Interpreter` the same way the
/// teacher's VM takes its tracker as a type parameter rather than a trait
/// object, so the no-limit path costs nothing.
pub trait CostTracker {
    fn on_operation(&mut self) -> Result<(), CelError>;
}

/// The default tracker: no budget, every operation is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl CostTracker for NoLimitTracker {
    fn on_operation(&mut self) -> Result<(), CelError> {
        Ok(())
    }
}

/// Aborts evaluation once `max_operations` basic operations have been
/// dispatched. Reuses `ErrorKind::Interrupted` — like cancellation, a
/// budget trip aborts the whole evaluation rather than producing an
/// in-band `Value::Error`, so both travel through `Program::eval`'s
/// `Result::Err` path rather than its `Ok(Value::Error(..))` path.
#[derive(Debug, Clone, Copy)]
pub struct BudgetedTracker {
    pub max_operations: u64,
    spent: u64,
}

impl BudgetedTracker {
    #[must_use]
    pub fn new(max_operations: u64) -> Self {
        Self { max_operations, spent: 0 }
    }

    #[must_use]
    pub fn spent(&self) -> u64 {
        self.spent
    }
}

impl CostTracker for BudgetedTracker {
    fn on_operation(&mut self) -> Result<(), CelError> {
        self.spent += 1;
        if self.spent > self.max_operations {
            return Err(CelError::new(
                ErrorKind::Interrupted,
                format!("evaluation cost budget exceeded ({} operations)", self.max_operations),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_starts_clear() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn budgeted_tracker_errors_past_limit() {
        let mut tracker = BudgetedTracker::new(2);
        assert!(tracker.on_operation().is_ok());
        assert!(tracker.on_operation().is_ok());
        assert!(tracker.on_operation().is_err());
    }
}
