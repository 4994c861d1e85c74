//! Invalid-input bookkeeping.
//!
//! Every rejected argument combination is returned to the caller as an error
//! value. In addition, each rejection bumps a per-thread counter so test
//! harnesses can assert that a sequence of calls produced no invalid input.

use std::cell::Cell;

use crate::error::{OperationError, SectorError};

thread_local! {
    static INVALID_INPUT_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// Number of invalid inputs recorded on the current thread.
#[must_use]
pub fn invalid_input_count() -> u64 {
    INVALID_INPUT_COUNT.with(Cell::get)
}

/// Resets the current thread's invalid-input counter to zero.
pub fn reset_invalid_input_count() {
    INVALID_INPUT_COUNT.with(|c| c.set(0));
}

fn record() {
    INVALID_INPUT_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

/// Records a rejected operation argument and returns the matching error.
pub(crate) fn invalid_input(message: impl Into<String>) -> OperationError {
    let message = message.into();
    record();
    tracing::warn!(reason = %message, "invalid input rejected");
    OperationError::InvalidInput(message)
}

/// Records a rejected sector query and passes the error through.
pub(crate) fn invalid_sector(err: SectorError) -> SectorError {
    record();
    tracing::warn!(error = %err, "invalid sector query");
    err
}
