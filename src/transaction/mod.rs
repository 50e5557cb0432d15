// ============================================================================
// Transaction Execution Module
// ============================================================================
//
// Retrying transaction runner and the backoff primitive it sleeps with.
//
// ============================================================================

pub mod backoff;
pub mod executor;

pub use backoff::BackoffPolicy;
pub use executor::TransactionExecutor;
