//! Utility modules.

pub mod retry;

pub use retry::{RetryPolicy, Retryable, with_retry};
