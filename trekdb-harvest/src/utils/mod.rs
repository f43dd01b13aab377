//! Utility modules for trekdb-harvest

pub mod request_queue;
pub mod retry;

pub use request_queue::RequestQueue;
pub use retry::{with_retries, RetryPolicy};
