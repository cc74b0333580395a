pub mod errors;
pub mod batching;
pub mod retry;

pub use errors::{ConfigurationError, PipelineError};
pub use batching::BatchPacer;
pub use retry::{retry_with_backoff, Backoff};
