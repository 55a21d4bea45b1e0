//! Logging, notification channels and message formatting.

mod format;
mod logging;
mod notifier;

pub use format::{progress_bar, MessageFormatter};
pub use logging::{setup_logging, LogGuard};
pub use notifier::{FanoutNotifier, JsonlNotifier, LogNotifier};
