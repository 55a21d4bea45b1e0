//! Notification channel trait.

use crate::error::NotifyError;
use crate::types::{ManagementEvent, TradingSignal};
use async_trait::async_trait;

/// Delivers signals and position events to the outside world.
///
/// Formatting and transport are the implementation's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError>;

    async fn send_event(&self, event: &ManagementEvent) -> Result<(), NotifyError>;

    /// Report an operational error.
    async fn send_error(&self, message: &str) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}
