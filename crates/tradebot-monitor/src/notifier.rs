//! Notifier implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tradebot_core::error::NotifyError;
use tradebot_core::traits::Notifier;
use tradebot_core::types::{ManagementEvent, TradingSignal};

use crate::format::MessageFormatter;

/// Writes formatted messages to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    formatter: MessageFormatter,
}

impl LogNotifier {
    pub fn new(formatter: MessageFormatter) -> Self {
        Self { formatter }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        info!(target: "tradebot::notify", "\n{}", self.formatter.signal(signal));
        Ok(())
    }

    async fn send_event(&self, event: &ManagementEvent) -> Result<(), NotifyError> {
        let text = self.formatter.event(event);
        match event {
            ManagementEvent::RiskAlert(_) => warn!(target: "tradebot::notify", "{}", text),
            _ => info!(target: "tradebot::notify", "{}", text),
        }
        Ok(())
    }

    async fn send_error(&self, message: &str) -> Result<(), NotifyError> {
        error!(target: "tradebot::notify", "{}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
enum Record<'a> {
    Signal(&'a TradingSignal),
    Event(&'a ManagementEvent),
    Error { message: &'a str },
}

#[derive(Serialize)]
struct Line<'a> {
    at: DateTime<Utc>,
    record: Record<'a>,
}

/// Appends one JSON object per notification to a file, for downstream
/// consumers such as a chat bot.
pub struct JsonlNotifier {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: Record<'_>) -> Result<(), NotifyError> {
        let mut line = serde_json::to_string(&Line {
            at: Utc::now(),
            record,
        })
        .map_err(|e| NotifyError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for JsonlNotifier {
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        self.append(Record::Signal(signal)).await
    }

    async fn send_event(&self, event: &ManagementEvent) -> Result<(), NotifyError> {
        self.append(Record::Event(event)).await
    }

    async fn send_error(&self, message: &str) -> Result<(), NotifyError> {
        self.append(Record::Error { message }).await
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Delivers to every inner notifier; fails if any of them failed.
#[derive(Default, Clone)]
pub struct FanoutNotifier {
    inner: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.inner.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn merge(&self, results: Vec<(&str, Result<(), NotifyError>)>) -> Result<(), NotifyError> {
        let failed: Vec<String> = results
            .into_iter()
            .filter_map(|(name, r)| r.err().map(|e| format!("{}: {}", name, e)))
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(failed.join("; ")))
        }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn send_signal(&self, signal: &TradingSignal) -> Result<(), NotifyError> {
        let mut results = Vec::with_capacity(self.inner.len());
        for n in &self.inner {
            results.push((n.name(), n.send_signal(signal).await));
        }
        self.merge(results)
    }

    async fn send_event(&self, event: &ManagementEvent) -> Result<(), NotifyError> {
        let mut results = Vec::with_capacity(self.inner.len());
        for n in &self.inner {
            results.push((n.name(), n.send_event(event).await));
        }
        self.merge(results)
    }

    async fn send_error(&self, message: &str) -> Result<(), NotifyError> {
        let mut results = Vec::with_capacity(self.inner.len());
        for n in &self.inner {
            results.push((n.name(), n.send_error(message).await));
        }
        self.merge(results)
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("tradebot-notify-{}", uuid::Uuid::new_v4()))
            .join("notifications.jsonl")
    }

    fn closed(symbol: &str) -> ManagementEvent {
        ManagementEvent::Closed {
            symbol: symbol.to_string(),
            reason: "disabled".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_jsonl_appends_lines() {
        let path = temp_path();
        let notifier = JsonlNotifier::new(&path);
        notifier.send_event(&closed("ETHUSDT")).await.unwrap();
        notifier.send_error("feed stalled").await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["record"]["kind"], "event");
        assert_eq!(lines[0]["record"]["payload"]["event"], "closed");
        assert_eq!(lines[1]["record"]["payload"]["message"], "feed stalled");
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send_signal(&self, _signal: &TradingSignal) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("down".to_string()))
        }

        async fn send_event(&self, _event: &ManagementEvent) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("down".to_string()))
        }

        async fn send_error(&self, _message: &str) -> Result<(), NotifyError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all_and_reports_failures() {
        let path = temp_path();
        let fanout = FanoutNotifier::new()
            .with(Arc::new(Failing))
            .with(Arc::new(JsonlNotifier::new(&path)));
        assert_eq!(fanout.len(), 2);

        let err = fanout.send_event(&closed("SOLUSDT")).await.unwrap_err();
        assert!(err.to_string().contains("failing: Delivery failed: down"));
        // The healthy channel still received the event
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);

        fanout.send_error("ok").await.unwrap();
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new(MessageFormatter::new(3000.0));
        assert!(notifier.send_event(&closed("ETHUSDT")).await.is_ok());
    }
}
