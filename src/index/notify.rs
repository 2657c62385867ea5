//! Notifier that publishes to the log

use crate::index::{IndexError, Notifier};
use tracing::info;

/// Logs every published message at info level
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn publish(&self, topic: &str, message: serde_json::Value) -> Result<(), IndexError> {
        let payload = serde_json::to_string(&message)?;
        info!(topic, %payload, "Published message");
        Ok(())
    }
}
