use std::sync::Arc;

use tracing::{debug, error};

use crate::platform::Messenger;

/// Best-effort delivery: failures are logged here and never reach the caller.
#[derive(Clone)]
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Returns whether the message was delivered.
    pub async fn send_message(&self, message: &str) -> bool {
        match self.messenger.send_text(message).await {
            Ok(()) => {
                debug!(
                    "Sent {} message: \"{}\"",
                    self.messenger.platform(),
                    message
                );
                true
            }
            Err(e) => {
                error!("Failed to send message: {:#}", e);
                false
            }
        }
    }
}
