use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};

use crate::platform::Messenger;

/// Parse the configured destination: numeric ids are chats, anything else a channel username.
fn parse_recipient(chat_id: &str) -> Recipient {
    let trimmed = chat_id.trim();
    match trimmed.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(trimmed.to_string()),
    }
}

/// Sends messages to a single Telegram chat.
pub struct TelegramMessenger {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
            recipient: parse_recipient(chat_id),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    fn platform(&self) -> &'static str {
        "telegram"
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.recipient.clone(), text.to_string())
            .await
            .context("Telegram sendMessage failed")?;
        Ok(())
    }
}
