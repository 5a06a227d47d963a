use bot_commons::useful_methods::Transport;
use serde::Deserialize;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Recipient, UserId};
use url::Url;

use crate::{config::Config, links::deep_link};

/// What to do when Telegram can't tell us if a user is in the channel,
/// for example because the bot can't see the channel's members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Let them through.
    #[default]
    FailOpen,
    /// Treat them as not subscribed.
    FailClosed,
}

/// Requires users to be in a channel before they can use the bot.
pub struct AccessGate {
    channel: Option<Recipient>,
    join_url: Option<Url>,
    policy: GatePolicy,
}

impl AccessGate {
    pub fn new(channel: Option<Recipient>, join_url: Option<Url>, policy: GatePolicy) -> Self {
        Self {
            channel,
            join_url,
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let channel = config.gate_channel();

        let join_url = match config.force_sub_url.trim() {
            "" => None,
            url => match Url::parse(url) {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("Ignoring unparsable channel join URL {url}: {e}");
                    None
                }
            },
        };

        if channel.is_some() && join_url.is_none() {
            log::warn!("Channel gating is on, but there's no join URL to show to users.");
        }

        Self::new(channel, join_url, config.gate_policy)
    }

    /// True if the user may use the bot.
    pub async fn is_member(&self, transport: &impl Transport, user: UserId) -> bool {
        let Some(channel) = &self.channel else {
            return true;
        };

        match transport.membership(channel, user).await {
            Ok(status) => status.is_member(),
            Err(e) => {
                log::warn!("Failed to check if {user} is in the channel: {e}");
                self.policy == GatePolicy::FailOpen
            }
        }
    }

    /// Keyboard with a button to join the channel, and a button to try again
    /// that leads back into `/start` with the same payload.
    pub fn join_keyboard(&self, bot_username: &str, payload: Option<&str>) -> InlineKeyboardMarkup {
        let mut rows = Vec::new();

        if let Some(join_url) = &self.join_url {
            rows.push(vec![InlineKeyboardButton::url(
                "🔔 Join Channel",
                join_url.clone(),
            )]);
        }

        rows.push(vec![InlineKeyboardButton::url(
            "✅ I Joined",
            deep_link(bot_username, payload.unwrap_or("none")),
        )]);

        InlineKeyboardMarkup::new(rows)
    }
}
