use std::sync::LazyLock;

use teloxide::types::UserId;
use url::Url;

static TELEGRAM: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://t.me/").expect("URL will always be valid"));

/// `https://t.me/<bot>?start=<payload>`, which makes Telegram send `/start <payload>` to the bot.
pub fn deep_link(bot_username: &str, payload: &str) -> Url {
    let mut url = TELEGRAM.clone();
    url.set_path(bot_username);
    url.query_pairs_mut().append_pair("start", payload);
    url
}

/// Payload to fetch the media under this short ID.
pub fn get_payload(short_id: &str) -> String {
    format!("get_{short_id}")
}

/// Payload to credit a referral to this user.
pub fn referral_payload(user: UserId) -> String {
    format!("ref_{user}")
}

/// What a `/start` payload asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPayload {
    /// `get_<short id>`
    Get(String),
    /// `ref_<user id>`
    Referral(UserId),
    /// Anything else. Gets the usual welcome.
    Other(String),
}

impl StartPayload {
    /// Returns [`None`] if there's no payload at all.
    pub fn parse(payload: &str) -> Option<Self> {
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }

        if let Some(short_id) = payload.strip_prefix("get_") {
            return Some(StartPayload::Get(short_id.to_string()));
        }

        if let Some(Ok(id)) = payload.strip_prefix("ref_").map(str::parse::<u64>) {
            return Some(StartPayload::Referral(UserId(id)));
        }

        Some(StartPayload::Other(payload.to_string()))
    }

    /// Payload of a `/start` command message, if any.
    pub fn from_command_text(text: &str) -> Option<Self> {
        text.split_whitespace().nth(1).and_then(Self::parse)
    }

    pub fn referrer(&self) -> Option<UserId> {
        match self {
            StartPayload::Referral(id) => Some(*id),
            _ => None,
        }
    }
}
