use std::fs;

use ::config::Environment;
use serde::Deserialize;
use teloxide::types::{ChatId, Recipient, UserId};

use crate::{error::Error, gate::GatePolicy};

fn default_database_url() -> String {
    String::from("sqlite:movie_store.sqlite")
}

fn default_shortener_domain() -> String {
    String::from("gplinks.in")
}

fn default_shortener_timeout_secs() -> u64 {
    10
}

fn default_port() -> u16 {
    5000
}

fn default_broadcast_timeout_secs() -> u64 {
    600
}

/// Settings of the bot, sourced from environment variables of the same name
/// in upper case (`ADMIN_ID`, `FORCE_SUB_CHANNEL` and so on).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// If absent, the token is read from a `key` (or `key_debug`) file instead.
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub admin_id: u64,
    /// Numeric chat ID or `@username` of the channel users must join.
    /// Empty means no gating.
    #[serde(default)]
    pub force_sub_channel: String,
    #[serde(default)]
    pub force_sub_url: String,
    #[serde(default)]
    pub gate_policy: GatePolicy,
    #[serde(default)]
    pub use_shortener: bool,
    #[serde(default)]
    pub shortener_api: String,
    #[serde(default = "default_shortener_domain")]
    pub shortener_domain: String,
    #[serde(default = "default_shortener_timeout_secs")]
    pub shortener_timeout_secs: u64,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_broadcast_timeout_secs")]
    pub broadcast_timeout_secs: u64,
}

impl Config {
    /// Load the configuration from the process environment,
    /// after pulling in a `.env` file if there is one.
    pub fn from_env() -> Result<Self, Error> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Failed to load .env file: {e}");
            }
        }
        Self::from_environment(Environment::default())
    }

    /// Same as [`Self::from_env`], but from a fixed set of variables.
    #[cfg(test)]
    pub fn from_vars(vars: ::config::Map<String, String>) -> Result<Self, Error> {
        Self::from_environment(Environment::default().source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self, Error> {
        let config = ::config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn admin(&self) -> UserId {
        UserId(self.admin_id)
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin()
    }

    /// Returns [`Error::PermissionDenied`] unless `user` is the admin.
    pub fn ensure_admin(&self, user: UserId) -> Result<(), Error> {
        match self.is_admin(user) {
            true => Ok(()),
            false => Err(Error::PermissionDenied),
        }
    }

    /// The gate channel, if gating is configured.
    pub fn gate_channel(&self) -> Option<Recipient> {
        let channel = self.force_sub_channel.trim();
        if channel.is_empty() {
            return None;
        }
        Some(match channel.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(channel.to_string()),
        })
    }

    /// The bot token, from the environment or from the key file.
    pub fn bot_token(&self) -> Result<String, Error> {
        if let Some(token) = &self.bot_token {
            return Ok(token.trim().to_string());
        }

        let key = fs::read_to_string(match cfg!(debug_assertions) {
            true => "key_debug",
            false => "key",
        })?;
        Ok(key.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> ::config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_in() {
        let config = Config::from_vars(vars(&[("ADMIN_ID", "123456789")])).unwrap();
        assert_eq!(config.admin(), UserId(123456789));
        assert_eq!(config.database_url, "sqlite:movie_store.sqlite");
        assert_eq!(config.gate_policy, GatePolicy::FailOpen);
        assert!(!config.use_shortener);
        assert_eq!(config.shortener_domain, "gplinks.in");
        assert_eq!(config.port, 5000);
        assert!(config.gate_channel().is_none());
    }

    #[test]
    fn reads_everything() {
        let config = Config::from_vars(vars(&[
            ("BOT_TOKEN", "123:abc"),
            ("ADMIN_ID", "42"),
            ("FORCE_SUB_CHANNEL", "-1001234567890"),
            ("FORCE_SUB_URL", "https://t.me/yourchannel"),
            ("GATE_POLICY", "fail_closed"),
            ("USE_SHORTENER", "true"),
            ("SHORTENER_API", "deadbeef"),
            ("SHORTENER_DOMAIN", "short.example"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.bot_token().unwrap(), "123:abc");
        assert!(config.is_admin(UserId(42)));
        assert!(!config.is_admin(UserId(43)));
        assert_eq!(config.gate_policy, GatePolicy::FailClosed);
        assert!(config.use_shortener);
        assert_eq!(config.shortener_api, "deadbeef");
        assert_eq!(config.shortener_domain, "short.example");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.gate_channel(),
            Some(Recipient::Id(ChatId(-1001234567890)))
        );
    }

    #[test]
    fn secrets_stay_as_written() {
        let config = Config::from_vars(vars(&[
            ("ADMIN_ID", "1"),
            ("SHORTENER_API", "0071e5"),
            ("BOT_TOKEN", "0042"),
            ("FORCE_SUB_URL", "1e3"),
        ]))
        .unwrap();
        assert_eq!(config.shortener_api, "0071e5");
        assert_eq!(config.bot_token().unwrap(), "0042");
        assert_eq!(config.force_sub_url, "1e3");
    }

    #[test]
    fn channel_by_username() {
        let config = Config::from_vars(vars(&[
            ("ADMIN_ID", "1"),
            ("FORCE_SUB_CHANNEL", "@yourchannel"),
        ]))
        .unwrap();
        assert_eq!(
            config.gate_channel(),
            Some(Recipient::ChannelUsername(String::from("@yourchannel")))
        );
    }

    #[test]
    fn admin_is_required() {
        assert!(Config::from_vars(vars(&[("PORT", "1")])).is_err());
    }

    #[test]
    fn only_admin_passes() {
        let config = Config::from_vars(vars(&[("ADMIN_ID", "7")])).unwrap();
        assert!(config.ensure_admin(UserId(7)).is_ok());
        assert!(matches!(
            config.ensure_admin(UserId(8)),
            Err(Error::PermissionDenied)
        ));
    }
}
