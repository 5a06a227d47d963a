//! Source code for the Movie File Store Bot: the admin uploads files, everyone
//! else finds them by name and gets them through deep links.

/// Configuration read from the environment.
mod config;

/// The error type.
mod error;

/// Various types used throughout.
mod types;

/// The database.
mod database;

/// Deep links and `/start` payloads.
mod links;

/// Channel membership check.
mod gate;

/// First contact bookkeeping and referral crediting.
mod referral;

/// Turning short IDs back into files.
mod resolver;

/// Trending, random and by-name lookups.
mod search;

/// External link shortener.
mod shortener;

/// Admin broadcasts.
mod broadcast;

/// Admin uploads.
mod upload;

/// Liveness endpoint for the hosting platform.
mod health;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

#[cfg(test)]
mod testing;
