use std::fmt::Display;

use bot_commons::useful_methods::FileKind;
use chrono::{DateTime, Utc};
use rand::RngExt;
use teloxide::types::UserId;

/// Public handle of a stored media file. Whoever has it can fetch the file,
/// so it's drawn at random: 8 characters out of 62 is about 47.6 bits.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ShortId(String);

impl ShortId {
    pub const LEN: usize = 8;
    const ALPHABET: &'static [u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    /// Draw a fresh random ID.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..Self::LEN)
            .map(|_| char::from(Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())]))
            .collect();
        Self(id)
    }

    /// Wrap an ID that came from the database.
    pub(crate) fn from_stored(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ShortId {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A user as seen by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: String,
    pub points: u32,
    pub referrals: u32,
    pub joined_at: DateTime<Utc>,
}

/// A stored media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub short_id: ShortId,
    /// Telegram's file ID. Opaque to us.
    pub file_ref: String,
    pub kind: FileKind,
    pub name: String,
    pub caption: Option<String>,
    pub views: u32,
    pub added_at: DateTime<Utc>,
}

/// A media file about to be stored.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub file_ref: String,
    pub kind: FileKind,
    pub name: String,
    pub caption: Option<String>,
}
