//! Texts and keyboards the bot answers with.

use html_escape::encode_text;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use url::Url;

use crate::{
    broadcast::BroadcastReport,
    search::{PROFILE_LABEL, RANDOM_LABEL, SEARCH_LABEL, TRENDING_LABEL},
    types::{MediaRecord, UserRecord},
};

pub const JOIN_CHANNEL: &str = "⚠️ <b>You must join our channel to use this bot.</b>";
pub const NOT_FOUND: &str = "❌ Movie not found or deleted.";
pub const NO_RESULTS: &str = "❌ No movies found. Try checking the spelling.";
pub const SEARCH_PROMPT: &str = "👇 Type the movie name you want to search:";
pub const BROADCAST_PROMPT: &str =
    "Send the message/file you want to broadcast (Reply with /cancel to stop).";
pub const BROADCAST_CANCELLED: &str = "Broadcast cancelled.";
pub const BROADCAST_STARTED: &str = "🚀 Broadcast started...";
pub const BROADCAST_FAILED: &str = "❌ Broadcast failed: couldn't get the list of users.";

/// The four-button menu under the text field.
pub fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(SEARCH_LABEL),
            KeyboardButton::new(PROFILE_LABEL),
        ],
        vec![
            KeyboardButton::new(TRENDING_LABEL),
            KeyboardButton::new(RANDOM_LABEL),
        ],
    ])
    .resize_keyboard()
}

pub fn welcome(first_name: &str) -> String {
    format!(
        concat!(
            "👋 Hello <b>{}</b>!\n\n",
            "🎬 I am your <b>Movie File Store Bot</b>.\n",
            "🔎 Simply send me the <b>Movie Name</b> or use the buttons below."
        ),
        encode_text(first_name)
    )
}

/// Profile of a user. They may not be in the database if it hiccuped, so that's optional.
pub fn profile(user: Option<&UserRecord>, referral_link: &Url) -> String {
    let (points, referrals) = user.map_or((0, 0), |x| (x.points, x.referrals));
    format!(
        concat!(
            "👤 <b>User Profile</b>\n\n",
            "💰 Points: {}\n",
            "👥 Referrals: {}\n",
            "🔗 <b>Your Referral Link:</b>\n",
            "<code>{}</code>"
        ),
        points,
        referrals,
        encode_text(referral_link.as_str())
    )
}

pub fn results_title(title: &str) -> String {
    format!("🔎 Results for: <b>{}</b>", encode_text(title))
}

pub fn stats(users: u64, media: u64) -> String {
    format!("📊 <b>Bot Statistics</b>\n\n👥 Users: {users}\n🎥 Movies: {media}")
}

pub fn media_saved(media: &MediaRecord, link: &Url) -> String {
    format!(
        concat!(
            "✅ <b>Movie Saved!</b>\n\n",
            "📂 Name: {}\n",
            "🆔 ID: <code>{}</code>\n",
            "🔗 {}"
        ),
        encode_text(&media.name),
        media.short_id,
        encode_text(link.as_str())
    )
}

pub fn broadcast_report(report: &BroadcastReport) -> String {
    format!(
        "✅ Broadcast Complete\nSuccessful: {}\nFailed: {}",
        report.delivered, report.failed
    )
}
