use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::{
    database::Database,
    error::Error,
    links::{deep_link, get_payload},
    shortener::Shortener,
    types::MediaRecord,
};

pub const SEARCH_LABEL: &str = "🔍 Search Movie";
pub const PROFILE_LABEL: &str = "👤 My Profile";
pub const TRENDING_LABEL: &str = "🔥 Trending";
pub const RANDOM_LABEL: &str = "🎲 Random Movie";

const TRENDING_LIMIT: u32 = 5;
const RANDOM_LIMIT: u32 = 1;
const TEXT_LIMIT: u32 = 10;

/// What a plain text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Most viewed media.
    Trending,
    /// One media picked at random.
    Random,
    /// Media with this in their name.
    Text(String),
}

impl SearchQuery {
    /// Returns [`None`] if the text can't be understood as a query:
    /// it's blank, or it's a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('/') {
            return None;
        }

        Some(match text {
            TRENDING_LABEL => SearchQuery::Trending,
            RANDOM_LABEL => SearchQuery::Random,
            _ => SearchQuery::Text(text.to_string()),
        })
    }

    /// Most results this query can produce.
    pub fn limit(&self) -> u32 {
        match self {
            SearchQuery::Trending => TRENDING_LIMIT,
            SearchQuery::Random => RANDOM_LIMIT,
            SearchQuery::Text(_) => TEXT_LIMIT,
        }
    }

    /// How to title the results.
    pub fn title(&self) -> &str {
        match self {
            SearchQuery::Trending => TRENDING_LABEL,
            SearchQuery::Random => RANDOM_LABEL,
            SearchQuery::Text(text) => text,
        }
    }
}

/// Run a query. An empty result is [`Ok`] with nothing in it.
pub async fn search(database: &Database, query: &SearchQuery) -> Result<Vec<MediaRecord>, Error> {
    let limit = query.limit();
    let results = match query {
        SearchQuery::Trending => database.most_viewed(limit).await?,
        SearchQuery::Random => database.random_media(limit).await?,
        SearchQuery::Text(text) => database.media_named_like(text, limit as usize).await?,
    };
    Ok(results)
}

fn truncate(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Text of the button leading to this media.
pub fn button_text(media: &MediaRecord, shortened: bool) -> String {
    match shortened {
        true => format!("🔓 Unlock: {}...", truncate(&media.name, 20)),
        false => format!("⬇️ {}", truncate(&media.name, 25)),
    }
}

/// One button per result, each a deep link fetching that media,
/// passed through the shortener if it's on.
pub async fn results_keyboard(
    results: &[MediaRecord],
    bot_username: &str,
    shortener: &Shortener,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::with_capacity(results.len());

    for media in results {
        let link = deep_link(bot_username, &get_payload(media.short_id.as_str()));
        let link = shortener.shorten(&link).await;
        rows.push(vec![InlineKeyboardButton::url(
            button_text(media, shortener.is_enabled()),
            link,
        )]);
    }

    InlineKeyboardMarkup::new(rows)
}
