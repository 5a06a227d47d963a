use bot_commons::useful_methods::Transport;
use html_escape::encode_text;
use teloxide::types::ChatId;

use crate::{database::Database, error::Error, types::MediaRecord};

/// Telegram refuses captions longer than this many UTF-16 units, counted on the visible text.
const CAPTION_LIMIT: usize = 1024;

/// Longest start of `text` that is at most `units` UTF-16 units long.
fn fit_utf16(text: &str, units: usize) -> &str {
    let mut used = 0;
    for (index, c) in text.char_indices() {
        used += c.len_utf16();
        if used > units {
            return &text[..index];
        }
    }
    text
}

/// Caption the file goes out with. The stored caption gets cut short if the whole thing
/// wouldn't fit, and the name too if it's absurdly long.
pub fn media_caption(media: &MediaRecord, bot_username: &str) -> String {
    let footer = format!("🤖 via @{bot_username}");
    let mut budget =
        CAPTION_LIMIT.saturating_sub("🎬 \n\n".encode_utf16().count() + footer.encode_utf16().count());

    let name = fit_utf16(&media.name, budget);
    budget -= name.encode_utf16().count();

    let mut caption = format!("🎬 <b>{}</b>\n\n", encode_text(name));
    if let Some(extra) = media.caption.as_deref().filter(|x| !x.trim().is_empty()) {
        // Leave room for the blank line after it.
        let extra = fit_utf16(extra, budget.saturating_sub(2));
        if !extra.is_empty() {
            caption.push_str(&encode_text(extra));
            caption.push_str("\n\n");
        }
    }
    caption.push_str(&footer);
    caption
}

/// Look up media by its short ID, send it to `to`, and count the view.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if there's nothing under that ID, in which case nothing is
/// sent and nothing in the database changes.
pub async fn resolve(
    database: &Database,
    transport: &impl Transport,
    to: ChatId,
    short_id: &str,
    bot_username: &str,
) -> Result<MediaRecord, Error> {
    let Some(media) = database.find_media(short_id).await? else {
        log::debug!("No media under {short_id:?}");
        return Err(Error::NotFound);
    };

    transport
        .send_stored_file(
            to,
            media.kind,
            &media.file_ref,
            &media_caption(&media, bot_username),
        )
        .await?;

    database.record_view(&media.short_id).await?;

    Ok(media)
}
