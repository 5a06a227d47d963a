pub mod commands;
mod replies;

use bot_commons::useful_methods::*;

use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    types::{ChatId, Me, Message, MessageId, UserId},
    Bot,
};

use crate::{
    broadcast::BroadcastSessions,
    config::Config,
    database::Database,
    error::Error,
    gate::AccessGate,
    links::{deep_link, get_payload, referral_payload},
    referral::record_contact,
    search::{search, results_keyboard, SearchQuery, PROFILE_LABEL, SEARCH_LABEL},
    shortener::Shortener,
    upload::store_upload,
};

use commands::{finish_broadcast, handle_command, Command};

/// Everything the handlers need, shared between them.
pub struct App {
    pub config: Config,
    pub database: Database,
    pub gate: AccessGate,
    pub shortener: Shortener,
    pub broadcasts: BroadcastSessions,
}

/// Who the bot itself is.
#[derive(Debug, Clone, Copy)]
pub struct Myself<'a> {
    pub id: UserId,
    pub username: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct Sender<'a> {
    pub id: UserId,
    pub first_name: &'a str,
}

/// The parts of a message the handlers look at.
pub struct Incoming<'a> {
    pub chat: ChatId,
    pub private: bool,
    pub id: MessageId,
    pub from: Option<Sender<'a>>,
    pub text: Option<&'a str>,
    pub upload: Option<UploadedFile<'a>>,
}

impl<'a> Incoming<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            chat: message.chat.id,
            private: message.chat.is_private(),
            id: message.id,
            from: message.from.as_ref().map(|user| Sender {
                id: user.id,
                first_name: &user.first_name,
            }),
            text: message.text(),
            upload: message.uploaded_file(),
        }
    }
}

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    app: Arc<App>,
) -> Result<(), Error> {
    let myself = Myself {
        id: me.id,
        username: me.username(),
    };

    match route_message(&bot, myself, &Incoming::new(&message), &app).await {
        Err(Error::PermissionDenied) => {
            log::debug!(
                "Ignoring an admin-only action in chat {} from a non-admin.",
                message.chat.id
            );
            Ok(())
        }
        other => other,
    }
}

async fn route_message(
    transport: &impl Transport,
    me: Myself<'_>,
    message: &Incoming<'_>,
    app: &App,
) -> Result<(), Error> {
    let Some(sender) = message.from else {
        return Ok(());
    };

    // Bot ignores messages made by itself.
    if sender.id == me.id {
        return Ok(());
    }

    let admin = app.config.is_admin(sender.id);

    // Everyone else is only talked to in DMs.
    if !message.private && !admin {
        return Ok(());
    }

    if admin && app.broadcasts.take(sender.id, Utc::now()).await {
        return finish_broadcast(transport, me, app, message).await;
    }

    if let Some(upload) = &message.upload {
        app.config.ensure_admin(sender.id)?;

        let media = store_upload(&app.database, upload, Utc::now()).await?;
        let link = deep_link(me.username, &get_payload(media.short_id.as_str()));

        transport
            .reply_html(message.chat, message.id, &replies::media_saved(&media, &link))
            .await?;
        return Ok(());
    }

    let Some(text) = message.text else {
        return Ok(());
    };

    if let Some(command) = Command::parse(text, me.username) {
        return handle_command(transport, me, app, message, sender, command).await;
    }

    handle_text(transport, me, app, message, sender, text).await
}

/// Menu buttons and movie names.
async fn handle_text(
    transport: &impl Transport,
    me: Myself<'_>,
    app: &App,
    message: &Incoming<'_>,
    sender: Sender<'_>,
    text: &str,
) -> Result<(), Error> {
    let chat = message.chat;

    if !app.config.is_admin(sender.id) && !app.gate.is_member(transport, sender.id).await {
        return send_join_prompt(transport, me, app, chat, None).await;
    }

    record_contact(
        &app.database,
        transport,
        sender.id,
        sender.first_name,
        None,
        Utc::now(),
    )
    .await?;

    match text.trim() {
        SEARCH_LABEL => {
            transport.send_html(chat, replies::SEARCH_PROMPT).await?;
        }
        PROFILE_LABEL => {
            let record = app.database.get_user(sender.id).await?;
            let link = deep_link(me.username, &referral_payload(sender.id));
            transport
                .send_html(chat, &replies::profile(record.as_ref(), &link))
                .await?;
        }
        _ => {
            let results = match SearchQuery::parse(text) {
                Some(query) => {
                    let results = search(&app.database, &query).await?;
                    (!results.is_empty()).then_some((query, results))
                }
                None => None,
            };

            let Some((query, results)) = results else {
                transport
                    .reply_html(chat, message.id, replies::NO_RESULTS)
                    .await?;
                return Ok(());
            };

            let keyboard = results_keyboard(&results, me.username, &app.shortener).await;
            transport
                .send_html_with_markup(chat, &replies::results_title(query.title()), keyboard.into())
                .await?;
        }
    }

    Ok(())
}

/// Tell the user to join the channel first. `payload` is what they came with, so that
/// the "I Joined" button can bring them back to it.
async fn send_join_prompt(
    transport: &impl Transport,
    me: Myself<'_>,
    app: &App,
    chat: ChatId,
    payload: Option<&str>,
) -> Result<(), Error> {
    transport
        .send_html_with_markup(
            chat,
            replies::JOIN_CHANNEL,
            app.gate.join_keyboard(me.username, payload).into(),
        )
        .await?;
    Ok(())
}
