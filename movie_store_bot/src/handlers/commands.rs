use bot_commons::useful_methods::Transport;
use chrono::Utc;
use teloxide::types::BotCommand;

use crate::{
    broadcast::relay,
    error::Error,
    links::StartPayload,
    referral::record_contact,
    resolver::resolve,
};

use super::{replies, send_join_prompt, App, Incoming, Myself, Sender};

/// A command this bot knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Option<StartPayload>),
    Stats,
    Broadcast,
    Cancel,
}

impl Command {
    /// Returns [`None`] if it's not a command, not one of ours,
    /// or addressed to some other bot.
    pub fn parse(text: &str, bot_username: &str) -> Option<Command> {
        if !text.starts_with('/') {
            return None;
        }
        let command = text.split_whitespace().next()?;

        // "/start@Movie_Store_Bot" is "/start", if that's us.
        let callname = if let Some(username_start) = command.find('@') {
            // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
            if !command[username_start + '@'.len_utf8()..].eq_ignore_ascii_case(bot_username) {
                return None;
            }
            &command[..username_start]
        } else {
            command
        };

        match callname.to_ascii_lowercase().as_str() {
            "/start" => Some(Command::Start(StartPayload::from_command_text(text))),
            "/stats" => Some(Command::Stats),
            "/broadcast" => Some(Command::Broadcast),
            "/cancel" => Some(Command::Cancel),
            _ => None,
        }
    }

    /// Commands to show in Telegram's menu. Admin ones stay hidden.
    pub fn generate_bot_commands() -> Vec<BotCommand> {
        vec![BotCommand::new("start", "Open the menu")]
    }
}

pub async fn handle_command(
    transport: &impl Transport,
    me: Myself<'_>,
    app: &App,
    message: &Incoming<'_>,
    sender: Sender<'_>,
    command: Command,
) -> Result<(), Error> {
    match command {
        Command::Start(payload) => start(transport, me, app, message, sender, payload).await,
        Command::Stats => stats(transport, app, message, sender).await,
        Command::Broadcast => begin_broadcast(transport, app, message, sender).await,
        // Nothing to cancel. A live broadcast session would've taken this message already.
        Command::Cancel => app.config.ensure_admin(sender.id),
    }
}

async fn start(
    transport: &impl Transport,
    me: Myself<'_>,
    app: &App,
    message: &Incoming<'_>,
    sender: Sender<'_>,
    payload: Option<StartPayload>,
) -> Result<(), Error> {
    let chat = message.chat;

    if !app.config.is_admin(sender.id) && !app.gate.is_member(transport, sender.id).await {
        let raw_payload = message.text.and_then(|x| x.split_whitespace().nth(1));
        return send_join_prompt(transport, me, app, chat, raw_payload).await;
    }

    record_contact(
        &app.database,
        transport,
        sender.id,
        sender.first_name,
        payload.as_ref(),
        Utc::now(),
    )
    .await?;

    if let Some(StartPayload::Get(short_id)) = &payload {
        match resolve(&app.database, transport, chat, short_id, me.username).await {
            Ok(media) => log::debug!("Sent {} to {}", media.short_id, sender.id),
            Err(Error::NotFound) => {
                transport.send_html(chat, replies::NOT_FOUND).await?;
            }
            Err(e) => return Err(e),
        }
        return Ok(());
    }

    transport
        .send_html_with_markup(
            chat,
            &replies::welcome(sender.first_name),
            replies::menu_keyboard().into(),
        )
        .await?;

    Ok(())
}

async fn stats(
    transport: &impl Transport,
    app: &App,
    message: &Incoming<'_>,
    sender: Sender<'_>,
) -> Result<(), Error> {
    app.config.ensure_admin(sender.id)?;

    let users = app.database.count_users().await?;
    let media = app.database.count_media().await?;

    transport
        .reply_html(message.chat, message.id, &replies::stats(users, media))
        .await?;

    Ok(())
}

async fn begin_broadcast(
    transport: &impl Transport,
    app: &App,
    message: &Incoming<'_>,
    sender: Sender<'_>,
) -> Result<(), Error> {
    app.config.ensure_admin(sender.id)?;

    let session = app.broadcasts.begin(sender.id, Utc::now()).await;
    log::info!("Awaiting a message to broadcast until {}", session.expires_at);

    transport
        .reply_html(message.chat, message.id, replies::BROADCAST_PROMPT)
        .await?;

    Ok(())
}

/// Handle the message that follows `/broadcast`: either `/cancel`, or the thing to send to everyone.
pub async fn finish_broadcast(
    transport: &impl Transport,
    me: Myself<'_>,
    app: &App,
    message: &Incoming<'_>,
) -> Result<(), Error> {
    let chat = message.chat;

    let cancelled = message
        .text
        .and_then(|x| Command::parse(x, me.username))
        .is_some_and(|x| x == Command::Cancel);

    if cancelled {
        transport.send_html(chat, replies::BROADCAST_CANCELLED).await?;
        return Ok(());
    }

    let status = transport.send_html(chat, replies::BROADCAST_STARTED).await?;

    let recipients = match app.database.all_user_ids().await {
        Ok(recipients) => recipients,
        Err(e) => {
            if let Err(edit_error) = transport.edit_html(chat, status, replies::BROADCAST_FAILED).await {
                log::warn!("Failed to report a failed broadcast: {edit_error}");
            }
            return Err(e.into());
        }
    };
    log::info!("Broadcasting to {} users...", recipients.len());

    let report = relay(transport, &recipients, chat, message.id).await;

    transport
        .edit_html(chat, status, &replies::broadcast_report(&report))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse("/start", "MovieStoreBot"),
            Some(Command::Start(None))
        );
        assert_eq!(
            Command::parse("/start get_AB12cd34", "MovieStoreBot"),
            Some(Command::Start(Some(StartPayload::Get(String::from(
                "AB12cd34"
            )))))
        );
        assert_eq!(Command::parse("/STATS", "MovieStoreBot"), Some(Command::Stats));
        assert_eq!(
            Command::parse("/broadcast@moviestorebot", "MovieStoreBot"),
            Some(Command::Broadcast)
        );
        assert_eq!(Command::parse("/cancel", "MovieStoreBot"), Some(Command::Cancel));
    }

    #[test]
    fn ignores_what_is_not_ours() {
        assert_eq!(Command::parse("/start@OtherBot", "MovieStoreBot"), None);
        assert_eq!(Command::parse("/help", "MovieStoreBot"), None);
        assert_eq!(Command::parse("start", "MovieStoreBot"), None);
        assert_eq!(Command::parse("🔥 Trending", "MovieStoreBot"), None);
        assert_eq!(Command::parse("/", "MovieStoreBot"), None);
    }
}
