//! Test helpers: a throwaway database and a Telegram stand-in.
#![allow(clippy::unwrap_used)]

use std::{collections::HashSet, net::SocketAddr, sync::Mutex};

use bot_commons::useful_methods::{FileKind, MemberStatus, Transport};
use tempfile::TempDir;
use teloxide::{
    types::{ChatId, MessageId, Recipient, ReplyMarkup, UserId},
    ApiError, RequestError,
};

use crate::{database::Database, types::NewMedia};

/// Serve `router` on an ephemeral local port in the background.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    addr
}

/// Fresh database in a temporary directory. Keep the directory alive for as long as the database.
pub async fn temp_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.sqlite").display());
    let db = Database::new(&url).await.unwrap();
    (dir, db)
}

pub fn new_media(name: &str) -> NewMedia {
    NewMedia {
        file_ref: format!("file-of-{name}"),
        kind: FileKind::Document,
        name: name.to_string(),
        caption: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        to: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
        reply_to: Option<MessageId>,
    },
    Edit { chat: ChatId, message: MessageId, text: String },
    File { to: ChatId, kind: FileKind, file_id: String, caption: String },
    Copy { to: ChatId, from: ChatId, message: MessageId },
}

/// Records everything "sent" through it.
#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<Sent>>,
    /// Chats that have blocked the bot.
    pub blocked: HashSet<ChatId>,
    /// What the membership query answers. `None` makes it fail.
    pub membership: Option<MemberStatus>,
}

impl FakeTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|x| match x {
                Sent::Text { to, text, .. } if to == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Records `what`. The message ID it gets is its position among everything sent, from 1.
    fn deliver(&self, to: ChatId, what: Sent) -> Result<MessageId, RequestError> {
        if self.blocked.contains(&to) {
            return Err(RequestError::Api(ApiError::BotBlocked));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(what);
        Ok(MessageId(sent.len() as i32))
    }

    fn text(
        &self,
        to: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, RequestError> {
        self.deliver(
            to,
            Sent::Text {
                to,
                text: text.to_string(),
                markup,
                reply_to,
            },
        )
    }
}

impl Transport for FakeTransport {
    async fn send_html(&self, to: ChatId, text: &str) -> Result<MessageId, RequestError> {
        self.text(to, text, None, None)
    }

    async fn send_html_with_markup(
        &self,
        to: ChatId,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<MessageId, RequestError> {
        self.text(to, text, Some(markup), None)
    }

    async fn reply_html(
        &self,
        to: ChatId,
        reply_to: MessageId,
        text: &str,
    ) -> Result<MessageId, RequestError> {
        self.text(to, text, None, Some(reply_to))
    }

    async fn edit_html(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError> {
        self.deliver(
            chat,
            Sent::Edit {
                chat,
                message,
                text: text.to_string(),
            },
        )?;
        Ok(())
    }

    async fn send_stored_file(
        &self,
        to: ChatId,
        kind: FileKind,
        file_id: &str,
        caption: &str,
    ) -> Result<(), RequestError> {
        self.deliver(
            to,
            Sent::File {
                to,
                kind,
                file_id: file_id.to_string(),
                caption: caption.to_string(),
            },
        )?;
        Ok(())
    }

    async fn copy_to(&self, to: ChatId, from: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.deliver(to, Sent::Copy { to, from, message })?;
        Ok(())
    }

    async fn membership(&self, _chat: &Recipient, _user: UserId) -> Result<MemberStatus, RequestError> {
        self.membership
            .ok_or(RequestError::Api(ApiError::ChatNotFound))
    }
}
