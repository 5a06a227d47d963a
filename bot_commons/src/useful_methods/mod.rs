use std::{fmt::Display, future::Future};

use teloxide::{
    payloads::{EditMessageTextSetters, SendDocumentSetters, SendMessageSetters, SendVideoSetters},
    requests::Requester,
    sugar::request::RequestReplyExt,
    types::{
        ChatId, FileId, FileMeta, InputFile, Message, MessageId, ParseMode, Recipient,
        ReplyMarkup, UserId,
    },
    Bot, RequestError,
};

/// Kind of file a message carried, which decides how it's sent back out later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Document,
    Video,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Video => "video",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "document" => Some(FileKind::Document),
            "video" => Some(FileKind::Video),
            _ => None,
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document or a video attached to a message.
pub struct UploadedFile<'a> {
    pub kind: FileKind,
    pub file: &'a FileMeta,
    pub file_name: Option<&'a str>,
    pub caption: Option<&'a str>,
}

impl UploadedFile<'_> {
    /// Telegram's handle of this file, reusable to send it again.
    pub fn file_id(&self) -> &str {
        &self.file.id.0
    }
}

pub trait MessageStuff {
    /// Text of the message, or its caption if it has none.
    fn text_full(&self) -> Option<&str>;
    /// Document or video attached to this message, if any.
    fn uploaded_file(&self) -> Option<UploadedFile<'_>>;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }

    fn uploaded_file(&self) -> Option<UploadedFile<'_>> {
        if let Some(document) = self.document() {
            return Some(UploadedFile {
                kind: FileKind::Document,
                file: &document.file,
                file_name: document.file_name.as_deref(),
                caption: self.caption(),
            });
        }

        if let Some(video) = self.video() {
            return Some(UploadedFile {
                kind: FileKind::Video,
                file: &video.file,
                file_name: video.file_name.as_deref(),
                caption: self.caption(),
            });
        }

        None
    }
}

/// Standing of a user in some chat, flattened from Telegram's chat member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// True for anyone who is properly in the chat.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member
        )
    }
}

/// The handful of outgoing operations the store bot needs.
///
/// Implemented for [`Bot`], and by fakes in tests.
pub trait Transport {
    /// Send a message formatted with HTML.
    fn send_html(
        &self,
        to: ChatId,
        text: &str,
    ) -> impl Future<Output = Result<MessageId, RequestError>> + Send;

    /// Same as [`Self::send_html`], with a keyboard attached.
    fn send_html_with_markup(
        &self,
        to: ChatId,
        text: &str,
        markup: ReplyMarkup,
    ) -> impl Future<Output = Result<MessageId, RequestError>> + Send;

    /// Same as [`Self::send_html`], as a reply to `reply_to`.
    fn reply_html(
        &self,
        to: ChatId,
        reply_to: MessageId,
        text: &str,
    ) -> impl Future<Output = Result<MessageId, RequestError>> + Send;

    /// Replace the text of a message the bot sent earlier.
    fn edit_html(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Send a file Telegram already has by its file ID, with an HTML caption.
    fn send_stored_file(
        &self,
        to: ChatId,
        kind: FileKind,
        file_id: &str,
        caption: &str,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Copy a message from one chat into another, without a "forwarded" header.
    fn copy_to(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Query the standing of a user in a chat.
    fn membership(
        &self,
        chat: &Recipient,
        user: UserId,
    ) -> impl Future<Output = Result<MemberStatus, RequestError>> + Send;
}

impl Transport for Bot {
    async fn send_html(&self, to: ChatId, text: &str) -> Result<MessageId, RequestError> {
        let sent = self.send_message(to, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(sent.id)
    }

    async fn send_html_with_markup(
        &self,
        to: ChatId,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<MessageId, RequestError> {
        let sent = self.send_message(to, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup)
            .await?;
        Ok(sent.id)
    }

    async fn reply_html(
        &self,
        to: ChatId,
        reply_to: MessageId,
        text: &str,
    ) -> Result<MessageId, RequestError> {
        let sent = self.send_message(to, text)
            .parse_mode(ParseMode::Html)
            .reply_to(reply_to)
            .await?;
        Ok(sent.id)
    }

    async fn edit_html(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), RequestError> {
        self.edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_stored_file(
        &self,
        to: ChatId,
        kind: FileKind,
        file_id: &str,
        caption: &str,
    ) -> Result<(), RequestError> {
        let file = InputFile::file_id(FileId(file_id.to_string()));
        match kind {
            FileKind::Document => {
                self.send_document(to, file)
                    .caption(caption)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            FileKind::Video => {
                self.send_video(to, file)
                    .caption(caption)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
        Ok(())
    }

    async fn copy_to(&self, to: ChatId, from: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.copy_message(to, from, message).await?;
        Ok(())
    }

    async fn membership(&self, chat: &Recipient, user: UserId) -> Result<MemberStatus, RequestError> {
        let member = self.get_chat_member(chat.clone(), user).await?;
        let kind = &member.kind;

        let status = if kind.is_owner() {
            MemberStatus::Owner
        } else if kind.is_administrator() {
            MemberStatus::Administrator
        } else if kind.is_member() {
            MemberStatus::Member
        } else if kind.is_restricted() {
            MemberStatus::Restricted
        } else if kind.is_banned() {
            MemberStatus::Banned
        } else {
            MemberStatus::Left
        };

        Ok(status)
    }
}
