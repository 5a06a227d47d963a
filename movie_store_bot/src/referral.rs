use bot_commons::useful_methods::Transport;
use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, UserId};

use crate::{database::Database, error::Error, links::StartPayload};

/// Outcome of [`record_contact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The user was already known. Nothing happened.
    Returning,
    /// The user is new. If they came through someone's referral link,
    /// that someone has been credited.
    New { credited: Option<UserId> },
}

/// Remember a user the first time they show up, and if they came in with a
/// `ref_<id>` payload, give that referrer a point and tell them about it.
///
/// Safe to call on every message: only the call that actually creates the
/// user does anything.
pub async fn record_contact(
    database: &Database,
    transport: &impl Transport,
    user: UserId,
    first_name: &str,
    payload: Option<&StartPayload>,
    now: DateTime<Utc>,
) -> Result<Contact, Error> {
    if !database.insert_user_if_absent(user, first_name, now).await? {
        return Ok(Contact::Returning);
    }

    log::debug!("New user {user}");

    let Some(referrer) = payload.and_then(StartPayload::referrer) else {
        return Ok(Contact::New { credited: None });
    };

    if referrer == user {
        log::debug!("User {user} tried to refer themselves.");
        return Ok(Contact::New { credited: None });
    }

    if !database.credit_referral(referrer).await? {
        log::debug!("User {user} came with a referral from unknown user {referrer}.");
        return Ok(Contact::New { credited: None });
    }

    // They got the point either way; the message is a courtesy.
    if let Err(e) = transport
        .send_html(ChatId::from(referrer), "🎉 You got a new referral! +1 Point.")
        .await
    {
        log::warn!("Failed to notify {referrer} about a referral: {e}");
    }

    Ok(Contact::New {
        credited: Some(referrer),
    })
}
