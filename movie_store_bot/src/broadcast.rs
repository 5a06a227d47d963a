use bot_commons::useful_methods::Transport;
use chrono::{DateTime, TimeDelta, Utc};
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::sync::Mutex;

/// The admin has sent `/broadcast` and their next message is to be relayed to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastSession {
    pub awaiting_from: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Holds at most one pending broadcast.
pub struct BroadcastSessions {
    pending: Mutex<Option<BroadcastSession>>,
    lifetime: TimeDelta,
}

impl BroadcastSessions {
    pub fn new(lifetime: TimeDelta) -> Self {
        Self {
            pending: Mutex::new(None),
            lifetime,
        }
    }

    /// Start waiting for the next message from `admin`. Replaces any earlier session.
    pub async fn begin(&self, admin: UserId, now: DateTime<Utc>) -> BroadcastSession {
        let session = BroadcastSession {
            awaiting_from: admin,
            expires_at: now + self.lifetime,
        };
        *self.pending.lock().await = Some(session);
        session
    }

    /// If a live session is waiting on a message from `user`, end it and return `true`:
    /// the message at hand is the one to broadcast. Expired sessions are dropped.
    pub async fn take(&self, user: UserId, now: DateTime<Utc>) -> bool {
        let mut pending = self.pending.lock().await;
        let current = *pending;
        match current {
            Some(session) if now >= session.expires_at => {
                log::debug!("Broadcast session of {user} expired.");
                *pending = None;
                false
            }
            Some(session) if session.awaiting_from == user => {
                *pending = None;
                true
            }
            _ => false,
        }
    }
}

/// How a broadcast went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: u32,
    pub failed: u32,
}

impl BroadcastReport {
    pub fn attempted(&self) -> u32 {
        self.delivered + self.failed
    }
}

/// Copy a message to each recipient in turn. Failures (blocked bot, deleted account)
/// are counted and don't stop the rest.
pub async fn relay(
    transport: &impl Transport,
    recipients: &[UserId],
    from_chat: ChatId,
    message: MessageId,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for &recipient in recipients {
        match transport.copy_to(ChatId::from(recipient), from_chat, message).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                log::debug!("Broadcast to {recipient} failed: {e}");
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Broadcast done: {} delivered, {} failed.",
        report.delivered,
        report.failed
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Sent};

    const ADMIN: UserId = UserId(1);

    #[tokio::test]
    async fn session_is_one_shot() {
        let sessions = BroadcastSessions::new(TimeDelta::minutes(10));
        let now = Utc::now();

        assert!(!sessions.take(ADMIN, now).await);
        sessions.begin(ADMIN, now).await;
        assert!(!sessions.take(UserId(2), now).await);
        assert!(sessions.take(ADMIN, now + TimeDelta::minutes(1)).await);
        assert!(!sessions.take(ADMIN, now + TimeDelta::minutes(2)).await);
    }

    #[tokio::test]
    async fn session_expires() {
        let sessions = BroadcastSessions::new(TimeDelta::minutes(10));
        let now = Utc::now();

        let session = sessions.begin(ADMIN, now).await;
        assert_eq!(session.expires_at, now + TimeDelta::minutes(10));
        assert!(!sessions.take(ADMIN, now + TimeDelta::minutes(10)).await);
        // And it's gone for good.
        assert!(!sessions.take(ADMIN, now).await);
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let recipients: Vec<UserId> = (1..=10).map(UserId).collect();
        let transport = FakeTransport {
            blocked: [2, 5, 9].into_iter().map(ChatId).collect(),
            ..Default::default()
        };

        let report = relay(&transport, &recipients, ChatId(1), MessageId(77)).await;

        assert_eq!(report.delivered, 7);
        assert_eq!(report.failed, 3);
        assert_eq!(report.attempted(), 10);

        let delivered_to: Vec<ChatId> = transport
            .sent()
            .into_iter()
            .map(|x| match x {
                Sent::Copy { to, from, message } => {
                    assert_eq!(from, ChatId(1));
                    assert_eq!(message, MessageId(77));
                    to
                }
                other => panic!("unexpected send: {other:?}"),
            })
            .collect();
        assert_eq!(
            delivered_to,
            [1, 3, 4, 6, 7, 8, 10].into_iter().map(ChatId).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn nobody_to_send_to() {
        let transport = FakeTransport::default();
        let report = relay(&transport, &[], ChatId(1), MessageId(1)).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
