//! SendMessageHandler - Command handler for private messages.

use std::sync::Arc;
use thiserror::Error;

use crate::application::{Delivery, NotificationError, NotificationPolicy, RealtimePublisher};
use crate::domain::foundation::{DomainError, UserId, ValidationError};
use crate::domain::realtime::EventKind;
use crate::domain::social::{Message, MessageSendBlacklisted};
use crate::ports::{BlacklistReader, MessageRepository};

/// Command to send a message.
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub origin: UserId,
    pub destination: UserId,
    pub text: String,
    pub invite: bool,
}

/// Result of handling a send.
#[derive(Debug, Clone)]
pub enum SendMessageResult {
    Sent { message: Message, delivery: Delivery },
    /// The destination blacklisted the sender; nothing was stored.
    Refused,
}

#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DomainError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

/// Handler for sending messages.
pub struct SendMessageHandler {
    messages: Arc<dyn MessageRepository>,
    blacklist: Arc<dyn BlacklistReader>,
    policy: Arc<NotificationPolicy>,
    publisher: RealtimePublisher,
}

impl SendMessageHandler {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        blacklist: Arc<dyn BlacklistReader>,
        policy: Arc<NotificationPolicy>,
        publisher: RealtimePublisher,
    ) -> Self {
        Self {
            messages,
            blacklist,
            policy,
            publisher,
        }
    }

    pub async fn handle(&self, cmd: SendMessageCommand) -> Result<SendMessageResult, SendMessageError> {
        // 1. Validate
        let message = Message::new(cmd.origin, cmd.destination, cmd.text, cmd.invite)?;

        // 2. Refuse if the destination blacklisted the sender
        if self
            .blacklist
            .is_blacklisted(&message.destination, &message.origin)
            .await?
        {
            let refusal = MessageSendBlacklisted {
                id: message.destination,
            };
            if let Err(e) = self
                .publisher
                .push(&message.origin, EventKind::MessageSendBlacklisted, &refusal)
                .await
            {
                tracing::warn!(user_id = %message.origin, error = %e, "Could not notify sender of refusal");
            }
            return Ok(SendMessageResult::Refused);
        }

        // 3. Persist
        self.messages.insert(&message).await?;

        // 4. Notify destination
        let delivery = self
            .policy
            .notify(&message.destination, &message.origin, message.event_kind(), &message)
            .await?;

        Ok(SendMessageResult::Sent { message, delivery })
    }
}
