//! RecordGuestVisitHandler - Records a profile visit and tells the owner.

use std::sync::Arc;
use thiserror::Error;

use crate::application::{Delivery, NotificationError, NotificationPolicy};
use crate::domain::foundation::{DomainError, UserId, ValidationError};
use crate::domain::realtime::EventKind;
use crate::domain::social::GuestVisit;
use crate::ports::GuestRepository;

#[derive(Debug, Clone)]
pub struct RecordGuestVisitCommand {
    /// Profile owner.
    pub user: UserId,
    /// Visitor.
    pub guest: UserId,
}

#[derive(Debug, Error)]
pub enum RecordGuestVisitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DomainError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

pub struct RecordGuestVisitHandler {
    guests: Arc<dyn GuestRepository>,
    policy: Arc<NotificationPolicy>,
}

impl RecordGuestVisitHandler {
    pub fn new(guests: Arc<dyn GuestRepository>, policy: Arc<NotificationPolicy>) -> Self {
        Self { guests, policy }
    }

    pub async fn handle(
        &self,
        cmd: RecordGuestVisitCommand,
    ) -> Result<(GuestVisit, Delivery), RecordGuestVisitError> {
        let visit = GuestVisit::new(cmd.user, cmd.guest)?;
        self.guests.record_visit(&visit).await?;

        let delivery = self
            .policy
            .notify(&visit.user, &visit.guest, EventKind::Guest, &visit)
            .await?;

        Ok((visit, delivery))
    }
}
