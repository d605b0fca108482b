//! Profile visits ("guests").

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RecordId, Timestamp, UserId, ValidationError};

/// `guest` looked at `user`'s profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestVisit {
    pub id: RecordId,
    pub user: UserId,
    pub guest: UserId,
    pub time: Timestamp,
}

impl GuestVisit {
    /// Records a visit. Looking at your own profile is not a visit.
    pub fn new(user: UserId, guest: UserId) -> Result<Self, ValidationError> {
        if user == guest {
            return Err(ValidationError::invalid_format(
                "guest",
                "cannot be a guest of yourself",
            ));
        }
        Ok(Self {
            id: RecordId::new(),
            user,
            guest,
            time: Timestamp::now(),
        })
    }
}
