//! In-memory social stores.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::social::{GuestVisit, Message};
use crate::ports::{BlacklistReader, GuestRepository, MessageRepository};

#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Message> {
        self.messages
            .read()
            .expect("InMemoryMessageRepository: lock poisoned")
            .clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), DomainError> {
        self.messages
            .write()
            .expect("InMemoryMessageRepository: lock poisoned")
            .push(message.clone());
        Ok(())
    }
}

/// Keeps the latest visit per (user, guest) pair.
#[derive(Debug, Default)]
pub struct InMemoryGuestRepository {
    visits: RwLock<Vec<GuestVisit>>,
}

impl InMemoryGuestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits_of(&self, user: &UserId) -> Vec<GuestVisit> {
        self.visits
            .read()
            .expect("InMemoryGuestRepository: lock poisoned")
            .iter()
            .filter(|visit| &visit.user == user)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GuestRepository for InMemoryGuestRepository {
    async fn record_visit(&self, visit: &GuestVisit) -> Result<(), DomainError> {
        let mut visits = self
            .visits
            .write()
            .expect("InMemoryGuestRepository: lock poisoned");
        match visits
            .iter_mut()
            .find(|existing| existing.user == visit.user && existing.guest == visit.guest)
        {
            Some(existing) => existing.time = visit.time,
            None => visits.push(visit.clone()),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlacklist {
    entries: RwLock<HashSet<(UserId, UserId)>>,
}

impl InMemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// `owner` blacklists `other`.
    pub fn block(&self, owner: UserId, other: UserId) {
        self.entries
            .write()
            .expect("InMemoryBlacklist: lock poisoned")
            .insert((owner, other));
    }
}

#[async_trait]
impl BlacklistReader for InMemoryBlacklist {
    async fn is_blacklisted(&self, owner: &UserId, other: &UserId) -> Result<bool, DomainError> {
        Ok(self
            .entries
            .read()
            .expect("InMemoryBlacklist: lock poisoned")
            .contains(&(*owner, *other)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeat_visit_refreshes_time() {
        let repo = InMemoryGuestRepository::new();
        let (user, guest) = (UserId::new(), UserId::new());

        let first = GuestVisit::new(user, guest).unwrap();
        repo.record_visit(&first).await.unwrap();
        let second = GuestVisit::new(user, guest).unwrap();
        repo.record_visit(&second).await.unwrap();

        let visits = repo.visits_of(&user);
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].time, second.time);
    }

    #[tokio::test]
    async fn blacklist_is_directional() {
        let blacklist = InMemoryBlacklist::new();
        let (a, b) = (UserId::new(), UserId::new());
        blacklist.block(a, b);

        assert!(blacklist.is_blacklisted(&a, &b).await.unwrap());
        assert!(!blacklist.is_blacklisted(&b, &a).await.unwrap());
    }
}
