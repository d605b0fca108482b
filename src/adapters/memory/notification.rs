//! In-memory collaborators of the notification policy.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, UpdateId, UserId};
use crate::domain::realtime::{EventEnvelope, OfflineUpdate, SubscriptionTopic};
use crate::ports::{OfflineUpdateStore, PresenceReader, SecondaryChannel, SubscriptionPreferences};

fn injected(what: &str) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("injected {} failure", what))
}

/// Online flags keyed by user.
#[derive(Debug, Default)]
pub struct InMemoryPresence {
    online: RwLock<HashSet<UserId>>,
    fail: AtomicBool,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, user_id: UserId, online: bool) {
        let mut users = self.online.write().expect("InMemoryPresence: lock poisoned");
        if online {
            users.insert(user_id);
        } else {
            users.remove(&user_id);
        }
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PresenceReader for InMemoryPresence {
    async fn is_online(&self, user_id: &UserId) -> Result<bool, DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected("presence"));
        }
        Ok(self
            .online
            .read()
            .expect("InMemoryPresence: lock poisoned")
            .contains(user_id))
    }
}

/// Offline updates kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryOfflineUpdateStore {
    records: RwLock<Vec<OfflineUpdate>>,
    fail_inserts: AtomicBool,
}

impl InMemoryOfflineUpdateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<OfflineUpdate> {
        self.records
            .read()
            .expect("InMemoryOfflineUpdateStore: lock poisoned")
            .clone()
    }

    pub fn count_for(&self, recipient: &UserId) -> usize {
        self.all()
            .iter()
            .filter(|record| &record.recipient == recipient)
            .count()
    }
}

#[async_trait]
impl OfflineUpdateStore for InMemoryOfflineUpdateStore {
    async fn insert(&self, update: &OfflineUpdate) -> Result<(), DomainError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected("offline update insert"));
        }
        self.records
            .write()
            .expect("InMemoryOfflineUpdateStore: lock poisoned")
            .push(update.clone());
        Ok(())
    }

    async fn get(&self, id: &UpdateId) -> Result<Option<OfflineUpdate>, DomainError> {
        Ok(self.all().into_iter().find(|record| &record.id == id))
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<OfflineUpdate>, DomainError> {
        let mut records: Vec<_> = self
            .all()
            .into_iter()
            .filter(|record| &record.recipient == recipient)
            .collect();
        // Stable sort keeps insertion order reversed for equal timestamps.
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn remove(&self, recipient: &UserId, id: &UpdateId) -> Result<bool, DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemoryOfflineUpdateStore: lock poisoned");
        let before = records.len();
        records.retain(|record| !(&record.id == id && &record.recipient == recipient));
        Ok(records.len() < before)
    }
}

/// Topic opt-ins keyed by user.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionPreferences {
    subscriptions: RwLock<HashSet<(UserId, SubscriptionTopic)>>,
    fail: AtomicBool,
}

impl InMemorySubscriptionPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, user_id: UserId, topic: SubscriptionTopic) {
        self.subscriptions
            .write()
            .expect("InMemorySubscriptionPreferences: lock poisoned")
            .insert((user_id, topic));
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionPreferences for InMemorySubscriptionPreferences {
    async fn is_subscribed(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
    ) -> Result<bool, DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected("subscription lookup"));
        }
        Ok(self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionPreferences: lock poisoned")
            .contains(&(*user_id, topic)))
    }
}

/// Captures secondary-channel pushes for assertions.
#[derive(Debug, Default)]
pub struct RecordingSecondaryChannel {
    pushed: RwLock<Vec<(UserId, SubscriptionTopic, EventEnvelope)>>,
    fail: AtomicBool,
}

impl RecordingSecondaryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn pushed(&self) -> Vec<(UserId, SubscriptionTopic, EventEnvelope)> {
        self.pushed
            .read()
            .expect("RecordingSecondaryChannel: lock poisoned")
            .clone()
    }
}

#[async_trait]
impl SecondaryChannel for RecordingSecondaryChannel {
    async fn push(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected("secondary channel"));
        }
        self.pushed
            .write()
            .expect("RecordingSecondaryChannel: lock poisoned")
            .push((*user_id, topic, envelope.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::realtime::EventKind;
    use serde_json::json;

    #[tokio::test]
    async fn presence_defaults_to_offline() {
        let presence = InMemoryPresence::new();
        let user = UserId::new();
        assert!(!presence.is_online(&user).await.unwrap());

        presence.set_online(user, true);
        assert!(presence.is_online(&user).await.unwrap());
    }

    #[tokio::test]
    async fn offline_store_lists_newest_first_and_removes_by_owner() {
        let store = InMemoryOfflineUpdateStore::new();
        let recipient = UserId::new();
        let origin = UserId::new();

        let first = OfflineUpdate::new(recipient, origin, EventKind::Message, json!({"n": 1}));
        let second = OfflineUpdate::new(recipient, origin, EventKind::Guest, json!({"n": 2}));
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let listed = store.list_for_recipient(&recipient).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        assert!(!store.remove(&origin, &first.id).await.unwrap());
        assert!(store.remove(&recipient, &first.id).await.unwrap());
        assert!(store.get(&first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscriptions_are_per_topic() {
        let prefs = InMemorySubscriptionPreferences::new();
        let user = UserId::new();
        prefs.subscribe(user, SubscriptionTopic::Messages);

        assert!(prefs.is_subscribed(&user, SubscriptionTopic::Messages).await.unwrap());
        assert!(!prefs.is_subscribed(&user, SubscriptionTopic::Guests).await.unwrap());
    }
}
