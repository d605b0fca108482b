//! Process-wide map of user → hub.
//!
//! Check-and-create happens under a single lock with no await inside, so
//! concurrent first connections for the same user always end up sharing
//! one hub and one broker subscription. Idle eviction takes the same lock,
//! which means a connection can never attach to a hub that is being
//! evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::realtime::ChannelKey;
use crate::ports::Broker;

use super::hub::{Backoff, Hub, SubscriptionState};
use super::queue::OutboundQueue;

/// Settings shared by every hub the registry creates.
#[derive(Debug, Clone)]
pub struct HubSettings {
    /// Channel key namespace.
    pub namespace: String,
    /// How long `attach` waits for a new hub's first subscribe.
    pub ready_timeout: Duration,
    pub backoff: Backoff,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            namespace: "poputchiki".to_string(),
            ready_timeout: Duration::from_secs(2),
            backoff: Backoff::default(),
        }
    }
}

/// Owner of every live hub in this process.
pub struct HubRegistry {
    broker: Arc<dyn Broker>,
    settings: HubSettings,
    hubs: Mutex<HashMap<UserId, Arc<Hub>>>,
}

impl HubRegistry {
    pub fn new(broker: Arc<dyn Broker>, settings: HubSettings) -> Self {
        Self {
            broker,
            settings,
            hubs: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Arc<Hub>>> {
        self.hubs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_or_create(&self, hubs: &mut HashMap<UserId, Arc<Hub>>, user_id: &UserId) -> Arc<Hub> {
        hubs.entry(*user_id)
            .or_insert_with(|| {
                tracing::info!(user_id = %user_id, "Creating hub");
                Arc::new(Hub::spawn(
                    *user_id,
                    ChannelKey::realtime(&self.settings.namespace, user_id),
                    self.broker.clone(),
                    self.settings.backoff,
                ))
            })
            .clone()
    }

    /// Returns the user's hub, creating it (and its subscription) if absent.
    pub fn ensure(&self, user_id: &UserId) -> Arc<Hub> {
        let mut hubs = self.lock();
        self.get_or_create(&mut hubs, user_id)
    }

    /// Ensures the hub and registers `queue` on it in one atomic step, then
    /// waits for the hub's subscription to be established.
    ///
    /// If the subscription is not up within the ready timeout the queue
    /// stays registered; the hub keeps retrying in the background.
    pub async fn attach(
        &self,
        user_id: &UserId,
        connection_id: ConnectionId,
        queue: Arc<OutboundQueue>,
    ) -> Arc<Hub> {
        let hub = {
            let mut hubs = self.lock();
            let hub = self.get_or_create(&mut hubs, user_id);
            hub.register(connection_id, queue);
            hub
        };

        let state = hub.wait_ready(self.settings.ready_timeout).await;
        if state != SubscriptionState::Subscribed {
            tracing::warn!(
                user_id = %user_id,
                connection_id = %connection_id,
                state = ?state,
                "Attached before hub subscription was ready"
            );
        }
        hub
    }

    pub fn get(&self, user_id: &UserId) -> Option<Arc<Hub>> {
        self.lock().get(user_id).cloned()
    }

    /// Evicts a hub that has no connections. Returns false if the hub is
    /// absent or still in use.
    pub fn evict(&self, user_id: &UserId) -> bool {
        let mut hubs = self.lock();
        let idle = hubs
            .get(user_id)
            .map(|hub| hub.connection_count() == 0)
            .unwrap_or(false);

        if !idle {
            return false;
        }
        if let Some(hub) = hubs.remove(user_id) {
            hub.shutdown();
            tracing::info!(user_id = %user_id, "Hub evicted");
        }
        true
    }

    /// Evicts every hub that has been empty for at least `grace`.
    /// A zero grace disables eviction. Returns how many hubs were evicted.
    pub fn evict_idle(&self, grace: Duration) -> usize {
        if grace.is_zero() {
            return 0;
        }

        let mut hubs = self.lock();
        let before = hubs.len();
        hubs.retain(|user_id, hub| {
            let expired = hub.idle_for().map(|idle| idle >= grace).unwrap_or(false);
            if expired {
                hub.shutdown();
                tracing::info!(user_id = %user_id, "Idle hub evicted");
            }
            !expired
        });
        before - hubs.len()
    }

    pub fn hub_count(&self) -> usize {
        self.lock().len()
    }

    /// Starts a periodic idle sweep. The task ends when the registry is
    /// dropped. Returns `None` when eviction is disabled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        grace: Duration,
        interval: Duration,
    ) -> Option<JoinHandle<()>> {
        if grace.is_zero() || interval.is_zero() {
            return None;
        }

        let registry: Weak<Self> = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let evicted = registry.evict_idle(grace);
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = registry.hub_count(), "Hub sweep");
                }
            }
        }))
    }
}

impl Drop for HubRegistry {
    fn drop(&mut self) {
        for hub in self.lock().values() {
            hub.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::websocket::queue::OverflowPolicy;

    fn registry() -> (Arc<InMemoryBroker>, Arc<HubRegistry>) {
        let broker = Arc::new(InMemoryBroker::new());
        let settings = HubSettings {
            namespace: "test".to_string(),
            ready_timeout: Duration::from_secs(1),
            backoff: Backoff {
                initial: Duration::from_millis(10),
                max: Duration::from_millis(50),
            },
        };
        (broker.clone(), Arc::new(HubRegistry::new(broker, settings)))
    }

    fn queue() -> Arc<OutboundQueue> {
        Arc::new(OutboundQueue::new(10, OverflowPolicy::DropOldest))
    }

    #[tokio::test]
    async fn ensure_returns_same_hub() {
        let (_broker, registry) = registry();
        let user = UserId::new();

        let a = registry.ensure(&user);
        let b = registry.ensure(&user);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.hub_count(), 1);
    }

    #[tokio::test]
    async fn attach_registers_and_waits_for_subscription() {
        let (broker, registry) = registry();
        let user = UserId::new();

        let hub = registry.attach(&user, ConnectionId::new(), queue()).await;

        assert_eq!(hub.connection_count(), 1);
        assert_eq!(hub.subscription_state(), SubscriptionState::Subscribed);
        assert_eq!(
            broker.subscribe_count(&ChannelKey::realtime("test", &user)),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attach_creates_one_subscription() {
        let (broker, registry) = registry();
        let user = UserId::new();

        let attaches: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.attach(&user, ConnectionId::new(), queue()).await })
            })
            .collect();

        let mut hubs = Vec::new();
        for attach in attaches {
            hubs.push(attach.await.unwrap());
        }

        assert!(hubs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(hubs[0].connection_count(), 16);
        assert_eq!(
            broker.subscribe_count(&ChannelKey::realtime("test", &user)),
            1
        );
    }

    #[tokio::test]
    async fn evict_refuses_hub_with_connections() {
        let (_broker, registry) = registry();
        let user = UserId::new();
        let id = ConnectionId::new();
        let hub = registry.attach(&user, id, queue()).await;

        assert!(!registry.evict(&user));

        hub.unregister(&id);
        assert!(registry.evict(&user));
        assert!(registry.get(&user).is_none());
    }

    #[tokio::test]
    async fn evict_idle_respects_grace() {
        let (_broker, registry) = registry();
        let idle_user = UserId::new();
        let busy_user = UserId::new();
        registry.ensure(&idle_user);
        registry.attach(&busy_user, ConnectionId::new(), queue()).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(60)), 0);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(registry.evict_idle(Duration::from_millis(20)), 1);
        assert!(registry.get(&idle_user).is_none());
        assert!(registry.get(&busy_user).is_some());
    }

    #[tokio::test]
    async fn zero_grace_disables_eviction() {
        let (_broker, registry) = registry();
        registry.ensure(&UserId::new());

        assert_eq!(registry.evict_idle(Duration::ZERO), 0);
        assert!(registry.spawn_sweeper(Duration::ZERO, Duration::from_secs(1)).is_none());
        assert_eq!(registry.hub_count(), 1);
    }

    #[tokio::test]
    async fn evicted_hub_is_replaced_on_next_attach() {
        let (broker, registry) = registry();
        let user = UserId::new();
        let first = registry.ensure(&user);
        first.wait_ready(Duration::from_secs(1)).await;
        assert!(registry.evict(&user));

        let second = registry.attach(&user, ConnectionId::new(), queue()).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(
            broker.subscribe_count(&ChannelKey::realtime("test", &user)),
            2
        );
    }

    #[tokio::test]
    async fn sweeper_evicts_idle_hubs() {
        let (_broker, registry) = registry();
        registry.ensure(&UserId::new());

        let sweeper = registry
            .spawn_sweeper(Duration::from_millis(10), Duration::from_millis(10))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.hub_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        sweeper.abort();
    }
}
