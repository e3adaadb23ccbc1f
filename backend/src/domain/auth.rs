//! Authentication state hub.
//!
//! The identity provider lives outside this service. When it reports a
//! sign-in or sign-out, the change is published here and every subscriber is
//! called with the new state. Subscribing returns an [`AuthSubscription`]
//! handle; the callback stays registered until that handle is dropped or
//! explicitly unsubscribed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

use super::models::actor::Actor;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(Actor),
}

impl AuthState {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            AuthState::SignedIn(actor) => Some(actor),
            AuthState::SignedOut => None,
        }
    }
}

type Callback = Arc<dyn Fn(&AuthState) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    state: AuthState,
    next_id: u64,
    subscribers: BTreeMap<u64, Callback>,
}

#[derive(Clone, Default)]
pub struct AuthStateHub {
    inner: Arc<Mutex<HubInner>>,
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    // A panicking subscriber must not take the hub down with it
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AuthStateHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AuthState {
        lock(&self.inner).state.clone()
    }

    /// Register `callback` and immediately call it with the current state
    pub fn subscribe<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let (id, state) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.insert(id, callback.clone());
            (id, inner.state.clone())
        };
        debug!("Auth subscriber {} registered", id);

        callback(&state);

        AuthSubscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Record a new state and notify every live subscriber. Returns how many
    /// were called.
    pub fn publish(&self, state: AuthState) -> usize {
        let callbacks: Vec<Callback> = {
            let mut inner = lock(&self.inner);
            inner.state = state.clone();
            inner.subscribers.values().cloned().collect()
        };

        // Called outside the lock so a callback may subscribe or unsubscribe
        for callback in &callbacks {
            callback(&state);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// Keeps a callback registered with an [`AuthStateHub`]. Dropping it releases
/// the callback.
#[must_use = "the subscription ends as soon as the handle is dropped"]
pub struct AuthSubscription {
    id: u64,
    hub: Weak<Mutex<HubInner>>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            lock(&inner).subscribers.remove(&self.id);
            debug!("Auth subscriber {} released", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::actor::fixtures::{admin, clerk};

    fn recorder() -> (Arc<Mutex<Vec<AuthState>>>, impl Fn(&AuthState) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |state: &AuthState| sink.lock().unwrap().push(state.clone()))
    }

    #[test]
    fn test_new_subscriber_gets_current_state() {
        let hub = AuthStateHub::new();
        hub.publish(AuthState::SignedIn(clerk()));

        let (seen, callback) = recorder();
        let _subscription = hub.subscribe(callback);

        assert_eq!(*seen.lock().unwrap(), vec![AuthState::SignedIn(clerk())]);
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let hub = AuthStateHub::new();
        let (first, callback_a) = recorder();
        let (second, callback_b) = recorder();
        let _a = hub.subscribe(callback_a);
        let _b = hub.subscribe(callback_b);

        let notified = hub.publish(AuthState::SignedIn(admin()));

        assert_eq!(notified, 2);
        assert_eq!(first.lock().unwrap().last(), Some(&AuthState::SignedIn(admin())));
        assert_eq!(second.lock().unwrap().len(), 2);
        assert_eq!(hub.current().actor(), Some(&admin()));
    }

    #[test]
    fn test_dropped_subscription_stops_receiving() {
        let hub = AuthStateHub::new();
        let (seen, callback) = recorder();
        let subscription = hub.subscribe(callback);
        hub.publish(AuthState::SignedIn(clerk()));

        drop(subscription);
        let notified = hub.publish(AuthState::SignedOut);

        assert_eq!(notified, 0);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let hub = AuthStateHub::new();
        let (seen, callback) = recorder();
        let subscription = hub.subscribe(callback);

        subscription.unsubscribe();
        hub.publish(AuthState::SignedIn(clerk()));

        assert_eq!(*seen.lock().unwrap(), vec![AuthState::SignedOut]);
    }

    #[test]
    fn test_subscription_outliving_hub_is_harmless() {
        let (_seen, callback) = recorder();
        let subscription = {
            let hub = AuthStateHub::new();
            hub.subscribe(callback)
        };
        drop(subscription);
    }
}
