use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

enum State {
    InFlight,
    Done(Vec<i32>),
}

struct Record {
    state: State,
    expires_at: Instant,
}

/// Outcome of claiming an idempotency key.
#[derive(Debug, PartialEq, Eq)]
pub enum Claim {
    /// First time this key is seen; the caller must `complete` or `release` it.
    Fresh,
    /// A finished request already created these bookings.
    Replay(Vec<i32>),
}

/// Expiring map from (requester, client key) to the bookings a create produced.
///
/// Owned by the engine and passed in at construction, so separate instances
/// (and tests) never share hidden state.
pub struct IdempotencyStore {
    records: DashMap<(Uuid, String), Record>,
    ttl: Duration,
}

impl IdempotencyStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
        }
    }

    pub fn claim(&self, requester: Uuid, key: &str) -> AppResult<Claim> {
        self.purge_expired();

        let now = Instant::now();
        match self.records.entry((requester, key.to_string())) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    occupied.insert(Record {
                        state: State::InFlight,
                        expires_at: now + self.ttl,
                    });
                    return Ok(Claim::Fresh);
                }
                match &occupied.get().state {
                    State::InFlight => Err(AppError::DuplicateRequest(format!(
                        "A request with idempotency key '{}' is still being processed",
                        key
                    ))),
                    State::Done(ids) => Ok(Claim::Replay(ids.clone())),
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Record {
                    state: State::InFlight,
                    expires_at: now + self.ttl,
                });
                Ok(Claim::Fresh)
            }
        }
    }

    pub fn complete(&self, requester: Uuid, key: &str, booking_ids: Vec<i32>) {
        self.records.insert(
            (requester, key.to_string()),
            Record {
                state: State::Done(booking_ids),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Forget a key whose request failed so the client may retry it.
    pub fn release(&self, requester: Uuid, key: &str) {
        self.records.remove(&(requester, key.to_string()));
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.records.retain(|_, record| record.expires_at > now);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Holds a freshly claimed key while its request runs.
///
/// Dropping the guard without calling `complete` releases the key, so a
/// request abandoned mid-flight (client gone, handler cancelled) can be
/// retried at once instead of reporting `DuplicateRequest` until expiry.
pub struct ClaimGuard<'a> {
    store: &'a IdempotencyStore,
    requester: Uuid,
    key: String,
    armed: bool,
}

impl<'a> ClaimGuard<'a> {
    pub fn new(store: &'a IdempotencyStore, requester: Uuid, key: &str) -> Self {
        Self {
            store,
            requester,
            key: key.to_string(),
            armed: true,
        }
    }

    /// Record the bookings the request created; later claims replay them.
    pub fn complete(mut self, booking_ids: Vec<i32>) {
        self.store.complete(self.requester, &self.key, booking_ids);
        self.armed = false;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.release(self.requester, &self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_claim_is_fresh_and_second_is_in_flight() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let who = Uuid::new_v4();

        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Fresh);
        let err = store.claim(who, "k1").unwrap_err();
        assert!(matches!(err, AppError::DuplicateRequest(_)));
    }

    #[test]
    fn completed_key_replays_booking_ids() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let who = Uuid::new_v4();

        store.claim(who, "k1").unwrap();
        store.complete(who, "k1", vec![4, 5]);

        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Replay(vec![4, 5]));
    }

    #[test]
    fn keys_are_scoped_per_requester() {
        let store = IdempotencyStore::new(Duration::from_secs(60));

        store.claim(Uuid::new_v4(), "shared").unwrap();
        assert_eq!(store.claim(Uuid::new_v4(), "shared").unwrap(), Claim::Fresh);
    }

    #[test]
    fn released_key_can_be_claimed_again() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let who = Uuid::new_v4();

        store.claim(who, "k1").unwrap();
        store.release(who, "k1");

        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Fresh);
    }

    #[test]
    fn expired_records_are_dropped() {
        let store = IdempotencyStore::new(Duration::ZERO);
        let who = Uuid::new_v4();

        store.claim(who, "k1").unwrap();
        store.complete(who, "k1", vec![1]);
        store.purge_expired();

        assert!(store.is_empty());
        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Fresh);
    }

    #[test]
    fn dropped_guard_releases_the_key() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let who = Uuid::new_v4();

        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Fresh);
        drop(ClaimGuard::new(&store, who, "k1"));

        assert!(store.is_empty());
        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Fresh);
    }

    #[test]
    fn completed_guard_keeps_the_result() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let who = Uuid::new_v4();

        store.claim(who, "k1").unwrap();
        ClaimGuard::new(&store, who, "k1").complete(vec![7]);

        assert_eq!(store.claim(who, "k1").unwrap(), Claim::Replay(vec![7]));
    }
}
