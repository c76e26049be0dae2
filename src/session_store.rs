//! In-memory session store with inactivity expiry.
//!
//! Maps session ids (carried in a cookie) to [`SharedSession`] records. The map
//! is a [`DashMap`], so concurrent requests only contend on the shard holding
//! their id. Each session sits behind its own mutex, which serializes value
//! updates from concurrent requests of the same visitor.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, trace};

use crate::session::{SESSION_ID_LEN, Session, SharedSession, generate_id};

/// Default inactivity timeout: 15 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// Thread-safe registry of browser sessions.
///
/// Do not call into the store while holding a session's lock: the store locks
/// sessions itself and the two locks must always be taken store-first.
pub struct SessionStore {
    sessions: DashMap<String, SharedSession>,
    timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self { sessions: DashMap::new(), timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns the session for `id`. Never creates one.
    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the session for `id`, creating and storing an empty one if
    /// there is none. Creation is atomic: two racing callers get the same record.
    pub fn get_or_create(&self, id: &str) -> SharedSession {
        let entry = self
            .sessions
            .entry(id.to_owned())
            .or_insert_with(|| Session::with_id(id).into_shared());
        Arc::clone(entry.value())
    }

    /// Creates an empty session for `id`, replacing any previous entry.
    pub fn create(&self, id: &str) -> SharedSession {
        let session = Session::with_id(id).into_shared();
        self.sessions.insert(id.to_owned(), Arc::clone(&session));
        session
    }

    /// Stores `session` under its own id.
    ///
    /// An existing record for that id is overwritten in place, so requests
    /// already holding it observe the new contents. Its last activity never
    /// moves backwards.
    pub fn set(&self, session: Session) -> SharedSession {
        match self.sessions.entry(session.id().to_owned()) {
            Entry::Occupied(entry) => {
                let shared = Arc::clone(entry.get());
                {
                    let mut live = shared.lock();
                    let last_activity = live.last_activity_at();
                    *live = session;
                    live.touch_at(last_activity);
                }
                shared
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(session.into_shared()).value()),
        }
    }

    /// `true` when an entry keyed by `id` exists and its record carries that id.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some_and(|session| session.lock().id() == id)
    }

    /// Removes every entry whose record carries `id`, whatever key it is
    /// stored under. Returns how many were removed.
    pub fn drop(&self, id: &str) -> usize {
        let snapshot: Vec<(String, SharedSession)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        snapshot
            .into_iter()
            .filter(|(_, session)| session.lock().id() == id)
            .filter(|(key, session)| {
                self.sessions
                    .remove_if(key, |_, current| Arc::ptr_eq(current, session))
                    .is_some()
            })
            .count()
    }

    /// Looks up the session named by a request's cookie, or mints a new one.
    ///
    /// A missing id, one shorter than [`SESSION_ID_LEN`], or one the store does
    /// not know gets a fresh session under a new random id. Either way the
    /// returned session's activity is refreshed.
    pub fn acquire(&self, presented: Option<&str>) -> SharedSession {
        let now = Utc::now();

        if let Some(id) = presented.filter(|id| id.len() >= SESSION_ID_LEN) {
            // The shard guard stays alive while touching so a concurrent sweep
            // cannot remove the session between lookup and refresh.
            if let Some(entry) = self.sessions.get(id) {
                entry.value().lock().touch_at(now);
                trace!(session = id, "session resumed");
                return Arc::clone(entry.value());
            }
        }

        loop {
            let id = generate_id();
            if let Entry::Vacant(entry) = self.sessions.entry(id) {
                let session = Session::with_id(entry.key().clone()).into_shared();
                debug!(session = entry.key().as_str(), "session created");
                return Arc::clone(entry.insert(session).value());
            }
        }
    }

    /// Removes every session idle for longer than the timeout.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Like [`SessionStore::sweep`], measuring idleness against `now`.
    ///
    /// A session whose lock is currently held is in use by a request and is
    /// always kept.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let timeout = TimeDelta::from_std(self.timeout).unwrap_or(TimeDelta::MAX);
        let cutoff = now.checked_sub_signed(timeout).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Some(s) => !s.is_idle_since(cutoff),
            None => true,
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "expired sessions swept");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const ID: &str = "EIMA5VQOU4980S35AYPAEKYABL73GZBA";

    #[test]
    fn get_does_not_create() {
        let store = SessionStore::default();
        assert!(store.get(ID).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn get_or_create_returns_the_same_record() {
        let store = SessionStore::default();
        let a = store.get_or_create(ID);
        a.lock().set("k", 1);
        let b = store.get_or_create(ID);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.lock().get_as::<i32>("k"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_overwrites() {
        let store = SessionStore::default();
        store.get_or_create(ID).lock().set("k", 1);
        let fresh = store.create(ID);
        assert!(fresh.lock().is_empty());
        assert!(store.get(ID).unwrap().lock().is_empty());
    }

    #[test]
    fn set_replaces_contents_in_place() {
        let store = SessionStore::default();
        let held = store.get_or_create(ID);

        let mut replacement = Session::with_id(ID);
        replacement.set("fresh", true);
        store.set(replacement);

        assert_eq!(held.lock().get_as::<bool>("fresh"), Some(true));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_keeps_the_later_activity_time() {
        let store = SessionStore::default();
        let held = store.get_or_create(ID);
        let later = Utc::now() + TimeDelta::minutes(10);
        held.lock().touch_at(later);

        store.set(Session::with_id(ID));
        assert_eq!(held.lock().last_activity_at(), later);

        let mut newer = Session::with_id(ID);
        newer.touch_at(later + TimeDelta::minutes(5));
        store.set(newer);
        assert_eq!(held.lock().last_activity_at(), later + TimeDelta::minutes(5));
    }

    #[test]
    fn contains_checks_the_stored_id() {
        let store = SessionStore::default();
        assert!(!store.contains(ID));
        store.get_or_create(ID);
        assert!(store.contains(ID));

        // A record filed under the wrong key does not count.
        store.sessions.insert("stale-key".to_owned(), Session::with_id(ID).into_shared());
        assert!(!store.contains("stale-key"));
    }

    #[test]
    fn drop_removes_every_record_with_the_id() {
        let store = SessionStore::default();
        store.get_or_create(ID);
        store.get_or_create("OTHERSESSION0000000000000000000X");
        store.sessions.insert("duplicate".to_owned(), Session::with_id(ID).into_shared());

        assert_eq!(store.drop(ID), 2);
        assert!(!store.contains(ID));
        assert_eq!(store.len(), 1);
        assert_eq!(store.drop(ID), 0);
    }

    #[test]
    fn acquire_mints_for_missing_short_or_unknown_ids() {
        let store = SessionStore::default();

        for presented in [None, Some("short"), Some(ID)] {
            let session = store.acquire(presented);
            let id = session.lock().id().to_owned();
            assert_eq!(id.len(), SESSION_ID_LEN);
            assert_ne!(Some(id.as_str()), presented);
            assert!(store.contains(&id));
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn acquire_resumes_and_refreshes_known_ids() {
        let store = SessionStore::default();
        let first = store.acquire(None);
        let id = first.lock().id().to_owned();
        let seen = first.lock().last_activity_at();

        let again = store.acquire(Some(&id));
        assert!(Arc::ptr_eq(&first, &again));
        assert!(again.lock().last_activity_at() >= seen);
    }

    #[test]
    fn sweep_removes_only_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(900));
        let now = Utc::now();

        let idle = store.get_or_create("IDLE0000000000000000000000000000");
        let active = store.get_or_create("ACTIVE00000000000000000000000000");
        active.lock().touch_at(now + TimeDelta::minutes(20));

        assert_eq!(store.sweep_at(now + TimeDelta::minutes(16)), 1);
        assert!(!store.contains(idle.lock().id()));
        assert!(store.contains("ACTIVE00000000000000000000000000"));

        assert_eq!(store.sweep(), 0);
    }

    #[test]
    fn sweep_keeps_sessions_in_use() {
        let store = SessionStore::new(Duration::from_secs(1));
        let session = store.get_or_create(ID);
        let guard = session.lock();
        assert_eq!(store.sweep_at(Utc::now() + TimeDelta::hours(1)), 0);
        drop(guard);
        assert_eq!(store.sweep_at(Utc::now() + TimeDelta::hours(1)), 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = Arc::new(SessionStore::default());
        let id = store.acquire(None).lock().id().to_owned();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let session = store.acquire(Some(&id));
                        let mut s = session.lock();
                        let n = s.get_as::<u64>("count").unwrap_or(0);
                        s.set("count", n + 1);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let count = store.get(&id).unwrap().lock().get_as::<u64>("count");
        assert_eq!(count, Some(800));
    }
}
