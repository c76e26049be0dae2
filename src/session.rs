//! Browser session: one visitor's server-side key/value state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Length of a generated session id.
pub const SESSION_ID_LEN: usize = 32;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A session shared between the store and every request holding it.
///
/// All access to a given id goes through this one record, so a value set by
/// one request is seen by the next one that locks it.
pub type SharedSession = Arc<Mutex<Session>>;

/// Server-side state for one visitor.
#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    values: HashMap<String, Value>,
}

impl Session {
    /// A new, empty session with a freshly generated id.
    pub fn new() -> Self {
        Self::with_id(generate_id())
    }

    /// A new, empty session with the given id.
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: id.into(), created_at: now, last_activity_at: now, values: HashMap::new() }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn last_activity_at(&self) -> DateTime<Utc> { self.last_activity_at }

    /// Records activity now.
    pub fn touch(&mut self) {
        self.touch_at(Utc::now());
    }

    /// Records activity at `at`. Never moves the timestamp backwards.
    pub fn touch_at(&mut self, at: DateTime<Utc>) {
        self.last_activity_at = self.last_activity_at.max(at);
    }

    /// `true` when the last activity is older than `cutoff`.
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity_at < cutoff
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Reads a value back into a typed form. `None` when absent or when it does
    /// not deserialize as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.values.get(key)?.clone()).ok()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Stores any serializable value. Fails only when `value` cannot be
    /// represented as JSON.
    pub fn set_serialized<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }
}

impl Default for Session {
    fn default() -> Self { Self::new() }
}

/// Generates a random session id of [`SESSION_ID_LEN`] characters.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..SESSION_ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
