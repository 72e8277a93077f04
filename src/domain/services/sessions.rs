#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::models::SessionState;

/// Sessions untouched for this long are dropped.
pub const SESSION_IDLE_LIMIT: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone, Debug)]
struct Entry {
    state: SessionState,
    last_seen: Instant,
}

/// In-memory session states keyed by the id in the browser's session cookie.
/// Nothing is persisted; a restart starts every browser afresh. Only states
/// holding something are stored, and idle ones are evicted on every save.
pub struct Sessions {
    states: DashMap<String, Entry>,
    idle_limit: Duration,
}

impl Default for Sessions {
    fn default() -> Sessions {
        return Sessions::new(SESSION_IDLE_LIMIT);
    }
}

impl Sessions {
    pub fn new(idle_limit: Duration) -> Sessions {
        return Sessions {
            states: DashMap::new(),
            idle_limit,
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4().simple().to_string();
    }

    fn is_idle(&self, entry: &Entry, now: Instant) -> bool {
        return now.saturating_duration_since(entry.last_seen) >= self.idle_limit;
    }

    /// Returns the state for `id`, or a fresh state under a new id when the
    /// cookie is missing, unknown or idle past the limit.
    pub fn load(&self, id: Option<&str>) -> (String, SessionState) {
        if let Some(id) = id {
            if let Some(entry) = self.states.get(id) {
                if !self.is_idle(&entry, Instant::now()) {
                    return (id.to_string(), entry.state.clone());
                }
            }
        }

        return (Sessions::create_id(), SessionState::default());
    }

    pub fn save(&self, id: &str, state: SessionState) {
        if state == SessionState::default() {
            self.states.remove(id);
        } else {
            self.states.insert(
                id.to_string(),
                Entry {
                    state,
                    last_seen: Instant::now(),
                },
            );
        }

        self.evict_idle(Instant::now());
    }

    /// Drops every session idle at `now`. Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.states.len();
        self.states.retain(|_, entry| return !self.is_idle(entry, now));
        let evicted = before.saturating_sub(self.states.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.states.len(), "evicted idle sessions");
        }

        return evicted;
    }

    pub fn len(&self) -> usize {
        return self.states.len();
    }
}
