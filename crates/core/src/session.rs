//! Session tracking and sessionization.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::limits::SESSION_TIMEOUT_SECS;

/// Sessions are scoped per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub tenant_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(tenant_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// A run of events for one session key.
///
/// `start_time` and `last_activity` are event time. `touched_at` is server
/// time of the last update and only drives idle eviction.
///
/// Invariant: `last_activity >= start_time`, `event_count >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub event_count: u64,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    /// Starts a session anchored at event time `at`, observed at `now`.
    pub fn start(at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start_time: at,
            last_activity: at,
            event_count: 1,
            touched_at: now,
        }
    }

    /// Time from session start to `at`.
    pub fn elapsed_at(&self, at: DateTime<Utc>) -> Duration {
        at - self.start_time
    }

    fn record(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
        if now > self.touched_at {
            self.touched_at = now;
        }
        self.event_count += 1;
    }
}

/// Session fields reported for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUpdate {
    pub session_start: DateTime<Utc>,
    pub duration_seconds: i64,
    pub event_count: u64,
    /// True when this event opened a new session.
    pub started: bool,
}

/// Keyed session state.
///
/// Each `observe` runs under one lock, so updates for the same key are
/// never interleaved. Callers must feed events for a key in non-decreasing
/// timestamp order for durations to be meaningful.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, Session>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Applies an event at `at` to the session for `key`, processed at `now`.
    ///
    /// A session reaching the timeout (measured from its start) is replaced
    /// by a fresh one anchored at this event. Session fields depend on `at`
    /// only; `now` is recorded for eviction.
    pub fn observe(&self, key: &SessionKey, at: DateTime<Utc>, now: DateTime<Utc>) -> SessionUpdate {
        let mut sessions = self.sessions.lock();

        let Some(session) = sessions.get_mut(key) else {
            let session = Session::start(at, now);
            sessions.insert(key.clone(), session);
            return SessionUpdate {
                session_start: at,
                duration_seconds: 0,
                event_count: 1,
                started: true,
            };
        };

        let elapsed = session.elapsed_at(at);
        if elapsed >= self.timeout {
            *session = Session::start(at, now);
            return SessionUpdate {
                session_start: at,
                duration_seconds: 0,
                event_count: 1,
                started: true,
            };
        }

        session.record(at, now);
        SessionUpdate {
            session_start: session.start_time,
            duration_seconds: elapsed.num_seconds().max(0),
            event_count: session.event_count,
            started: false,
        }
    }

    pub fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.lock().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Drops sessions not updated for longer than the timeout, measured in
    /// server time. Returns how many.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        let timeout = self.timeout;

        sessions.retain(|_, session| now - session.touched_at <= timeout);
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(SESSION_TIMEOUT_SECS))
    }
}
