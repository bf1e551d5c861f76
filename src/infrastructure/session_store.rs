// ============================================================
// SESSION STORE
// ============================================================
// In-memory analyses keyed by the browser session id

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::SalesAnalysis;

/// Lifecycle state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Loaded,
}

/// Point-in-time summary of a session, safe to hand to the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub generation: u64,
    pub source_name: Option<String>,
    pub row_count: Option<usize>,
    pub column_count: Option<usize>,
    pub loaded_at: Option<DateTime<Local>>,
}

struct SessionEntry {
    analysis: Option<Arc<SalesAnalysis>>,
    generation: u64,
    last_access: Instant,
    busy: Arc<AtomicBool>,
}

impl SessionEntry {
    fn new(now: Instant) -> Self {
        Self {
            analysis: None,
            generation: 0,
            last_access: now,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    fn snapshot(&self, id: &str) -> SessionSnapshot {
        let analysis = self.analysis.as_deref();
        SessionSnapshot {
            id: id.to_string(),
            state: if analysis.is_some() {
                SessionState::Loaded
            } else {
                SessionState::Empty
            },
            generation: self.generation,
            source_name: analysis.map(|a| a.source_name.clone()),
            row_count: analysis.map(|a| a.dataset.row_count()),
            column_count: analysis.map(|a| a.dataset.column_count()),
            loaded_at: analysis.map(|a| a.analyzed_at),
        }
    }
}

/// Exclusive right to mutate one session; released on drop
#[derive(Debug)]
pub struct SessionGuard {
    id: String,
    busy: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Session registry with inactivity expiry
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new empty session and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.write().insert(id.clone(), SessionEntry::new(Instant::now()));
        debug!(session = %id, "Created session");
        id
    }

    /// Reuse the given session when it is still alive, otherwise create one.
    /// The flag is `true` when a new session was created.
    pub fn resolve(&self, id: Option<&str>) -> (String, bool) {
        match id {
            Some(id) if self.contains(id) => (id.to_string(), false),
            _ => (self.create(), true),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Loaded analysis of a session; refreshes its last access time
    pub fn loaded(&self, id: &str) -> Result<Arc<SalesAnalysis>> {
        let mut sessions = self.write();
        let entry = sessions.get_mut(id).ok_or_else(AppError::no_data)?;
        entry.last_access = Instant::now();
        entry.analysis.clone().ok_or_else(AppError::no_data)
    }

    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        self.read().get(id).map(|entry| entry.snapshot(id))
    }

    /// Take the per-session mutation guard.
    ///
    /// Fails with `SessionBusy` while another guard for the session is alive.
    pub fn acquire(&self, id: &str) -> Result<SessionGuard> {
        let sessions = self.read();
        let entry = sessions
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown session '{}'", id)))?;

        entry
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                AppError::SessionBusy("Another operation is running for this session".to_string())
            })?;

        Ok(SessionGuard {
            id: id.to_string(),
            busy: entry.busy.clone(),
        })
    }

    /// Replace the session's analysis as a whole; returns the new generation
    pub fn load(&self, guard: &SessionGuard, analysis: SalesAnalysis) -> Result<u64> {
        let mut sessions = self.write();
        let entry = sessions
            .get_mut(&guard.id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown session '{}'", guard.id)))?;

        entry.analysis = Some(Arc::new(analysis));
        entry.generation += 1;
        entry.last_access = Instant::now();

        info!(session = %guard.id, generation = entry.generation, "Session loaded");
        Ok(entry.generation)
    }

    /// Drop the session's analysis, back to `Empty`
    pub fn clear(&self, guard: &SessionGuard) -> Result<()> {
        let mut sessions = self.write();
        let entry = sessions
            .get_mut(&guard.id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown session '{}'", guard.id)))?;

        entry.analysis = None;
        entry.last_access = Instant::now();

        info!(session = %guard.id, "Session cleared");
        Ok(())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// Remove sessions idle for longer than the TTL as of `now`.
    /// Busy sessions are kept.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();

        sessions.retain(|_, entry| {
            entry.busy.load(Ordering::Acquire)
                || now.saturating_duration_since(entry.last_access) < self.ttl
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Swept expired sessions");
        }
        removed
    }
}
