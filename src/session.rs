//! Session-scoped filter state and the light cache.
//!
//! Each session holds a pending/applied pair of filter specs. Edits touch
//! only the pending copy; committing deep-copies it into the applied slot
//! and invalidates the memoized filtered master. Derived tables are
//! recomputed from the cached filtered master on every read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::filter::{apply_filters, FilterSpec};
use crate::models::{AuditRecord, DeltaRow, PerformanceRow};

/// Normalize a URL for cross-table joins: trailing-slash-insensitive.
pub fn normalize_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Per-session filter state: Clean (memo valid) or Dirty (pending edits).
#[derive(Debug, Default)]
pub struct SessionState {
    pending: FilterSpec,
    applied: FilterSpec,
    dirty: bool,
    filtered_master: Option<Arc<Vec<AuditRecord>>>,
}

impl SessionState {
    /// Fresh session: both specs unrestricted, state Clean, so the first
    /// read shows the full dataset.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &FilterSpec {
        &self.pending
    }

    pub fn applied(&self) -> &FilterSpec {
        &self.applied
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the pending spec. Any actual change marks the session
    /// Dirty; the applied spec and the memo are untouched.
    pub fn update_pending(&mut self, spec: FilterSpec) {
        if spec != self.pending {
            self.pending = spec;
            self.dirty = true;
        }
    }

    /// Commit: snapshot pending into applied, drop the memoized result,
    /// reset the dirty flag.
    pub fn apply(&mut self) {
        self.applied = self.pending.clone();
        self.filtered_master = None;
        self.dirty = false;
    }

    /// Filtered master under the applied spec, memoized until the next
    /// commit.
    pub fn filtered_master(&mut self, master: &[AuditRecord]) -> Arc<Vec<AuditRecord>> {
        if let Some(cached) = &self.filtered_master {
            return Arc::clone(cached);
        }
        let result = Arc::new(apply_filters(master, &self.applied));
        self.filtered_master = Some(Arc::clone(&result));
        result
    }

    /// Performance rows restricted to URLs present in the filtered
    /// master. Not cached: derived from the memo on each call.
    pub fn filtered_performance(
        &mut self,
        master: &[AuditRecord],
        performance: &[PerformanceRow],
    ) -> Vec<PerformanceRow> {
        let filtered = self.filtered_master(master);
        restrict_by_url(performance, &filtered, |row| &row.url)
    }

    /// Delta rows restricted to URLs present in the filtered master.
    pub fn filtered_deltas(
        &mut self,
        master: &[AuditRecord],
        deltas: &[DeltaRow],
    ) -> Vec<DeltaRow> {
        let filtered = self.filtered_master(master);
        restrict_by_url(deltas, &filtered, |row| &row.url)
    }
}

fn restrict_by_url<T, F>(rows: &[T], master: &[AuditRecord], url_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if rows.is_empty() || master.is_empty() {
        return rows.to_vec();
    }
    let urls: HashSet<&str> = master.iter().map(|r| normalize_url(&r.url)).collect();
    rows.iter()
        .filter(|row| urls.contains(normalize_url(url_of(row))))
        .cloned()
        .collect()
}

/// All live sessions, keyed by session id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the session for `id`, creating it with defaults on
    /// first touch.
    pub async fn with_session<F, R>(&self, id: &str, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(id.to_string()).or_default();
        f(state)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
