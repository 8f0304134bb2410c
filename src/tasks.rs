//! Optimistic task-collection synchronization.
//!
//! The [`TaskSynchronizer`] owns the in-memory task collection and keeps it
//! consistent with the remote API using confirm-before-apply semantics:
//! local state changes only after a successful response, using the
//! server's returned record verbatim (the response is authoritative for
//! every field, not just the one that was edited).
//!
//! ## Design
//! - Call guard: without a credential every operation is a silent no-op —
//!   no network call is attempted.
//! - Validation failures (empty titles) are rejected locally before any
//!   network call, also as silent no-ops.
//! - Every remote result passes through one settle point: authorization
//!   rejections go to `SessionManager::expire` and are never surfaced as
//!   per-operation errors; any other failure propagates with the
//!   collection left in its last-known-good state.
//! - Operations may overlap; each completion applies one atomic mutation
//!   under the lock. Overlapping edits to the same id are not serialized:
//!   the last-applied response wins.

use crate::error::ApiError;
use crate::remote::{ApiClient, Task, TaskPatch};
use crate::session::SessionManager;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Read-only projection over the current collection, recomputed on every
/// observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
}

/// Keeps the local task collection in sync with the remote API.
pub struct TaskSynchronizer {
    api: ApiClient,
    session: Arc<SessionManager>,
    tasks: Mutex<Vec<Task>>,
}

impl TaskSynchronizer {
    /// Create a synchronizer bound to a session. The collection starts
    /// empty until the first [`load_all`](Self::load_all).
    pub fn new(api: ApiClient, session: Arc<SessionManager>) -> Self {
        Self {
            api,
            session,
            tasks: Mutex::new(Vec::new()),
        }
    }

    // ── Operations ───────────────────────────────────────────

    /// Fetch the full collection and replace the local copy wholesale,
    /// preserving the server's order.
    pub async fn load_all(&self) -> Result<()> {
        let Some(token) = self.session.credential() else {
            return Ok(());
        };
        if let Some(tasks) = self.settle(self.api.list_tasks(&token).await)? {
            *self.tasks.lock() = tasks;
        }
        Ok(())
    }

    /// Create a task. Empty or whitespace-only titles are rejected locally
    /// without a network call. On success the server's task (with its
    /// assigned id) is appended.
    pub async fn create(&self, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Ok(());
        }
        let Some(token) = self.session.credential() else {
            return Ok(());
        };
        if let Some(task) = self.settle(self.api.create_task(&token, title).await)? {
            self.tasks.lock().push(task);
        }
        Ok(())
    }

    /// Flip a task's completion flag. Unknown ids are a no-op. The update
    /// request carries the inverted value of the *current local* flag; on
    /// success the server's full record replaces the local one.
    pub async fn toggle_completion(&self, id: &str) -> Result<()> {
        let Some(token) = self.session.credential() else {
            return Ok(());
        };
        let Some(current) = self.find_completed(id) else {
            return Ok(());
        };

        let patch = TaskPatch {
            completed: Some(!current),
            ..TaskPatch::default()
        };
        if let Some(updated) = self.settle(self.api.update_task(&token, id, &patch).await)? {
            self.replace(updated);
        }
        Ok(())
    }

    /// Rename a task. Same empty-title guard as [`create`](Self::create),
    /// same confirm-before-apply replace as
    /// [`toggle_completion`](Self::toggle_completion).
    pub async fn rename(&self, id: &str, new_title: &str) -> Result<()> {
        if new_title.trim().is_empty() {
            return Ok(());
        }
        let Some(token) = self.session.credential() else {
            return Ok(());
        };
        if !self.contains(id) {
            return Ok(());
        }

        let patch = TaskPatch {
            title: Some(new_title.to_string()),
            ..TaskPatch::default()
        };
        if let Some(updated) = self.settle(self.api.update_task(&token, id, &patch).await)? {
            self.replace(updated);
        }
        Ok(())
    }

    /// Delete a task. The local entry is removed only after the server
    /// confirms; an authorization rejection leaves it in place.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let Some(token) = self.session.credential() else {
            return Ok(());
        };
        if self.settle(self.api.delete_task(&token, id).await)?.is_some() {
            self.tasks.lock().retain(|t| t.id != id);
        }
        Ok(())
    }

    // ── Projections ──────────────────────────────────────────

    /// Copy of the current collection, in order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    /// Counts derived from the current collection.
    pub fn stats(&self) -> TaskStats {
        let tasks = self.tasks.lock();
        let completed = tasks.iter().filter(|t| t.completed).count();
        TaskStats {
            total: tasks.len(),
            completed,
            incomplete: tasks.len() - completed,
        }
    }

    // ── Internals ────────────────────────────────────────────

    /// Single dispatch point for remote results: success passes through,
    /// an authorization rejection expires the session (and resolves the
    /// operation without an error), anything else propagates untouched.
    fn settle<T>(&self, result: Result<T, ApiError>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::Unauthorized) => {
                tracing::debug!("remote call rejected the credential");
                self.session.expire();
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the local record with the server's authoritative copy. If
    /// the id vanished locally in the meantime (deleted by an overlapping
    /// operation), the response is dropped.
    fn replace(&self, updated: Task) {
        let mut tasks = self.tasks.lock();
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == updated.id) {
            *slot = updated;
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.tasks.lock().iter().any(|t| t.id == id)
    }

    fn find_completed(&self, id: &str) -> Option<bool> {
        self.tasks
            .lock()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.completed)
    }
}

// ── Tests ────────────────────────────────────────────────────────
