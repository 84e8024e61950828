//! Per-patient edit locks
//!
//! One writer per patient at a time. Locks are process-local, handed out as
//! RAII guards, and carry a timeout so an abandoned editing session cannot
//! hold a patient hostage: once the timeout elapses the next acquirer takes
//! the lock over.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::{IrisError, PatientId, Result};

struct Holder {
    token: u64,
    acquired_at: Instant,
}

/// Registry of live per-patient edit locks
pub struct EditLockRegistry {
    holders: Mutex<HashMap<u32, Holder>>,
    timeout: Duration,
    next_token: AtomicU64,
}

impl EditLockRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            holders: Mutex::new(HashMap::new()),
            timeout,
            next_token: AtomicU64::new(1),
        }
    }

    /// Acquires the edit lock for a patient.
    ///
    /// Returns `Conflict` while another live session holds it. A holder past
    /// the timeout is considered abandoned and taken over.
    pub fn acquire(self: &Arc<Self>, id: PatientId) -> Result<EditGuard> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut holders = self.holders();

        if let Some(current) = holders.get(&id.value()) {
            if current.acquired_at.elapsed() < self.timeout {
                return Err(IrisError::Conflict(format!(
                    "patient {id} is being edited by another session"
                )));
            }
            warn!(
                patient_id = id.value(),
                held_secs = current.acquired_at.elapsed().as_secs(),
                "Taking over expired edit lock"
            );
        }

        holders.insert(
            id.value(),
            Holder {
                token,
                acquired_at: Instant::now(),
            },
        );
        debug!(patient_id = id.value(), "Acquired edit lock");

        Ok(EditGuard {
            registry: Arc::clone(self),
            id,
            token,
        })
    }

    /// Whether a live (non-expired) lock is held for the patient
    pub fn is_locked(&self, id: PatientId) -> bool {
        self.holders()
            .get(&id.value())
            .is_some_and(|h| h.acquired_at.elapsed() < self.timeout)
    }

    /// Whether the guard still owns its patient's lock.
    ///
    /// False once another acquirer has taken the lock over; a writer must
    /// not commit under a guard that is no longer the current holder.
    pub fn holds(&self, guard: &EditGuard) -> bool {
        self.holders()
            .get(&guard.id.value())
            .is_some_and(|h| h.token == guard.token)
    }

    fn release(&self, id: PatientId, token: u64) {
        let mut holders = self.holders();
        // Only the guard that owns the current holder may release it; a
        // stale guard dropped after a takeover must not evict the new owner.
        if holders.get(&id.value()).is_some_and(|h| h.token == token) {
            holders.remove(&id.value());
            debug!(patient_id = id.value(), "Released edit lock");
        }
    }

    fn holders(&self) -> std::sync::MutexGuard<'_, HashMap<u32, Holder>> {
        self.holders.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// RAII edit lock; dropping it releases the patient
pub struct EditGuard {
    registry: Arc<EditLockRegistry>,
    id: PatientId,
    token: u64,
}

impl EditGuard {
    pub fn patient_id(&self) -> PatientId {
        self.id
    }
}

impl fmt::Debug for EditGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditGuard")
            .field("patient_id", &self.id)
            .finish()
    }
}

impl Drop for EditGuard {
    fn drop(&mut self) {
        self.registry.release(self.id, self.token);
    }
}
