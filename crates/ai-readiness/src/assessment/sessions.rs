use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::submission::{Submission, SubmissionId};

/// How long finished submissions stay reachable, and how many are held at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRetention {
    pub finished_ttl: Duration,
    pub max_finished: usize,
}

impl Default for SessionRetention {
    fn default() -> Self {
        Self {
            finished_ttl: Duration::hours(6),
            max_finished: 256,
        }
    }
}

enum Slot {
    Idle {
        submission: Box<Submission>,
        finished_at: Option<DateTime<Utc>>,
    },
    InFlight,
}

/// In-flight submissions keyed by id. A submission is checked out while a request
/// works on it, so two requests never drive the same submission concurrently.
///
/// Submissions that reached a terminal state are evicted once they outlive
/// [`SessionRetention::finished_ttl`] or exceed [`SessionRetention::max_finished`],
/// oldest first. Unfinished and checked-out submissions are never evicted.
pub struct SubmissionSessions {
    slots: Mutex<HashMap<SubmissionId, Slot>>,
    retention: SessionRetention,
}

impl Default for SubmissionSessions {
    fn default() -> Self {
        Self::with_retention(SessionRetention::default())
    }
}

impl SubmissionSessions {
    pub fn with_retention(retention: SessionRetention) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn retention(&self) -> SessionRetention {
        self.retention
    }

    pub fn insert(&self, submission: Submission) {
        self.store(submission, None, Utc::now());
    }

    /// Clone of the current submission without checking it out.
    pub fn snapshot(&self, id: &SubmissionId) -> Result<Submission, SessionError> {
        let guard = self.lock();
        match guard.get(id) {
            Some(Slot::Idle { submission, .. }) => Ok(submission.as_ref().clone()),
            Some(Slot::InFlight) => Err(SessionError::Busy(id.clone())),
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    /// Take a submission out of the registry. It is checked back in when the
    /// returned guard drops, including while a panic unwinds.
    pub fn checkout(&self, id: &SubmissionId) -> Result<CheckedOut<'_>, SessionError> {
        let mut guard = self.lock();
        let Some(slot) = guard.get_mut(id) else {
            return Err(SessionError::NotFound(id.clone()));
        };
        match std::mem::replace(slot, Slot::InFlight) {
            Slot::Idle {
                submission,
                finished_at,
            } => Ok(CheckedOut {
                sessions: self,
                submission: Some(*submission),
                finished_at,
            }),
            Slot::InFlight => Err(SessionError::Busy(id.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubmissionId, Slot>> {
        // Check-in runs from `Drop`, so a poisoned lock must not turn into a second panic.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(
        &self,
        submission: Submission,
        finished_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        let finished_at = finished_at.or_else(|| submission.state.is_terminal().then_some(now));
        let mut guard = self.lock();
        guard.insert(
            submission.id.clone(),
            Slot::Idle {
                submission: Box::new(submission),
                finished_at,
            },
        );
        self.evict_finished(&mut guard, now);
    }

    fn evict_finished(&self, slots: &mut HashMap<SubmissionId, Slot>, now: DateTime<Utc>) {
        if let Some(cutoff) = now.checked_sub_signed(self.retention.finished_ttl) {
            slots.retain(|id, slot| match slot {
                Slot::Idle {
                    finished_at: Some(at),
                    ..
                } if *at < cutoff => {
                    debug!(submission_id = %id, "evicting expired finished submission");
                    false
                }
                _ => true,
            });
        }

        let mut finished: Vec<(DateTime<Utc>, SubmissionId)> = slots
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Idle {
                    finished_at: Some(at),
                    ..
                } => Some((*at, id.clone())),
                _ => None,
            })
            .collect();
        if finished.len() <= self.retention.max_finished {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.retention.max_finished;
        for (_, id) in finished.into_iter().take(excess) {
            debug!(submission_id = %id, "evicting finished submission over capacity");
            slots.remove(&id);
        }
    }
}

impl std::fmt::Debug for SubmissionSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionSessions")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

/// Exclusive handle on a checked-out submission.
pub struct CheckedOut<'a> {
    sessions: &'a SubmissionSessions,
    submission: Option<Submission>,
    finished_at: Option<DateTime<Utc>>,
}

impl Deref for CheckedOut<'_> {
    type Target = Submission;

    fn deref(&self) -> &Submission {
        self.submission
            .as_ref()
            .expect("checked-out submission is held until drop")
    }
}

impl DerefMut for CheckedOut<'_> {
    fn deref_mut(&mut self) -> &mut Submission {
        self.submission
            .as_mut()
            .expect("checked-out submission is held until drop")
    }
}

impl Drop for CheckedOut<'_> {
    fn drop(&mut self) {
        if let Some(submission) = self.submission.take() {
            self.sessions
                .store(submission, self.finished_at, Utc::now());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("submission {0} is being processed")]
    Busy(SubmissionId),
}
