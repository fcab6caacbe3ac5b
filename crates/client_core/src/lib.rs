//! Client core for the assignment-submission product: the submission
//! lifecycle controller plus the repository and payload codec it drives.
//!
//! Rendering, routing, and credential acquisition live outside this crate;
//! they reach in through the [`AuthHeaderProvider`] and
//! [`ConfirmationPrompt`] seams, and observe the controller through its
//! [`LifecycleState`] snapshot.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Assignment, AssignmentId, ResultRecord, SubmissionId, UserId},
    error::{AuthFailure, LogicError},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

pub mod repository;
pub mod results;

pub use repository::{HttpSubmissionRepository, SubmissionApi};
pub use results::decode_results;

const DELETE_CONFIRM_MESSAGE: &str = "Are you sure you want to delete this submission?";

/// Produces the headers that authenticate a request. May suspend (e.g.
/// refreshing a token). Credentials themselves are none of this crate's
/// business.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync {
    async fn headers(&self) -> Result<HashMap<String, String>, AuthFailure>;
}

/// Null provider wired in when no auth backend is configured; every
/// request fails before it leaves the client.
pub struct MissingAuthHeaderProvider;

#[async_trait]
impl AuthHeaderProvider for MissingAuthHeaderProvider {
    async fn headers(&self) -> Result<HashMap<String, String>, AuthFailure> {
        Err(AuthFailure("no auth header provider configured".to_string()))
    }
}

/// Asks the user a yes/no question before a destructive action. Platform
/// front ends supply their own implementation (browser dialog, native
/// alert); the prompt may suspend indefinitely waiting on a human and the
/// controller never times it out.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Null prompt that declines everything, so a misconfigured front end can
/// never delete data.
pub struct MissingConfirmationPrompt;

#[async_trait]
impl ConfirmationPrompt for MissingConfirmationPrompt {
    async fn confirm(&self, _message: &str) -> bool {
        false
    }
}

/// The controller's single authoritative view of submission/grading
/// progress for one (user, assignment) pair. Always rebuilt from the
/// latest server response, never hand-patched.
///
/// `Processing` means a submission exists but its payload did not decode:
/// grading is still in progress. `Error` means an operation failed. The
/// two are never conflated.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleState {
    Unselected,
    Loading,
    AwaitingUpload,
    Processing {
        submission_id: SubmissionId,
    },
    Completed {
        submission_id: SubmissionId,
        record: ResultRecord,
    },
    Deleting {
        submission_id: SubmissionId,
    },
    Error {
        message: String,
    },
}

impl LifecycleState {
    /// The submission id this state is about, if it carries one.
    pub fn submission_id(&self) -> Option<SubmissionId> {
        match self {
            LifecycleState::Processing { submission_id }
            | LifecycleState::Completed { submission_id, .. }
            | LifecycleState::Deleting { submission_id } => Some(*submission_id),
            _ => None,
        }
    }
}

struct ControllerInner {
    /// Monotonic token of the most recently started operation. A network
    /// response belonging to an older token is discarded without mutating
    /// state, so a slow refresh can never clobber a newer one.
    latest_token: u64,
}

/// Orchestrates the submission lifecycle for one (user, assignment) pair:
/// refreshes from the server, coordinates confirmed deletion, and owns the
/// [`LifecycleState`] snapshot the presentation layer renders from.
pub struct SubmissionController {
    repository: Arc<dyn SubmissionApi>,
    prompt: Arc<dyn ConfirmationPrompt>,
    inner: Mutex<ControllerInner>,
    state_tx: watch::Sender<LifecycleState>,
}

impl SubmissionController {
    pub fn new(
        repository: Arc<dyn SubmissionApi>,
        prompt: Arc<dyn ConfirmationPrompt>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(LifecycleState::Unselected);
        Arc::new(Self {
            repository,
            prompt,
            inner: Mutex::new(ControllerInner { latest_token: 0 }),
            state_tx,
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> LifecycleState {
        self.state_tx.borrow().clone()
    }

    /// Watches state changes; the receiver always observes the latest
    /// value.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    async fn next_token(&self) -> u64 {
        let mut guard = self.inner.lock().await;
        guard.latest_token += 1;
        guard.latest_token
    }

    /// Publishes `state` only if `token` is still the newest operation.
    /// Returns whether the publication took effect.
    async fn publish(&self, token: u64, state: LifecycleState) -> bool {
        let guard = self.inner.lock().await;
        if guard.latest_token != token {
            debug!(token, latest = guard.latest_token, "discarding stale state publication");
            return false;
        }
        self.state_tx.send_replace(state);
        true
    }

    /// Resynchronizes state from the server for one (user, assignment)
    /// pair. With either half of the pair absent the state is
    /// `Unselected` and no network call is made. Supersedes any in-flight
    /// operation. Returns the state as of this call's completion.
    pub async fn refresh(
        &self,
        user_id: Option<UserId>,
        assignment: Option<&Assignment>,
    ) -> LifecycleState {
        let token = self.next_token().await;
        let (user_id, assignment_id) = match (user_id, assignment) {
            (Some(user_id), Some(assignment)) => (user_id, assignment.assignment_id),
            _ => {
                self.publish(token, LifecycleState::Unselected).await;
                return self.state();
            }
        };

        self.publish(token, LifecycleState::Loading).await;
        let next = self.fetch_state(user_id, assignment_id).await;
        self.publish(token, next).await;
        self.state()
    }

    /// Deletes the currently known submission after user confirmation.
    ///
    /// Preconditions: the current state must carry exactly
    /// `submission_id`; anything else is a contract violation reported as
    /// a [`LogicError`] with zero network calls and no state change. A
    /// declined confirmation is likewise a complete no-op.
    ///
    /// After a confirmed delete, whatever its outcome, the controller
    /// re-fetches the list so state always comes back from the server: a
    /// delete failure surfaces as `Error` but the resynchronizing fetch
    /// still runs, so a stale `Deleting` spinner never persists.
    pub async fn request_delete(
        &self,
        user_id: UserId,
        assignment: &Assignment,
        submission_id: SubmissionId,
    ) -> Result<(), LogicError> {
        match self.state().submission_id() {
            Some(known) if known == submission_id => {}
            known => {
                let err = LogicError(format!(
                    "delete requested for submission {} but the known submission is {:?}",
                    submission_id.0,
                    known.map(|id| id.0),
                ));
                error!("{err}");
                return Err(err);
            }
        }

        if !self.prompt.confirm(DELETE_CONFIRM_MESSAGE).await {
            debug!(submission_id = submission_id.0, "submission delete declined");
            return Ok(());
        }

        // The whole delete + resync sequence runs under one token; any
        // operation started after this point invalidates both of its
        // remaining publications.
        let token = self.next_token().await;
        self.publish(token, LifecycleState::Deleting { submission_id })
            .await;

        match self.repository.delete_submission(submission_id).await {
            Ok(()) => {
                info!(submission_id = submission_id.0, "submission deleted");
            }
            Err(err) => {
                warn!(
                    submission_id = submission_id.0,
                    "submission delete failed: {err}"
                );
                self.publish(
                    token,
                    LifecycleState::Error {
                        message: err.to_string(),
                    },
                )
                .await;
            }
        }

        let next = self.fetch_state(user_id, assignment.assignment_id).await;
        self.publish(token, next).await;
        Ok(())
    }

    /// Maps one `list_submissions` round trip onto a lifecycle state.
    async fn fetch_state(&self, user_id: UserId, assignment_id: AssignmentId) -> LifecycleState {
        let submissions = match self.repository.list_submissions(user_id, assignment_id).await {
            Ok(submissions) => submissions,
            Err(err) => {
                warn!(
                    user_id = user_id.0,
                    assignment_id = assignment_id.0,
                    "failed to fetch submissions: {err}"
                );
                return LifecycleState::Error {
                    message: err.to_string(),
                };
            }
        };

        let Some(submission) = submissions.first() else {
            return LifecycleState::AwaitingUpload;
        };
        if submissions.len() > 1 {
            // The server contract does not promise at most one row per
            // (user, assignment); the first row is treated as canonical.
            warn!(
                user_id = user_id.0,
                assignment_id = assignment_id.0,
                count = submissions.len(),
                "server returned multiple submissions; taking the first"
            );
        }

        match results::decode_results(submission.results.as_deref()) {
            Ok(record) => LifecycleState::Completed {
                submission_id: submission.submission_id,
                record,
            },
            Err(_) => LifecycleState::Processing {
                submission_id: submission.submission_id,
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
