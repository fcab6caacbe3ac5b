use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        Assignment, AssignmentId, Classroom, ClassroomId, CombinedSubmission, Submission,
        SubmissionId, UserId,
    },
    error::NetworkFailure,
    protocol::ApiEnvelope,
};
use tracing::debug;

use crate::AuthHeaderProvider;

/// Object-safe seam over the assignment-submission API. Implemented by
/// [`HttpSubmissionRepository`] and by test doubles.
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    /// Lists the caller's submissions for one assignment. An empty list is
    /// success: the user simply has not submitted.
    async fn list_submissions(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Vec<Submission>, NetworkFailure>;

    /// Deletes one submission. The server does not guarantee idempotency;
    /// deleting an already-deleted id fails with a `NetworkFailure`.
    async fn delete_submission(&self, submission_id: SubmissionId)
        -> Result<(), NetworkFailure>;

    /// Classrooms the user is enrolled in.
    async fn list_classrooms(&self, user_id: UserId) -> Result<Vec<Classroom>, NetworkFailure>;

    /// Assignments belonging to one classroom.
    async fn list_assignments(
        &self,
        classroom_id: ClassroomId,
    ) -> Result<Vec<Assignment>, NetworkFailure>;

    /// Admin roster: every submission joined with its owner and score.
    async fn list_all_submissions(&self) -> Result<Vec<CombinedSubmission>, NetworkFailure>;
}

/// HTTP repository over the grading server. Injects headers from the
/// supplied [`AuthHeaderProvider`] per request; holds no credentials of
/// its own and never retries. Timeout policy belongs to the transport.
pub struct HttpSubmissionRepository {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthHeaderProvider>,
}

impl HttpSubmissionRepository {
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthHeaderProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }

    async fn authed(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, NetworkFailure> {
        let headers = self.auth.headers().await?;
        let mut request = request;
        for (name, value) in headers {
            request = request.header(name, value);
        }
        Ok(request)
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, NetworkFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(NetworkFailure::Http {
            status: status.as_u16(),
            message,
        })
    }

    /// GET a list endpoint and unwrap its `{success, data, message}`
    /// envelope. A successful envelope with no `data` is an empty list.
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, NetworkFailure> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "repository GET");
        let request = self.authed(self.http.get(&url)).await?;
        let response = request
            .send()
            .await
            .map_err(|err| NetworkFailure::Transport(err.to_string()))?;
        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<Vec<T>> = response
            .json()
            .await
            .map_err(|err| NetworkFailure::Transport(err.to_string()))?;
        if !envelope.success {
            return Err(NetworkFailure::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "unspecified server rejection".to_string()),
            ));
        }
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl SubmissionApi for HttpSubmissionRepository {
    async fn list_submissions(
        &self,
        user_id: UserId,
        assignment_id: AssignmentId,
    ) -> Result<Vec<Submission>, NetworkFailure> {
        self.get_list(&format!(
            "/submissions/user/{}/assignment/{}",
            user_id.0, assignment_id.0
        ))
        .await
    }

    async fn delete_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<(), NetworkFailure> {
        let url = format!("{}/submissions/{}", self.base_url, submission_id.0);
        debug!(url = %url, "repository DELETE");
        let request = self.authed(self.http.delete(&url)).await?;
        let response = request
            .send()
            .await
            .map_err(|err| NetworkFailure::Transport(err.to_string()))?;
        // No body contract on delete; only the status matters.
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_classrooms(&self, user_id: UserId) -> Result<Vec<Classroom>, NetworkFailure> {
        self.get_list(&format!("/classroom/user/{}", user_id.0)).await
    }

    async fn list_assignments(
        &self,
        classroom_id: ClassroomId,
    ) -> Result<Vec<Assignment>, NetworkFailure> {
        self.get_list(&format!("/assignments/classroom/{}", classroom_id.0))
            .await
    }

    async fn list_all_submissions(&self) -> Result<Vec<CombinedSubmission>, NetworkFailure> {
        self.get_list("/submissions").await
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
