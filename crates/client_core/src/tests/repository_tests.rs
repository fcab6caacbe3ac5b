use super::*;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
};

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use shared::error::AuthFailure;
use tokio::net::TcpListener;

struct StaticAuthHeaderProvider(HashMap<String, String>);

#[async_trait]
impl AuthHeaderProvider for StaticAuthHeaderProvider {
    async fn headers(&self) -> Result<HashMap<String, String>, AuthFailure> {
        Ok(self.0.clone())
    }
}

fn bearer_auth() -> Arc<dyn AuthHeaderProvider> {
    let mut headers = HashMap::new();
    headers.insert(
        "authorization".to_string(),
        "Bearer test-token".to_string(),
    );
    Arc::new(StaticAuthHeaderProvider(headers))
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn stored_submission() -> Submission {
    Submission {
        submission_id: SubmissionId(4),
        user_id: UserId(7),
        assignment_id: AssignmentId(2),
        results: Some(r#"{"time":[0],"score":[100]}"#.to_string()),
    }
}

#[tokio::test]
async fn list_submissions_sends_auth_and_unwraps_envelope() {
    let app = Router::new().route(
        "/submissions/user/:user_id/assignment/:assignment_id",
        get(
            |Path((user_id, assignment_id)): Path<(i64, i64)>, headers: HeaderMap| async move {
                if headers.get("authorization").map(|v| v.as_bytes())
                    != Some(b"Bearer test-token".as_slice())
                {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                assert_eq!((user_id, assignment_id), (7, 2));
                Ok(Json(ApiEnvelope::ok(vec![stored_submission()])))
            },
        ),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let submissions = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect("list");
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].submission_id, SubmissionId(4));
}

#[tokio::test]
async fn successful_envelope_without_data_is_an_empty_list() {
    let app = Router::new().route(
        "/submissions/user/:user_id/assignment/:assignment_id",
        get(|| async {
            Json(ApiEnvelope::<Vec<Submission>> {
                success: true,
                data: None,
                message: None,
            })
        }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let submissions = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect("list");
    assert!(submissions.is_empty());
}

#[tokio::test]
async fn rejected_envelope_surfaces_its_message() {
    let app = Router::new().route(
        "/submissions/user/:user_id/assignment/:assignment_id",
        get(|| async { Json(ApiEnvelope::<Vec<Submission>>::rejected("not enrolled")) }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let err = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect_err("rejected");
    assert_eq!(err, NetworkFailure::Rejected("not enrolled".to_string()));
}

#[tokio::test]
async fn non_success_status_is_surfaced_with_its_code() {
    let app = Router::new().route(
        "/submissions/user/:user_id/assignment/:assignment_id",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let err = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect_err("server error");
    assert_eq!(
        err,
        NetworkFailure::Http {
            status: 500,
            message: "boom".to_string(),
        }
    );
}

#[tokio::test]
async fn auth_failure_prevents_the_request_from_leaving() {
    static HITS: AtomicU32 = AtomicU32::new(0);
    let app = Router::new().route(
        "/submissions/user/:user_id/assignment/:assignment_id",
        get(|| async {
            HITS.fetch_add(1, Ordering::SeqCst);
            Json(ApiEnvelope::<Vec<Submission>>::ok(Vec::new()))
        }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(
        server_url,
        Arc::new(crate::MissingAuthHeaderProvider),
    );

    let err = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect_err("auth must fail");
    assert!(matches!(err, NetworkFailure::Auth(_)));
    assert_eq!(HITS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    // Bind then drop so the port is known to refuse connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let repository = HttpSubmissionRepository::new(format!("http://{addr}"), bearer_auth());
    let err = repository
        .list_submissions(UserId(7), AssignmentId(2))
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, NetworkFailure::Transport(_)));
}

#[tokio::test]
async fn delete_submission_succeeds_on_2xx() {
    let app = Router::new().route(
        "/submissions/:submission_id",
        delete(|Path(submission_id): Path<i64>| async move {
            assert_eq!(submission_id, 4);
            StatusCode::NO_CONTENT
        }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    repository
        .delete_submission(SubmissionId(4))
        .await
        .expect("delete");
}

#[tokio::test]
async fn deleting_an_already_deleted_submission_fails() {
    let app = Router::new().route(
        "/submissions/:submission_id",
        delete(|| async { (StatusCode::NOT_FOUND, "no such submission") }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let err = repository
        .delete_submission(SubmissionId(4))
        .await
        .expect_err("second delete fails");
    assert_eq!(
        err,
        NetworkFailure::Http {
            status: 404,
            message: "no such submission".to_string(),
        }
    );
}

#[tokio::test]
async fn list_classrooms_and_assignments_share_the_envelope_handling() {
    let app = Router::new()
        .route(
            "/classroom/user/:user_id",
            get(|| async {
                Json(ApiEnvelope::ok(vec![Classroom {
                    classroom_id: ClassroomId(1),
                    name: "Systems".to_string(),
                    description: None,
                }]))
            }),
        )
        .route(
            "/assignments/classroom/:classroom_id",
            get(|| async {
                Json(ApiEnvelope::ok(vec![Assignment {
                    assignment_id: AssignmentId(2),
                    classroom_id: ClassroomId(1),
                    title: "Sorting networks".to_string(),
                    description: None,
                    due_date: None,
                }]))
            }),
        );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let classrooms = repository.list_classrooms(UserId(7)).await.expect("classrooms");
    assert_eq!(classrooms.len(), 1);
    assert_eq!(classrooms[0].classroom_id, ClassroomId(1));

    let assignments = repository
        .list_assignments(ClassroomId(1))
        .await
        .expect("assignments");
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].assignment_id, AssignmentId(2));
}

#[tokio::test]
async fn admin_roster_lists_every_submission() {
    let app = Router::new().route(
        "/submissions",
        get(|| async {
            Json(ApiEnvelope::ok(vec![
                CombinedSubmission {
                    submission_id: SubmissionId(1),
                    first_name: "Alice".to_string(),
                    last_name: "Smith".to_string(),
                    score: 85.0,
                },
                CombinedSubmission {
                    submission_id: SubmissionId(2),
                    first_name: "Bob".to_string(),
                    last_name: "Jones".to_string(),
                    score: 92.0,
                },
            ]))
        }),
    );
    let server_url = spawn_server(app).await;
    let repository = HttpSubmissionRepository::new(server_url, bearer_auth());

    let roster = repository.list_all_submissions().await.expect("roster");
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].first_name, "Alice");
    assert_eq!(roster[1].score, 92.0);
}
