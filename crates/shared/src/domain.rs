use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(ClassroomId);
id_newtype!(AssignmentId);
id_newtype!(SubmissionId);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    pub classroom_id: ClassroomId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: AssignmentId,
    pub classroom_id: ClassroomId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// One stored submission row. `results` is the raw grading payload exactly
/// as the grader wrote it: it may be null, half-written, or malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: SubmissionId,
    pub user_id: UserId,
    pub assignment_id: AssignmentId,
    pub results: Option<String>,
}

/// Admin roster row: a submission joined with its owner's name and score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSubmission {
    pub submission_id: SubmissionId,
    pub first_name: String,
    pub last_name: String,
    pub score: f64,
}

/// Decoded grading result: parallel time/score sample sequences.
///
/// Strict schema. A payload with unknown or missing fields does not decode;
/// the codec treats it as malformed rather than coercing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultRecord {
    pub time: Vec<f64>,
    pub score: Vec<f64>,
}
