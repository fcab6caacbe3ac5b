use shared::{domain::ResultRecord, error::DecodeFailure};
use tracing::warn;

/// Decodes the raw grading payload stored on a submission.
///
/// Absence (null or blank) is the legitimate "not graded yet" signal, not
/// an error, and is never logged. A present-but-undecodable payload is
/// logged but still benign: the grader may simply not have finished
/// writing it, so callers show "processing" rather than a parse error.
/// Decoding is all-or-nothing; there is no lenient mode.
pub fn decode_results(raw: Option<&str>) -> Result<ResultRecord, DecodeFailure> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Err(DecodeFailure::Absent),
    };

    serde_json::from_str::<ResultRecord>(raw).map_err(|err| {
        warn!("result payload failed to decode: {err}");
        DecodeFailure::Malformed(err.to_string())
    })
}
