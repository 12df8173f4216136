use std::future::Future;
use std::time::Duration;
use shared::{models::CandidateId, validation::validate_candidate_id};
use crate::error::ApiError;

pub fn parse_candidate_id(id: &str) -> Result<CandidateId, ApiError> {
    let id = id.parse::<CandidateId>().map_err(|_| ApiError::InvalidId(id.to_string()))?;
    validate_candidate_id(id).map_err(|_| ApiError::InvalidId(id.to_string()))?;
    Ok(id)
}

/// Runs `fut` for at most `limit`, mapping both its error and the timeout
/// into the caller's error type.
pub async fn bounded<T, E, F, G>(
    limit: Duration,
    fut: F,
    on_error: impl FnOnce(E) -> G,
    on_timeout: impl FnOnce() -> G,
) -> Result<T, G>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(on_error(e)),
        Err(_) => Err(on_timeout()),
    }
}
