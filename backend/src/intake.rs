use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use shared::{models::*, validation::validate_candidate_id};
use crate::{
    error::IntakeError,
    queue::VoteQueue,
    store::CandidateStore,
    utils::bounded,
};

/// Accepts votes: checks the candidate, publishes a [`VoteEvent`] and
/// acknowledges without waiting for the vote to be written.
pub struct VoteIntake {
    candidates: Arc<dyn CandidateStore>,
    queue: Arc<dyn VoteQueue>,
    timeout: Duration,
}

impl VoteIntake {
    pub fn new(candidates: Arc<dyn CandidateStore>, queue: Arc<dyn VoteQueue>, timeout: Duration) -> Self {
        Self { candidates, queue, timeout }
    }

    pub async fn submit(&self, candidate_id: CandidateId) -> Result<VoteAck, IntakeError> {
        validate_candidate_id(candidate_id).map_err(|_| IntakeError::InvalidId(candidate_id))?;

        let candidate = bounded(
            self.timeout,
            self.candidates.find_by_id(candidate_id),
            |e| IntakeError::StoreFailure(e.to_string()),
            || IntakeError::StoreFailure("candidate lookup timed out".into()),
        )
        .await?
        .ok_or_else(|| {
            debug!(candidate_id, "vote rejected, unknown candidate");
            IntakeError::NotFound(candidate_id)
        })?;

        let event = VoteEvent { candidate_id: candidate.id };
        bounded(
            self.timeout,
            self.queue.publish(&event),
            |e| IntakeError::PublishFailure(e.to_string()),
            || IntakeError::PublishFailure("publish timed out".into()),
        )
        .await
        .inspect_err(|e| warn!(candidate_id, error = %e, "vote event not published"))?;

        info!(candidate_id, "vote accepted");
        Ok(VoteAck::accepted(&candidate, OffsetDateTime::now_utc()))
    }
}
