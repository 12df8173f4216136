use std::sync::Arc;
use shared::models::CandidateId;
use crate::store::{StoreError, VoteStore};

/// Counts persisted votes on every call; nothing is cached.
#[derive(Clone)]
pub struct TallyReader {
    votes: Arc<dyn VoteStore>,
}

impl TallyReader {
    pub fn new(votes: Arc<dyn VoteStore>) -> Self {
        Self { votes }
    }

    /// Zero for a candidate with no votes, including one that does not exist.
    pub async fn tally(&self, candidate_id: CandidateId) -> Result<i64, StoreError> {
        self.votes.count_by_candidate(candidate_id).await
    }
}
