use serde::{Serialize, Deserialize};
use time::OffsetDateTime;

/// Exchange the intake path publishes vote events to.
pub const VOTE_EXCHANGE: &str = "compute-vote";
/// The single durable queue bound to [`VOTE_EXCHANGE`].
pub const VOTE_QUEUE: &str = "compute-vote.queue";
pub const VOTE_ACK_MESSAGE: &str = "vote computed successfully";

pub type CandidateId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

/// A durable ballot. `timestamp` is assigned when the record is written,
/// not when the vote was submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub candidate_id: CandidateId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewVote {
    pub candidate_id: CandidateId,
}

/// Queue payload. Carries no identity of its own, so a redelivered event is
/// indistinguishable from a fresh one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteAck {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub id: CandidateId,
    pub name: String,
    pub total_votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TallyResponse {
    pub candidate_id: CandidateId,
    pub total_votes: i64,
}

impl VoteAck {
    pub fn accepted(candidate: &Candidate, at: OffsetDateTime) -> Self {
        Self {
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
            timestamp: at,
            message: VOTE_ACK_MESSAGE.to_string(),
        }
    }
}

impl From<&VoteEvent> for NewVote {
    fn from(event: &VoteEvent) -> Self {
        Self { candidate_id: event.candidate_id }
    }
}

impl CandidateResponse {
    pub fn with_tally(candidate: Candidate, total_votes: i64) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            total_votes,
        }
    }
}
