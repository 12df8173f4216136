use sqlx::PgPool;
use shared::models::*;
use crate::store::{CandidateStore, StoreError, VoteStore};

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl CandidateStore for PgCandidateStore {
    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        sqlx::query_as::<_, Candidate>("SELECT id, name FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn create(&self, name: &str) -> Result<Candidate, StoreError> {
        sqlx::query_as::<_, Candidate>(
            "INSERT INTO candidates (name) VALUES ($1) RETURNING id, name"
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }
}

#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl VoteStore for PgVoteStore {
    async fn save(&self, vote: &NewVote) -> Result<Vote, StoreError> {
        sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (candidate_id) VALUES ($1)
             RETURNING id, candidate_id, cast_at AS timestamp"
        )
        .bind(vote.candidate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return StoreError::UnknownCandidate(vote.candidate_id);
                }
            }
            db_error(e)
        })
    }

    async fn count_by_candidate(&self, candidate_id: CandidateId) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE candidate_id = $1")
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
