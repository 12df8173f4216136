use std::collections::HashMap;
use std::sync::Mutex;
use time::OffsetDateTime;
use shared::models::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    LockFailed,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Referenced candidate {0} does not exist")]
    UnknownCandidate(CandidateId),
}

#[rocket::async_trait]
pub trait CandidateStore: Send + Sync {
    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;

    async fn create(&self, name: &str) -> Result<Candidate, StoreError>;
}

#[rocket::async_trait]
pub trait VoteStore: Send + Sync {
    /// Inserts a new record; id and timestamp are assigned here.
    async fn save(&self, vote: &NewVote) -> Result<Vote, StoreError>;

    async fn count_by_candidate(&self, candidate_id: CandidateId) -> Result<i64, StoreError>;
}

struct Table<T> {
    rows: HashMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: HashMap::new(), next_id: 1 }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryCandidateStore {
    table: Mutex<Table<Candidate>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        let table = self.table.lock().map_err(|_| StoreError::LockFailed)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, name: &str) -> Result<Candidate, StoreError> {
        let mut table = self.table.lock().map_err(|_| StoreError::LockFailed)?;
        let candidate = Candidate { id: table.allocate_id(), name: name.to_string() };
        table.rows.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }
}

/// Does not check that the candidate exists; callers re-validate first.
#[derive(Default)]
pub struct MemoryVoteStore {
    table: Mutex<Table<Vote>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Result<Vec<Vote>, StoreError> {
        let table = self.table.lock().map_err(|_| StoreError::LockFailed)?;
        let mut votes: Vec<_> = table.rows.values().cloned().collect();
        votes.sort_by_key(|v| v.id);
        Ok(votes)
    }
}

#[rocket::async_trait]
impl VoteStore for MemoryVoteStore {
    async fn save(&self, vote: &NewVote) -> Result<Vote, StoreError> {
        let mut table = self.table.lock().map_err(|_| StoreError::LockFailed)?;
        let vote = Vote {
            id: table.allocate_id(),
            candidate_id: vote.candidate_id,
            timestamp: OffsetDateTime::now_utc(),
        };
        table.rows.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn count_by_candidate(&self, candidate_id: CandidateId) -> Result<i64, StoreError> {
        let table = self.table.lock().map_err(|_| StoreError::LockFailed)?;
        let count = table.rows.values().filter(|v| v.candidate_id == candidate_id).count();
        Ok(count as i64)
    }
}
